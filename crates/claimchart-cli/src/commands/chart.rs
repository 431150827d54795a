//! List, show and delete commands.

use crate::cli::{DeleteArgs, ShowArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::session::{parse_chart_id, Session};
use std::io::{self, Write};

/// Execute the list command.
pub fn execute_list(session: &Session, formatter: &Formatter) -> Result<()> {
    let charts = session.list_charts()?;
    println!("{}", formatter.format_charts(&charts)?);
    Ok(())
}

/// Execute the show command.
pub fn execute_show(args: ShowArgs, session: &Session, formatter: &Formatter) -> Result<()> {
    let chart = session.chart(parse_chart_id(&args.chart)?)?;

    match args.element {
        Some(element_id) => {
            let element = chart
                .element(&element_id)
                .ok_or_else(|| CliError::NotFound(format!("Element '{}'", element_id)))?;
            println!("{}", formatter.format_element(element)?);
        }
        None => println!("{}", formatter.format_chart(&chart)?),
    }
    Ok(())
}

/// Execute the delete command.
pub fn execute_delete(args: DeleteArgs, session: &Session, formatter: &Formatter) -> Result<()> {
    let chart_id = parse_chart_id(&args.chart)?;
    let chart = session.chart(chart_id)?;

    // Confirm deletion unless --yes is specified
    if !args.yes {
        print!(
            "Delete chart '{}' and its {} element(s)? [y/N] ",
            chart.title,
            chart.elements.len()
        );
        io::stdout().flush()?;

        let mut response = String::new();
        io::stdin().read_line(&mut response)?;

        if !response.trim().eq_ignore_ascii_case("y") {
            println!("{}", formatter.info("Operation cancelled"));
            return Ok(());
        }
    }

    if session.delete_chart(chart_id)? {
        println!("{}", formatter.success(&format!("Deleted chart {}", chart_id)));
    } else {
        println!("{}", formatter.warning("Chart was already gone"));
    }
    Ok(())
}
