//! Check command implementation.

use crate::cli::ChartArgs;
use crate::error::Result;
use crate::output::Formatter;
use crate::session::{parse_chart_id, Session};

/// Execute the check command.
pub fn execute_check(args: ChartArgs, session: &Session, formatter: &Formatter) -> Result<()> {
    let chart = session.chart(parse_chart_id(&args.chart)?)?;
    let issues = chart.export_issues();
    println!("{}", formatter.format_issues(&issues)?);
    Ok(())
}
