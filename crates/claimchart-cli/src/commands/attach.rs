//! Attach command implementation.

use crate::cli::AttachArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::session::{file_label, parse_chart_id, Session};
use std::fs;

/// Execute the attach command.
pub fn execute_attach(args: AttachArgs, session: &Session, formatter: &Formatter) -> Result<()> {
    let chart_id = parse_chart_id(&args.chart)?;
    let text = fs::read_to_string(&args.file)?;
    if text.trim().is_empty() {
        return Err(CliError::InvalidInput(format!(
            "{} is empty",
            args.file.display()
        )));
    }

    let name = file_label(&args.file, args.name.as_deref());
    let chart = session.attach_reference(chart_id, &name, &text)?;

    println!(
        "{}",
        formatter.success(&format!(
            "Attached '{}' ({} reference document(s) on chart)",
            name,
            chart.reference_documents.len()
        ))
    );
    Ok(())
}
