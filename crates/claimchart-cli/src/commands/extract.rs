//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::error::Result;
use crate::output::Formatter;
use crate::session::{file_label, Session};
use std::fs;

/// Execute the extract command.
pub async fn execute_extract(
    args: ExtractArgs,
    session: &Session,
    formatter: &Formatter,
) -> Result<()> {
    let text = fs::read_to_string(&args.file)?;
    let title = file_label(&args.file, args.title.as_deref());

    let chart = session.extract_chart(&title, &text).await?;
    println!("{}", formatter.format_chart(&chart)?);
    Ok(())
}
