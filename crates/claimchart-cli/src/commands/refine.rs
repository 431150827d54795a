//! Refine command implementation.

use crate::cli::RefineArgs;
use crate::error::Result;
use crate::output::Formatter;
use crate::session::{parse_chart_id, Session};
use claimchart_refine::RefineReport;

/// Execute the refine command.
pub async fn execute_refine(args: RefineArgs, session: &Session, formatter: &Formatter) -> Result<()> {
    let chart_id = parse_chart_id(&args.chart)?;
    let result = session.refine(chart_id, &args.element, &args.query).await?;

    println!("{}", formatter.format_refinement(&result)?);

    if formatter.format() != crate::config::OutputFormat::Json {
        if let RefineReport::Proposed { message_index } | RefineReport::RestoreProposed { message_index, .. } =
            result.report
        {
            let change = result
                .element
                .chat_history
                .get(message_index)
                .and_then(|m| m.proposed_change.as_ref());
            if let Some(change) = change {
                println!("{}", formatter.format_diff(&session.proposal_diff(change))?);
            }
        }
    }
    Ok(())
}
