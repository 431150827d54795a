//! Accept, reject, diff and history commands.

use crate::cli::{ElementArgs, ReviewArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::session::{parse_chart_id, Session};
use claimchart_domain::{ChartId, ClaimElement};
use tracing::debug;

/// Execute the accept command.
pub fn execute_accept(args: ReviewArgs, session: &Session, formatter: &Formatter) -> Result<()> {
    let (chart_id, element) = load_element(session, &args.chart, &args.element)?;
    let index = resolve_message(&element, args.message)?;
    debug!("Accepting message {} on {}", index, element.id);

    let transition = session.accept(chart_id, &element.id, index)?;
    println!("{}", formatter.format_transition(&transition, "accepted"));
    Ok(())
}

/// Execute the reject command.
pub fn execute_reject(args: ReviewArgs, session: &Session, formatter: &Formatter) -> Result<()> {
    let (chart_id, element) = load_element(session, &args.chart, &args.element)?;
    let index = resolve_message(&element, args.message)?;
    debug!("Rejecting message {} on {}", index, element.id);

    let transition = session.reject(chart_id, &element.id, index)?;
    println!("{}", formatter.format_transition(&transition, "rejected"));
    Ok(())
}

/// Execute the diff command.
pub fn execute_diff(args: ReviewArgs, session: &Session, formatter: &Formatter) -> Result<()> {
    let (_, element) = load_element(session, &args.chart, &args.element)?;
    let index = resolve_message(&element, args.message)?;

    let change = element
        .chat_history
        .get(index)
        .and_then(|m| m.proposed_change.as_ref())
        .ok_or_else(|| CliError::NotFound(format!("No proposal at message #{}", index)))?;

    println!("{}", formatter.format_diff(&session.proposal_diff(change))?);
    Ok(())
}

/// Execute the history command.
pub fn execute_history(args: ElementArgs, session: &Session, formatter: &Formatter) -> Result<()> {
    let (_, element) = load_element(session, &args.chart, &args.element)?;
    println!("{}", formatter.format_history(&element)?);
    Ok(())
}

fn load_element(session: &Session, chart: &str, element_id: &str) -> Result<(ChartId, ClaimElement)> {
    let chart_id = parse_chart_id(chart)?;
    let element = session
        .chart(chart_id)?
        .element(element_id)
        .cloned()
        .ok_or_else(|| CliError::NotFound(format!("Element '{}'", element_id)))?;
    Ok((chart_id, element))
}

/// Explicit message index, or the latest pending proposal.
fn resolve_message(element: &ClaimElement, explicit: Option<usize>) -> Result<usize> {
    explicit
        .or_else(|| element.latest_pending())
        .ok_or_else(|| CliError::NotFound(format!("No pending proposal on element '{}'", element.id)))
}
