//! Version log and rollback requests

use claimchart_domain::{ClaimElement, ElementVersion, ProposalKind, ProposedChange};
use regex::Regex;
use std::sync::LazyLock;

/// Note on snapshots taken before an AI rewrite is applied
pub const REFINEMENT_NOTE: &str = "Before refinement";

/// Note on snapshots taken before a rollback is applied
pub const ROLLBACK_NOTE: &str = "Before rollback";

static RESTORE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)restore\s+version\s+v?(\d+)").expect("valid regex"));

static UNDO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bundo\b|\brevert\b|\broll.?back\b").expect("valid regex"));

/// Copy of `element` with its current fields appended to the version log
pub fn snapshot(element: &ClaimElement, note: &str, timestamp: u64) -> ClaimElement {
    let mut next = element.clone();
    next.versions.push(element.capture_version(note, timestamp));
    next
}

/// What an analyst message asks of the version log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreResolution {
    /// The message is not a rollback request
    NotRequested,
    /// Rollback requested, but nothing has been logged
    EmptyHistory,
    /// Rollback to this 0-based log index
    Target(usize),
}

/// Interpret `request` against `log`
///
/// "restore version vN" names a 1-based version and takes precedence over
/// generic undo phrasing, which targets the latest entry. A version number
/// outside the log also falls back to the latest entry.
pub fn resolve_restore_target(log: &[ElementVersion], request: &str) -> RestoreResolution {
    let explicit = RESTORE_VERSION
        .captures(request)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().parse::<usize>().ok());

    if explicit.is_none() && !UNDO.is_match(request) {
        return RestoreResolution::NotRequested;
    }
    if log.is_empty() {
        return RestoreResolution::EmptyHistory;
    }

    let latest = log.len() - 1;
    match explicit.flatten() {
        Some(version) if (1..=log.len()).contains(&version) => {
            RestoreResolution::Target(version - 1)
        }
        _ => RestoreResolution::Target(latest),
    }
}

/// Proposal pairing the element's current fields with a logged version
///
/// Every field is carried, empty ones included, so accepting restores the
/// version exactly. Returns `None` when `index` is outside the log.
pub fn build_restore_proposal(element: &ClaimElement, index: usize) -> Option<ProposedChange> {
    let version = element.versions.get(index)?;
    Some(ProposedChange {
        kind: ProposalKind::Restore { version: index + 1 },
        old_reasoning: element.reasoning_text.clone(),
        new_reasoning: Some(version.reasoning_text.clone()),
        old_evidence: element.evidence_text.clone(),
        new_evidence: Some(version.evidence_text.clone()),
        new_confidence: Some(version.confidence),
        new_flags: Some(version.flags.clone()),
    })
}
