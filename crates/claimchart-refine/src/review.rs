//! Proposal review: build, accept and reject

use crate::error::ReviewError;
use crate::history::{snapshot, REFINEMENT_NOTE, ROLLBACK_NOTE};
use crate::types::{Assessment, Transition};
use claimchart_domain::{ClaimElement, Decision, ProposalKind, ProposedChange};
use tracing::debug;

/// Build a refinement proposal against the element's current fields
///
/// An absent or blank rewrite is stored as `None`, leaving that field
/// unchanged on accept.
pub fn propose(
    element: &ClaimElement,
    reasoning: Option<&str>,
    evidence: Option<&str>,
    assessment: &Assessment,
) -> ProposedChange {
    ProposedChange {
        kind: ProposalKind::Refinement,
        old_reasoning: element.reasoning_text.clone(),
        new_reasoning: rewrite(reasoning),
        old_evidence: element.evidence_text.clone(),
        new_evidence: rewrite(evidence),
        new_confidence: Some(assessment.confidence),
        new_flags: Some(assessment.flags.clone()),
    }
}

fn rewrite(text: Option<&str>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty()).map(str::to_string)
}

/// Accept the proposal on message `index`
///
/// Snapshots the current fields, then writes every field the proposal
/// carries. A rollback may carry an empty value, which clears the field.
pub fn accept(element: &ClaimElement, index: usize, now: u64) -> Result<Transition, ReviewError> {
    decide(element, index, Decision::Accept, now)
}

/// Reject the proposal on message `index`; element fields stay as they are
pub fn reject(element: &ClaimElement, index: usize) -> Result<Transition, ReviewError> {
    decide(element, index, Decision::Reject, 0)
}

fn decide(
    element: &ClaimElement,
    index: usize,
    decision: Decision,
    now: u64,
) -> Result<Transition, ReviewError> {
    let message = element
        .chat_history
        .get(index)
        .ok_or(ReviewError::MessageNotFound(index))?;
    let change = message
        .proposed_change
        .as_ref()
        .ok_or(ReviewError::NoProposal(index))?;

    let Some(status) = message.status.transition(decision) else {
        if !message.status.is_terminal() {
            return Err(ReviewError::NoProposal(index));
        }
        debug!(
            "Message {} on element {} already {}",
            index,
            element.id,
            message.status.as_str()
        );
        return Ok(Transition::AlreadyResolved(message.status));
    };

    let mut next = match decision {
        Decision::Accept => apply(element, change, now),
        Decision::Reject => element.clone(),
    };
    next.chat_history[index].status = status;

    Ok(Transition::Applied(next))
}

fn apply(element: &ClaimElement, change: &ProposedChange, now: u64) -> ClaimElement {
    let note = match change.kind {
        ProposalKind::Refinement => REFINEMENT_NOTE,
        ProposalKind::Restore { .. } => ROLLBACK_NOTE,
    };
    let mut next = snapshot(element, note, now);

    if let Some(reasoning) = &change.new_reasoning {
        next.reasoning_text = reasoning.clone();
    }
    if let Some(evidence) = &change.new_evidence {
        next.evidence_text = evidence.clone();
    }
    if let Some(confidence) = change.new_confidence {
        next.confidence = confidence;
    }
    if let Some(flags) = &change.new_flags {
        next.flags = flags.clone();
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimchart_domain::{ChatMessage, Confidence, ElementSeed, FlagSet, ReviewStatus};

    fn base() -> ClaimElement {
        let mut element = ClaimElement::from_seed(ElementSeed {
            id: "1.a".to_string(),
            element_text: "A digital sensor array".to_string(),
            evidence_text: "TechSpec §3.1".to_string(),
            reasoning_text: "The product probably meets this.".to_string(),
        });
        element.confidence = Confidence::new(55).unwrap();
        element.flags = FlagSet::from_iter(["Hedging language"]);
        element
    }

    fn with_proposal(element: &ClaimElement, reasoning: &str, evidence: &str) -> ClaimElement {
        let assessment = Assessment {
            confidence: Confidence::new(90).unwrap(),
            flags: FlagSet::new(),
            explanation: "Removed hedging.".to_string(),
        };
        let change = propose(
            element,
            Some(reasoning).filter(|s| !s.is_empty()),
            Some(evidence).filter(|s| !s.is_empty()),
            &assessment,
        );
        element
            .with_message(ChatMessage::user("Remove hedging"))
            .with_message(ChatMessage::proposal("Proposed refinement", change))
    }

    fn applied(transition: Transition) -> ClaimElement {
        match transition {
            Transition::Applied(element) => element,
            other => panic!("expected Applied, got {:?}", other),
        }
    }

    #[test]
    fn test_accept_snapshots_then_applies() {
        let element = with_proposal(&base(), "Per §3.1 the array meets this.", "");
        let next = applied(accept(&element, 1, 1_000).unwrap());

        assert_eq!(next.versions.len(), element.versions.len() + 1);
        let logged = next.versions.last().unwrap();
        assert_eq!(logged.reasoning_text, "The product probably meets this.");
        assert_eq!(logged.evidence_text, "TechSpec §3.1");
        assert_eq!(logged.confidence.value(), 55);
        assert!(logged.flags.contains("Hedging language"));
        assert_eq!(logged.note, REFINEMENT_NOTE);
        assert_eq!(logged.timestamp, 1_000);

        assert_eq!(next.reasoning_text, "Per §3.1 the array meets this.");
        assert_eq!(next.evidence_text, "TechSpec §3.1");
        assert_eq!(next.confidence.value(), 90);
        assert!(next.flags.is_empty());
        assert_eq!(next.chat_history[1].status, ReviewStatus::Accepted);
    }

    #[test]
    fn test_reject_changes_nothing_but_status() {
        let element = with_proposal(&base(), "New reasoning", "New evidence");
        let next = applied(reject(&element, 1).unwrap());

        assert_eq!(next.versions.len(), element.versions.len());
        assert_eq!(next.reasoning_text, element.reasoning_text);
        assert_eq!(next.evidence_text, element.evidence_text);
        assert_eq!(next.confidence, element.confidence);
        assert_eq!(next.chat_history[1].status, ReviewStatus::Rejected);
    }

    #[test]
    fn test_second_decision_is_no_op() {
        let element = with_proposal(&base(), "New reasoning", "");
        let accepted = applied(accept(&element, 1, 1).unwrap());

        assert_eq!(
            accept(&accepted, 1, 2).unwrap(),
            Transition::AlreadyResolved(ReviewStatus::Accepted)
        );
        assert_eq!(
            reject(&accepted, 1).unwrap(),
            Transition::AlreadyResolved(ReviewStatus::Accepted)
        );
    }

    #[test]
    fn test_decision_on_plain_messages() {
        let element = with_proposal(&base(), "New reasoning", "");
        assert_eq!(accept(&element, 0, 1), Err(ReviewError::NoProposal(0)));
        assert_eq!(reject(&element, 9), Err(ReviewError::MessageNotFound(9)));
    }

    #[test]
    fn test_proposal_without_pending_status_is_not_reviewable() {
        let element = with_proposal(&base(), "New reasoning", "");
        let mut stale = element.clone();
        stale.chat_history[1].status = ReviewStatus::None;

        assert_eq!(accept(&stale, 1, 1), Err(ReviewError::NoProposal(1)));
        assert_eq!(reject(&stale, 1), Err(ReviewError::NoProposal(1)));
    }

    #[test]
    fn test_restore_accept_uses_rollback_note() {
        let element = base();
        let mut restored_from = element.clone();
        restored_from.versions.push(element.capture_version(REFINEMENT_NOTE, 5));
        restored_from.reasoning_text = "Later reasoning".to_string();
        restored_from.confidence = Confidence::new(95).unwrap();

        let change = crate::history::build_restore_proposal(&restored_from, 0).unwrap();
        let pending = restored_from.with_message(ChatMessage::proposal("Restore v1?", change));
        let next = applied(accept(&pending, 0, 10).unwrap());

        assert_eq!(next.versions.len(), 2);
        assert_eq!(next.versions[1].note, ROLLBACK_NOTE);
        assert_eq!(next.versions[1].reasoning_text, "Later reasoning");
        assert_eq!(next.reasoning_text, "The product probably meets this.");
        assert_eq!(next.confidence.value(), 55);
    }

    #[test]
    fn test_blank_rewrite_is_absent() {
        let assessment = Assessment::default();
        let change = propose(&base(), Some("  "), None, &assessment);
        assert_eq!(change.new_reasoning, None);
        assert_eq!(change.new_evidence, None);

        let pending = base()
            .with_message(ChatMessage::user("Tighten this"))
            .with_message(ChatMessage::proposal("Nothing to rewrite", change));
        let next = applied(accept(&pending, 1, 1).unwrap());
        assert_eq!(next.reasoning_text, "The product probably meets this.");
        assert_eq!(next.evidence_text, "TechSpec §3.1");
    }

    #[test]
    fn test_restore_clears_field_that_was_empty() {
        let mut element = ClaimElement::from_seed(ElementSeed {
            id: "1.b".to_string(),
            element_text: "A wireless communication module".to_string(),
            evidence_text: String::new(),
            reasoning_text: String::new(),
        });
        let original = element.capture_version(REFINEMENT_NOTE, 5);
        element.versions.push(original);
        element.evidence_text = "API Reference §4".to_string();
        element.reasoning_text = "Module per §4.".to_string();
        element.confidence = Confidence::new(85).unwrap();

        let change = crate::history::build_restore_proposal(&element, 0).unwrap();
        assert_eq!(change.new_evidence.as_deref(), Some(""));

        let pending = element.with_message(ChatMessage::proposal("Restore v1?", change));
        let next = applied(accept(&pending, 0, 10).unwrap());

        assert_eq!(next.evidence_text, "");
        assert_eq!(next.reasoning_text, "");
        assert_eq!(next.confidence.value(), 100);
        assert_eq!(next.versions[1].evidence_text, "API Reference §4");
    }
}
