//! Review conversation attached to each element

use crate::confidence::Confidence;
use crate::flags::FlagSet;
use serde::{Deserialize, Serialize};

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The analyst
    User,
    /// The AI service
    Assistant,
}

impl Role {
    /// Get the role name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Review state of a chat message
///
/// Only `Pending` can move, and only once:
///
/// ```text
/// None       (commentary, never reviewable)
/// Pending ──accept──> Accepted
///         └─reject──> Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    /// Plain message with nothing to review
    #[default]
    None,
    /// Proposal awaiting a decision
    Pending,
    /// Proposal applied to the element
    Accepted,
    /// Proposal discarded
    Rejected,
}

/// Analyst decision on a pending proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Apply the proposal
    Accept,
    /// Discard the proposal
    Reject,
}

impl ReviewStatus {
    /// Apply a decision, returning the new status
    ///
    /// Returns `None` when the status does not admit the decision: terminal
    /// states stay terminal and plain messages never become reviewable.
    pub fn transition(self, decision: Decision) -> Option<ReviewStatus> {
        match (self, decision) {
            (ReviewStatus::Pending, Decision::Accept) => Some(ReviewStatus::Accepted),
            (ReviewStatus::Pending, Decision::Reject) => Some(ReviewStatus::Rejected),
            (ReviewStatus::None, _) | (ReviewStatus::Accepted, _) | (ReviewStatus::Rejected, _) => {
                None
            }
        }
    }

    /// True once a decision has been recorded
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReviewStatus::Accepted | ReviewStatus::Rejected)
    }

    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::None => "none",
            ReviewStatus::Pending => "pending",
            ReviewStatus::Accepted => "accepted",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

/// Where a proposal came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProposalKind {
    /// AI-suggested rewrite
    Refinement,
    /// Rollback to a logged version (1-based label)
    Restore {
        /// Version label as shown to the analyst, `v{version}`
        version: usize,
    },
}

/// Diff-ready pair of current and proposed field values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedChange {
    /// Origin of the proposal
    pub kind: ProposalKind,

    /// Reasoning at proposal time
    pub old_reasoning: String,

    /// Proposed reasoning; `None` leaves the field unchanged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_reasoning: Option<String>,

    /// Evidence at proposal time
    pub old_evidence: String,

    /// Proposed evidence; `None` leaves the field unchanged
    ///
    /// `Some("")` clears the field. Only rollbacks produce it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_evidence: Option<String>,

    /// Confidence written on accept, replacing the current score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_confidence: Option<Confidence>,

    /// Flags written on accept, replacing the current set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_flags: Option<FlagSet>,
}

/// A single turn in an element's review conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author
    pub role: Role,

    /// Message text
    pub content: String,

    /// Attached proposal, present only on reviewable assistant messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_change: Option<ProposedChange>,

    /// Review state
    #[serde(default)]
    pub status: ReviewStatus,
}

impl ChatMessage {
    /// Analyst message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            proposed_change: None,
            status: ReviewStatus::None,
        }
    }

    /// Assistant commentary with nothing to review
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            proposed_change: None,
            status: ReviewStatus::None,
        }
    }

    /// Assistant message carrying a pending proposal
    pub fn proposal(content: impl Into<String>, change: ProposedChange) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            proposed_change: Some(change),
            status: ReviewStatus::Pending,
        }
    }

    /// True while the attached proposal awaits a decision
    pub fn is_pending(&self) -> bool {
        self.status == ReviewStatus::Pending && self.proposed_change.is_some()
    }
}
