//! Request and result types for refinement

use claimchart_domain::{ChatMessage, ClaimElement, Confidence, FlagSet, ReferenceDocument, ReviewStatus, Role};
use serde::Serialize;

/// AI assessment of an element, reported with every readable reply
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    /// Reported confidence (defaults to 100 when absent)
    pub confidence: Confidence,

    /// Reported weaknesses
    pub flags: FlagSet,

    /// Text to show the analyst
    pub explanation: String,
}

impl Default for Assessment {
    fn default() -> Self {
        Self {
            confidence: Confidence::MAX,
            flags: FlagSet::new(),
            explanation: String::new(),
        }
    }
}

/// Why a readable reply carries no rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoChangeReason {
    /// The AI judged the element already strong (`noChangeNeeded`)
    AlreadyStrong,
    /// The AI only explained, without rewriting anything
    CommentaryOnly,
}

/// Typed reading of an AI refinement reply
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefinementOutcome {
    /// At least one field has a non-empty proposed rewrite
    Rewrite {
        /// Proposed reasoning, absent when unchanged
        reasoning: Option<String>,
        /// Proposed evidence, absent when unchanged
        evidence: Option<String>,
        /// Assessment of the rewritten element
        assessment: Assessment,
    },
    /// Nothing to review
    NoChange {
        /// Why nothing is proposed
        reason: NoChangeReason,
        /// Assessment of the current element
        assessment: Assessment,
    },
    /// No JSON object could be read from the reply
    ParseFailure {
        /// What went wrong
        reason: String,
    },
}

/// One prior conversation turn passed back to the AI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    /// Author
    pub role: Role,
    /// Message text
    pub content: String,
}

impl From<&ChatMessage> for ChatTurn {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Everything the AI sees for one refinement call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefinementRequest {
    /// Element identifier
    pub element_id: String,

    /// Claim language
    pub element_text: String,

    /// Current evidence
    pub evidence_text: String,

    /// Current reasoning
    pub reasoning_text: String,

    /// Analyst request
    pub query: String,

    /// Reference documents, each cut to the character budget
    pub reference_documents: Vec<ReferenceDocument>,

    /// Conversation so far, oldest first
    pub prior_turns: Vec<ChatTurn>,
}

impl RefinementRequest {
    /// Assemble a request for `element`
    ///
    /// `element` must not yet contain the message for `query`; its chat
    /// history becomes the prior turns.
    pub fn new(
        element: &ClaimElement,
        query: &str,
        documents: &[ReferenceDocument],
        char_budget: usize,
    ) -> Self {
        Self {
            element_id: element.id.clone(),
            element_text: element.element_text.clone(),
            evidence_text: element.evidence_text.clone(),
            reasoning_text: element.reasoning_text.clone(),
            query: query.to_string(),
            reference_documents: documents
                .iter()
                .map(|doc| ReferenceDocument {
                    name: doc.name.clone(),
                    text: truncate_chars(&doc.text, char_budget).to_string(),
                })
                .collect(),
            prior_turns: element.chat_history.iter().map(ChatTurn::from).collect(),
        }
    }
}

/// What a refinement call did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub enum RefineReport {
    /// A rewrite is pending review
    Proposed {
        /// Index of the pending assistant message
        message_index: usize,
    },
    /// A rollback is pending review
    RestoreProposed {
        /// Index of the pending assistant message
        message_index: usize,
        /// 1-based version label being restored
        version: usize,
    },
    /// Commentary only; confidence and flags may have been aggregated
    Commentary {
        /// Index of the assistant message
        message_index: usize,
        /// True when the AI reported the element already strong
        no_change_needed: bool,
    },
    /// Rollback requested but the element has no versions
    NoHistory {
        /// Index of the assistant message
        message_index: usize,
    },
    /// The AI call failed or its reply was unreadable
    Failed {
        /// Index of the assistant failure message
        message_index: usize,
        /// Underlying cause, for logs
        reason: String,
    },
}

/// Result of a refinement call: the report plus the stored element
#[derive(Debug, Clone, PartialEq)]
pub struct RefinementResult {
    /// What happened
    pub report: RefineReport,
    /// Element as stored after the call
    pub element: ClaimElement,
}

/// Result of an accept/reject request
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The decision was recorded; carries the replacement element
    Applied(ClaimElement),
    /// The message had already been decided; nothing changed
    AlreadyResolved(ReviewStatus),
}

/// Longest prefix of `text` holding at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
