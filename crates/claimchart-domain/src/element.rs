//! Claim element module - one row of the claim chart

use crate::chat::ChatMessage;
use crate::confidence::Confidence;
use crate::flags::FlagSet;
use serde::{Deserialize, Serialize};

/// Raw element as supplied by document extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSeed {
    /// Stable element identifier (e.g. "1.a")
    pub id: String,

    /// Claim language
    pub element_text: String,

    /// Evidence text
    pub evidence_text: String,

    /// Reasoning text
    pub reasoning_text: String,
}

/// Immutable snapshot of an element's tracked fields
///
/// Versions are only ever appended to an element's log; nothing edits one
/// after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementVersion {
    /// Reasoning at snapshot time
    pub reasoning_text: String,

    /// Evidence at snapshot time
    pub evidence_text: String,

    /// Confidence at snapshot time
    pub confidence: Confidence,

    /// Flags at snapshot time
    pub flags: FlagSet,

    /// Snapshot time (milliseconds since Unix epoch)
    pub timestamp: u64,

    /// Why the snapshot was taken
    pub note: String,
}

/// A claim element - one sub-part of a claim with its evidence and reasoning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimElement {
    /// Stable identifier
    pub id: String,

    /// Claim language
    pub element_text: String,

    /// Evidence mapped to this element
    pub evidence_text: String,

    /// Reasoning connecting evidence to claim language
    pub reasoning_text: String,

    /// Confidence score
    pub confidence: Confidence,

    /// Detected weaknesses
    pub flags: FlagSet,

    /// Append-only version log, oldest first
    pub versions: Vec<ElementVersion>,

    /// Review conversation, in request-issue order
    pub chat_history: Vec<ChatMessage>,
}

impl ClaimElement {
    /// Create an element from extraction output
    ///
    /// New elements start at full confidence with no flags, versions or chat.
    pub fn from_seed(seed: ElementSeed) -> Self {
        Self {
            id: seed.id,
            element_text: seed.element_text,
            evidence_text: seed.evidence_text,
            reasoning_text: seed.reasoning_text,
            confidence: Confidence::MAX,
            flags: FlagSet::new(),
            versions: Vec::new(),
            chat_history: Vec::new(),
        }
    }

    /// Capture the current tracked fields as a version
    pub fn capture_version(&self, note: impl Into<String>, timestamp: u64) -> ElementVersion {
        ElementVersion {
            reasoning_text: self.reasoning_text.clone(),
            evidence_text: self.evidence_text.clone(),
            confidence: self.confidence,
            flags: self.flags.clone(),
            timestamp,
            note: note.into(),
        }
    }

    /// Copy of this element with one more chat message
    pub fn with_message(&self, message: ChatMessage) -> Self {
        let mut next = self.clone();
        next.chat_history.push(message);
        next
    }

    /// Index of the most recent pending message, if any
    pub fn latest_pending(&self) -> Option<usize> {
        self.chat_history.iter().rposition(ChatMessage::is_pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> ElementSeed {
        ElementSeed {
            id: "1.a".to_string(),
            element_text: "A digital sensor array".to_string(),
            evidence_text: "TechSpec §3.1".to_string(),
            reasoning_text: "The array meets the limitation.".to_string(),
        }
    }

    #[test]
    fn test_from_seed_defaults() {
        let element = ClaimElement::from_seed(seed());
        assert_eq!(element.id, "1.a");
        assert_eq!(element.confidence.value(), 100);
        assert!(element.flags.is_empty());
        assert!(element.versions.is_empty());
        assert!(element.chat_history.is_empty());
    }

    #[test]
    fn test_capture_version() {
        let element = ClaimElement::from_seed(seed());
        let version = element.capture_version("Before refinement", 1_700_000_000_000);
        assert_eq!(version.reasoning_text, element.reasoning_text);
        assert_eq!(version.evidence_text, element.evidence_text);
        assert_eq!(version.confidence, element.confidence);
        assert_eq!(version.note, "Before refinement");
    }

    #[test]
    fn test_with_message_leaves_original() {
        let element = ClaimElement::from_seed(seed());
        let next = element.with_message(ChatMessage::user("hi"));
        assert!(element.chat_history.is_empty());
        assert_eq!(next.chat_history.len(), 1);
    }
}
