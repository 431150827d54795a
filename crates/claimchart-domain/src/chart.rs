//! Chart module - a titled table of claim elements

use crate::element::ClaimElement;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a chart based on UUIDv7
///
/// UUIDv7 keeps chart listings sortable by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartId(uuid::Uuid);

impl ChartId {
    /// Generate a new UUIDv7-based ChartId
    ///
    /// # Examples
    ///
    /// ```
    /// use claimchart_domain::ChartId;
    ///
    /// let id = ChartId::new();
    /// assert_eq!(id.to_string().len(), 36);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Create a ChartId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(uuid::Uuid::from_u128(value))
    }

    /// Parse a ChartId from its string form
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid chart id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0.as_u128()
    }
}

impl Default for ChartId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ChartId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

/// Reference document text supplied by ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDocument {
    /// Display name (usually the file name)
    pub name: String,

    /// Full extracted text
    pub text: String,
}

/// Listing entry for a stored chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSummary {
    /// Chart identifier
    pub id: ChartId,

    /// Chart title
    pub title: String,

    /// Number of elements
    pub element_count: usize,

    /// Last modification (milliseconds since Unix epoch)
    pub updated_at: u64,
}

/// A reason an element would weaken an exported chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportIssue {
    /// Element identifier
    pub element_id: String,

    /// Human-readable issue
    pub issue: String,
}

/// Below this score an element is reported as low confidence
pub const LOW_CONFIDENCE_THRESHOLD: u8 = 50;

/// A claim chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    /// Unique identifier
    pub id: ChartId,

    /// Title (usually the source document name)
    pub title: String,

    /// Elements in table order
    pub elements: Vec<ClaimElement>,

    /// Reference documents used as refinement context
    #[serde(default)]
    pub reference_documents: Vec<ReferenceDocument>,

    /// Creation time (milliseconds since Unix epoch)
    pub created_at: u64,

    /// Last modification (milliseconds since Unix epoch)
    pub updated_at: u64,
}

impl Chart {
    /// Create a chart holding the given elements
    pub fn new(title: impl Into<String>, elements: Vec<ClaimElement>, now: u64) -> Self {
        Self {
            id: ChartId::new(),
            title: title.into(),
            elements,
            reference_documents: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Find an element by id
    pub fn element(&self, element_id: &str) -> Option<&ClaimElement> {
        self.elements.iter().find(|e| e.id == element_id)
    }

    /// Copy of this chart with one element replaced wholesale
    ///
    /// Returns `None` when no element carries the replacement's id.
    pub fn with_element(&self, element: ClaimElement, now: u64) -> Option<Self> {
        let position = self.elements.iter().position(|e| e.id == element.id)?;
        let mut next = self.clone();
        next.elements[position] = element;
        next.updated_at = now;
        Some(next)
    }

    /// Summary for listings
    pub fn summary(&self) -> ChartSummary {
        ChartSummary {
            id: self.id,
            title: self.title.clone(),
            element_count: self.elements.len(),
            updated_at: self.updated_at,
        }
    }

    /// Elements that would weaken an exported chart, one issue per element
    ///
    /// Missing evidence outranks flags, which outrank a low score.
    pub fn export_issues(&self) -> Vec<ExportIssue> {
        self.elements
            .iter()
            .filter_map(|element| {
                let issue = if element.evidence_text.trim().is_empty() {
                    "No evidence mapped: this element has no supporting evidence.".to_string()
                } else if !element.flags.is_empty() {
                    let flags: Vec<&str> = element.flags.iter().collect();
                    format!("Flagged weakness: {}", flags.join("; "))
                } else if element.confidence.value() < LOW_CONFIDENCE_THRESHOLD {
                    format!("Low confidence score ({}).", element.confidence)
                } else {
                    return None;
                };
                Some(ExportIssue {
                    element_id: element.id.clone(),
                    issue,
                })
            })
            .collect()
    }
}
