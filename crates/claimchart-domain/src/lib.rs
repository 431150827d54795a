//! Claimchart Domain Layer
//!
//! This crate contains the domain model for claimchart: the claim-element table
//! an analyst maintains, the review conversation attached to each element, and
//! the trait interfaces that every other layer depends upon.
//!
//! ## Key Concepts
//!
//! - **Claim element**: a sub-part of a claim, paired with evidence and reasoning text
//! - **Proposal**: an AI-suggested rewrite of reasoning/evidence awaiting accept/reject
//! - **Version**: an immutable snapshot of an element's fields, appended before every change
//! - **Flag**: a short descriptor of a detected weakness in evidence or reasoning
//! - **Confidence**: an integer score in [0, 100]
//!
//! ## Architecture
//!
//! - Value types only; mutation happens by building a replacement value
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chart;
pub mod chat;
pub mod confidence;
pub mod element;
pub mod flags;
pub mod traits;

// Re-exports for convenience
pub use chart::{Chart, ChartId, ChartSummary, ExportIssue, ReferenceDocument};
pub use chat::{ChatMessage, Decision, ProposalKind, ProposedChange, ReviewStatus, Role};
pub use confidence::Confidence;
pub use element::{ClaimElement, ElementSeed, ElementVersion};
pub use flags::FlagSet;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
