//! Claimchart Refine
//!
//! Reviews and strengthens claim-chart elements with an AI assistant while
//! keeping every change reversible and analyst-approved.
//!
//! # Overview
//!
//! An analyst asks for a change on one element. The Refiner sends the element,
//! its conversation and the chart's reference documents to the AI, reads the
//! reply tolerantly, and either records commentary or attaches a proposal that
//! waits for an explicit accept or reject. Accepting snapshots the element
//! first, so any earlier state can be proposed back with "undo" or
//! "restore version vN".
//!
//! # Architecture
//!
//! ```text
//! Query → Refiner → LLM → Parser → Proposal (pending) → accept/reject → ChartRepository
//!                                └→ Commentary → confidence/flag aggregation
//! ```
//!
//! # Key Features
//!
//! - **Tolerant parsing**: JSON pulled out of prose, code fences and stray brackets
//! - **Review state machine**: pending proposals move once, to accepted or rejected
//! - **Version log**: append-only snapshots taken before every applied change
//! - **Word diff**: whitespace-preserving LCS diff for proposal review
//! - **Extraction**: claim-chart document text to elements
//!
//! # Example Usage
//!
//! ```no_run
//! use claimchart_refine::{Refiner, RefinerConfig, RefineReport};
//! use claimchart_llm::MockProvider;
//! use claimchart_store::MemoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new(r#"{"refinedReasoning":"Per §3.1 ...","confidence":90}"#);
//! let refiner = Refiner::new(llm, MemoryStore::new(), RefinerConfig::default())?;
//!
//! let chart = refiner
//!     .extract_chart("NexaTherm", "1.a A digital sensor array | TechSpec §3.1 | ...")
//!     .await?;
//!
//! let result = refiner.refine(chart.id, "1.a", "Remove the hedging").await?;
//! if let RefineReport::Proposed { message_index } = result.report {
//!     refiner.accept(chart.id, "1.a", message_index)?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod aggregate;
mod config;
mod diff;
mod error;
mod history;
mod parser;
mod prompt;
mod refiner;
mod review;
mod types;

#[cfg(test)]
mod tests;

pub use aggregate::aggregate;
pub use config::RefinerConfig;
pub use diff::{
    has_changes, new_text, old_text, proposal_diff, tokenize, word_diff, word_diff_bounded,
    DiffKind, DiffOp, ProposalDiff, WordDiff,
};
pub use error::{RefineError, ReviewError};
pub use history::{
    build_restore_proposal, resolve_restore_target, snapshot, RestoreResolution, REFINEMENT_NOTE,
    ROLLBACK_NOTE,
};
pub use parser::{extract_json, parse_extraction_response, parse_refinement_response, JsonShape};
pub use prompt::{ExtractionPromptBuilder, PromptBuilder};
pub use refiner::{Refiner, FAILURE_MESSAGE, NO_HISTORY_MESSAGE};
pub use review::{accept, propose, reject};
pub use types::{
    truncate_chars, Assessment, ChatTurn, NoChangeReason, RefineReport, RefinementOutcome,
    RefinementRequest, RefinementResult, Transition,
};
