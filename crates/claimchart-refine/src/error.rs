//! Error types for the refinement engine

use thiserror::Error;

/// Errors that can occur while refining or extracting
///
/// A reply the parser cannot read is not an error: it is reported as a
/// failed refinement inside a successful call.
#[derive(Error, Debug)]
pub enum RefineError {
    /// No chart with this id
    #[error("Chart not found: {0}")]
    ChartNotFound(String),

    /// No element with this id in the chart
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Another refinement call is still in flight
    #[error("A refinement is already in progress")]
    Busy,

    /// Empty analyst query
    #[error("Query is empty")]
    EmptyQuery,

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// LLM call exceeded the configured timeout
    #[error("LLM call timed out")]
    Timeout,

    /// Document extraction failed
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Chart repository error
    #[error("Store error: {0}")]
    Store(String),

    /// Invalid review request
    #[error("Review error: {0}")]
    Review(#[from] ReviewError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised by accept/reject requests that name no proposal
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    /// Message index outside the chat history
    #[error("No chat message at index {0}")]
    MessageNotFound(usize),

    /// Message carries nothing to review
    #[error("Chat message {0} has no proposed change")]
    NoProposal(usize),
}
