//! Claimchart LLM Provider Layer
//!
//! Implementations of the `LlmProvider` trait from `claimchart-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `ReplayProvider`: Replays an AI response saved on disk, for offline review
//!
//! # Examples
//!
//! ```
//! use claimchart_llm::MockProvider;
//! use claimchart_domain::traits::LlmProvider;
//!
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.generate("test prompt").unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! ```

#![warn(missing_docs)]

pub mod replay;

use claimchart_domain::traits::LlmProvider as LlmProviderTrait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

pub use replay::ReplayProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network, file or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

#[derive(Debug, Clone)]
enum Scripted {
    Reply(String),
    Fail(String),
}

#[derive(Debug, Default)]
struct MockState {
    queue: VecDeque<Scripted>,
    prompts: Vec<String>,
}

/// Mock LLM provider for deterministic testing
///
/// Returns scripted replies in order, then falls back to a fixed default.
/// Every prompt it receives is recorded so tests can inspect the assembled
/// context.
///
/// # Examples
///
/// ```
/// use claimchart_llm::MockProvider;
/// use claimchart_domain::traits::LlmProvider;
///
/// let provider = MockProvider::new("fallback");
/// provider.push_response("first");
/// assert_eq!(provider.generate("a").unwrap(), "first");
/// assert_eq!(provider.generate("b").unwrap(), "fallback");
/// assert_eq!(provider.call_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    state: Arc<Mutex<MockState>>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            state: Arc::new(Mutex::new(MockState::default())),
            delay: None,
        }
    }

    /// Sleep for `delay` inside every call, simulating a slow service
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a reply for the next unanswered call
    pub fn push_response(&self, response: impl Into<String>) {
        self.lock().queue.push_back(Scripted::Reply(response.into()));
    }

    /// Queue a failure for the next unanswered call
    pub fn push_error(&self, message: impl Into<String>) {
        self.lock().queue.push_back(Scripted::Fail(message.into()));
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.lock().prompts.len()
    }

    /// Most recent prompt received
    pub fn last_prompt(&self) -> Option<String> {
        self.lock().prompts.last().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        let scripted = {
            let mut state = self.lock();
            state.prompts.push(prompt.to_string());
            state.queue.pop_front()
        };

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        match scripted {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Fail(message)) => Err(LlmError::Other(message)),
            None => Ok(self.default_response.clone()),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
