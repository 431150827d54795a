//! Configuration for the Refiner

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Refiner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinerConfig {
    /// Characters of each reference document sent as refinement context
    pub reference_doc_char_budget: usize,

    /// Characters of document text sent for element extraction
    pub extraction_char_budget: usize,

    /// Trimmed document text shorter than this is rejected before any AI call
    pub min_document_chars: usize,

    /// Maximum time for a single AI call (seconds)
    pub llm_timeout_secs: u64,

    /// Bracket spans tried by the longest-block parse fallback
    pub max_parse_candidates: usize,

    /// Tokens per side above which diffs degrade to whole-text replacement
    pub max_diff_tokens: usize,
}

impl RefinerConfig {
    /// Get the AI call timeout as a Duration
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.reference_doc_char_budget == 0 {
            return Err("reference_doc_char_budget must be greater than 0".to_string());
        }
        if self.extraction_char_budget == 0 {
            return Err("extraction_char_budget must be greater than 0".to_string());
        }
        if self.min_document_chars > self.extraction_char_budget {
            return Err("min_document_chars cannot exceed extraction_char_budget".to_string());
        }
        if self.llm_timeout_secs == 0 {
            return Err("llm_timeout_secs must be greater than 0".to_string());
        }
        if self.max_parse_candidates == 0 {
            return Err("max_parse_candidates must be greater than 0".to_string());
        }
        if self.max_diff_tokens == 0 {
            return Err("max_diff_tokens must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for RefinerConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            reference_doc_char_budget: 8_000,
            extraction_char_budget: 12_000,
            min_document_chars: 20,
            llm_timeout_secs: 120,
            max_parse_candidates: 256,
            max_diff_tokens: 2_000,
        }
    }
}

impl RefinerConfig {
    /// Aggressive preset: smaller context, shorter timeout
    pub fn aggressive() -> Self {
        Self {
            reference_doc_char_budget: 4_000,
            extraction_char_budget: 8_000,
            min_document_chars: 20,
            llm_timeout_secs: 60,
            max_parse_candidates: 64,
            max_diff_tokens: 1_000,
        }
    }

    /// Lenient preset: larger context, longer timeout
    pub fn lenient() -> Self {
        Self {
            reference_doc_char_budget: 16_000,
            extraction_char_budget: 24_000,
            min_document_chars: 20,
            llm_timeout_secs: 300,
            max_parse_candidates: 1_024,
            max_diff_tokens: 5_000,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
