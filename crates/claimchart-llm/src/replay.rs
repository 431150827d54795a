//! Replay provider - serves an AI response saved to disk

use crate::LlmError;
use claimchart_domain::traits::LlmProvider;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Provider that answers every prompt with the contents of a file
///
/// The file is read at call time, so a reviewer can paste a fresh response
/// between calls without rebuilding the provider.
#[derive(Debug, Clone)]
pub struct ReplayProvider {
    path: PathBuf,
}

impl ReplayProvider {
    /// Create a provider backed by `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// File this provider replays
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LlmProvider for ReplayProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        debug!(
            "Replaying {} for prompt of {} chars",
            self.path.display(),
            prompt.len()
        );
        let response = fs::read_to_string(&self.path).map_err(|e| {
            LlmError::Communication(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        if response.trim().is_empty() {
            return Err(LlmError::InvalidResponse(format!(
                "{} is empty",
                self.path.display()
            )));
        }
        Ok(response)
    }

    fn model_name(&self) -> &str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_replays_file_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"noChangeNeeded": true}}"#).unwrap();

        let provider = ReplayProvider::new(file.path());
        assert_eq!(provider.generate("prompt").unwrap(), r#"{"noChangeNeeded": true}"#);
    }

    #[test]
    fn test_missing_file() {
        let provider = ReplayProvider::new("/nonexistent/response.txt");
        assert!(matches!(
            provider.generate("prompt"),
            Err(LlmError::Communication(_))
        ));
    }

    #[test]
    fn test_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let provider = ReplayProvider::new(file.path());
        assert!(matches!(
            provider.generate("prompt"),
            Err(LlmError::InvalidResponse(_))
        ));
    }
}
