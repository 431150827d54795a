//! Opening a review session against the configured database.

use crate::error::{CliError, Result};
use claimchart_domain::ChartId;
use claimchart_llm::ReplayProvider;
use claimchart_refine::{RefinerConfig, Refiner};
use claimchart_store::SqliteStore;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Refiner over the SQLite store, answering AI calls from a saved reply.
pub type Session = Refiner<ReplayProvider, SqliteStore>;

/// Open a session on `db`.
///
/// Commands that never call the AI pass no `response`; a call made anyway
/// fails with a read error and is reported as a failed refinement.
pub fn open(db: &Path, response: Option<&Path>, config: RefinerConfig) -> Result<Session> {
    if let Some(parent) = db.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    debug!("Opening database {}", db.display());

    let store = SqliteStore::new(db)?;
    let provider = ReplayProvider::new(response.map(Path::to_path_buf).unwrap_or_else(PathBuf::new));
    Ok(Refiner::new(provider, store, config)?)
}

/// Parse a chart id argument.
pub fn parse_chart_id(value: &str) -> Result<ChartId> {
    ChartId::from_string(value.trim())
        .map_err(|e| CliError::InvalidInput(format!("Invalid chart ID '{}': {}", value, e)))
}

/// Name for a document read from `path` when none was given.
pub fn file_label(path: &Path, explicit: Option<&str>) -> String {
    match explicit {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
    }
}
