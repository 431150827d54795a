//! Claimchart Storage Layer
//!
//! Implements the `ChartRepository` trait with two interchangeable backends.
//!
//! # Backends
//!
//! - `MemoryStore`: charts held in a map, for tests and throwaway sessions
//! - `SqliteStore`: durable storage, one row per chart and one per element
//!
//! Both backends write charts wholesale, so a saved chart is always a
//! consistent value.
//!
//! # Examples
//!
//! ```
//! use claimchart_domain::traits::ChartRepository;
//! use claimchart_domain::Chart;
//! use claimchart_store::SqliteStore;
//!
//! let mut store = SqliteStore::new(":memory:").unwrap();
//! let chart = Chart::new("Demo", Vec::new(), 0);
//! store.save_chart(&chart).unwrap();
//! assert!(store.get_chart(chart.id).unwrap().is_some());
//! store.close().unwrap();
//! ```

#![warn(missing_docs)]

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON column could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Chart not found
    #[error("Chart not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Store used after `close`
    #[error("Store is closed")]
    Closed,
}
