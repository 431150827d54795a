//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{Chart, ChartId, ChartSummary, ClaimElement};

/// Trait for storing and retrieving charts
///
/// Implemented by the infrastructure layer (claimchart-store). Charts are
/// always written wholesale: callers build a replacement value and save it.
pub trait ChartRepository {
    /// Error type for store operations
    type Error;

    /// Prepare the backend (schema creation, connection checks)
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Insert a chart or replace the stored chart with the same id
    fn save_chart(&mut self, chart: &Chart) -> Result<(), Self::Error>;

    /// Get a chart by ID
    fn get_chart(&self, id: ChartId) -> Result<Option<Chart>, Self::Error>;

    /// List stored charts, oldest first
    fn list_charts(&self) -> Result<Vec<ChartSummary>, Self::Error>;

    /// Delete a chart and its elements, returning whether it existed
    fn delete_chart(&mut self, id: ChartId) -> Result<bool, Self::Error>;

    /// Replace a single element of a stored chart
    ///
    /// Returns the updated chart, or `None` when either the chart or the
    /// element id is unknown.
    fn replace_element(
        &mut self,
        chart_id: ChartId,
        element: ClaimElement,
        now: u64,
    ) -> Result<Option<Chart>, Self::Error> {
        let Some(chart) = self.get_chart(chart_id)? else {
            return Ok(None);
        };
        let Some(next) = chart.with_element(element, now) else {
            return Ok(None);
        };
        self.save_chart(&next)?;
        Ok(Some(next))
    }

    /// Release backend resources
    fn close(&mut self) -> Result<(), Self::Error>;
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (claimchart-llm)
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Generate text completion
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Name of the model behind this provider
    fn model_name(&self) -> &str {
        "llm"
    }
}
