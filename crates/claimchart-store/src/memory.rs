//! In-memory chart repository

use crate::StoreError;
use claimchart_domain::traits::ChartRepository;
use claimchart_domain::{Chart, ChartId, ChartSummary};
use std::collections::BTreeMap;

/// Chart repository backed by a map
///
/// Keys are UUIDv7 chart ids, so iteration order follows creation order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    charts: BTreeMap<ChartId, Chart>,
    closed: bool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

impl ChartRepository for MemoryStore {
    type Error = StoreError;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.closed = false;
        Ok(())
    }

    fn save_chart(&mut self, chart: &Chart) -> Result<(), Self::Error> {
        self.ensure_open()?;
        self.charts.insert(chart.id, chart.clone());
        Ok(())
    }

    fn get_chart(&self, id: ChartId) -> Result<Option<Chart>, Self::Error> {
        self.ensure_open()?;
        Ok(self.charts.get(&id).cloned())
    }

    fn list_charts(&self) -> Result<Vec<ChartSummary>, Self::Error> {
        self.ensure_open()?;
        Ok(self.charts.values().map(Chart::summary).collect())
    }

    fn delete_chart(&mut self, id: ChartId) -> Result<bool, Self::Error> {
        self.ensure_open()?;
        Ok(self.charts.remove(&id).is_some())
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        self.charts.clear();
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimchart_domain::{ClaimElement, ElementSeed};

    fn chart(title: &str) -> Chart {
        let element = ClaimElement::from_seed(ElementSeed {
            id: "1.a".to_string(),
            element_text: "element".to_string(),
            evidence_text: "evidence".to_string(),
            reasoning_text: "reasoning".to_string(),
        });
        Chart::new(title, vec![element], 1)
    }

    #[test]
    fn test_save_and_get() {
        let mut store = MemoryStore::new();
        let chart = chart("A");
        store.save_chart(&chart).unwrap();
        assert_eq!(store.get_chart(chart.id).unwrap(), Some(chart));
    }

    #[test]
    fn test_replace_element_via_default_impl() {
        let mut store = MemoryStore::new();
        let chart = chart("A");
        store.save_chart(&chart).unwrap();

        let mut element = chart.elements[0].clone();
        element.reasoning_text = "rewritten".to_string();
        let updated = store.replace_element(chart.id, element, 5).unwrap().unwrap();

        assert_eq!(updated.elements[0].reasoning_text, "rewritten");
        let stored = store.get_chart(chart.id).unwrap().unwrap();
        assert_eq!(stored.elements[0].reasoning_text, "rewritten");
        assert_eq!(stored.updated_at, 5);
    }

    #[test]
    fn test_delete_and_list() {
        let mut store = MemoryStore::new();
        let a = chart("A");
        let b = chart("B");
        store.save_chart(&a).unwrap();
        store.save_chart(&b).unwrap();

        assert_eq!(store.list_charts().unwrap().len(), 2);
        assert!(store.delete_chart(a.id).unwrap());
        assert!(!store.delete_chart(a.id).unwrap());
        assert_eq!(store.list_charts().unwrap()[0].title, "B");
    }

    #[test]
    fn test_closed_store_rejects_operations() {
        let mut store = MemoryStore::new();
        store.close().unwrap();
        assert!(matches!(store.list_charts(), Err(StoreError::Closed)));

        store.init().unwrap();
        assert!(store.list_charts().unwrap().is_empty());
    }
}
