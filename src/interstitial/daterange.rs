//! Generic `EXT-X-DATERANGE` bookkeeping: open, close, remove, by stable id
//! (spec §4.9).

use crate::manifest::model::DateRange;
use std::sync::Arc;
use tokio::sync::Mutex;

struct State {
    ranges: Vec<DateRange>,
}

/// Actor-style handle; cloning shares the same underlying set of ranges.
/// Invariants: ids are unique, insertion order is preserved.
#[derive(Clone)]
pub struct DateRangeManager {
    state: Arc<Mutex<State>>,
}

impl DateRangeManager {
    pub fn new() -> Self {
        Self { state: Arc::new(Mutex::new(State { ranges: Vec::new() })) }
    }

    /// Creates a range. Returns `false` without modifying anything if `id`
    /// is already in use.
    pub async fn open(
        &self,
        id: impl Into<String>,
        start_date: impl Into<String>,
        class: Option<String>,
        planned_duration: Option<f64>,
        custom_attrs: Vec<(String, String)>,
    ) -> bool {
        self.open_with_scte35(id, start_date, class, planned_duration, custom_attrs, None, None, None).await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn open_with_scte35(
        &self,
        id: impl Into<String>,
        start_date: impl Into<String>,
        class: Option<String>,
        planned_duration: Option<f64>,
        custom_attrs: Vec<(String, String)>,
        scte35_cmd: Option<String>,
        scte35_out: Option<String>,
        scte35_in: Option<String>,
    ) -> bool {
        let mut state = self.state.lock().await;
        let id = id.into();
        if state.ranges.iter().any(|r| r.id == id) {
            return false;
        }
        state.ranges.push(DateRange {
            id,
            class,
            start_date: start_date.into(),
            end_date: None,
            duration: None,
            planned_duration,
            scte35_cmd,
            scte35_out,
            scte35_in,
            end_on_next: false,
            custom_attributes: custom_attrs,
        });
        true
    }

    /// Fixes `DURATION` from `end_date - start_date` and records `end_date`.
    /// Returns `false` if `id` is unknown.
    pub async fn close(&self, id: &str, end_date: impl Into<String>, duration: Option<f64>) -> bool {
        let mut state = self.state.lock().await;
        match state.ranges.iter_mut().find(|r| r.id == id) {
            Some(range) => {
                range.end_date = Some(end_date.into());
                range.duration = duration;
                true
            }
            None => false,
        }
    }

    /// Returns `false` if `id` is unknown.
    pub async fn remove(&self, id: &str) -> bool {
        let mut state = self.state.lock().await;
        let before = state.ranges.len();
        state.ranges.retain(|r| r.id != id);
        state.ranges.len() != before
    }

    pub async fn get(&self, id: &str) -> Option<DateRange> {
        self.state.lock().await.ranges.iter().find(|r| r.id == id).cloned()
    }

    pub async fn all(&self) -> Vec<DateRange> {
        self.state.lock().await.ranges.clone()
    }
}

impl Default for DateRangeManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_rejects_duplicate_ids() {
        let manager = DateRangeManager::new();
        assert!(manager.open("ad-1", "2026-01-01T00:00:00Z", None, None, Vec::new()).await);
        assert!(!manager.open("ad-1", "2026-01-01T00:00:05Z", None, None, Vec::new()).await);
    }

    #[tokio::test]
    async fn close_sets_end_date_and_duration() {
        let manager = DateRangeManager::new();
        manager.open("ad-1", "2026-01-01T00:00:00Z", None, None, Vec::new()).await;
        assert!(manager.close("ad-1", "2026-01-01T00:00:30Z", Some(30.0)).await);
        let range = manager.get("ad-1").await.unwrap();
        assert_eq!(range.duration, Some(30.0));
    }

    #[tokio::test]
    async fn preserves_insertion_order() {
        let manager = DateRangeManager::new();
        manager.open("a", "t0", None, None, Vec::new()).await;
        manager.open("b", "t1", None, None, Vec::new()).await;
        let all = manager.all().await;
        assert_eq!(all.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
