use crate::dashboard::snapshot::DashboardSnapshot;
use crate::error::FetchError;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const FETCH_ERROR_MESSAGE: &str = "Failed to load dashboard data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Mount,
    Manual,
    AfterUpload,
}

#[derive(Debug, Clone)]
pub struct FetchState {
    pub is_loading: bool,
    pub error: Option<String>,
    pub data: Arc<DashboardSnapshot>,
}

/// What `resolve` did with a fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Updated,
    Failed,
    Discarded,
}

/// Holds the dashboard's fetch state. Every fetch gets a sequence number
/// from `begin`; a result is only applied if its number is higher than the
/// last one applied, so a slow stale response cannot overwrite newer data.
#[derive(Debug)]
pub struct DashboardStore {
    state: FetchState,
    issued: u64,
    last_applied: u64,
    in_flight: usize,
    last_trigger: Option<RefreshTrigger>,
}

impl Default for DashboardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardStore {
    pub fn new() -> Self {
        Self {
            state: FetchState {
                is_loading: false,
                error: None,
                data: Arc::new(DashboardSnapshot::placeholder()),
            },
            issued: 0,
            last_applied: 0,
            in_flight: 0,
            last_trigger: None,
        }
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        Arc::clone(&self.state.data)
    }

    pub fn last_trigger(&self) -> Option<RefreshTrigger> {
        self.last_trigger
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Marks a fetch as started and returns its sequence number.
    pub fn begin(&mut self, trigger: RefreshTrigger) -> u64 {
        self.issued += 1;
        self.in_flight += 1;
        self.last_trigger = Some(trigger);
        self.state.is_loading = true;
        debug!("Refresh #{} started ({:?})", self.issued, trigger);
        self.issued
    }

    pub fn resolve(
        &mut self,
        seq: u64,
        result: Result<DashboardSnapshot, FetchError>,
    ) -> Resolution {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.state.is_loading = self.in_flight > 0;

        if seq <= self.last_applied {
            debug!(
                "Discarding refresh #{}: #{} already applied",
                seq, self.last_applied
            );
            return Resolution::Discarded;
        }
        self.last_applied = seq;

        match result {
            Ok(snapshot) => {
                info!("Dashboard data updated (refresh #{})", seq);
                self.state.data = Arc::new(snapshot);
                self.state.error = None;
                Resolution::Updated
            }
            Err(e) => {
                // The last good snapshot stays on screen.
                warn!("Refresh #{} failed: {}", seq, e);
                self.state.error = Some(FETCH_ERROR_MESSAGE.to_string());
                Resolution::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot_with_members(total: u64) -> DashboardSnapshot {
        let mut snapshot = DashboardSnapshot::placeholder();
        snapshot.members.insert("total".to_string(), json!(total));
        snapshot
    }

    #[test]
    fn starts_with_placeholder() {
        let store = DashboardStore::new();
        assert!(!store.state().is_loading);
        assert!(store.state().error.is_none());
        assert_eq!(*store.snapshot(), DashboardSnapshot::placeholder());
    }

    #[test]
    fn success_replaces_snapshot_and_clears_error() {
        let mut store = DashboardStore::new();
        let first = store.begin(RefreshTrigger::Mount);
        store.resolve(first, Err(FetchError::Status(500)));
        assert_eq!(store.state().error.as_deref(), Some(FETCH_ERROR_MESSAGE));

        let second = store.begin(RefreshTrigger::Manual);
        assert!(store.state().is_loading);
        assert_eq!(store.resolve(second, Ok(snapshot_with_members(10))), Resolution::Updated);
        assert!(!store.state().is_loading);
        assert!(store.state().error.is_none());
        assert_eq!(store.snapshot().members["total"], json!(10));
    }

    #[test]
    fn failure_keeps_last_good_snapshot() {
        let mut store = DashboardStore::new();
        let seq = store.begin(RefreshTrigger::Mount);
        store.resolve(seq, Ok(snapshot_with_members(7)));

        let seq = store.begin(RefreshTrigger::Manual);
        assert_eq!(
            store.resolve(seq, Err(FetchError::Transport("refused".to_string()))),
            Resolution::Failed
        );
        assert_eq!(store.snapshot().members["total"], json!(7));
        assert_eq!(store.state().error.as_deref(), Some(FETCH_ERROR_MESSAGE));
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut store = DashboardStore::new();
        let older = store.begin(RefreshTrigger::AfterUpload);
        let newer = store.begin(RefreshTrigger::Manual);

        assert_eq!(store.resolve(newer, Ok(snapshot_with_members(2))), Resolution::Updated);
        assert!(store.state().is_loading);
        assert_eq!(store.resolve(older, Ok(snapshot_with_members(1))), Resolution::Discarded);

        assert!(!store.state().is_loading);
        assert_eq!(store.snapshot().members["total"], json!(2));
    }

    #[test]
    fn in_order_responses_both_apply() {
        let mut store = DashboardStore::new();
        let first = store.begin(RefreshTrigger::Mount);
        let second = store.begin(RefreshTrigger::Manual);

        assert_eq!(store.resolve(first, Ok(snapshot_with_members(1))), Resolution::Updated);
        assert_eq!(store.resolve(second, Ok(snapshot_with_members(2))), Resolution::Updated);
        assert_eq!(store.snapshot().members["total"], json!(2));
        assert_eq!(store.last_trigger(), Some(RefreshTrigger::Manual));
    }
}
