use async_trait::async_trait;
use chrono::{NaiveDate, SecondsFormat, Utc};
use faces_intake::workflows::registration::{
    ApplicationId, PrimaryStore, StoreError, StoreRow, StoredApplication, SyncFailure,
    SyncFailureSink,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Most recent sync failures kept for the operator endpoint.
const SYNC_FAILURE_CAPACITY: usize = 200;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) sync_failures: Arc<InMemorySyncFailures>,
}

/// Primary store used when no remote store is configured.
#[derive(Default, Clone)]
pub(crate) struct InMemoryStore {
    rows: Arc<Mutex<Vec<(ApplicationId, StoreRow)>>>,
}

impl InMemoryStore {
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.rows.lock().expect("store mutex poisoned").len()
    }
}

#[async_trait]
impl PrimaryStore for InMemoryStore {
    async fn insert(&self, row: StoreRow) -> Result<StoredApplication, StoreError> {
        let id = ApplicationId(Uuid::new_v4().to_string());
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.rows
            .lock()
            .expect("store mutex poisoned")
            .push((id.clone(), row));
        Ok(StoredApplication {
            id,
            created_at: Some(created_at),
        })
    }
}

#[derive(Default)]
pub(crate) struct InMemorySyncFailures {
    failures: Mutex<VecDeque<SyncFailure>>,
}

impl InMemorySyncFailures {
    /// Newest first.
    pub(crate) fn recent(&self) -> Vec<SyncFailure> {
        let guard = self.failures.lock().expect("sync failure mutex poisoned");
        guard.iter().rev().cloned().collect()
    }
}

impl SyncFailureSink for InMemorySyncFailures {
    fn record(&self, failure: SyncFailure) {
        tracing::warn!(
            application_id = %failure.application_id.0,
            error = %failure.error,
            "CRM sync failed after submission"
        );
        let mut guard = self.failures.lock().expect("sync failure mutex poisoned");
        if guard.len() == SYNC_FAILURE_CAPACITY {
            guard.pop_front();
        }
        guard.push_back(failure);
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
