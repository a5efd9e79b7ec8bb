//! Turns a finished record into remote payloads and reports one aggregate outcome.

mod payload;
mod webhook;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;

use super::crm::CrmGateway;
use super::domain::{ApplicationId, ApplicationRecord};
use super::store::{PrimaryStore, StoredApplication};

pub use payload::{ContactProperties, StoreRow, APPLICATION_SOURCE};
pub use webhook::{SubmissionHook, WebhookClient, WebhookError, WebhookPayload, WEBHOOK_ORIGIN};

/// How the CRM upsert participates in a submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrmSyncPolicy {
    /// Awaited after the store insert; a CRM failure fails the submission.
    Required,
    /// Spawned after the store insert; failures go to the sync-failure sink.
    #[default]
    BestEffort,
    Disabled,
}

impl CrmSyncPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "required" => Some(Self::Required),
            "best_effort" | "besteffort" => Some(Self::BestEffort),
            "disabled" | "off" | "none" => Some(Self::Disabled),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            CrmSyncPolicy::Required => "required",
            CrmSyncPolicy::BestEffort => "best_effort",
            CrmSyncPolicy::Disabled => "disabled",
        }
    }
}

impl fmt::Display for CrmSyncPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Aggregate result reported back to the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<ApplicationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmissionOutcome {
    pub fn succeeded(stored: StoredApplication) -> Self {
        Self {
            success: true,
            application_id: Some(stored.id),
            created_at: stored.created_at,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            application_id: None,
            created_at: None,
            error: Some(error.into()),
        }
    }
}

/// A best-effort CRM sync that did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub application_id: ApplicationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub error: String,
    pub occurred_at: DateTime<Utc>,
}

/// Destination for best-effort sync failures so operators can follow up.
pub trait SyncFailureSink: Send + Sync {
    fn record(&self, failure: SyncFailure);
}

/// Sink that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSyncSink;

impl SyncFailureSink for LoggingSyncSink {
    fn record(&self, failure: SyncFailure) {
        tracing::warn!(
            application_id = %failure.application_id.0,
            error = %failure.error,
            "CRM sync failure recorded"
        );
    }
}

/// Primary-store insert followed by an optional CRM upsert.
#[derive(Clone)]
pub struct SubmissionPipeline {
    store: Arc<dyn PrimaryStore>,
    crm: Option<Arc<dyn CrmGateway>>,
    policy: CrmSyncPolicy,
    failures: Arc<dyn SyncFailureSink>,
    webhook: Option<Arc<dyn SubmissionHook>>,
}

impl SubmissionPipeline {
    /// Pipeline writing to the store only.
    pub fn store_only(store: Arc<dyn PrimaryStore>) -> Self {
        Self {
            store,
            crm: None,
            policy: CrmSyncPolicy::Disabled,
            failures: Arc::new(LoggingSyncSink),
            webhook: None,
        }
    }

    pub fn new(
        store: Arc<dyn PrimaryStore>,
        crm: Option<Arc<dyn CrmGateway>>,
        policy: CrmSyncPolicy,
        failures: Arc<dyn SyncFailureSink>,
    ) -> Self {
        Self {
            store,
            crm,
            policy,
            failures,
            webhook: None,
        }
    }

    /// Also notifies `hook` in the background after each stored application.
    pub fn with_webhook(mut self, hook: Arc<dyn SubmissionHook>) -> Self {
        self.webhook = Some(hook);
        self
    }

    /// Effective policy; without a CRM client nothing is synced.
    pub fn policy(&self) -> CrmSyncPolicy {
        match self.crm {
            Some(_) => self.policy,
            None => CrmSyncPolicy::Disabled,
        }
    }

    /// Sends the record. Never retries and never deduplicates: each call inserts a row.
    pub async fn submit(&self, record: &ApplicationRecord) -> SubmissionOutcome {
        let (outcome, _sync) = self.dispatch(record).await;
        outcome
    }

    /// Like [`submit`](Self::submit) but also returns the handle of the
    /// background work (best-effort sync, webhook), if any was started.
    pub async fn dispatch(
        &self,
        record: &ApplicationRecord,
    ) -> (SubmissionOutcome, Option<JoinHandle<()>>) {
        let submitted_at = Utc::now();
        let row = StoreRow::from_record(record, submitted_at);

        let stored = match self.store.insert(row).await {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(error = %err, "primary store insert failed");
                return (SubmissionOutcome::failed(err.to_string()), None);
            }
        };
        tracing::info!(application_id = %stored.id.0, "application stored");

        let properties = ContactProperties::from_record(record, Some(&stored.id), submitted_at);
        let mut background_crm = None;

        match (self.crm.as_ref(), self.policy) {
            (None, _) | (Some(_), CrmSyncPolicy::Disabled) => {}
            (Some(crm), CrmSyncPolicy::Required) => {
                match crm.upsert_contact(&properties).await {
                    Ok(contact) => {
                        tracing::info!(contact_id = %contact.0, "CRM contact synced");
                    }
                    Err(err) => {
                        tracing::warn!(
                            application_id = %stored.id.0,
                            error = %err,
                            "CRM sync failed"
                        );
                        return (SubmissionOutcome::failed(err.to_string()), None);
                    }
                }
            }
            (Some(crm), CrmSyncPolicy::BestEffort) => background_crm = Some(Arc::clone(crm)),
        }

        let webhook = self
            .webhook
            .as_ref()
            .map(|hook| (Arc::clone(hook), WebhookPayload::from_record(record, submitted_at)));
        if background_crm.is_none() && webhook.is_none() {
            return (SubmissionOutcome::succeeded(stored), None);
        }

        let failures = Arc::clone(&self.failures);
        let application_id = stored.id.clone();
        let handle = tokio::spawn(async move {
            if let Some((hook, payload)) = webhook {
                if let Err(err) = hook.notify(&payload).await {
                    tracing::warn!(
                        application_id = %application_id.0,
                        error = %err,
                        "submission webhook failed"
                    );
                }
            }

            let Some(crm) = background_crm else {
                return;
            };
            match crm.upsert_contact(&properties).await {
                Ok(contact) => {
                    tracing::info!(contact_id = %contact.0, "CRM contact synced");
                }
                Err(err) => {
                    tracing::warn!(
                        application_id = %application_id.0,
                        error = %err,
                        "best-effort CRM sync failed"
                    );
                    failures.record(SyncFailure {
                        application_id,
                        email: properties.email().map(str::to_string),
                        error: err.to_string(),
                        occurred_at: Utc::now(),
                    });
                }
            }
        });
        (SubmissionOutcome::succeeded(stored), Some(handle))
    }
}
