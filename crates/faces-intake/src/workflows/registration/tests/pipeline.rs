use std::sync::Arc;

use super::common::*;
use crate::workflows::registration::crm::CrmGateway;
use crate::workflows::registration::domain::Gender;
use crate::workflows::registration::submission::{
    CrmSyncPolicy, SubmissionHook, SubmissionPipeline, WEBHOOK_ORIGIN,
};

#[tokio::test]
async fn submitting_twice_creates_two_rows() {
    let store = Arc::new(MemoryStore::default());
    let pipeline = SubmissionPipeline::store_only(store.clone());
    let record = complete_record();

    let first = pipeline.submit(&record).await;
    let second = pipeline.submit(&record).await;

    assert!(first.success && second.success);
    assert_ne!(first.application_id, second.application_id);
    let rows = store.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].email, rows[1].email);
}

#[tokio::test]
async fn store_failure_skips_crm() {
    let crm = Arc::new(MemoryCrm::default());
    let pipeline = pipeline_with(
        Arc::new(UnavailableStore),
        Some(crm.clone() as Arc<dyn CrmGateway>),
        CrmSyncPolicy::Required,
        Arc::new(MemorySyncFailures::default()),
    );

    let outcome = pipeline.submit(&complete_record()).await;

    assert!(!outcome.success);
    assert_eq!(outcome.application_id, None);
    assert!(crm.contacts().is_empty());
}

#[tokio::test]
async fn required_sync_sends_store_id_to_crm() {
    let store = Arc::new(MemoryStore::default());
    let crm = Arc::new(MemoryCrm::default());
    let pipeline = pipeline_with(
        store.clone(),
        Some(crm.clone() as Arc<dyn CrmGateway>),
        CrmSyncPolicy::Required,
        Arc::new(MemorySyncFailures::default()),
    );

    let outcome = pipeline.submit(&complete_record()).await;

    assert!(outcome.success);
    let contacts = crm.contacts();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].get("faces_supabase_id"), Some("row-1"));
    assert_eq!(contacts[0].email(), Some("maya@example.com"));
    assert_eq!(
        contacts[0].get("faces_application_source"),
        Some("registration_wizard")
    );
}

#[tokio::test]
async fn required_sync_failure_fails_submission() {
    let store = Arc::new(MemoryStore::default());
    let pipeline = pipeline_with(
        store.clone(),
        Some(Arc::new(MemoryCrm::failing()) as Arc<dyn CrmGateway>),
        CrmSyncPolicy::Required,
        Arc::new(MemorySyncFailures::default()),
    );

    let outcome = pipeline.submit(&complete_record()).await;

    assert!(!outcome.success);
    assert_eq!(
        outcome.error.as_deref(),
        Some("CRM request failed (401): Authentication credentials not found")
    );
    assert_eq!(store.rows().len(), 1, "store row is written before the CRM call");
}

#[tokio::test]
async fn best_effort_failure_is_recorded_not_returned() {
    let failures = Arc::new(MemorySyncFailures::default());
    let pipeline = pipeline_with(
        Arc::new(MemoryStore::default()),
        Some(Arc::new(MemoryCrm::failing()) as Arc<dyn CrmGateway>),
        CrmSyncPolicy::BestEffort,
        failures.clone(),
    );

    let (outcome, sync) = pipeline.dispatch(&complete_record()).await;
    assert!(outcome.success);
    sync.expect("sync task spawned").await.expect("sync task completes");

    let recorded = failures.failures();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].application_id.0, "row-1");
    assert_eq!(recorded[0].email.as_deref(), Some("maya@example.com"));
    assert!(recorded[0].error.contains("401"));
}

#[tokio::test]
async fn best_effort_success_syncs_in_background() {
    let crm = Arc::new(MemoryCrm::default());
    let failures = Arc::new(MemorySyncFailures::default());
    let pipeline = pipeline_with(
        Arc::new(MemoryStore::default()),
        Some(crm.clone() as Arc<dyn CrmGateway>),
        CrmSyncPolicy::BestEffort,
        failures.clone(),
    );

    let (outcome, sync) = pipeline.dispatch(&complete_record()).await;
    sync.expect("sync task spawned").await.expect("sync task completes");

    assert!(outcome.success);
    assert_eq!(crm.contacts().len(), 1);
    assert!(failures.failures().is_empty());
}

#[tokio::test]
async fn disabled_sync_never_calls_crm() {
    let crm = Arc::new(MemoryCrm::default());
    let pipeline = pipeline_with(
        Arc::new(MemoryStore::default()),
        Some(crm.clone() as Arc<dyn CrmGateway>),
        CrmSyncPolicy::Disabled,
        Arc::new(MemorySyncFailures::default()),
    );

    let (outcome, sync) = pipeline.dispatch(&complete_record()).await;

    assert!(outcome.success);
    assert!(sync.is_none());
    assert!(crm.contacts().is_empty());
}

#[test]
fn policy_without_crm_is_disabled() {
    let pipeline = pipeline_with(
        Arc::new(MemoryStore::default()),
        None,
        CrmSyncPolicy::Required,
        Arc::new(MemorySyncFailures::default()),
    );
    assert_eq!(pipeline.policy(), CrmSyncPolicy::Disabled);
}

#[test]
fn sync_policy_parses_env_spellings() {
    assert_eq!(CrmSyncPolicy::parse("best-effort"), Some(CrmSyncPolicy::BestEffort));
    assert_eq!(CrmSyncPolicy::parse(" REQUIRED "), Some(CrmSyncPolicy::Required));
    assert_eq!(CrmSyncPolicy::parse("off"), Some(CrmSyncPolicy::Disabled));
    assert_eq!(CrmSyncPolicy::parse("maybe"), None);
}

#[tokio::test]
async fn webhook_receives_flat_summary_after_store() {
    let hook = Arc::new(MemoryHook::default());
    let pipeline = SubmissionPipeline::store_only(Arc::new(MemoryStore::default()))
        .with_webhook(hook.clone() as Arc<dyn SubmissionHook>);

    let (outcome, background) = pipeline.dispatch(&complete_record()).await;
    background
        .expect("webhook task spawned")
        .await
        .expect("webhook task completes");

    assert!(outcome.success);
    let payloads = hook.payloads();
    assert_eq!(payloads.len(), 1);
    let payload = &payloads[0];
    assert_eq!(payload.triggered_from, WEBHOOK_ORIGIN);
    assert_eq!(payload.gender, Gender::Female.label());
    assert_eq!(payload.first_name, "Maya");
    assert_eq!(payload.email, "maya@example.com");
    assert_eq!(payload.area, "Hamra");
    assert_eq!(payload.languages, vec!["Arabic", "English"]);
    assert!(!payload.has_passport);
    assert_eq!(payload.has_car, "");
}

#[tokio::test]
async fn webhook_failure_keeps_submission_and_crm_sync() {
    let hook = Arc::new(MemoryHook::failing());
    let crm = Arc::new(MemoryCrm::default());
    let failures = Arc::new(MemorySyncFailures::default());
    let pipeline = pipeline_with(
        Arc::new(MemoryStore::default()),
        Some(crm.clone() as Arc<dyn CrmGateway>),
        CrmSyncPolicy::BestEffort,
        failures.clone(),
    )
    .with_webhook(hook.clone() as Arc<dyn SubmissionHook>);

    let (outcome, background) = pipeline.dispatch(&complete_record()).await;
    background
        .expect("background task spawned")
        .await
        .expect("background task completes");

    assert!(outcome.success);
    assert_eq!(hook.payloads().len(), 1);
    assert_eq!(crm.contacts().len(), 1);
    assert!(failures.failures().is_empty());
}

#[tokio::test]
async fn store_failure_skips_webhook() {
    let hook = Arc::new(MemoryHook::default());
    let pipeline = SubmissionPipeline::store_only(Arc::new(UnavailableStore))
        .with_webhook(hook.clone() as Arc<dyn SubmissionHook>);

    let (outcome, background) = pipeline.dispatch(&complete_record()).await;

    assert!(!outcome.success);
    assert!(background.is_none());
    assert!(hook.payloads().is_empty());
}
