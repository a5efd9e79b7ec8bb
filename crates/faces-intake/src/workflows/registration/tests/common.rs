use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;
use tokio::sync::Notify;

use crate::workflows::registration::crm::{ContactId, CrmError, CrmGateway};
use crate::workflows::registration::domain::{
    ApplicationId, ApplicationRecord, FieldUpdate, Gender, LocationLevel, PhoneField,
    SelectionList, TextField,
};
use crate::workflows::registration::locations::LocationCatalog;
use crate::workflows::registration::service::{RegistrationService, SessionId, SessionPolicy};
use crate::workflows::registration::steps::StepRegistry;
use crate::workflows::registration::store::{PrimaryStore, StoreError, StoredApplication};
use crate::workflows::registration::submission::{
    ContactProperties, CrmSyncPolicy, StoreRow, SubmissionHook, SubmissionPipeline, SyncFailure,
    SyncFailureSink, WebhookError, WebhookPayload,
};
use crate::workflows::registration::validation::ValidationContext;
use crate::workflows::registration::wizard::WizardController;

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date")
}

pub(super) fn registry() -> Arc<StepRegistry> {
    Arc::new(StepRegistry::standard())
}

pub(super) fn catalog() -> Arc<LocationCatalog> {
    Arc::new(LocationCatalog::lebanon())
}

pub(super) fn context(catalog: &LocationCatalog) -> ValidationContext<'_> {
    ValidationContext::new(today(), catalog)
}

pub(super) fn controller() -> WizardController {
    WizardController::new(registry(), catalog())
}

fn text(field: TextField, value: &str) -> FieldUpdate {
    FieldUpdate::Text {
        field,
        value: value.to_string(),
    }
}

fn phone(field: PhoneField, value: &str) -> FieldUpdate {
    FieldUpdate::PhoneNumber {
        field,
        value: value.to_string(),
    }
}

fn location(level: LocationLevel, value: &str) -> FieldUpdate {
    FieldUpdate::Location {
        level,
        value: value.to_string(),
    }
}

pub(super) fn identity_updates() -> Vec<FieldUpdate> {
    vec![
        text(TextField::FirstName, "Maya"),
        text(TextField::MiddleName, "Rose"),
        text(TextField::LastName, "Haddad"),
        text(TextField::DateOfBirth, "1998-04-12"),
        text(TextField::Nationality, "Lebanese"),
    ]
}

pub(super) fn contact_updates() -> Vec<FieldUpdate> {
    vec![
        phone(PhoneField::Mobile, "70123456"),
        phone(PhoneField::Whatsapp, "70123456"),
        phone(PhoneField::OtherNumber, "(03) 456-789"),
        text(TextField::OtherNumberRelationship, "Mother"),
        text(TextField::OtherNumberPersonName, "Rana Haddad"),
        text(TextField::Email, "maya@example.com"),
    ]
}

pub(super) fn address_updates() -> Vec<FieldUpdate> {
    vec![
        location(LocationLevel::Governorate, "Beirut"),
        location(LocationLevel::District, "Beirut"),
        location(LocationLevel::Area, "Hamra"),
    ]
}

pub(super) fn language_updates() -> Vec<FieldUpdate> {
    vec![FieldUpdate::Selection {
        list: SelectionList::Languages,
        items: vec!["Arabic".to_string(), "English".to_string()],
    }]
}

pub(super) fn appearance_updates() -> Vec<FieldUpdate> {
    vec![
        text(TextField::EyeColor, "Brown"),
        text(TextField::HairColor, "Black"),
        text(TextField::HairType, "Straight"),
        text(TextField::HairLength, "Long"),
        text(TextField::SkinTone, "Medium"),
    ]
}

pub(super) fn measurement_updates() -> Vec<FieldUpdate> {
    vec![
        text(TextField::Height, "168"),
        text(TextField::Weight, "55"),
        text(TextField::PantSize, "M"),
        text(TextField::JacketSize, "S"),
        text(TextField::ShoeSize, "38"),
        text(TextField::Bust, "86"),
        text(TextField::Waist, "64"),
        text(TextField::Hips, "92"),
        text(TextField::Shoulders, "40"),
    ]
}

/// Updates for steps 1..=6, indexed by the step they satisfy.
pub(super) fn mandatory_step_updates() -> Vec<Vec<FieldUpdate>> {
    vec![
        identity_updates(),
        contact_updates(),
        address_updates(),
        language_updates(),
        appearance_updates(),
        measurement_updates(),
    ]
}

pub(super) fn complete_record() -> ApplicationRecord {
    let mut record = ApplicationRecord::default();
    record.apply(FieldUpdate::Gender {
        value: Gender::Female,
    });
    for update in mandatory_step_updates().into_iter().flatten() {
        record.apply(update);
    }
    record
}

/// Walks a fresh controller to the review step, filling each mandatory step.
pub(super) fn controller_at_review() -> WizardController {
    let mut controller = controller();
    controller
        .select_gender(Gender::Female)
        .expect("welcome accepts gender");
    for updates in mandatory_step_updates() {
        for update in updates {
            controller.update_field(update).expect("field updates");
        }
        let validation = controller.advance_on(today()).expect("advance runs");
        assert!(validation.is_valid(), "step rejected: {validation:?}");
    }
    while controller.current_step() < 10 {
        controller.skip().expect("optional step skips");
    }
    controller
}

#[derive(Default)]
pub(super) struct MemoryStore {
    rows: Mutex<Vec<StoreRow>>,
}

impl MemoryStore {
    pub(super) fn rows(&self) -> Vec<StoreRow> {
        self.rows.lock().expect("store mutex poisoned").clone()
    }
}

#[async_trait]
impl PrimaryStore for MemoryStore {
    async fn insert(&self, row: StoreRow) -> Result<StoredApplication, StoreError> {
        let mut rows = self.rows.lock().expect("store mutex poisoned");
        rows.push(row);
        Ok(StoredApplication {
            id: ApplicationId(format!("row-{}", rows.len())),
            created_at: Some("2026-10-19T09:00:00Z".to_string()),
        })
    }
}

/// Store that blocks inside `insert` until released.
#[derive(Default)]
pub(super) struct GatedStore {
    pub(super) entered: Notify,
    pub(super) release: Notify,
    inner: MemoryStore,
}

impl GatedStore {
    pub(super) fn rows(&self) -> Vec<StoreRow> {
        self.inner.rows()
    }
}

#[async_trait]
impl PrimaryStore for GatedStore {
    async fn insert(&self, row: StoreRow) -> Result<StoredApplication, StoreError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.insert(row).await
    }
}

pub(super) struct PanickingStore;

#[async_trait]
impl PrimaryStore for PanickingStore {
    async fn insert(&self, _row: StoreRow) -> Result<StoredApplication, StoreError> {
        panic!("store driver crashed");
    }
}

pub(super) struct UnavailableStore;

#[async_trait]
impl PrimaryStore for UnavailableStore {
    async fn insert(&self, _row: StoreRow) -> Result<StoredApplication, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryCrm {
    contacts: Mutex<Vec<ContactProperties>>,
    fail: bool,
}

impl MemoryCrm {
    pub(super) fn failing() -> Self {
        Self {
            contacts: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub(super) fn contacts(&self) -> Vec<ContactProperties> {
        self.contacts.lock().expect("crm mutex poisoned").clone()
    }
}

#[async_trait]
impl CrmGateway for MemoryCrm {
    async fn upsert_contact(&self, properties: &ContactProperties) -> Result<ContactId, CrmError> {
        if self.fail {
            return Err(CrmError::Api {
                status: 401,
                message: "Authentication credentials not found".to_string(),
            });
        }
        let mut contacts = self.contacts.lock().expect("crm mutex poisoned");
        contacts.push(properties.clone());
        Ok(ContactId(format!("contact-{}", contacts.len())))
    }
}

#[derive(Default)]
pub(super) struct MemorySyncFailures {
    failures: Mutex<Vec<SyncFailure>>,
}

impl MemorySyncFailures {
    pub(super) fn failures(&self) -> Vec<SyncFailure> {
        self.failures.lock().expect("sink mutex poisoned").clone()
    }
}

impl SyncFailureSink for MemorySyncFailures {
    fn record(&self, failure: SyncFailure) {
        self.failures
            .lock()
            .expect("sink mutex poisoned")
            .push(failure);
    }
}

/// Hook that keeps every payload and optionally rejects it.
#[derive(Default)]
pub(super) struct MemoryHook {
    payloads: Mutex<Vec<WebhookPayload>>,
    fail: bool,
}

impl MemoryHook {
    pub(super) fn failing() -> Self {
        Self {
            payloads: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub(super) fn payloads(&self) -> Vec<WebhookPayload> {
        self.payloads.lock().expect("hook mutex poisoned").clone()
    }
}

#[async_trait]
impl SubmissionHook for MemoryHook {
    async fn notify(&self, payload: &WebhookPayload) -> Result<(), WebhookError> {
        self.payloads
            .lock()
            .expect("hook mutex poisoned")
            .push(payload.clone());
        if self.fail {
            return Err(WebhookError::Rejected { status: 503 });
        }
        Ok(())
    }
}

pub(super) fn pipeline_with(
    store: Arc<dyn PrimaryStore>,
    crm: Option<Arc<dyn CrmGateway>>,
    policy: CrmSyncPolicy,
    failures: Arc<MemorySyncFailures>,
) -> SubmissionPipeline {
    SubmissionPipeline::new(store, crm, policy, failures)
}

pub(super) fn service_with_store(store: Arc<dyn PrimaryStore>) -> Arc<RegistrationService> {
    let pipeline = Arc::new(SubmissionPipeline::store_only(store));
    Arc::new(RegistrationService::new(registry(), catalog(), pipeline).with_fixed_date(today()))
}

pub(super) fn service_with_policy(
    store: Arc<dyn PrimaryStore>,
    policy: SessionPolicy,
) -> Arc<RegistrationService> {
    let pipeline = Arc::new(SubmissionPipeline::store_only(store));
    Arc::new(
        RegistrationService::new(registry(), catalog(), pipeline)
            .with_fixed_date(today())
            .with_session_policy(policy),
    )
}

/// Same walk as [`controller_at_review`], through the service API.
pub(super) fn drive_service_to_review(service: &RegistrationService, id: &SessionId) {
    service
        .select_gender(id, Gender::Female)
        .expect("gender selects");
    for updates in mandatory_step_updates() {
        for update in updates {
            service.update_field(id, update).expect("field updates");
        }
        let result = service.advance(id).expect("advance runs");
        assert!(result.validation.is_valid(), "{:?}", result.validation);
    }
    for _ in 0..4 {
        service.skip(id).expect("optional step skips");
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
