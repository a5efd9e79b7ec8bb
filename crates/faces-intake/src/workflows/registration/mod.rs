//! Multi-step candidate registration wizard and its submission pipeline.

pub mod crm;
pub mod domain;
pub mod locations;
pub mod router;
pub mod service;
pub mod steps;
pub mod store;
pub mod submission;
pub mod validation;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use crm::{
    crm_proxy_router, ContactApi, ContactId, CrmError, CrmGateway, CrmProxy, CrmProxyClient,
    CrmReply, CrmRequest, HubSpotClient, ProxyRequest,
};
pub use domain::{
    Answer, ApplicationId, ApplicationRecord, FieldUpdate, Flag, Gender, LocationLevel,
    MediaHandle, MediaSlot, PhoneField, RatedSelection, SelectionList, TextField,
};
pub use locations::{CatalogError, LocationCatalog, LocationMismatch};
pub use router::registration_router;
pub use service::{
    RegistrationService, RegistrationServiceError, SessionId, SessionPolicy, SessionView,
};
pub use steps::{StepDescriptor, StepKind, StepRegistry};
pub use store::{PrimaryStore, RestStore, StoreError, StoredApplication};
pub use submission::{
    ContactProperties, CrmSyncPolicy, LoggingSyncSink, StoreRow, SubmissionHook,
    SubmissionOutcome, SubmissionPipeline, SyncFailure, SyncFailureSink, WebhookClient,
    WebhookError, WebhookPayload,
};
pub use validation::{validate_step, Validation, ValidationContext};
pub use wizard::{WizardController, WizardError, WizardState, WizardView};
