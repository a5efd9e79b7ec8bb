use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use super::domain::{ApplicationId, ApplicationRecord, FieldUpdate, Gender};
use super::locations::LocationCatalog;
use super::steps::{StepDescriptor, StepKind, StepRegistry};
use super::submission::{SubmissionOutcome, SubmissionPipeline};
use super::validation::{validate_step, Validation, ValidationContext};

/// Position of a wizard: a step index, or the terminal submitted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "step", rename_all = "snake_case")]
pub enum WizardState {
    Active(usize),
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("step {0:?} is mandatory and cannot be skipped")]
    NotSkippable(StepKind),
    #[error("applications can only be submitted from the final step")]
    NotAtFinalStep,
    #[error("a submission is already in progress")]
    SubmissionInFlight,
    #[error("this application has already been submitted")]
    AlreadySubmitted,
    #[error("gender is chosen on the welcome step")]
    NotAtWelcome,
}

/// Step sequencing and validation for one candidate.
#[derive(Debug, Clone)]
pub struct WizardController {
    registry: Arc<StepRegistry>,
    catalog: Arc<LocationCatalog>,
    record: ApplicationRecord,
    current_step: usize,
    is_submitting: bool,
    is_submitted: bool,
    application_id: Option<ApplicationId>,
}

impl WizardController {
    pub fn new(registry: Arc<StepRegistry>, catalog: Arc<LocationCatalog>) -> Self {
        Self {
            registry,
            catalog,
            record: ApplicationRecord::default(),
            current_step: 0,
            is_submitting: false,
            is_submitted: false,
            application_id: None,
        }
    }

    pub fn record(&self) -> &ApplicationRecord {
        &self.record
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn current_descriptor(&self) -> Option<&StepDescriptor> {
        self.registry.get(self.current_step)
    }

    pub fn state(&self) -> WizardState {
        if self.is_submitted {
            WizardState::Submitted
        } else {
            WizardState::Active(self.current_step)
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn is_submitted(&self) -> bool {
        self.is_submitted
    }

    pub fn application_id(&self) -> Option<&ApplicationId> {
        self.application_id.as_ref()
    }

    fn ensure_editable(&self) -> Result<(), WizardError> {
        if self.is_submitted {
            return Err(WizardError::AlreadySubmitted);
        }
        if self.is_submitting {
            return Err(WizardError::SubmissionInFlight);
        }
        Ok(())
    }

    /// Merges one field without validating it.
    pub fn update_field(&mut self, update: FieldUpdate) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.record.apply(update);
        Ok(())
    }

    /// Welcome-screen shortcut: records the gender and moves to the next step.
    pub fn select_gender(&mut self, gender: Gender) -> Result<(), WizardError> {
        self.ensure_editable()?;
        if self.current_step != 0 {
            return Err(WizardError::NotAtWelcome);
        }
        self.record.apply(FieldUpdate::Gender { value: gender });
        self.current_step = 1.min(self.registry.last_index());
        Ok(())
    }

    /// Validates the current step against today's date and advances on success.
    pub fn advance(&mut self) -> Result<Validation, WizardError> {
        self.advance_on(Local::now().date_naive())
    }

    pub fn advance_on(&mut self, today: NaiveDate) -> Result<Validation, WizardError> {
        self.ensure_editable()?;
        let validation = self.validate_current_on(today);
        if validation.is_valid() {
            self.current_step = (self.current_step + 1).min(self.registry.last_index());
        } else {
            tracing::debug!(
                step = self.current_step,
                reason = validation.reason().unwrap_or_default(),
                "step validation failed"
            );
        }
        Ok(validation)
    }

    /// Checks the current step without moving.
    pub fn validate_current_on(&self, today: NaiveDate) -> Validation {
        match self.registry.get(self.current_step) {
            Some(step) => {
                let context = ValidationContext::new(today, &self.catalog);
                validate_step(step, &self.record, &context)
            }
            None => Validation::Valid,
        }
    }

    pub fn retreat(&mut self) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.current_step = self.current_step.saturating_sub(1);
        Ok(())
    }

    /// Moves past a non-mandatory step without running its validator.
    pub fn skip(&mut self) -> Result<(), WizardError> {
        self.ensure_editable()?;
        if let Some(step) = self.registry.get(self.current_step) {
            if step.mandatory {
                return Err(WizardError::NotSkippable(step.kind));
            }
        }
        self.current_step = (self.current_step + 1).min(self.registry.last_index());
        Ok(())
    }

    /// Marks the submission in flight and hands back the record to send.
    pub fn begin_submission(&mut self) -> Result<ApplicationRecord, WizardError> {
        self.ensure_editable()?;
        if self.current_step != self.registry.last_index() {
            return Err(WizardError::NotAtFinalStep);
        }
        self.is_submitting = true;
        Ok(self.record.clone())
    }

    /// Records the pipeline result; success is terminal, failure allows a retry.
    pub fn finish_submission(&mut self, outcome: &SubmissionOutcome) {
        self.is_submitting = false;
        if outcome.success {
            self.is_submitted = true;
            self.application_id = outcome.application_id.clone();
        }
    }

    pub async fn submit(
        &mut self,
        pipeline: &SubmissionPipeline,
    ) -> Result<SubmissionOutcome, WizardError> {
        let record = self.begin_submission()?;
        let outcome = pipeline.submit(&record).await;
        self.finish_submission(&outcome);
        Ok(outcome)
    }

    pub fn view(&self) -> WizardView {
        let step = self.current_descriptor();
        WizardView {
            state: self.state(),
            current_step: self.current_step,
            step_count: self.registry.len(),
            step_kind: step.map(|step| step.kind),
            step_label: step.map(|step| step.kind.label()),
            mandatory: step.map(|step| step.mandatory).unwrap_or(false),
            is_submitting: self.is_submitting,
            is_submitted: self.is_submitted,
            application_id: self.application_id.clone(),
            record: self.record.clone(),
        }
    }
}

/// Snapshot returned to clients after each operation.
#[derive(Debug, Clone, Serialize)]
pub struct WizardView {
    pub state: WizardState,
    pub current_step: usize,
    pub step_count: usize,
    pub step_kind: Option<StepKind>,
    pub step_label: Option<&'static str>,
    pub mandatory: bool,
    pub is_submitting: bool,
    pub is_submitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<ApplicationId>,
    pub record: ApplicationRecord,
}
