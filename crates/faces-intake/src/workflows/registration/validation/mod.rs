mod rules;

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::ApplicationRecord;
use super::locations::LocationCatalog;
use super::steps::{StepDescriptor, StepKind};

pub use rules::{age_on, MAX_AGE, MAX_NAME_LENGTH, MAX_PHONE_LENGTH, MIN_AGE};

/// Result of checking one step; only the first violated rule is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid { reason: String },
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Validation::Valid => None,
            Validation::Invalid { reason } => Some(reason),
        }
    }

    /// Wire shape: `{valid: true}` or `{valid: false, reason}`.
    pub fn view(&self) -> ValidationView<'_> {
        ValidationView {
            valid: self.is_valid(),
            reason: self.reason(),
        }
    }
}

impl From<Result<(), String>> for Validation {
    fn from(result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Validation::Valid,
            Err(reason) => Validation::Invalid { reason },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationView<'a> {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
}

/// Inputs a validator needs beyond the record itself.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub today: NaiveDate,
    pub catalog: &'a LocationCatalog,
}

impl<'a> ValidationContext<'a> {
    pub fn new(today: NaiveDate, catalog: &'a LocationCatalog) -> Self {
        Self { today, catalog }
    }
}

/// Validates `record` for `step`. Non-mandatory steps always pass.
pub fn validate_step(
    step: &StepDescriptor,
    record: &ApplicationRecord,
    context: &ValidationContext<'_>,
) -> Validation {
    if !step.mandatory {
        return Validation::Valid;
    }
    check_kind(step.kind, record, context)
}

/// Runs the rules for `kind` regardless of whether the step is mandatory.
pub fn check_kind(
    kind: StepKind,
    record: &ApplicationRecord,
    context: &ValidationContext<'_>,
) -> Validation {
    let outcome = match kind {
        StepKind::Welcome => rules::welcome(record),
        StepKind::Identity => rules::identity(record, context.today),
        StepKind::Contact => rules::contact(record),
        StepKind::Address => rules::address(record, context.catalog),
        StepKind::Languages => rules::languages(record),
        StepKind::Appearance => rules::appearance(record),
        StepKind::Measurements => rules::measurements(record),
        StepKind::Talents | StepKind::Availability | StepKind::Photos | StepKind::Review => {
            Ok(())
        }
    };
    Validation::from(outcome)
}
