use chrono::{Local, NaiveDate};
use clap::Args;
use faces_intake::error::AppError;
use faces_intake::workflows::registration::{
    validate_step, ApplicationRecord, LocationCatalog, StepKind, StepRegistry, Validation,
    ValidationContext,
};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct CheckArgs {
    /// Application record JSON, as stored by a wizard session
    pub(crate) path: PathBuf,
    /// Date used for the age rule (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Location catalog JSON replacing the bundled one
    #[arg(long)]
    pub(crate) locations: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StepCheck {
    pub(crate) kind: StepKind,
    pub(crate) mandatory: bool,
    pub(crate) validation: Validation,
}

pub(crate) fn check_record(
    record: &ApplicationRecord,
    registry: &StepRegistry,
    catalog: &LocationCatalog,
    today: NaiveDate,
) -> Vec<StepCheck> {
    let context = ValidationContext::new(today, catalog);
    registry
        .iter()
        .map(|step| StepCheck {
            kind: step.kind,
            mandatory: step.mandatory,
            validation: validate_step(step, record, &context),
        })
        .collect()
}

pub(crate) fn run_check(args: CheckArgs) -> Result<(), AppError> {
    let CheckArgs {
        path,
        today,
        locations,
    } = args;

    let raw = std::fs::read_to_string(&path)?;
    let record: ApplicationRecord = serde_json::from_str(&raw)?;
    let catalog = match locations {
        Some(path) => LocationCatalog::from_path(path)?,
        None => LocationCatalog::lebanon(),
    };
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    let checks = check_record(&record, &StepRegistry::standard(), &catalog, today);
    println!("Application check for {} (as of {today})", path.display());
    for check in &checks {
        let marker = match (&check.validation, check.mandatory) {
            (_, false) => "-",
            (Validation::Valid, true) => "ok",
            (Validation::Invalid { .. }, true) => "!!",
        };
        match check.validation.reason() {
            Some(reason) => println!("  [{marker}] {}: {reason}", check.kind.label()),
            None => println!("  [{marker}] {}", check.kind.label()),
        }
    }

    let failing = checks
        .iter()
        .filter(|check| !check.validation.is_valid())
        .count();
    if failing == 0 {
        println!("Ready to submit.");
    } else {
        println!("{failing} step(s) need attention before submission.");
    }

    Ok(())
}
