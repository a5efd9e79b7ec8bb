use super::common::*;
use crate::workflows::registration::domain::{
    Answer, ApplicationRecord, FieldUpdate, Flag, LocationLevel, PhoneField, TextField,
};
use crate::workflows::registration::locations::LocationCatalog;
use crate::workflows::registration::steps::{StepKind, StepRegistry};
use crate::workflows::registration::validation::{check_kind, validate_step, Validation};

fn check(kind: StepKind, record: &ApplicationRecord) -> Validation {
    let catalog = LocationCatalog::lebanon();
    check_kind(kind, record, &context(&catalog))
}

fn reason(kind: StepKind, record: &ApplicationRecord) -> Option<String> {
    check(kind, record).reason().map(str::to_string)
}

fn with(update: FieldUpdate) -> ApplicationRecord {
    let mut record = complete_record();
    record.apply(update);
    record
}

fn with_text(field: TextField, value: &str) -> ApplicationRecord {
    with(FieldUpdate::Text {
        field,
        value: value.to_string(),
    })
}

#[test]
fn complete_record_passes_every_step() {
    let record = complete_record();
    let catalog = LocationCatalog::lebanon();
    let context = context(&catalog);
    for step in StepRegistry::standard().iter() {
        assert_eq!(
            validate_step(step, &record, &context),
            Validation::Valid,
            "{:?} should pass",
            step.kind
        );
    }
}

#[test]
fn empty_record_fails_with_first_violation_only() {
    let record = ApplicationRecord::default();
    assert_eq!(
        reason(StepKind::Welcome, &record).as_deref(),
        Some("Please select a gender")
    );
    assert_eq!(
        reason(StepKind::Identity, &record).as_deref(),
        Some("First name is required")
    );
    assert_eq!(
        reason(StepKind::Contact, &record).as_deref(),
        Some("Mobile number is required")
    );
    assert_eq!(
        reason(StepKind::Address, &record).as_deref(),
        Some("Governorate is required")
    );
    assert_eq!(
        reason(StepKind::Languages, &record).as_deref(),
        Some("Please select at least one language")
    );
    assert_eq!(
        reason(StepKind::Appearance, &record).as_deref(),
        Some("Eye color is required")
    );
    assert_eq!(
        reason(StepKind::Measurements, &record).as_deref(),
        Some("Height is required")
    );
}

#[test]
fn optional_steps_pass_on_an_empty_record() {
    let record = ApplicationRecord::default();
    let catalog = LocationCatalog::lebanon();
    let context = context(&catalog);
    let registry = StepRegistry::standard();
    for step in registry.iter().filter(|step| !step.mandatory) {
        assert!(validate_step(step, &record, &context).is_valid());
    }
}

#[test]
fn names_accept_hyphens_and_apostrophes() {
    let record = with_text(TextField::FirstName, "Jean-Pierre O'Neil");
    assert!(check(StepKind::Identity, &record).is_valid());
}

#[test]
fn names_reject_digits_length_and_blank() {
    assert_eq!(
        reason(StepKind::Identity, &with_text(TextField::FirstName, "John123")).as_deref(),
        Some("First name can only contain letters, spaces, hyphens, and apostrophes")
    );
    assert_eq!(
        reason(
            StepKind::Identity,
            &with_text(TextField::MiddleName, &"a".repeat(51))
        )
        .as_deref(),
        Some("Middle name must be less than 50 characters")
    );
    assert!(check(StepKind::Identity, &with_text(TextField::MiddleName, &"a".repeat(50))).is_valid());
    assert_eq!(
        reason(StepKind::Identity, &with_text(TextField::LastName, "")).as_deref(),
        Some("Last name is required")
    );
}

#[test]
fn age_bounds_are_inclusive() {
    // today() is 2026-10-19
    for dob in ["2010-10-19", "1926-10-19", "1925-10-20"] {
        let record = with_text(TextField::DateOfBirth, dob);
        assert!(check(StepKind::Identity, &record).is_valid(), "{dob} should pass");
    }

    for dob in ["2010-10-20", "1925-10-19"] {
        let record = with_text(TextField::DateOfBirth, dob);
        assert_eq!(
            reason(StepKind::Identity, &record).as_deref(),
            Some("Age must be between 16 and 100 years"),
            "{dob} should fail"
        );
    }
}

#[test]
fn date_of_birth_must_be_iso_formatted() {
    assert_eq!(
        reason(StepKind::Identity, &with_text(TextField::DateOfBirth, "12/04/1998")).as_deref(),
        Some("Date of birth must be a valid date (YYYY-MM-DD)")
    );
    assert_eq!(
        reason(StepKind::Identity, &with_text(TextField::DateOfBirth, "1998-02-30")).as_deref(),
        Some("Date of birth must be a valid date (YYYY-MM-DD)")
    );
    assert_eq!(
        reason(StepKind::Identity, &with_text(TextField::Nationality, "  ")).as_deref(),
        Some("Nationality is required")
    );
}

#[test]
fn contact_checks_phone_format_and_other_number_owner() {
    let record = with(FieldUpdate::PhoneNumber {
        field: PhoneField::Whatsapp,
        value: "70-12x".to_string(),
    });
    assert_eq!(
        reason(StepKind::Contact, &record).as_deref(),
        Some("Invalid phone number format")
    );

    let record = with_text(TextField::OtherNumberRelationship, "");
    assert_eq!(
        reason(StepKind::Contact, &record).as_deref(),
        Some("Please select who the other number belongs to")
    );

    let record = with_text(TextField::OtherNumberPersonName, "");
    assert_eq!(
        reason(StepKind::Contact, &record).as_deref(),
        Some("Name of person is required")
    );
}

#[test]
fn whish_number_required_only_with_account() {
    let mut record = with(FieldUpdate::Flag {
        flag: Flag::HasWhishAccount,
        value: Answer::No,
    });
    assert!(check(StepKind::Contact, &record).is_valid());

    record.apply(FieldUpdate::Flag {
        flag: Flag::HasWhishAccount,
        value: Answer::Yes,
    });
    assert_eq!(
        reason(StepKind::Contact, &record).as_deref(),
        Some("Whish number is required")
    );

    record.apply(FieldUpdate::PhoneNumber {
        field: PhoneField::Whish,
        value: "76 555 123".to_string(),
    });
    assert!(check(StepKind::Contact, &record).is_valid());
}

#[test]
fn address_checks_catalog_consistency() {
    let mut record = complete_record();
    record.apply(FieldUpdate::Location {
        level: LocationLevel::Area,
        value: "Jounieh".to_string(),
    });
    assert_eq!(
        reason(StepKind::Address, &record).as_deref(),
        Some("Area does not belong to the selected district")
    );

    record.apply(FieldUpdate::Location {
        level: LocationLevel::Governorate,
        value: "Mount Lebanon".to_string(),
    });
    assert_eq!(
        reason(StepKind::Address, &record).as_deref(),
        Some("District is required")
    );

    let unrestricted = LocationCatalog::unrestricted();
    let mut custom = complete_record();
    custom.apply(FieldUpdate::Location {
        level: LocationLevel::Governorate,
        value: "Region A".to_string(),
    });
    custom.apply(FieldUpdate::Location {
        level: LocationLevel::District,
        value: "District X".to_string(),
    });
    custom.apply(FieldUpdate::Location {
        level: LocationLevel::Area,
        value: "Area 1".to_string(),
    });
    assert!(check_kind(StepKind::Address, &custom, &context(&unrestricted)).is_valid());
}

#[test]
fn address_accepts_padded_catalog_names() {
    let mut record = ApplicationRecord::default();
    for (level, value) in [
        (LocationLevel::Governorate, " Beirut"),
        (LocationLevel::District, "Beirut "),
        (LocationLevel::Area, "  Hamra  "),
    ] {
        record.apply(FieldUpdate::Location {
            level,
            value: value.to_string(),
        });
    }

    assert_eq!(record.location.governorate(), "Beirut");
    assert_eq!(record.location.area(), "Hamra");
    assert!(check(StepKind::Address, &record).is_valid());
}

#[test]
fn custom_colors_satisfy_appearance() {
    let mut record = with_text(TextField::EyeColor, "");
    assert_eq!(
        reason(StepKind::Appearance, &record).as_deref(),
        Some("Eye color is required")
    );
    record.apply(FieldUpdate::Text {
        field: TextField::CustomEyeColor,
        value: "Amber".to_string(),
    });
    assert!(check(StepKind::Appearance, &record).is_valid());
}

#[test]
fn measurements_report_fields_in_form_order() {
    let mut record = complete_record();
    record.apply(FieldUpdate::Text {
        field: TextField::Shoulders,
        value: String::new(),
    });
    record.apply(FieldUpdate::Text {
        field: TextField::ShoeSize,
        value: String::new(),
    });
    assert_eq!(
        reason(StepKind::Measurements, &record).as_deref(),
        Some("Shoe size is required")
    );
}

#[test]
fn validation_view_serializes_reason() {
    let invalid = Validation::Invalid {
        reason: "Height is required".to_string(),
    };
    let json = serde_json::to_value(invalid.view()).expect("view serializes");
    assert_eq!(
        json,
        serde_json::json!({"valid": false, "reason": "Height is required"})
    );
    let json = serde_json::to_value(Validation::Valid.view()).expect("view serializes");
    assert_eq!(json, serde_json::json!({"valid": true}));
}
