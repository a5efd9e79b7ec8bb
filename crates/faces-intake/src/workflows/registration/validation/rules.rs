use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use super::super::domain::{ApplicationRecord, PhoneNumber};
use super::super::locations::LocationCatalog;

pub const MAX_NAME_LENGTH: usize = 50;
pub const MAX_PHONE_LENGTH: usize = 20;
pub const MIN_AGE: i32 = 16;
pub const MAX_AGE: i32 = 100;

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z\s\-']+$").expect("name pattern compiles"))
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[\d\s\-()]+$").expect("phone pattern compiles"))
}

type RuleResult = Result<(), String>;

fn required(label: &str, value: &str) -> RuleResult {
    if value.trim().is_empty() {
        return Err(format!("{label} is required"));
    }
    Ok(())
}

fn person_name(label: &str, value: &str) -> RuleResult {
    required(label, value)?;
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(format!(
            "{label} must be less than {MAX_NAME_LENGTH} characters"
        ));
    }
    if !name_pattern().is_match(value) {
        return Err(format!(
            "{label} can only contain letters, spaces, hyphens, and apostrophes"
        ));
    }
    Ok(())
}

fn phone(label: &str, value: &PhoneNumber) -> RuleResult {
    required(label, &value.number)?;
    if value.number.chars().count() > MAX_PHONE_LENGTH {
        return Err(format!("{label} is too long"));
    }
    if !phone_pattern().is_match(&value.number) {
        return Err("Invalid phone number format".to_string());
    }
    Ok(())
}

/// Whole years between `birth` and `today`, minus one if the birthday is still ahead.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

fn date_of_birth(value: &str, today: NaiveDate) -> RuleResult {
    required("Date of birth", value)?;
    let birth = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| "Date of birth must be a valid date (YYYY-MM-DD)".to_string())?;
    let age = age_on(birth, today);
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(format!(
            "Age must be between {MIN_AGE} and {MAX_AGE} years"
        ));
    }
    Ok(())
}

pub(super) fn welcome(record: &ApplicationRecord) -> RuleResult {
    match record.identity.gender {
        Some(_) => Ok(()),
        None => Err("Please select a gender".to_string()),
    }
}

pub(super) fn identity(record: &ApplicationRecord, today: NaiveDate) -> RuleResult {
    let identity = &record.identity;
    person_name("First name", &identity.first_name)?;
    person_name("Middle name", &identity.middle_name)?;
    person_name("Last name", &identity.last_name)?;
    date_of_birth(&identity.date_of_birth, today)?;
    required("Nationality", &identity.nationality)
}

pub(super) fn contact(record: &ApplicationRecord) -> RuleResult {
    let contact = &record.contact;
    phone("Mobile number", &contact.mobile)?;
    phone("WhatsApp number", &contact.whatsapp)?;
    phone("Other number", &contact.other_number)?;
    if contact.other_number_relationship.trim().is_empty() {
        return Err("Please select who the other number belongs to".to_string());
    }
    required("Name of person", &contact.other_number_person_name)?;
    if contact.has_whish_account.is_yes() {
        phone("Whish number", &contact.whish_number)?;
    }
    Ok(())
}

pub(super) fn address(record: &ApplicationRecord, catalog: &LocationCatalog) -> RuleResult {
    let location = &record.location;
    required("Governorate", location.governorate())?;
    required("District", location.district())?;
    required("Area", location.area())?;
    catalog.check(location).map_err(|mismatch| mismatch.to_string())
}

pub(super) fn languages(record: &ApplicationRecord) -> RuleResult {
    if record.skills.languages.is_empty() {
        return Err("Please select at least one language".to_string());
    }
    Ok(())
}

pub(super) fn appearance(record: &ApplicationRecord) -> RuleResult {
    let appearance = &record.appearance;
    required("Eye color", appearance.effective_eye_color())?;
    required("Hair color", appearance.effective_hair_color())?;
    required("Hair type", &appearance.hair_type)?;
    required("Hair length", &appearance.hair_length)?;
    required("Skin tone", &appearance.skin_tone)
}

pub(super) fn measurements(record: &ApplicationRecord) -> RuleResult {
    let sizes = &record.measurements;
    required("Height", &sizes.height)?;
    required("Weight", &sizes.weight)?;
    required("Pant size", &sizes.pant_size)?;
    required("Jacket/Blouse size", &sizes.jacket_size)?;
    required("Shoe size", &sizes.shoe_size)?;
    required("Waist", &sizes.waist)?;
    required("Bust/Chest", &sizes.bust)?;
    required("Hips", &sizes.hips)?;
    required("Shoulders", &sizes.shoulders)
}
