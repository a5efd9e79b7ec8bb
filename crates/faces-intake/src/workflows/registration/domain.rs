use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Country code pre-selected for every phone field.
pub const DEFAULT_COUNTRY_CODE: &str = "+961";
/// Proficiency assigned when an item is first added to a rated list.
pub const DEFAULT_RATING: u8 = 3;
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Identifier assigned by the primary store to a persisted application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Opaque reference to an uploaded image; the bytes live in the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaHandle(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub const fn label(self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
        }
    }
}

/// Yes/no answer that starts out unanswered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    #[default]
    Unset,
    Yes,
    No,
}

impl Answer {
    pub const fn label(self) -> Option<&'static str> {
        match self {
            Answer::Unset => None,
            Answer::Yes => Some("yes"),
            Answer::No => Some("no"),
        }
    }

    pub const fn as_bool(self) -> Option<bool> {
        match self {
            Answer::Unset => None,
            Answer::Yes => Some(true),
            Answer::No => Some(false),
        }
    }

    pub const fn is_yes(self) -> bool {
        matches!(self, Answer::Yes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub country_code: String,
    pub number: String,
}

impl Default for PhoneNumber {
    fn default() -> Self {
        Self {
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            number: String::new(),
        }
    }
}

impl PhoneNumber {
    /// International form (`+961 70123456`), or `None` when no number was entered.
    pub fn formatted(&self) -> Option<String> {
        let number = self.number.trim();
        if number.is_empty() {
            return None;
        }
        Some(format!("{} {}", self.country_code.trim(), number).trim().to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    pub gender: Option<Gender>,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    /// Raw `YYYY-MM-DD` input; parsed during validation.
    pub date_of_birth: String,
    pub nationality: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactDetails {
    pub mobile: PhoneNumber,
    pub whatsapp: PhoneNumber,
    pub other_number: PhoneNumber,
    pub other_number_relationship: String,
    pub other_number_person_name: String,
    pub email: String,
    pub instagram: String,
    pub has_whish_account: Answer,
    pub whish_number: PhoneNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationLevel {
    Governorate,
    District,
    Area,
}

/// Governorate → district → area selection.
///
/// Changing a level clears every level below it, so a child value is never left
/// pointing at a parent that is no longer selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationSelection {
    governorate: String,
    district: String,
    area: String,
}

impl LocationSelection {
    pub fn governorate(&self) -> &str {
        &self.governorate
    }

    pub fn district(&self) -> &str {
        &self.district
    }

    pub fn area(&self) -> &str {
        &self.area
    }

    /// Stores the trimmed value. A changed parent clears its children.
    pub fn set(&mut self, level: LocationLevel, value: impl Into<String>) {
        let value = value.into().trim().to_string();
        match level {
            LocationLevel::Governorate => {
                if self.governorate != value {
                    self.district.clear();
                    self.area.clear();
                }
                self.governorate = value;
            }
            LocationLevel::District => {
                if self.district != value {
                    self.area.clear();
                }
                self.district = value;
            }
            LocationLevel::Area => self.area = value,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawRatedSelection {
    items: Vec<String>,
    ratings: BTreeMap<String, u8>,
}

/// Multi-select list whose items each carry a 1–5 proficiency rating.
///
/// Every selected item has exactly one rating entry and no rating exists for an
/// unselected item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawRatedSelection")]
pub struct RatedSelection {
    items: Vec<String>,
    ratings: BTreeMap<String, u8>,
}

impl From<RawRatedSelection> for RatedSelection {
    fn from(raw: RawRatedSelection) -> Self {
        let mut selection = Self::default();
        for item in raw.items {
            if selection.insert(item.clone()) {
                if let Some(rating) = raw.ratings.get(&item) {
                    selection.set_rating(&item, *rating);
                }
            }
        }
        selection
    }
}

impl RatedSelection {
    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn ratings(&self) -> &BTreeMap<String, u8> {
        &self.ratings
    }

    pub fn rating(&self, item: &str) -> Option<u8> {
        self.ratings.get(item).copied()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.iter().any(|existing| existing == item)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds an item with the default rating. Returns `false` if it was already selected.
    pub fn insert(&mut self, item: impl Into<String>) -> bool {
        let item = item.into();
        if item.trim().is_empty() || self.contains(&item) {
            return false;
        }
        self.ratings.insert(item.clone(), DEFAULT_RATING);
        self.items.push(item);
        true
    }

    /// Removes an item together with its rating.
    pub fn remove(&mut self, item: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|existing| existing != item);
        self.ratings.remove(item);
        before != self.items.len()
    }

    /// Flips membership of `item`; returns whether it is selected afterwards.
    pub fn toggle(&mut self, item: impl Into<String>) -> bool {
        let item = item.into();
        if self.remove(&item) {
            false
        } else {
            self.insert(item)
        }
    }

    /// Replaces the selection, keeping ratings of items that survive.
    pub fn replace(&mut self, items: Vec<String>) {
        let previous = std::mem::take(&mut self.ratings);
        self.items.clear();
        for item in items {
            if self.insert(item.clone()) {
                if let Some(rating) = previous.get(&item) {
                    self.ratings.insert(item, *rating);
                }
            }
        }
    }

    /// Rates a selected item, clamping to 1–5. Unselected items are left unrated.
    pub fn set_rating(&mut self, item: &str, rating: u8) -> bool {
        match self.ratings.get_mut(item) {
            Some(slot) => {
                *slot = rating.clamp(MIN_RATING, MAX_RATING);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionList {
    Languages,
    Talents,
    Sports,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Appearance {
    pub eye_color: String,
    pub custom_eye_color: String,
    pub hair_color: String,
    pub custom_hair_color: String,
    pub hair_type: String,
    pub hair_length: String,
    pub skin_tone: String,
    pub has_tattoos: Answer,
    pub has_piercings: Answer,
}

impl Appearance {
    pub fn effective_eye_color(&self) -> &str {
        prefer_custom(&self.custom_eye_color, &self.eye_color)
    }

    pub fn effective_hair_color(&self) -> &str {
        prefer_custom(&self.custom_hair_color, &self.hair_color)
    }
}

fn prefer_custom<'a>(custom: &'a str, listed: &'a str) -> &'a str {
    if custom.trim().is_empty() {
        listed
    } else {
        custom
    }
}

/// Free-text sizes; the wizard only checks presence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Measurements {
    pub height: String,
    pub weight: String,
    pub pant_size: String,
    pub jacket_size: String,
    pub shoe_size: String,
    pub bust: String,
    pub waist: String,
    pub hips: String,
    pub shoulders: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillSet {
    pub languages: RatedSelection,
    pub talents: RatedSelection,
    pub sports: RatedSelection,
    pub modeling_types: Vec<String>,
    pub experience: String,
}

impl SkillSet {
    pub fn list(&self, list: SelectionList) -> &RatedSelection {
        match list {
            SelectionList::Languages => &self.languages,
            SelectionList::Talents => &self.talents,
            SelectionList::Sports => &self.sports,
        }
    }

    pub fn list_mut(&mut self, list: SelectionList) -> &mut RatedSelection {
        match list {
            SelectionList::Languages => &mut self.languages,
            SelectionList::Talents => &mut self.talents,
            SelectionList::Sports => &mut self.sports,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    HasTattoos,
    HasPiercings,
    HasWhishAccount,
    HasModelingExperience,
    InterestedInExtraWork,
    ComfortableWithSwimwear,
    HasCar,
    HasDrivingLicense,
    WillingToTravel,
    HasPassport,
    HasMultiplePassports,
    HasLookAlikeTwin,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub has_modeling_experience: Answer,
    pub interested_in_extra_work: Answer,
    pub comfortable_with_swimwear: Answer,
    pub has_car: Answer,
    pub has_driving_license: Answer,
    pub willing_to_travel: Answer,
    pub has_passport: Answer,
    pub has_multiple_passports: Answer,
    pub has_look_alike_twin: Answer,
    pub how_did_you_hear: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSlot {
    Headshot,
    FullBody,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Media {
    pub headshot: Option<MediaHandle>,
    pub full_body: Option<MediaHandle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    FirstName,
    MiddleName,
    LastName,
    DateOfBirth,
    Nationality,
    Email,
    Instagram,
    OtherNumberRelationship,
    OtherNumberPersonName,
    EyeColor,
    CustomEyeColor,
    HairColor,
    CustomHairColor,
    HairType,
    HairLength,
    SkinTone,
    Height,
    Weight,
    PantSize,
    JacketSize,
    ShoeSize,
    Bust,
    Waist,
    Hips,
    Shoulders,
    Experience,
    HowDidYouHear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhoneField {
    Mobile,
    Whatsapp,
    OtherNumber,
    Whish,
}

/// One edit to the application record, as emitted by a form control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldUpdate {
    Text { field: TextField, value: String },
    Gender { value: Gender },
    PhoneNumber { field: PhoneField, value: String },
    CountryCode { field: PhoneField, value: String },
    Location { level: LocationLevel, value: String },
    Selection { list: SelectionList, items: Vec<String> },
    Toggle { list: SelectionList, item: String },
    Rating { list: SelectionList, item: String, rating: u8 },
    ModelingTypes { items: Vec<String> },
    Flag { flag: Flag, value: Answer },
    Media { slot: MediaSlot, handle: Option<MediaHandle> },
}

/// Answers accumulated across every wizard step for one candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationRecord {
    pub identity: Identity,
    pub contact: ContactDetails,
    pub location: LocationSelection,
    pub appearance: Appearance,
    pub measurements: Measurements,
    pub skills: SkillSet,
    pub preferences: Preferences,
    pub media: Media,
}

impl ApplicationRecord {
    /// Merges a single field, overwriting whatever was there.
    pub fn apply(&mut self, update: FieldUpdate) {
        match update {
            FieldUpdate::Text { field, value } => *self.text_mut(field) = value,
            FieldUpdate::Gender { value } => self.identity.gender = Some(value),
            FieldUpdate::PhoneNumber { field, value } => self.phone_mut(field).number = value,
            FieldUpdate::CountryCode { field, value } => {
                self.phone_mut(field).country_code = value
            }
            FieldUpdate::Location { level, value } => self.location.set(level, value),
            FieldUpdate::Selection { list, items } => self.skills.list_mut(list).replace(items),
            FieldUpdate::Toggle { list, item } => {
                self.skills.list_mut(list).toggle(item);
            }
            FieldUpdate::Rating { list, item, rating } => {
                if !self.skills.list_mut(list).set_rating(&item, rating) {
                    tracing::debug!(?list, %item, "ignoring rating for unselected item");
                }
            }
            FieldUpdate::ModelingTypes { items } => self.skills.modeling_types = items,
            FieldUpdate::Flag { flag, value } => *self.flag_mut(flag) = value,
            FieldUpdate::Media { slot, handle } => match slot {
                MediaSlot::Headshot => self.media.headshot = handle,
                MediaSlot::FullBody => self.media.full_body = handle,
            },
        }
    }

    pub fn text(&self, field: TextField) -> &str {
        match field {
            TextField::FirstName => &self.identity.first_name,
            TextField::MiddleName => &self.identity.middle_name,
            TextField::LastName => &self.identity.last_name,
            TextField::DateOfBirth => &self.identity.date_of_birth,
            TextField::Nationality => &self.identity.nationality,
            TextField::Email => &self.contact.email,
            TextField::Instagram => &self.contact.instagram,
            TextField::OtherNumberRelationship => &self.contact.other_number_relationship,
            TextField::OtherNumberPersonName => &self.contact.other_number_person_name,
            TextField::EyeColor => &self.appearance.eye_color,
            TextField::CustomEyeColor => &self.appearance.custom_eye_color,
            TextField::HairColor => &self.appearance.hair_color,
            TextField::CustomHairColor => &self.appearance.custom_hair_color,
            TextField::HairType => &self.appearance.hair_type,
            TextField::HairLength => &self.appearance.hair_length,
            TextField::SkinTone => &self.appearance.skin_tone,
            TextField::Height => &self.measurements.height,
            TextField::Weight => &self.measurements.weight,
            TextField::PantSize => &self.measurements.pant_size,
            TextField::JacketSize => &self.measurements.jacket_size,
            TextField::ShoeSize => &self.measurements.shoe_size,
            TextField::Bust => &self.measurements.bust,
            TextField::Waist => &self.measurements.waist,
            TextField::Hips => &self.measurements.hips,
            TextField::Shoulders => &self.measurements.shoulders,
            TextField::Experience => &self.skills.experience,
            TextField::HowDidYouHear => &self.preferences.how_did_you_hear,
        }
    }

    fn text_mut(&mut self, field: TextField) -> &mut String {
        match field {
            TextField::FirstName => &mut self.identity.first_name,
            TextField::MiddleName => &mut self.identity.middle_name,
            TextField::LastName => &mut self.identity.last_name,
            TextField::DateOfBirth => &mut self.identity.date_of_birth,
            TextField::Nationality => &mut self.identity.nationality,
            TextField::Email => &mut self.contact.email,
            TextField::Instagram => &mut self.contact.instagram,
            TextField::OtherNumberRelationship => &mut self.contact.other_number_relationship,
            TextField::OtherNumberPersonName => &mut self.contact.other_number_person_name,
            TextField::EyeColor => &mut self.appearance.eye_color,
            TextField::CustomEyeColor => &mut self.appearance.custom_eye_color,
            TextField::HairColor => &mut self.appearance.hair_color,
            TextField::CustomHairColor => &mut self.appearance.custom_hair_color,
            TextField::HairType => &mut self.appearance.hair_type,
            TextField::HairLength => &mut self.appearance.hair_length,
            TextField::SkinTone => &mut self.appearance.skin_tone,
            TextField::Height => &mut self.measurements.height,
            TextField::Weight => &mut self.measurements.weight,
            TextField::PantSize => &mut self.measurements.pant_size,
            TextField::JacketSize => &mut self.measurements.jacket_size,
            TextField::ShoeSize => &mut self.measurements.shoe_size,
            TextField::Bust => &mut self.measurements.bust,
            TextField::Waist => &mut self.measurements.waist,
            TextField::Hips => &mut self.measurements.hips,
            TextField::Shoulders => &mut self.measurements.shoulders,
            TextField::Experience => &mut self.skills.experience,
            TextField::HowDidYouHear => &mut self.preferences.how_did_you_hear,
        }
    }

    pub fn phone(&self, field: PhoneField) -> &PhoneNumber {
        match field {
            PhoneField::Mobile => &self.contact.mobile,
            PhoneField::Whatsapp => &self.contact.whatsapp,
            PhoneField::OtherNumber => &self.contact.other_number,
            PhoneField::Whish => &self.contact.whish_number,
        }
    }

    fn phone_mut(&mut self, field: PhoneField) -> &mut PhoneNumber {
        match field {
            PhoneField::Mobile => &mut self.contact.mobile,
            PhoneField::Whatsapp => &mut self.contact.whatsapp,
            PhoneField::OtherNumber => &mut self.contact.other_number,
            PhoneField::Whish => &mut self.contact.whish_number,
        }
    }

    pub fn flag(&self, flag: Flag) -> Answer {
        match flag {
            Flag::HasTattoos => self.appearance.has_tattoos,
            Flag::HasPiercings => self.appearance.has_piercings,
            Flag::HasWhishAccount => self.contact.has_whish_account,
            Flag::HasModelingExperience => self.preferences.has_modeling_experience,
            Flag::InterestedInExtraWork => self.preferences.interested_in_extra_work,
            Flag::ComfortableWithSwimwear => self.preferences.comfortable_with_swimwear,
            Flag::HasCar => self.preferences.has_car,
            Flag::HasDrivingLicense => self.preferences.has_driving_license,
            Flag::WillingToTravel => self.preferences.willing_to_travel,
            Flag::HasPassport => self.preferences.has_passport,
            Flag::HasMultiplePassports => self.preferences.has_multiple_passports,
            Flag::HasLookAlikeTwin => self.preferences.has_look_alike_twin,
        }
    }

    fn flag_mut(&mut self, flag: Flag) -> &mut Answer {
        match flag {
            Flag::HasTattoos => &mut self.appearance.has_tattoos,
            Flag::HasPiercings => &mut self.appearance.has_piercings,
            Flag::HasWhishAccount => &mut self.contact.has_whish_account,
            Flag::HasModelingExperience => &mut self.preferences.has_modeling_experience,
            Flag::InterestedInExtraWork => &mut self.preferences.interested_in_extra_work,
            Flag::ComfortableWithSwimwear => &mut self.preferences.comfortable_with_swimwear,
            Flag::HasCar => &mut self.preferences.has_car,
            Flag::HasDrivingLicense => &mut self.preferences.has_driving_license,
            Flag::WillingToTravel => &mut self.preferences.willing_to_travel,
            Flag::HasPassport => &mut self.preferences.has_passport,
            Flag::HasMultiplePassports => &mut self.preferences.has_multiple_passports,
            Flag::HasLookAlikeTwin => &mut self.preferences.has_look_alike_twin,
        }
    }
}
