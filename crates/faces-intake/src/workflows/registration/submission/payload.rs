use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::super::domain::{Answer, ApplicationId, ApplicationRecord, RatedSelection};

/// Value written to `faces_application_source` for contacts created by this service.
pub const APPLICATION_SOURCE: &str = "registration_wizard";

fn present(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Flat row inserted into the primary store, one column per record field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreRow {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<&'static str>,
    pub date_of_birth: Option<String>,
    pub nationality: Option<String>,

    pub mobile: Option<String>,
    pub whatsapp: Option<String>,
    pub other_number: Option<String>,
    pub other_number_relationship: Option<String>,
    pub other_number_person_name: Option<String>,
    pub email: Option<String>,
    pub instagram: Option<String>,
    pub has_whish_account: Option<bool>,
    pub whish_number: Option<String>,

    pub governorate: Option<String>,
    pub district: Option<String>,
    pub area: Option<String>,

    pub languages: Vec<String>,
    pub language_levels: BTreeMap<String, u8>,

    pub eye_color: Option<String>,
    pub hair_color: Option<String>,
    pub hair_type: Option<String>,
    pub hair_length: Option<String>,
    pub skin_tone: Option<String>,
    pub has_tattoos: Option<bool>,
    pub has_piercings: Option<bool>,

    pub height: Option<String>,
    pub weight: Option<String>,
    pub pant_size: Option<String>,
    pub jacket_size: Option<String>,
    pub shoe_size: Option<String>,
    pub bust: Option<String>,
    pub waist: Option<String>,
    pub hips: Option<String>,
    pub shoulders: Option<String>,

    pub talents: Vec<String>,
    pub talent_levels: BTreeMap<String, u8>,
    pub sports: Vec<String>,
    pub sport_levels: BTreeMap<String, u8>,
    pub modeling_types: Vec<String>,
    pub experience: Option<String>,

    pub has_modeling_experience: Option<bool>,
    pub interested_in_extra_work: Option<bool>,
    pub comfortable_with_swimwear: Option<bool>,
    pub has_car: Option<bool>,
    pub has_driving_license: Option<bool>,
    pub willing_to_travel: Option<bool>,
    pub has_passport: Option<bool>,
    pub has_multiple_passports: Option<bool>,
    pub has_look_alike_twin: Option<bool>,
    pub how_did_you_hear: Option<String>,

    pub headshot: Option<String>,
    pub full_body: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl StoreRow {
    pub fn from_record(record: &ApplicationRecord, submitted_at: DateTime<Utc>) -> Self {
        let identity = &record.identity;
        let contact = &record.contact;
        let appearance = &record.appearance;
        let sizes = &record.measurements;
        let skills = &record.skills;
        let preferences = &record.preferences;

        Self {
            first_name: present(&identity.first_name),
            middle_name: present(&identity.middle_name),
            last_name: present(&identity.last_name),
            gender: identity.gender.map(|gender| gender.label()),
            date_of_birth: present(&identity.date_of_birth),
            nationality: present(&identity.nationality),

            mobile: contact.mobile.formatted(),
            whatsapp: contact.whatsapp.formatted(),
            other_number: contact.other_number.formatted(),
            other_number_relationship: present(&contact.other_number_relationship),
            other_number_person_name: present(&contact.other_number_person_name),
            email: present(&contact.email),
            instagram: present(&contact.instagram),
            has_whish_account: contact.has_whish_account.as_bool(),
            whish_number: contact.whish_number.formatted(),

            governorate: present(record.location.governorate()),
            district: present(record.location.district()),
            area: present(record.location.area()),

            languages: skills.languages.items().to_vec(),
            language_levels: skills.languages.ratings().clone(),

            eye_color: present(appearance.effective_eye_color()),
            hair_color: present(appearance.effective_hair_color()),
            hair_type: present(&appearance.hair_type),
            hair_length: present(&appearance.hair_length),
            skin_tone: present(&appearance.skin_tone),
            has_tattoos: appearance.has_tattoos.as_bool(),
            has_piercings: appearance.has_piercings.as_bool(),

            height: present(&sizes.height),
            weight: present(&sizes.weight),
            pant_size: present(&sizes.pant_size),
            jacket_size: present(&sizes.jacket_size),
            shoe_size: present(&sizes.shoe_size),
            bust: present(&sizes.bust),
            waist: present(&sizes.waist),
            hips: present(&sizes.hips),
            shoulders: present(&sizes.shoulders),

            talents: skills.talents.items().to_vec(),
            talent_levels: skills.talents.ratings().clone(),
            sports: skills.sports.items().to_vec(),
            sport_levels: skills.sports.ratings().clone(),
            modeling_types: skills.modeling_types.clone(),
            experience: present(&skills.experience),

            has_modeling_experience: preferences.has_modeling_experience.as_bool(),
            interested_in_extra_work: preferences.interested_in_extra_work.as_bool(),
            comfortable_with_swimwear: preferences.comfortable_with_swimwear.as_bool(),
            has_car: preferences.has_car.as_bool(),
            has_driving_license: preferences.has_driving_license.as_bool(),
            willing_to_travel: preferences.willing_to_travel.as_bool(),
            has_passport: preferences.has_passport.as_bool(),
            has_multiple_passports: preferences.has_multiple_passports.as_bool(),
            has_look_alike_twin: preferences.has_look_alike_twin.as_bool(),
            how_did_you_hear: present(&preferences.how_did_you_hear),

            headshot: record.media.headshot.as_ref().map(|handle| handle.0.clone()),
            full_body: record.media.full_body.as_ref().map(|handle| handle.0.clone()),
            submitted_at,
        }
    }
}

/// HubSpot contact properties keyed by internal property name. Blank values are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ContactProperties(BTreeMap<String, String>);

impl ContactProperties {
    pub fn from_record(
        record: &ApplicationRecord,
        application_id: Option<&ApplicationId>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        let mut properties = Self::default();
        let identity = &record.identity;
        let contact = &record.contact;
        let appearance = &record.appearance;
        let sizes = &record.measurements;
        let skills = &record.skills;
        let preferences = &record.preferences;

        properties.text("firstname", &identity.first_name);
        properties.text("faces_middle_name", &identity.middle_name);
        properties.text("lastname", &identity.last_name);
        properties.text("email", &contact.email);
        if let Some(gender) = identity.gender {
            properties.text("faces_gender", gender.label());
        }
        properties.text("faces_date_of_birth", &identity.date_of_birth);
        properties.text("faces_nationality", &identity.nationality);

        properties.optional("faces_mobile", contact.mobile.formatted());
        properties.optional("faces_whatsapp", contact.whatsapp.formatted());
        properties.optional("faces_other_number", contact.other_number.formatted());
        properties.text(
            "faces_other_number_relationship",
            &contact.other_number_relationship,
        );
        properties.text(
            "faces_other_number_person_name",
            &contact.other_number_person_name,
        );
        properties.text("faces_instagram", &contact.instagram);
        properties.answer("faces_has_whish_account", contact.has_whish_account);
        properties.optional("faces_whish_number", contact.whish_number.formatted());

        properties.text("faces_governorate", record.location.governorate());
        properties.text("faces_district", record.location.district());
        properties.text("faces_area", record.location.area());

        properties.rated("faces_languages", "faces_language_levels", &skills.languages);

        properties.text("faces_eye_color", appearance.effective_eye_color());
        properties.text("faces_hair_color", appearance.effective_hair_color());
        properties.text("faces_hair_type", &appearance.hair_type);
        properties.text("faces_hair_length", &appearance.hair_length);
        properties.text("faces_skin_tone", &appearance.skin_tone);
        properties.boolean("faces_has_tattoos", appearance.has_tattoos);
        properties.boolean("faces_has_piercings", appearance.has_piercings);

        properties.text("faces_height_cm", &sizes.height);
        properties.text("faces_weight_kg", &sizes.weight);
        properties.text("faces_pant_size", &sizes.pant_size);
        properties.text("faces_jacket_size", &sizes.jacket_size);
        properties.text("faces_shoe_size", &sizes.shoe_size);
        properties.text("faces_bust_cm", &sizes.bust);
        properties.text("faces_waist_cm", &sizes.waist);
        properties.text("faces_hips_cm", &sizes.hips);
        properties.text("faces_shoulders_cm", &sizes.shoulders);

        properties.rated("faces_talents", "faces_talent_levels", &skills.talents);
        properties.rated("faces_sports", "faces_sport_levels", &skills.sports);
        if !skills.modeling_types.is_empty() {
            properties.json("faces_modeling_types", &skills.modeling_types);
        }
        properties.text("faces_experience", &skills.experience);
        properties.answer(
            "faces_has_modeling_experience",
            preferences.has_modeling_experience,
        );
        properties.boolean(
            "faces_comfortable_with_swimwear",
            preferences.comfortable_with_swimwear,
        );
        properties.answer(
            "faces_interested_in_extra_work",
            preferences.interested_in_extra_work,
        );

        properties.answer("faces_has_car", preferences.has_car);
        properties.answer("faces_has_driving_license", preferences.has_driving_license);
        properties.answer("faces_willing_to_travel", preferences.willing_to_travel);
        properties.answer("faces_has_valid_passport", preferences.has_passport);
        properties.answer(
            "faces_has_multiple_passports",
            preferences.has_multiple_passports,
        );
        properties.answer("faces_has_look_alike_twin", preferences.has_look_alike_twin);
        properties.text("faces_how_did_you_hear", &preferences.how_did_you_hear);

        properties.text(
            "faces_application_date",
            &submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        properties.text("faces_application_source", APPLICATION_SOURCE);
        if let Some(id) = application_id {
            properties.text("faces_supabase_id", &id.0);
        }

        properties
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn email(&self) -> Option<&str> {
        self.get("email")
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    fn text(&mut self, name: &str, value: &str) {
        if let Some(value) = present(value) {
            self.0.insert(name.to_string(), value);
        }
    }

    fn optional(&mut self, name: &str, value: Option<String>) {
        if let Some(value) = value {
            self.0.insert(name.to_string(), value);
        }
    }

    fn answer(&mut self, name: &str, value: Answer) {
        if let Some(label) = value.label() {
            self.0.insert(name.to_string(), label.to_string());
        }
    }

    fn boolean(&mut self, name: &str, value: Answer) {
        if let Some(flag) = value.as_bool() {
            self.0.insert(name.to_string(), flag.to_string());
        }
    }

    fn json<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(encoded) => {
                self.0.insert(name.to_string(), encoded);
            }
            Err(err) => tracing::warn!(property = name, error = %err, "skipping unencodable property"),
        }
    }

    fn rated(&mut self, items_name: &str, levels_name: &str, selection: &RatedSelection) {
        if selection.is_empty() {
            return;
        }
        self.json(items_name, selection.items());
        self.json(levels_name, selection.ratings());
    }
}

impl From<BTreeMap<String, String>> for ContactProperties {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}
