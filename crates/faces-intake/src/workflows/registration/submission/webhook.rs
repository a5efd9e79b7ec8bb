use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Serialize;

use super::super::domain::{Answer, ApplicationRecord};

/// Value of `triggered_from` in webhook documents sent by this service.
pub const WEBHOOK_ORIGIN: &str = "faces-intake";

/// Flat, camelCase summary of an application for automation webhooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub timestamp: String,
    pub triggered_from: String,
    pub gender: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub nationality: String,
    pub email: String,
    pub mobile: String,
    pub whatsapp: String,
    pub instagram: String,
    pub governorate: String,
    pub district: String,
    pub area: String,
    pub languages: Vec<String>,
    pub height: String,
    pub weight: String,
    pub eye_color: String,
    pub hair_color: String,
    pub hair_type: String,
    pub hair_length: String,
    pub skin_tone: String,
    pub talents: Vec<String>,
    pub sports: Vec<String>,
    pub experience: String,
    pub has_passport: bool,
    pub can_travel: bool,
    pub has_car: String,
}

impl WebhookPayload {
    pub fn from_record(record: &ApplicationRecord, submitted_at: DateTime<Utc>) -> Self {
        let identity = &record.identity;
        let contact = &record.contact;
        let appearance = &record.appearance;
        let skills = &record.skills;
        let preferences = &record.preferences;
        let answer = |value: Answer| value.label().unwrap_or_default().to_string();

        Self {
            timestamp: submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            triggered_from: WEBHOOK_ORIGIN.to_string(),
            gender: identity
                .gender
                .map(|gender| gender.label().to_string())
                .unwrap_or_default(),
            first_name: identity.first_name.trim().to_string(),
            middle_name: identity.middle_name.trim().to_string(),
            last_name: identity.last_name.trim().to_string(),
            date_of_birth: identity.date_of_birth.trim().to_string(),
            nationality: identity.nationality.trim().to_string(),
            email: contact.email.trim().to_string(),
            mobile: contact.mobile.formatted().unwrap_or_default(),
            whatsapp: contact.whatsapp.formatted().unwrap_or_default(),
            instagram: contact.instagram.trim().to_string(),
            governorate: record.location.governorate().to_string(),
            district: record.location.district().to_string(),
            area: record.location.area().to_string(),
            languages: skills.languages.items().to_vec(),
            height: record.measurements.height.trim().to_string(),
            weight: record.measurements.weight.trim().to_string(),
            eye_color: appearance.effective_eye_color().trim().to_string(),
            hair_color: appearance.effective_hair_color().trim().to_string(),
            hair_type: appearance.hair_type.trim().to_string(),
            hair_length: appearance.hair_length.trim().to_string(),
            skin_tone: appearance.skin_tone.trim().to_string(),
            talents: skills.talents.items().to_vec(),
            sports: skills.sports.items().to_vec(),
            experience: skills.experience.trim().to_string(),
            has_passport: preferences.has_passport.is_yes(),
            can_travel: preferences.willing_to_travel.is_yes(),
            has_car: answer(preferences.has_car),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("webhook unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("webhook rejected the notification ({status})")]
    Rejected { status: u16 },
}

/// Fire-and-forget notification sent after an application is stored.
#[async_trait]
pub trait SubmissionHook: Send + Sync {
    async fn notify(&self, payload: &WebhookPayload) -> Result<(), WebhookError>;
}

/// Posts the payload as JSON to a catch-hook URL (Zapier and similar).
#[derive(Debug, Clone)]
pub struct WebhookClient {
    http: Client,
    url: String,
}

impl WebhookClient {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl SubmissionHook for WebhookClient {
    async fn notify(&self, payload: &WebhookPayload) -> Result<(), WebhookError> {
        let response = self.http.post(&self.url).json(payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WebhookError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
