use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::domain::ApplicationId;
use super::submission::StoreRow;

/// Table receiving submitted applications when none is configured.
pub const DEFAULT_TABLE: &str = "applications";

/// Identifiers the primary store assigns to an inserted row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredApplication {
    pub id: ApplicationId,
    pub created_at: Option<String>,
}

/// System of record for submitted applications.
#[async_trait]
pub trait PrimaryStore: Send + Sync {
    async fn insert(&self, row: StoreRow) -> Result<StoredApplication, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("primary store unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("primary store rejected the application ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("primary store returned an unexpected response: {0}")]
    MalformedResponse(String),
    #[error("primary store unavailable: {0}")]
    Unavailable(String),
}

/// PostgREST-style insert endpoint (`POST {base}/rest/v1/{table}`).
#[derive(Debug, Clone)]
pub struct RestStore {
    http: Client,
    base_url: String,
    service_key: String,
    table: String,
}

impl RestStore {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        service_key: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            table: table.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }
}

#[async_trait]
impl PrimaryStore for RestStore {
    async fn insert(&self, row: StoreRow) -> Result<StoredApplication, StoreError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let payload: Value = response.json().await?;
        parse_inserted(&payload)
    }
}

/// Reads `id` and `created_at` from the first returned row.
fn parse_inserted(payload: &Value) -> Result<StoredApplication, StoreError> {
    let row = match payload {
        Value::Array(rows) => rows.first(),
        Value::Object(_) => Some(payload),
        _ => None,
    }
    .ok_or_else(|| StoreError::MalformedResponse("no row returned".to_string()))?;

    let id = match row.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => return Err(StoreError::MalformedResponse("row is missing an id".to_string())),
    };

    let created_at = row
        .get("created_at")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(StoredApplication {
        id: ApplicationId(id),
        created_at,
    })
}
