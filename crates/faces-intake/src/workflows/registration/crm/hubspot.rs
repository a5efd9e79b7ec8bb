use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{json, Value};

use super::{upsert_via, ContactApi, ContactId, CrmError, CrmGateway, CrmReply, CrmRequest};
use crate::workflows::registration::submission::ContactProperties;

pub const DEFAULT_API_URL: &str = "https://api.hubapi.com";

const CONTACTS_PATH: &str = "/crm/v3/objects/contacts";

/// Direct HubSpot contacts client authenticated with a private-app token.
#[derive(Debug, Clone)]
pub struct HubSpotClient {
    http: Client,
    api_base: String,
    access_token: String,
}

impl HubSpotClient {
    pub fn new(http: Client, api_base: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}{}{}", self.api_base, CONTACTS_PATH, suffix)
    }
}

async fn into_reply(response: Response) -> Result<CrmReply, CrmError> {
    let status = response.status().as_u16();
    let text = response.text().await?;
    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).map_err(|err| CrmError::Decode(err.to_string()))?
    };
    Ok(CrmReply { status, body })
}

#[async_trait]
impl ContactApi for HubSpotClient {
    async fn send(&self, request: CrmRequest) -> Result<CrmReply, CrmError> {
        let builder = match request {
            CrmRequest::Search { search_params } => {
                self.http.post(self.url("/search")).json(&search_params)
            }
            CrmRequest::Update {
                contact_id,
                properties,
            } => self
                .http
                .patch(self.url(&format!("/{contact_id}")))
                .json(&json!({ "properties": properties })),
            CrmRequest::Create { properties } => self
                .http
                .post(self.url(""))
                .json(&json!({ "properties": properties })),
        };

        let response = builder.bearer_auth(&self.access_token).send().await?;
        into_reply(response).await
    }
}

#[async_trait]
impl CrmGateway for HubSpotClient {
    async fn upsert_contact(&self, properties: &ContactProperties) -> Result<ContactId, CrmError> {
        upsert_via(self, properties).await
    }
}
