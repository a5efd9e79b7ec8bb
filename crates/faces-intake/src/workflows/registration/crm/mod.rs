//! CRM contact synchronisation.
//!
//! Two transports speak the same contact operations: [`HubSpotClient`] talks to
//! the CRM directly with a server-held token, [`CrmProxyClient`] goes through the
//! proxy endpoint served by [`crm_proxy_router`]. Both upsert by e-mail.

mod client;
mod hubspot;
mod proxy;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::submission::ContactProperties;

pub use client::CrmProxyClient;
pub use hubspot::{HubSpotClient, DEFAULT_API_URL};
pub use proxy::{crm_proxy_router, CrmProxy, MISSING_TOKEN_MESSAGE, PROXY_PATH};

/// Contact identifier assigned by the CRM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactId(pub String);

/// One contact operation understood by the CRM and the proxy.
#[derive(Debug, Clone, PartialEq)]
pub enum CrmRequest {
    Search { search_params: Value },
    Update { contact_id: String, properties: Value },
    Create { properties: Value },
}

/// Request body accepted by the proxy endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    #[serde(default)]
    pub properties: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_params: Option<Value>,
}

impl From<ProxyRequest> for CrmRequest {
    fn from(body: ProxyRequest) -> Self {
        let contact_id = body.contact_id.as_ref().and_then(|id| match id {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        });

        match (body.action.as_deref(), contact_id) {
            (Some("search"), _) => CrmRequest::Search {
                search_params: body.search_params.unwrap_or(Value::Null),
            },
            (Some("update"), Some(contact_id)) => CrmRequest::Update {
                contact_id,
                properties: body.properties,
            },
            _ => CrmRequest::Create {
                properties: body.properties,
            },
        }
    }
}

impl From<CrmRequest> for ProxyRequest {
    fn from(request: CrmRequest) -> Self {
        match request {
            CrmRequest::Search { search_params } => ProxyRequest {
                action: Some("search".to_string()),
                search_params: Some(search_params),
                ..ProxyRequest::default()
            },
            CrmRequest::Update {
                contact_id,
                properties,
            } => ProxyRequest {
                properties,
                action: Some("update".to_string()),
                contact_id: Some(Value::String(contact_id)),
                search_params: None,
            },
            CrmRequest::Create { properties } => ProxyRequest {
                properties,
                ..ProxyRequest::default()
            },
        }
    }
}

/// Status and decoded JSON body of a CRM response.
#[derive(Debug, Clone, PartialEq)]
pub struct CrmReply {
    pub status: u16,
    pub body: Value,
}

impl CrmReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn message(&self) -> String {
        self.body
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .unwrap_or("HubSpot API error")
            .to_string()
    }

    pub fn contact_id(&self) -> Option<String> {
        match self.body.get("id")? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    fn into_result(self) -> Result<Self, CrmError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(CrmError::Api {
                status: self.status,
                message: self.message(),
            })
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    #[error("CRM unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("CRM returned an unreadable body: {0}")]
    Decode(String),
    #[error("CRM request failed ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("CRM response did not include a contact id")]
    MissingContactId,
    #[error("CRM is not configured")]
    NotConfigured,
}

/// Transport for raw contact operations.
#[async_trait]
pub trait ContactApi: Send + Sync {
    async fn send(&self, request: CrmRequest) -> Result<CrmReply, CrmError>;
}

/// Creates or updates the CRM contact matching the submitted properties.
#[async_trait]
pub trait CrmGateway: Send + Sync {
    async fn upsert_contact(&self, properties: &ContactProperties) -> Result<ContactId, CrmError>;
}

fn email_search(email: &str) -> Value {
    json!({
        "filterGroups": [{
            "filters": [{
                "propertyName": "email",
                "operator": "EQ",
                "value": email,
            }]
        }],
        "properties": ["email"],
        "limit": 1,
    })
}

fn first_result_id(reply: &CrmReply) -> Option<String> {
    let first = reply.body.get("results")?.as_array()?.first()?;
    match first.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Search by e-mail, update the match, otherwise create.
pub(crate) async fn upsert_via<A>(
    api: &A,
    properties: &ContactProperties,
) -> Result<ContactId, CrmError>
where
    A: ContactApi + ?Sized,
{
    let existing = match properties.email() {
        Some(email) => {
            let reply = api
                .send(CrmRequest::Search {
                    search_params: email_search(email),
                })
                .await?
                .into_result()?;
            first_result_id(&reply)
        }
        None => None,
    };

    let encoded =
        serde_json::to_value(properties).map_err(|err| CrmError::Decode(err.to_string()))?;

    let request = match existing {
        Some(contact_id) => {
            tracing::debug!(%contact_id, "updating existing CRM contact");
            CrmRequest::Update {
                contact_id,
                properties: encoded,
            }
        }
        None => CrmRequest::Create {
            properties: encoded,
        },
    };

    let reply = api.send(request).await?.into_result()?;
    reply
        .contact_id()
        .map(ContactId)
        .ok_or(CrmError::MissingContactId)
}
