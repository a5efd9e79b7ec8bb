use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{
    upsert_via, ContactApi, ContactId, CrmError, CrmGateway, CrmReply, CrmRequest, ProxyRequest,
};
use crate::workflows::registration::submission::ContactProperties;

/// Talks to the CRM through the proxy endpoint instead of holding a token.
#[derive(Debug, Clone)]
pub struct CrmProxyClient {
    http: Client,
    endpoint: String,
}

impl CrmProxyClient {
    pub fn new(http: Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ContactApi for CrmProxyClient {
    async fn send(&self, request: CrmRequest) -> Result<CrmReply, CrmError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&ProxyRequest::from(request))
            .send()
            .await?;

        let status = response.status().as_u16();
        let envelope: Value = response
            .json()
            .await
            .map_err(|err| CrmError::Decode(err.to_string()))?;

        // The proxy wraps CRM payloads; unwrap back to the CRM's own shape.
        let body = if (200..300).contains(&status) {
            envelope.get("data").cloned().unwrap_or(Value::Null)
        } else {
            match envelope.get("details") {
                Some(details) if details.get("message").is_some() => details.clone(),
                _ => json!({ "message": envelope.get("error").cloned().unwrap_or(Value::Null) }),
            }
        };

        Ok(CrmReply { status, body })
    }
}

#[async_trait]
impl CrmGateway for CrmProxyClient {
    async fn upsert_contact(&self, properties: &ContactProperties) -> Result<ContactId, CrmError> {
        upsert_via(self, properties).await
    }
}
