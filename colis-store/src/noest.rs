use async_trait::async_trait;
use colis_core::{CarrierClient, CarrierOperation, CoreError, CoreResult};
use reqwest::Client;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, error};

use crate::app_config::CarrierConfig;

/// HTTP client for the Noest public API.
///
/// Every operation is a JSON POST whose body carries the account's
/// `api_token` and `user_guid` next to the operation fields.
#[derive(Debug, Clone)]
pub struct NoestClient {
    client: Client,
    base_url: String,
    api_token: String,
    user_guid: String,
}

impl NoestClient {
    pub fn new(config: &CarrierConfig) -> CoreResult<Self> {
        if config.api_token.is_empty() || config.user_guid.is_empty() {
            return Err(CoreError::carrier(
                "carrier.api_token and carrier.user_guid must be set",
                None,
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| CoreError::carrier(e.to_string(), None))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            user_guid: config.user_guid.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Credentials first, so operation fields win on a name clash.
    fn with_credentials(&self, payload: Value) -> Value {
        let mut body = Map::new();
        body.insert("api_token".into(), Value::String(self.api_token.clone()));
        body.insert("user_guid".into(), Value::String(self.user_guid.clone()));
        if let Value::Object(fields) = payload {
            body.extend(fields);
        }
        Value::Object(body)
    }
}

#[async_trait]
impl CarrierClient for NoestClient {
    async fn call(&self, operation: CarrierOperation, payload: Value) -> CoreResult<Value> {
        let url = format!("{}{}", self.base_url, operation.path());
        let body = self.with_credentials(payload);
        debug!(%operation, %url, "carrier request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(%operation, error = %e, "carrier unreachable");
                CoreError::carrier(e.to_string(), None)
            })?;

        let status = response.status();
        let data: Value = match response.json().await {
            Ok(data) => data,
            Err(_) if !status.is_success() => Value::Null,
            Err(e) => return Err(CoreError::carrier(e.to_string(), None)),
        };

        if !status.is_success() {
            let message = data["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Carrier returned {}", status));
            error!(%operation, %status, %message, "carrier rejected request");
            return Err(CoreError::carrier(message, Some(data)));
        }

        debug!(%operation, response = %data, "carrier response");
        Ok(data)
    }

    async fn download_label(&self, tracking: &str) -> CoreResult<Vec<u8>> {
        let url = format!("{}/get/order/label", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("tracking", tracking),
                ("api_token", self.api_token.as_str()),
                ("user_guid", self.user_guid.as_str()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                error!(tracking, error = %e, "label download failed");
                CoreError::carrier("Impossible de télécharger l'étiquette", None)
            })?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CoreError::carrier(e.to_string(), None))?;
        Ok(bytes.to_vec())
    }
}
