pub mod error;
pub mod institutions;
pub mod project;
pub mod settings;
pub mod types;

use crate::config::{ApiConfig, PageConfig};
use anyhow::{Context, Result};
use error::ApiError;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct OsfClient {
    pub(crate) client: Client,
    pub(crate) config: ApiConfig,
    pub(crate) page: PageConfig,
}

impl OsfClient {
    pub fn new(config: ApiConfig, page: PageConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            config,
            page,
        })
    }

    pub fn node_api(&self) -> String {
        self.config.node_api(&self.page.node_id)
    }

    pub fn v2_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_v2_prefix, path)
    }

    /// Sends the request and returns the decoded JSON body. Non-2xx and
    /// bodies that are not JSON both count as failures.
    pub(crate) async fn send_json(&self, url: &str, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = request
            .bearer_auth(&self.config.token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|source| ApiError::Malformed {
            url: url.to_string(),
            source,
        })
    }

    pub(crate) async fn get_typed<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let request = self.client.get(url).query(query);
        let body = self.send_json(url, request).await?;
        serde_json::from_value(body).map_err(|source| ApiError::Malformed {
            url: url.to_string(),
            source,
        })
    }
}
