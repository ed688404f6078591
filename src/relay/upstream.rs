use crate::config::UpstreamConfig;
use crate::relay::error::DispatchError;
use crate::relay::types::{CapturedBody, DispatchStep};
use anyhow::Result;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::log::debug;

/// Client for the upstream contact/template API. Built once at startup
/// and shared read-only across all request handlers.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
}
impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// POSTs to `{base}/v2/api/external/{segment}/{operation}`, forwarding
    /// the caller's bearer credential. Returns the upstream status with a
    /// best-effort capture of the response body; any connection or timeout
    /// failure comes back as a network error without a status.
    pub async fn post(
        &self,
        segment: &str,
        operation: DispatchStep,
        credential: &str,
        body: &impl Serialize,
    ) -> Result<(u16, CapturedBody), DispatchError> {
        let url = format!(
            "{}/v2/api/external/{}/{}",
            self.base_url,
            segment,
            operation.path()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(credential)
            .json(body)
            .send()
            .await
            .map_err(|e| DispatchError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let raw = response
            .text()
            .await
            .map_err(|e| DispatchError::Network(e.to_string()))?;

        debug!("Upstream {} returned status {status}", operation.path());
        Ok((status, CapturedBody::from_raw(&raw)))
    }
}
