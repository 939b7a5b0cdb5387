use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, warn};

use loadline_core::config::FmcsaConfig;
use loadline_core::domain::carrier::{CarrierVerification, McNumber};
use loadline_core::verification::CarrierVerifier;

use crate::response::interpret_response;

#[derive(Debug, Error)]
pub enum FmcsaError {
    #[error("failed to build FMCSA http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// QCMobile registry client. The web key travels as the `webKey` query
/// parameter and is never logged.
#[derive(Clone)]
pub struct FmcsaClient {
    http: Client,
    base_url: String,
    web_key: SecretString,
}

impl std::fmt::Debug for FmcsaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FmcsaClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

impl FmcsaClient {
    pub fn new(
        base_url: impl Into<String>,
        web_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, FmcsaError> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();

        Ok(Self { http, base_url, web_key })
    }

    pub fn from_config(config: &FmcsaConfig) -> Result<Self, FmcsaError> {
        Self::new(
            config.base_url.clone(),
            config.web_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn docket_url(&self, mc_number: &McNumber) -> String {
        format!("{}/carriers/docket-number/{}", self.base_url, mc_number)
    }

    pub async fn lookup(&self, mc_number: &McNumber) -> CarrierVerification {
        let url = self.docket_url(mc_number);
        debug!(event_name = "fmcsa.request", url = %url);

        let response = self
            .http
            .get(&url)
            .query(&[("webKey", self.web_key.expose_secret())])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(error) => {
                let timed_out = error.is_timeout();
                warn!(
                    event_name = "fmcsa.request_failed",
                    mc_number = %mc_number,
                    timed_out,
                    error = %error.without_url(),
                    "registry request failed"
                );
                return CarrierVerification::rejected();
            }
        };

        let status = response.status();
        match response.text().await {
            Ok(body) => interpret_response(status, &body),
            Err(error) => {
                warn!(
                    event_name = "fmcsa.body_unreadable",
                    mc_number = %mc_number,
                    error = %error.without_url(),
                    "registry response body could not be read"
                );
                interpret_response(status, "")
            }
        }
    }
}

#[async_trait]
impl CarrierVerifier for FmcsaClient {
    async fn verify(&self, mc_number: &McNumber) -> CarrierVerification {
        self.lookup(mc_number).await
    }
}
