//! HTTP transport used by the resolver and the verification client.
//!
//! The pipeline talks to the network only through [`HttpTransport`], so tests
//! and embedding applications can inject their own implementation through
//! [`crate::config::VerifierConfigBuilder::transport`]. The default
//! [`ReqwestTransport`] applies the configured timeouts.

use crate::config::VerifierConfig;
use crate::error::VerifyError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Minimal JSON-over-HTTP surface needed by the pipeline.
///
/// Implementations must be `Send + Sync`; one instance may serve concurrent
/// verifications.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// `GET url` and parse the body as JSON.
    ///
    /// A non-2xx status must be reported as [`VerifyError::FetchFailed`].
    async fn get_json(&self, url: &str) -> Result<Value, VerifyError>;

    /// `POST url` with `Content-Type: application/json` and `body`, and parse
    /// the response body as JSON.
    async fn post_json(&self, url: &str, body: String) -> Result<Value, VerifyError>;
}

/// [`HttpTransport`] backed by a reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    fetch_timeout: Duration,
    verify_timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(fetch_timeout: Duration, verify_timeout: Duration) -> Result<Self, VerifyError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("vc-qr-verify/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| VerifyError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            fetch_timeout,
            verify_timeout,
        })
    }

    pub fn from_config(config: &VerifierConfig) -> Result<Self, VerifyError> {
        Self::new(
            Duration::from_secs(config.fetch_timeout_secs),
            Duration::from_secs(config.verify_timeout_secs),
        )
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_json(&self, url: &str) -> Result<Value, VerifyError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    VerifyError::CredentialResolutionFailed(format!(
                        "fetching '{url}' timed out after {}s",
                        self.fetch_timeout.as_secs()
                    ))
                } else {
                    VerifyError::CredentialResolutionFailed(format!("GET {url}: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerifyError::FetchFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            VerifyError::CredentialResolutionFailed(format!("response from '{url}' is not JSON: {e}"))
        })
    }

    async fn post_json(&self, url: &str, body: String) -> Result<Value, VerifyError> {
        debug!("POST {} ({} bytes)", url, body.len());
        let response = self
            .client
            .post(url)
            .timeout(self.verify_timeout)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    VerifyError::VerificationRequestFailed(format!(
                        "'{url}' timed out after {}s",
                        self.verify_timeout.as_secs()
                    ))
                } else {
                    VerifyError::VerificationRequestFailed(format!("POST {url}: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| VerifyError::VerificationRequestFailed(format!("reading body: {e}")))?;

        serde_json::from_str(&body).map_err(|e| {
            VerifyError::VerificationRequestFailed(format!(
                "HTTP {status} from '{url}' with non-JSON body: {e}"
            ))
        })
    }
}

/// Use the injected transport when present, else build a reqwest one.
pub(crate) fn resolve_transport(
    config: &VerifierConfig,
) -> Result<Arc<dyn HttpTransport>, VerifyError> {
    if let Some(ref transport) = config.transport {
        return Ok(Arc::clone(transport));
    }
    Ok(Arc::new(ReqwestTransport::from_config(config)?))
}
