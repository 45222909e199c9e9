//! Verification client: POST the credential and read back its status.

use crate::error::VerifyError;
use crate::transport::HttpTransport;
use serde_json::Value;
use tracing::{debug, info};

/// Field of the endpoint's response carrying the verdict.
pub const VERIFICATION_STATUS_FIELD: &str = "verificationStatus";

/// Submit `credential_json` to `url` and return the endpoint's
/// `verificationStatus` (JSON `null` when the field is absent).
///
/// Transport and parse failures come back as
/// [`VerifyError::VerificationRequestFailed`], never as a panic.
pub async fn submit_credential(
    credential_json: String,
    url: &str,
    transport: &dyn HttpTransport,
) -> Result<Value, VerifyError> {
    if url.trim().is_empty() {
        return Err(VerifyError::VerificationRequestFailed(
            "verification URL is empty".into(),
        ));
    }

    info!("Submitting credential to {}", url);
    let response = transport
        .post_json(url, credential_json)
        .await
        .map_err(|e| match e {
            VerifyError::VerificationRequestFailed(_) => e,
            other => VerifyError::VerificationRequestFailed(other.to_string()),
        })?;

    let status = response
        .get(VERIFICATION_STATUS_FIELD)
        .cloned()
        .unwrap_or(Value::Null);
    debug!("{} = {}", VERIFICATION_STATUS_FIELD, status);
    Ok(status)
}
