//! Result shapes produced by the pipeline.
//!
//! [`VerificationOutcome`] is the only wire-shaped object the library defines:
//! it always serialises as `{ "status", "data", "error" }`. [`ScanResult`] is
//! the intermediate product of the scan stage and serialises as
//! `{ "data", "error" }` with exactly one side non-null.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Verdict of a verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Success,
    Failure,
}

/// The sole return value of the public entry points.
///
/// Constructed only through [`VerificationOutcome::success`] and
/// [`VerificationOutcome::failure`], which keep `data` empty and `error`
/// non-empty on failure, and `error` empty on success. Fields are read
/// through accessors so the pairing cannot be broken after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationOutcome {
    status: VerificationStatus,
    data: Value,
    error: String,
}

impl VerificationOutcome {
    /// Successful run. `result` is the endpoint's `verificationStatus`.
    pub fn success(result: Value, credential: Value) -> Self {
        Self {
            status: VerificationStatus::Success,
            data: json!({
                "result": result,
                "credential": credential,
            }),
            error: String::new(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "Unknown error".to_string();
        }
        Self {
            status: VerificationStatus::Failure,
            data: Value::Object(Map::new()),
            error,
        }
    }

    pub fn status(&self) -> VerificationStatus {
        self.status
    }

    /// `{ "result", "credential" }` on success, `{}` on failure.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Empty on success.
    pub fn error(&self) -> &str {
        &self.error
    }

    pub fn is_success(&self) -> bool {
        self.status == VerificationStatus::Success
    }

    /// The endpoint's `verificationStatus`, if the run succeeded.
    pub fn verification_result(&self) -> Option<&Value> {
        self.data.get("result")
    }

    /// The credential that was submitted, if the run succeeded.
    pub fn credential(&self) -> Option<&Value> {
        self.data.get("credential")
    }
}

/// Outcome of scanning one uploaded file for a QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    data: Option<String>,
    error: Option<String>,
}

impl ScanResult {
    pub fn found(data: impl Into<String>) -> Self {
        Self {
            data: Some(data.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn into_result(self) -> Result<String, String> {
        match (self.data, self.error) {
            (Some(data), None) => Ok(data),
            (_, Some(error)) => Err(error),
            (None, None) => Err("Unknown error: empty scan result".to_string()),
        }
    }
}
