//! Error types for the vc-qr-verify library.
//!
//! Every pipeline stage returns `Result<_, VerifyError>`, but no error ever
//! escapes the public entry points: [`crate::verify`] turns them into a
//! `FAILURE` [`crate::output::VerificationOutcome`].
//!
//! Two propagation rules apply:
//!
//! * **Scan stage**: errors are downgraded into one of three buckets
//!   (`Invalid PDF`, `Invalid Image`, `Unknown error: …`) by
//!   [`VerifyError::scan_bucket`] before they reach the orchestrator.
//! * **Everything after the scan**: errors propagate with `?` and are
//!   stringified into the outcome's `error` field.
//!
//! An unsupported envelope header is *not* an error: the payload decoder
//! returns `Ok(None)` for it.

use thiserror::Error;

/// All errors produced by the verification pipeline.
#[derive(Debug, Error)]
pub enum VerifyError {
    // ── Scan errors ───────────────────────────────────────────────────────
    /// The image blob could not be loaded or decoded.
    #[error("Failed to load image: {detail}")]
    InvalidFile { detail: String },

    /// The PDF document could not be opened or parsed.
    #[error("Invalid PDF: {detail}")]
    InvalidPdf { detail: String },

    /// No QR symbol was found in the image, or on any page of the PDF.
    #[error("No {format} found")]
    NoQrFound { format: String },

    /// pdfium failed to rasterise one page of an otherwise valid document.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// pdfium itself is unavailable (library missing or incompatible).
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or pass --pdfium-lib."
    )]
    PdfiumBindingFailed(String),

    // ── Decode / resolve errors ───────────────────────────────────────────
    /// The QR payload is malformed for the envelope it claims to be.
    #[error("Failed to decode QR payload: {0}")]
    DecodeFailed(String),

    /// The indirection resource answered with a non-2xx status.
    #[error("HTTP error! Status: {status} ({url})")]
    FetchFailed { url: String, status: u16 },

    /// The credential could not be obtained from the scanned text.
    #[error("Credential resolution failed: {0}")]
    CredentialResolutionFailed(String),

    // ── Verification errors ───────────────────────────────────────────────
    /// The verification endpoint was unreachable or answered garbage.
    #[error("Verification request failed: {0}")]
    VerificationRequestFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (task panic, runtime creation, timeouts).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VerifyError {
    /// Classify a scan-stage error into the message stored in
    /// [`crate::output::ScanResult`].
    pub fn scan_bucket(&self) -> String {
        match self {
            VerifyError::InvalidPdf { .. } => "Invalid PDF".to_string(),
            VerifyError::InvalidFile { .. } => "Invalid Image".to_string(),
            other => format!("Unknown error: {other}"),
        }
    }

    /// Wrap any resolver-stage failure, leaving already-wrapped ones alone.
    pub(crate) fn into_resolution_failure(self) -> VerifyError {
        match self {
            VerifyError::CredentialResolutionFailed(_) => self,
            other => VerifyError::CredentialResolutionFailed(other.to_string()),
        }
    }
}
