//! Public entry points: file → outcome and QR text → outcome.
//!
//! Both functions always return a [`VerificationOutcome`]. Every stage
//! error is caught here and stringified into the outcome's `error` field;
//! nothing is retried and no state survives the call.

use crate::config::VerifierConfig;
use crate::error::VerifyError;
use crate::output::VerificationOutcome;
use crate::pipeline::input::{validate_file, UploadedFile};
use crate::pipeline::resolve::resolve_credential;
use crate::pipeline::scan::scan_file;
use crate::pipeline::submit::submit_credential;
use crate::transport::resolve_transport;
use std::future::Future;
use std::thread;
use std::time::Instant;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// Error reported when the upload fails the size/extension check.
pub const INVALID_FILE_TYPE: &str = "Invalid file type";

/// Scan `file` for a credential QR code and verify it against `url`.
///
/// # Example
/// ```rust,no_run
/// use vc_qr_verify::{verify_from_file, UploadedFile, VerifierConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let file = UploadedFile::from_path("certificate.pdf").await?;
/// let config = VerifierConfig::default();
/// let outcome = verify_from_file(&file, "https://verify.example/v1/verify", &config).await;
/// println!("{}", serde_json::to_string_pretty(&outcome)?);
/// # Ok(())
/// # }
/// ```
pub async fn verify_from_file(
    file: &UploadedFile,
    url: &str,
    config: &VerifierConfig,
) -> VerificationOutcome {
    let start = Instant::now();
    info!(
        "Verifying upload {:?} ({}, {} bytes)",
        file.name.as_deref().unwrap_or("<unnamed>"),
        file.mime_type,
        file.size()
    );

    if config.enforce_file_checks
        && !validate_file(file, &config.limits, &config.allowed_extensions)
    {
        warn!("Upload rejected by file checks");
        return VerificationOutcome::failure(INVALID_FILE_TYPE);
    }

    let scanned = match scan_file(file, config).await.into_result() {
        Ok(text) => text,
        Err(error) => {
            info!("Scan failed after {}ms: {}", start.elapsed().as_millis(), error);
            return VerificationOutcome::failure(error);
        }
    };
    debug!("Scanned QR text in {}ms", start.elapsed().as_millis());

    verify_from_qr_text(&scanned, url, config).await
}

/// Resolve the credential carried by `qr_text` and verify it against `url`.
pub async fn verify_from_qr_text(
    qr_text: &str,
    url: &str,
    config: &VerifierConfig,
) -> VerificationOutcome {
    let start = Instant::now();
    match run_qr_text(qr_text, url, config).await {
        Ok(outcome) => {
            info!("Verification completed in {}ms", start.elapsed().as_millis());
            outcome
        }
        Err(e) => {
            warn!("Verification failed: {}", e);
            VerificationOutcome::failure(e.to_string())
        }
    }
}

async fn run_qr_text(
    qr_text: &str,
    url: &str,
    config: &VerifierConfig,
) -> Result<VerificationOutcome, VerifyError> {
    let transport = resolve_transport(config)?;

    let credential = resolve_credential(qr_text, &config.envelope, transport.as_ref()).await?;
    let body = serde_json::to_string(&credential)
        .map_err(|e| VerifyError::Internal(format!("serialising credential: {e}")))?;

    let result = submit_credential(body, url, transport.as_ref()).await?;
    Ok(VerificationOutcome::success(result, credential))
}

/// Synchronous wrapper around [`verify_from_file`].
///
/// Creates a temporary tokio runtime internally. When called from inside a
/// running runtime the work moves to a scoped OS thread, since blocking on
/// a nested runtime would panic.
pub fn verify_from_file_sync(
    file: &UploadedFile,
    url: &str,
    config: &VerifierConfig,
) -> VerificationOutcome {
    block_on_fresh_runtime(|| verify_from_file(file, url, config))
}

/// Synchronous wrapper around [`verify_from_qr_text`].
pub fn verify_from_qr_text_sync(
    qr_text: &str,
    url: &str,
    config: &VerifierConfig,
) -> VerificationOutcome {
    block_on_fresh_runtime(|| verify_from_qr_text(qr_text, url, config))
}

fn block_on_fresh_runtime<F, Fut>(make: F) -> VerificationOutcome
where
    F: FnOnce() -> Fut + Send,
    Fut: Future<Output = VerificationOutcome>,
{
    let run = move || match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(make()),
        Err(e) => VerificationOutcome::failure(
            VerifyError::Internal(format!("Failed to create tokio runtime: {e}")).to_string(),
        ),
    };

    if Handle::try_current().is_err() {
        return run();
    }

    debug!("Sync wrapper called inside a runtime; running on a scoped thread");
    thread::scope(|scope| {
        scope.spawn(run).join().unwrap_or_else(|_| {
            VerificationOutcome::failure(
                VerifyError::Internal("verification thread panicked".into()).to_string(),
            )
        })
    })
}
