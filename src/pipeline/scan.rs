//! Scan dispatch: route an upload to the PDF or image scanner and fold any
//! failure into a [`ScanResult`].

use crate::config::{VerifierConfig, QR_FORMAT_LABEL};
use crate::error::VerifyError;
use crate::output::ScanResult;
use crate::pipeline::input::UploadedFile;
use crate::pipeline::locate::locate_qr;
use crate::pipeline::render::PdfRenderer;
use tracing::{debug, warn};

/// Scan an uploaded file for a QR code. Never fails; errors land in
/// [`ScanResult::error`] as `Invalid PDF`, `Invalid Image` or
/// `Unknown error: …`.
pub async fn scan_file(file: &UploadedFile, config: &VerifierConfig) -> ScanResult {
    match scan_inner(file, config).await {
        Ok(text) => {
            debug!("Scan succeeded: {} chars", text.len());
            ScanResult::found(text)
        }
        Err(e) => {
            warn!("Scan failed: {}", e);
            ScanResult::failed(e.scan_bucket())
        }
    }
}

async fn scan_inner(file: &UploadedFile, config: &VerifierConfig) -> Result<String, VerifyError> {
    if file.is_pdf() {
        debug!("Scanning as PDF ({} bytes)", file.size());
        return PdfRenderer::from_config(config)
            .scan(file.bytes.clone(), QR_FORMAT_LABEL)
            .await;
    }

    debug!("Scanning as image '{}' ({} bytes)", file.mime_type, file.size());
    let bytes = file.bytes.clone();
    let found = tokio::task::spawn_blocking(move || locate_qr(&bytes, QR_FORMAT_LABEL, false))
        .await
        .map_err(|e| VerifyError::Internal(format!("Scan task panicked: {e}")))??;

    found.ok_or_else(|| VerifyError::NoQrFound {
        format: QR_FORMAT_LABEL.to_string(),
    })
}
