//! Uploaded files and the pre-scan file validator.
//!
//! An [`UploadedFile`] is the caller's blob plus the metadata the pipeline
//! branches on: the declared MIME type (scan dispatch) and the file name
//! (extension allow-list). Nothing here touches the file contents beyond
//! their length.

use crate::config::UploadLimits;
use crate::error::VerifyError;
use std::path::Path;
use tracing::debug;

pub const PDF_MIME: &str = "application/pdf";

/// A caller-supplied file, held in memory for the duration of one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: Option<String>,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: Some(name.into()),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Build an upload whose MIME type is inferred from the name's extension.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime = mime_for_name(&name).to_string();
        Self::new(name, mime, bytes)
    }

    /// Read a file from disk, inferring its MIME type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, VerifyError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| VerifyError::InvalidFile {
            detail: format!("cannot read '{}': {e}", path.display()),
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!("Loaded {} ({} bytes)", path.display(), bytes.len());
        Ok(Self::from_bytes(name, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lower-cased substring after the final `.` of the name.
    ///
    /// A name without a dot yields the whole name, as a browser upload form
    /// would; a missing name yields `None`.
    pub fn extension(&self) -> Option<String> {
        self.name.as_deref().filter(|n| !n.is_empty()).map(extension_of)
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == PDF_MIME
    }
}

fn extension_of(name: &str) -> String {
    match name.rfind('.') {
        Some(i) => name[i + 1..].to_lowercase(),
        None => name.to_lowercase(),
    }
}

/// Best-effort MIME type for a file name; unknown extensions map to
/// `application/octet-stream` and are scanned as images.
pub fn mime_for_name(name: &str) -> &'static str {
    match extension_of(name).as_str() {
        "pdf" => PDF_MIME,
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Check the upload against the size window and extension allow-list.
pub fn validate_file(file: &UploadedFile, limits: &UploadLimits, allowed: &[String]) -> bool {
    if !limits.contains(file.size()) {
        debug!(
            "Rejecting upload: size {} outside {}–{}",
            file.size(),
            limits.min,
            limits.max
        );
        return false;
    }
    match file.extension() {
        Some(ext) => {
            let ok = allowed.iter().any(|a| a == &ext);
            if !ok {
                debug!("Rejecting upload: extension '{}' not allowed", ext);
            }
            ok
        }
        None => false,
    }
}
