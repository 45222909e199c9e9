//! Configuration types for credential scanning and verification.
//!
//! All pipeline behaviour is controlled through [`VerifierConfig`], built via
//! its [`VerifierConfigBuilder`]. The config is immutable once built and is
//! shared by reference across calls; nothing in it is mutated at runtime, so
//! concurrent verifications never observe each other.

use crate::error::VerifyError;
use crate::transport::HttpTransport;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Prefix marking a QR payload as an indirection URL rather than an inline
/// credential.
pub const INDIRECTION_PREFIX: &str = "INJI_OVP://";

/// Human-readable symbol label used in "No … found" errors.
pub const QR_FORMAT_LABEL: &str = "QRCode";

/// Bounds applied by [`VerifierConfigBuilder::max_rendered_pixels`].
pub const MIN_RENDERED_PIXELS: u32 = 100;
pub const MAX_RENDERED_PIXELS: u32 = 20_000;

/// Configuration for a verification run.
///
/// # Example
/// ```rust
/// use vc_qr_verify::{PageHitPolicy, VerifierConfig};
///
/// let config = VerifierConfig::builder()
///     .min_file_size(100)
///     .page_policy(PageHitPolicy::FirstHit)
///     .verify_timeout_secs(10)
///     .build()
///     .unwrap();
/// assert_eq!(config.limits.min, 100);
/// ```
#[derive(Clone)]
pub struct VerifierConfig {
    /// Accepted upload size window in bytes. Default: 1000–7 000 000.
    pub limits: UploadLimits,

    /// Lower-cased file extensions accepted by the validator.
    /// Default: jpg, jpeg, png, gif, pdf.
    pub allowed_extensions: Vec<String>,

    /// Reject files that fail the validator before scanning. Default: true.
    pub enforce_file_checks: bool,

    /// Optional header envelope wrapped around the QR payload.
    /// Default: no envelope (empty delimiter).
    pub envelope: EnvelopeFormat,

    /// Upscale factor applied when rasterising PDF pages. Range: 0.5–8.0. Default: 3.0.
    ///
    /// QR modules in a printed certificate are small; rendering at 72 DPI
    /// leaves them a pixel or two wide, which the detector cannot resolve.
    pub render_scale: f32,

    /// Cap on either dimension of a rendered PDF page, in pixels. Default: 6000.
    pub max_rendered_pixels: u32,

    /// Which hit wins when several PDF pages carry a QR code. Default: [`PageHitPolicy::LastHit`].
    pub page_policy: PageHitPolicy,

    /// Explicit path to the pdfium shared library. If None, the system library is used.
    pub pdfium_library_path: Option<PathBuf>,

    /// Timeout for fetching an indirection resource, in seconds. Default: 30.
    pub fetch_timeout_secs: u64,

    /// Timeout for the verification POST, in seconds. Default: 30.
    pub verify_timeout_secs: u64,

    /// Timeout for opening and rendering a PDF, in seconds. Default: 60.
    pub pdf_load_timeout_secs: u64,

    /// Pre-constructed HTTP transport. If None, a reqwest client is built per call.
    pub transport: Option<Arc<dyn HttpTransport>>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            limits: UploadLimits::default(),
            allowed_extensions: ["jpg", "jpeg", "png", "gif", "pdf"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            enforce_file_checks: true,
            envelope: EnvelopeFormat::default(),
            render_scale: 3.0,
            max_rendered_pixels: 6000,
            page_policy: PageHitPolicy::default(),
            pdfium_library_path: None,
            fetch_timeout_secs: 30,
            verify_timeout_secs: 30,
            pdf_load_timeout_secs: 60,
            transport: None,
        }
    }
}

impl fmt::Debug for VerifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifierConfig")
            .field("limits", &self.limits)
            .field("allowed_extensions", &self.allowed_extensions)
            .field("enforce_file_checks", &self.enforce_file_checks)
            .field("envelope", &self.envelope)
            .field("render_scale", &self.render_scale)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("page_policy", &self.page_policy)
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("verify_timeout_secs", &self.verify_timeout_secs)
            .field("pdf_load_timeout_secs", &self.pdf_load_timeout_secs)
            .field(
                "transport",
                &self.transport.as_ref().map(|_| "<dyn HttpTransport>"),
            )
            .finish()
    }
}

impl VerifierConfig {
    /// Create a new builder for `VerifierConfig`.
    pub fn builder() -> VerifierConfigBuilder {
        VerifierConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`VerifierConfig`].
#[derive(Debug)]
pub struct VerifierConfigBuilder {
    config: VerifierConfig,
}

impl VerifierConfigBuilder {
    pub fn min_file_size(mut self, bytes: u64) -> Self {
        self.config.limits.min = bytes;
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.limits.max = bytes;
        self
    }

    pub fn allowed_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_extensions = exts
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    pub fn enforce_file_checks(mut self, v: bool) -> Self {
        self.config.enforce_file_checks = v;
        self
    }

    pub fn envelope(mut self, envelope: EnvelopeFormat) -> Self {
        self.config.envelope = envelope;
        self
    }

    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = scale.clamp(0.5, 8.0);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.clamp(MIN_RENDERED_PIXELS, MAX_RENDERED_PIXELS);
        self
    }

    pub fn page_policy(mut self, policy: PageHitPolicy) -> Self {
        self.config.page_policy = policy;
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    pub fn verify_timeout_secs(mut self, secs: u64) -> Self {
        self.config.verify_timeout_secs = secs;
        self
    }

    pub fn pdf_load_timeout_secs(mut self, secs: u64) -> Self {
        self.config.pdf_load_timeout_secs = secs;
        self
    }

    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.config.transport = Some(transport);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<VerifierConfig, VerifyError> {
        let c = &self.config;
        if c.limits.min > c.limits.max {
            return Err(VerifyError::InvalidConfig(format!(
                "minimum file size {} exceeds maximum {}",
                c.limits.min, c.limits.max
            )));
        }
        if c.allowed_extensions.is_empty() {
            return Err(VerifyError::InvalidConfig(
                "at least one file extension must be allowed".into(),
            ));
        }
        if !c.render_scale.is_finite() || c.render_scale <= 0.0 {
            return Err(VerifyError::InvalidConfig(format!(
                "render scale must be positive, got {}",
                c.render_scale
            )));
        }
        if c.fetch_timeout_secs == 0 || c.verify_timeout_secs == 0 || c.pdf_load_timeout_secs == 0
        {
            return Err(VerifyError::InvalidConfig("timeouts must be ≥ 1s".into()));
        }
        Ok(self.config)
    }
}

// ── Value types ──────────────────────────────────────────────────────────

/// Inclusive upload size window, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadLimits {
    pub min: u64,
    pub max: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            min: 1000,
            max: 7_000_000,
        }
    }
}

impl UploadLimits {
    pub fn contains(&self, size: u64) -> bool {
        size >= self.min && size <= self.max
    }
}

/// A `header<delimiter>body` wrapper around the QR payload.
///
/// With an empty delimiter (the default) the payload is used as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeFormat {
    pub delimiter: String,
    pub supported_headers: Vec<String>,
}

impl EnvelopeFormat {
    pub fn new(delimiter: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            delimiter: delimiter.into(),
            supported_headers: headers.iter().map(|h| h.to_string()).collect(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.delimiter.is_empty()
    }
}

/// Which QR hit wins when a multi-page PDF carries more than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageHitPolicy {
    /// Scan every page; the last page with a QR code wins. (default)
    #[default]
    LastHit,
    /// Stop at the first page with a QR code.
    FirstHit,
}
