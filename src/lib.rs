//! # vc-qr-verify
//!
//! Extract a verifiable credential from the QR code printed on an image or
//! PDF certificate, decode it, and submit it to a verification endpoint.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload
//!  │
//!  ├─ 1. Validate  size window + extension allow-list
//!  ├─ 2. Scan      image → rqrr, or PDF → pdfium pages → rqrr
//!  ├─ 3. Resolve   INJI_OVP:// indirection fetch, or inline payload
//!  │               (header envelope / ZIP / base45 + zlib + CBOR)
//!  ├─ 4. Verify    POST credential JSON to the caller's endpoint
//!  └─ 5. Outcome   { status, data, error }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vc_qr_verify::{verify_from_file, UploadedFile, VerifierConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let file = UploadedFile::from_path("certificate.png").await?;
//!     let outcome = verify_from_file(
//!         &file,
//!         "https://verify.example/v1/verify/vc-verification",
//!         &VerifierConfig::default(),
//!     )
//!     .await;
//!     println!("{}", serde_json::to_string_pretty(&outcome)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `vcverify` binary (clap + anyhow + tracing-subscriber) |
//!
//! PDF scanning needs a pdfium shared library at runtime: either on the
//! system library path or named by
//! [`VerifierConfigBuilder::pdfium_library_path`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod transport;
pub mod verify;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    EnvelopeFormat, PageHitPolicy, UploadLimits, VerifierConfig, VerifierConfigBuilder,
    INDIRECTION_PREFIX,
};
pub use error::VerifyError;
pub use output::{ScanResult, VerificationOutcome, VerificationStatus};
pub use pipeline::decode::{decode_payload, encode_payload};
pub use pipeline::input::{validate_file, UploadedFile};
pub use pipeline::scan::scan_file;
pub use transport::{HttpTransport, ReqwestTransport};
pub use verify::{
    verify_from_file, verify_from_file_sync, verify_from_qr_text, verify_from_qr_text_sync,
};
