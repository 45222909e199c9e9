//! Pipeline stages for QR credential verification.
//!
//! Each submodule implements exactly one step, so each is independently
//! testable and the external collaborators (image decoder, QR detector,
//! pdfium, HTTP) sit behind one module apiece.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ scan ──┬─▶ locate          ──▶ resolve ──▶ submit
//! (validate)       └─▶ render ─▶ locate     (decode)   (POST)
//!                      (pdfium)
//! ```
//!
//! 1. [`input`]   — uploaded file metadata and the size/extension validator
//! 2. [`scan`]    — dispatch on MIME type and bucket scan failures
//! 3. [`render`]  — rasterise PDF pages; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 4. [`locate`]  — decode an image and find the QR symbol in it
//! 5. [`decode`]  — unwrap the QR payload (envelope, ZIP, base45 + zlib)
//! 6. [`resolve`] — inline credential or indirection-URL fetch
//! 7. [`submit`]  — POST the credential to the verification endpoint

pub mod decode;
pub mod input;
pub mod locate;
pub mod render;
pub mod resolve;
pub mod scan;
pub mod submit;
