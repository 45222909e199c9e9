#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use qrcode::{Color, QrCode};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use vc_qr_verify::{HttpTransport, VerifierConfig, VerifyError};

/// Route library logs to the test harness; `RUST_LOG=debug` shows them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub const VERIFY_URL: &str = "https://verify.example/v1/verify/vc-verification";

pub fn sample_credential() -> Value {
    json!({
        "@context": ["https://www.w3.org/2018/credentials/v1"],
        "type": ["VerifiableCredential", "InsuranceCredential"],
        "issuer": "did:web:issuer.example",
        "credentialSubject": { "fullName": "Test Holder", "policyNumber": "5555" }
    })
}

// ── QR fixtures ──────────────────────────────────────────────────────────────

pub fn qr_image(text: &str) -> DynamicImage {
    let code = QrCode::new(text.as_bytes()).expect("payload fits in a QR code");
    let modules = code.width() as u32;
    let (px, quiet) = (6u32, 4u32);
    let side = (modules + 2 * quiet) * px;
    DynamicImage::ImageLuma8(GrayImage::from_fn(side, side, |x, y| {
        let mx = (x / px) as i64 - quiet as i64;
        let my = (y / px) as i64 - quiet as i64;
        let inside = mx >= 0 && my >= 0 && (mx as u32) < modules && (my as u32) < modules;
        if inside && code[(mx as usize, my as usize)] == Color::Dark {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    }))
}

pub fn png(img: &DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("png encode");
    buf
}

pub fn qr_png(text: &str) -> Vec<u8> {
    png(&qr_image(text))
}

pub fn blank_png() -> Vec<u8> {
    png(&DynamicImage::ImageLuma8(GrayImage::from_pixel(
        240,
        240,
        Luma([255u8]),
    )))
}

// ── Stub transport ───────────────────────────────────────────────────────────

/// Deterministic in-memory endpoint that records every request.
#[derive(Default)]
pub struct StubTransport {
    pub resources: HashMap<String, Value>,
    pub verdict: Option<Value>,
    pub gets: Mutex<Vec<String>>,
    pub posts: Mutex<Vec<(String, String)>>,
}

impl StubTransport {
    pub fn verifying(verdict: &str) -> Self {
        Self {
            verdict: Some(json!({ "verificationStatus": verdict })),
            ..Default::default()
        }
    }

    pub fn with_resource(mut self, url: &str, body: Value) -> Self {
        self.resources.insert(url.to_string(), body);
        self
    }

    pub fn get_count(&self) -> usize {
        self.gets.lock().unwrap().len()
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn get_json(&self, url: &str) -> Result<Value, VerifyError> {
        self.gets.lock().unwrap().push(url.to_string());
        self.resources
            .get(url)
            .cloned()
            .ok_or_else(|| VerifyError::FetchFailed {
                url: url.to_string(),
                status: 404,
            })
    }

    async fn post_json(&self, url: &str, body: String) -> Result<Value, VerifyError> {
        self.posts.lock().unwrap().push((url.to_string(), body));
        self.verdict
            .clone()
            .ok_or_else(|| VerifyError::VerificationRequestFailed("connection refused".into()))
    }
}

/// Config routed through `stub`; the size floor is lifted because small
/// generated PNGs fall under the default 1000-byte minimum.
pub fn config_with(stub: &Arc<StubTransport>) -> VerifierConfig {
    VerifierConfig::builder()
        .min_file_size(0)
        .transport(stub.clone())
        .build()
        .expect("valid config")
}
