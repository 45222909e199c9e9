//! Payload decoding: turn the raw QR bytes into credential JSON text.
//!
//! Three envelope shapes are recognised, checked in this order:
//!
//! 1. **Header envelope**: `header<delimiter>body`, only when a delimiter is
//!    configured. An unknown header or a malformed split yields `Ok(None)`.
//! 2. **Binary ZIP**: bytes whose lossy UTF-8 text starts with `PK` are a
//!    ZIP archive carrying `certificate.json`.
//! 3. **Transit text**: base45 over zlib; the inflated bytes are either JSON
//!    text or a CBOR document, which is converted to JSON.
//!
//! `Ok(None)` means "nothing to decode" and is distinct from
//! [`VerifyError::DecodeFailed`].

use crate::config::EnvelopeFormat;
use crate::error::VerifyError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ciborium::Value as CborValue;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde_json::{Map, Number, Value};
use std::io::{Cursor, Read, Write};
use tracing::debug;

/// Leading bytes of a ZIP local file header.
pub const ZIP_HEADER: &str = "PK";

/// Archive entry holding the credential inside a binary envelope.
pub const ZIP_CREDENTIAL_ENTRY: &str = "certificate.json";

/// Decode a raw QR payload into credential JSON text.
pub fn decode_payload(
    bytes: &[u8],
    envelope: &EnvelopeFormat,
) -> Result<Option<String>, VerifyError> {
    if bytes.is_empty() {
        return Ok(None);
    }

    let body = if envelope.is_enabled() {
        match split_envelope(bytes, envelope) {
            Some(body) => body,
            None => {
                debug!("Unsupported QR envelope; nothing decoded");
                return Ok(None);
            }
        }
    } else {
        bytes
    };

    let text = String::from_utf8_lossy(body);
    if text.starts_with(ZIP_HEADER) {
        debug!("Binary ZIP envelope ({} bytes)", body.len());
        return decode_binary(body).map(Some);
    }

    debug!("Transit-encoded payload ({} chars)", text.len());
    decode_text(&text).map(Some)
}

/// Encode credential JSON as base45(zlib(json)), the inverse of the transit
/// branch of [`decode_payload`].
pub fn encode_payload(json: &str) -> Result<String, VerifyError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(json.as_bytes())
        .and_then(|_| encoder.finish())
        .map(|compressed| base45::encode(compressed))
        .map_err(|e| VerifyError::Internal(format!("zlib: {e}")))
}

fn split_envelope<'a>(bytes: &'a [u8], envelope: &EnvelopeFormat) -> Option<&'a [u8]> {
    let delim = envelope.delimiter.as_bytes();
    let pos = find_subslice(bytes, delim)?;
    let header = &bytes[..pos];
    let rest = &bytes[pos + delim.len()..];

    // Exactly two parts: a second delimiter means a malformed envelope.
    if find_subslice(rest, delim).is_some() {
        return None;
    }

    let header = std::str::from_utf8(header).ok()?;
    if !envelope.supported_headers.iter().any(|h| h == header) {
        return None;
    }
    Some(rest)
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn decode_binary(bytes: &[u8]) -> Result<String, VerifyError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| VerifyError::DecodeFailed(format!("ZIP envelope: {e}")))?;
    let mut entry = archive.by_name(ZIP_CREDENTIAL_ENTRY).map_err(|e| {
        VerifyError::DecodeFailed(format!("ZIP envelope has no {ZIP_CREDENTIAL_ENTRY}: {e}"))
    })?;
    let mut out = String::new();
    entry
        .read_to_string(&mut out)
        .map_err(|e| VerifyError::DecodeFailed(format!("reading {ZIP_CREDENTIAL_ENTRY}: {e}")))?;
    Ok(out)
}

fn decode_text(text: &str) -> Result<String, VerifyError> {
    let compressed = base45::decode(text)
        .map_err(|e| VerifyError::DecodeFailed(format!("base45: {e:?}")))?;

    let mut inflated = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .read_to_end(&mut inflated)
        .map_err(|e| VerifyError::DecodeFailed(format!("zlib: {e}")))?;

    if let Ok(s) = std::str::from_utf8(&inflated) {
        if serde_json::from_str::<Value>(s).is_ok() {
            return Ok(s.to_string());
        }
    }

    if let Ok(doc) = ciborium::from_reader::<CborValue, _>(inflated.as_slice()) {
        if matches!(doc, CborValue::Map(_) | CborValue::Array(_)) {
            debug!("Inflated payload is CBOR; converting to JSON");
            return Ok(cbor_to_json(doc).to_string());
        }
    }

    String::from_utf8(inflated).map_err(|_| {
        VerifyError::DecodeFailed("inflated payload is neither UTF-8 text nor CBOR".into())
    })
}

/// Convert a CBOR value to JSON. Byte strings become base64; non-text map
/// keys are stringified.
fn cbor_to_json(value: CborValue) -> Value {
    match value {
        CborValue::Null => Value::Null,
        CborValue::Bool(b) => Value::Bool(b),
        CborValue::Text(s) => Value::String(s),
        CborValue::Integer(i) => {
            let n = i128::from(i);
            if let Ok(v) = i64::try_from(n) {
                Value::from(v)
            } else if let Ok(v) = u64::try_from(n) {
                Value::from(v)
            } else {
                Value::String(n.to_string())
            }
        }
        CborValue::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        CborValue::Bytes(b) => Value::String(STANDARD.encode(b)),
        CborValue::Tag(_, inner) => cbor_to_json(*inner),
        CborValue::Array(items) => Value::Array(items.into_iter().map(cbor_to_json).collect()),
        CborValue::Map(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (k, v) in entries {
                let key = match k {
                    CborValue::Text(s) => s,
                    other => match cbor_to_json(other) {
                        Value::String(s) => s,
                        v => v.to_string(),
                    },
                };
                map.insert(key, cbor_to_json(v));
            }
            Value::Object(map)
        }
        _ => Value::Null,
    }
}
