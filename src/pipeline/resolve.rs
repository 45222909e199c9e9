//! Credential resolution: scanned text → credential JSON.
//!
//! Two mutually exclusive paths, chosen by a literal prefix on the raw text:
//!
//! * `INJI_OVP://<url>`: the QR code points at the credential. The `resource`
//!   query parameter of `<url>` is fetched and its `credential` field used.
//!   No local payload decoding happens on this path.
//! * anything else: the text itself carries the credential and goes through
//!   [`decode_payload`].

use crate::config::{EnvelopeFormat, INDIRECTION_PREFIX};
use crate::error::VerifyError;
use crate::pipeline::decode::decode_payload;
use crate::transport::HttpTransport;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, info};

/// Resolve the credential referenced or carried by `raw_text`.
///
/// Every failure is reported as [`VerifyError::CredentialResolutionFailed`].
pub async fn resolve_credential(
    raw_text: &str,
    envelope: &EnvelopeFormat,
    transport: &dyn HttpTransport,
) -> Result<Value, VerifyError> {
    let resolved = match raw_text.strip_prefix(INDIRECTION_PREFIX) {
        Some(inner) => resolve_indirection(inner, transport).await,
        None => resolve_inline(raw_text, envelope),
    };
    resolved.map_err(VerifyError::into_resolution_failure)
}

/// Extract the `resource` query parameter from an indirection URL.
pub fn indirection_resource(inner_url: &str) -> Result<String, VerifyError> {
    let url = Url::parse(inner_url).map_err(|e| {
        VerifyError::CredentialResolutionFailed(format!("invalid indirection URL '{inner_url}': {e}"))
    })?;
    url.query_pairs()
        .find(|(k, _)| k == "resource")
        .map(|(_, v)| v.into_owned())
        .ok_or_else(|| {
            VerifyError::CredentialResolutionFailed(format!(
                "indirection URL '{inner_url}' has no resource parameter"
            ))
        })
}

async fn resolve_indirection(
    inner_url: &str,
    transport: &dyn HttpTransport,
) -> Result<Value, VerifyError> {
    let resource = indirection_resource(inner_url)?;
    info!("Fetching credential from {}", resource);

    let mut body = transport.get_json(&resource).await?;
    match body.get_mut("credential").map(Value::take) {
        Some(Value::Null) | None => Err(VerifyError::CredentialResolutionFailed(format!(
            "response from '{resource}' has no credential field"
        ))),
        Some(credential) => Ok(credential),
    }
}

fn resolve_inline(raw_text: &str, envelope: &EnvelopeFormat) -> Result<Value, VerifyError> {
    debug!("Decoding inline payload ({} bytes)", raw_text.len());
    let decoded = decode_payload(raw_text.as_bytes(), envelope)?.ok_or_else(|| {
        VerifyError::CredentialResolutionFailed("QR payload carries no decodable credential".into())
    })?;
    serde_json::from_str(&decoded).map_err(|e| {
        VerifyError::CredentialResolutionFailed(format!("decoded payload is not JSON: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::decode::encode_payload;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        gets: Mutex<Vec<String>>,
        reply: Option<Value>,
        status: Option<u16>,
    }

    #[async_trait]
    impl HttpTransport for Recorder {
        async fn get_json(&self, url: &str) -> Result<Value, VerifyError> {
            self.gets.lock().unwrap().push(url.to_string());
            if let Some(status) = self.status {
                return Err(VerifyError::FetchFailed {
                    url: url.to_string(),
                    status,
                });
            }
            Ok(self.reply.clone().unwrap_or(Value::Null))
        }
        async fn post_json(&self, _: &str, _: String) -> Result<Value, VerifyError> {
            unreachable!("resolver never POSTs")
        }
    }

    #[test]
    fn resource_parameter_extraction() {
        let r = indirection_resource(
            "https://wallet.example/authorize?client_id=v&resource=https%3A%2F%2Fissuer.example%2Fvc%2F42",
        )
        .unwrap();
        assert_eq!(r, "https://issuer.example/vc/42");
        assert!(indirection_resource("https://wallet.example/authorize?x=1").is_err());
        assert!(indirection_resource("not a url").is_err());
    }

    #[tokio::test]
    async fn indirection_fetches_exact_resource() {
        let t = Recorder {
            reply: Some(json!({"credential": {"id": "vc-42"}})),
            ..Default::default()
        };
        let cred = resolve_credential(
            "INJI_OVP://https://wallet.example/?resource=https://issuer.example/vc/42",
            &EnvelopeFormat::default(),
            &t,
        )
        .await
        .unwrap();
        assert_eq!(cred, json!({"id": "vc-42"}));
        assert_eq!(*t.gets.lock().unwrap(), vec!["https://issuer.example/vc/42"]);
    }

    #[tokio::test]
    async fn indirection_non_2xx_is_resolution_failure() {
        let t = Recorder {
            status: Some(404),
            ..Default::default()
        };
        let err = resolve_credential(
            "INJI_OVP://https://wallet.example/?resource=https://issuer.example/missing",
            &EnvelopeFormat::default(),
            &t,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, VerifyError::CredentialResolutionFailed(_)));
        assert!(err.to_string().contains("404"), "got: {err}");
    }

    #[tokio::test]
    async fn indirection_without_credential_field_fails() {
        let t = Recorder {
            reply: Some(json!({"other": 1})),
            ..Default::default()
        };
        let err = resolve_credential(
            "INJI_OVP://https://wallet.example/?resource=https://issuer.example/vc",
            &EnvelopeFormat::default(),
            &t,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("no credential field"), "got: {err}");
    }

    #[tokio::test]
    async fn inline_path_never_fetches() {
        let t = Recorder::default();
        let text = encode_payload(r#"{"id":"inline"}"#).unwrap();
        let cred = resolve_credential(&text, &EnvelopeFormat::default(), &t)
            .await
            .unwrap();
        assert_eq!(cred, json!({"id": "inline"}));
        assert!(t.gets.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn inline_non_json_fails() {
        let t = Recorder::default();
        let text = encode_payload("just words").unwrap();
        let err = resolve_credential(&text, &EnvelopeFormat::default(), &t)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not JSON"), "got: {err}");
    }

    #[tokio::test]
    async fn inline_unsupported_envelope_fails() {
        let t = Recorder::default();
        let env = EnvelopeFormat::new("~", &["VC1"]);
        let err = resolve_credential("XX~ABC", &env, &t).await.unwrap_err();
        assert!(err.to_string().contains("no decodable credential"), "got: {err}");
    }
}
