//! One HTTP exchange with the array.
//!
//! [`Transport`] is the seam between the session layer and the wire: it
//! sends a fully composed [`TransportRequest`] and hands back the raw
//! status and body. Turning that into a [`crate::ResultEnvelope`] is the
//! session's job. [`HttpTransport`] is the `reqwest` implementation.

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::codes::TOKEN_HEADER;
use crate::error::{RestError, Result};

/// HTTP method of an array request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Read.
    Get,
    /// Create or invoke.
    Post,
    /// Modify.
    Put,
    /// Remove.
    Delete,
}

impl HttpMethod {
    /// Upper-case method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request ready to go on the wire.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Full URL, base and path joined.
    pub url: String,
    /// Session token; `None` for a fresh, unauthenticated context.
    pub token: Option<String>,
    /// JSON body; sent only when present.
    pub body: Option<Value>,
    /// Whole-request timeout.
    pub timeout: Duration,
}

/// Raw HTTP reply.
#[derive(Debug, Clone)]
pub struct TransportReply {
    /// HTTP status code.
    pub status: u16,
    /// Canonical reason phrase of `status`.
    pub reason: String,
    /// Raw body text, parsed by the session.
    pub body: String,
}

impl TransportReply {
    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced an HTTP reply.
#[derive(Debug, Error)]
pub enum TransportError {
    /// TCP or TLS connection could not be established.
    #[error("connection to {url} failed: {reason}")]
    Connect { url: String, reason: String },

    /// No reply within the request timeout.
    #[error("request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    /// Any other client-side failure.
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },
}

/// Sends one request to the array.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn execute(&self, request: TransportRequest) -> std::result::Result<TransportReply, TransportError>;
}

/// TLS settings for [`HttpTransport`].
#[derive(Debug, Clone, Default)]
pub struct TlsOptions {
    /// Verify the array certificate against `ca_path`.
    pub verify: bool,
    /// PEM bundle of trusted CA certificates.
    pub ca_path: Option<std::path::PathBuf>,
}

/// `reqwest` backed transport sharing one keep-alive connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build the pooled client described by `tls`.
    pub fn new(tls: &TlsOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder().tcp_keepalive(Duration::from_secs(60));

        if tls.verify {
            let path = tls.ca_path.as_deref().ok_or_else(|| {
                RestError::Config("certificate verification needs a CA path".into())
            })?;
            // Only the configured bundle is trusted, not the system roots.
            builder = builder.tls_built_in_root_certs(false);
            for cert in load_certificates(path)? {
                builder = builder.add_root_certificate(cert);
            }
        } else {
            tracing::warn!("array certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| RestError::HttpSetup(e.to_string()))?;
        Ok(Self { client })
    }
}

/// Every certificate in the PEM bundle at `path`.
fn load_certificates(path: &Path) -> Result<Vec<reqwest::Certificate>> {
    let pem = std::fs::read(path)?;
    let certs = reqwest::Certificate::from_pem_bundle(&pem)
        .map_err(|e| RestError::Config(format!("bad CA file {}: {}", path.display(), e)))?;
    if certs.is_empty() {
        return Err(RestError::Config(format!(
            "CA file {} holds no certificate",
            path.display()
        )));
    }
    Ok(certs)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: TransportRequest) -> std::result::Result<TransportReply, TransportError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .timeout(request.timeout)
            .header(reqwest::header::CONNECTION, "keep-alive")
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(ref token) = request.token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        if let Some(ref body) = request.body {
            builder = builder.body(body.to_string());
        }

        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                TransportError::Timeout {
                    url: request.url.clone(),
                    timeout_ms: request.timeout.as_millis() as u64,
                }
            } else if e.is_connect() {
                TransportError::Connect {
                    url: request.url.clone(),
                    reason: e.to_string(),
                }
            } else {
                TransportError::Request {
                    url: request.url.clone(),
                    reason: e.to_string(),
                }
            }
        };

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        let body = response.text().await.map_err(classify)?;

        Ok(TransportReply {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

const SECRET_KEYS: [&str; 4] = ["password", "username", "ibasetoken", "token"];

/// Copy of `value` with credential and token fields masked, for logging.
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let lowered = k.to_ascii_lowercase();
                    if SECRET_KEYS.iter().any(|s| lowered.contains(s)) {
                        (k.clone(), Value::String("***".into()))
                    } else {
                        (k.clone(), redact(v))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_names() {
        assert_eq!(HttpMethod::Get.to_string(), "GET");
        assert_eq!(HttpMethod::Delete.as_str(), "DELETE");
    }

    #[test]
    fn test_redact_masks_nested_secrets() {
        let body = json!({
            "username": "admin",
            "password": "Admin@123",
            "scope": "0",
            "items": [{"iBaseToken": "abc", "NAME": "fs0"}],
        });
        let masked = redact(&body);
        assert_eq!(masked["username"], "***");
        assert_eq!(masked["password"], "***");
        assert_eq!(masked["scope"], "0");
        assert_eq!(masked["items"][0]["iBaseToken"], "***");
        assert_eq!(masked["items"][0]["NAME"], "fs0");
    }

    #[test]
    fn test_reply_success_range() {
        let ok = TransportReply { status: 204, reason: "No Content".into(), body: String::new() };
        let bad = TransportReply { status: 401, reason: "Unauthorized".into(), body: String::new() };
        assert!(ok.is_success());
        assert!(!bad.is_success());
    }

    fn fixture(name: &str) -> std::path::PathBuf {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    #[test]
    fn test_ca_bundle_loads_every_certificate() {
        let certs = load_certificates(&fixture("ca-bundle.pem")).unwrap();
        assert_eq!(certs.len(), 2);
    }

    #[test]
    fn test_verify_with_ca_bundle_builds() {
        let tls = TlsOptions {
            verify: true,
            ca_path: Some(fixture("ca-bundle.pem")),
        };
        assert!(HttpTransport::new(&tls).is_ok());
    }

    #[test]
    fn test_ca_file_without_certificate_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pem");
        std::fs::write(&path, "not a certificate\n").unwrap();

        let err = load_certificates(&path).unwrap_err();

        assert!(matches!(err, RestError::Config(ref msg) if msg.contains("no certificate")));
    }

    #[test]
    fn test_verify_without_ca_path_is_rejected() {
        let err = HttpTransport::new(&TlsOptions { verify: true, ca_path: None }).unwrap_err();
        assert!(matches!(err, RestError::Config(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let transport = HttpTransport::new(&TlsOptions::default()).unwrap();
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = transport
            .execute(TransportRequest {
                method: HttpMethod::Get,
                url: format!("http://{}/deviceManager/rest/xx/sessions", addr),
                token: None,
                body: None,
                timeout: Duration::from_secs(2),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. } | TransportError::Request { .. }));
    }
}
