//! Array connection settings, loaded from TOML or JSON.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::codes::{
    ReservedCodes, DEFAULT_LOGIN_TIMEOUT, DEFAULT_MAX_CONCURRENT_REQUESTS, DEFAULT_PAGE_SIZE,
    DEFAULT_REQUEST_TIMEOUT,
};
use crate::credentials::Credentials;
use crate::error::{RestError, Result};

/// Connection settings for one storage array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrayConfig {
    /// Candidate REST endpoints, tried in order at login.
    #[serde(deserialize_with = "deserialize_rest_urls")]
    pub rest_urls: Vec<String>,
    /// Plain text or `!$$$` obfuscated.
    pub username: String,
    /// Plain text or `!$$$` obfuscated.
    pub password: String,
    /// Verify the array certificate against `ssl_cert_path` only.
    pub ssl_cert_verify: bool,
    /// PEM bundle of trusted CA certificates.
    pub ssl_cert_path: Option<PathBuf>,
    /// Seconds before an ordinary request is abandoned.
    pub request_timeout_secs: u64,
    /// Seconds before a login attempt moves to the next endpoint.
    pub login_timeout_secs: u64,
    /// Upper bound on requests in flight at once.
    pub max_concurrent_requests: usize,
    /// Items per window for paged listings.
    pub page_size: usize,
    /// Session-level result codes, overridable per firmware.
    pub codes: ReservedCodes,
}

impl Default for ArrayConfig {
    fn default() -> Self {
        Self {
            rest_urls: Vec::new(),
            username: String::new(),
            password: String::new(),
            ssl_cert_verify: false,
            ssl_cert_path: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            login_timeout_secs: DEFAULT_LOGIN_TIMEOUT.as_secs(),
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            page_size: DEFAULT_PAGE_SIZE,
            codes: ReservedCodes::default(),
        }
    }
}

impl ArrayConfig {
    /// Load and validate a config file; the format follows the extension.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        let config: ArrayConfig = match ext.to_lowercase().as_str() {
            "toml" => toml::from_str(&contents)?,
            "json" => serde_json::from_str(&contents)?,
            _ => anyhow::bail!("Unsupported config file extension: {}", ext),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the session layer cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.rest_urls.is_empty() {
            return Err(RestError::Config("rest_urls is not configured".into()));
        }
        if self.username.trim().is_empty() {
            return Err(RestError::Config("username is not configured".into()));
        }
        if self.password.trim().is_empty() {
            return Err(RestError::Config("password is not configured".into()));
        }
        if self.ssl_cert_verify && self.ssl_cert_path.is_none() {
            return Err(RestError::Config(
                "ssl_cert_verify is enabled but ssl_cert_path is not set".into(),
            ));
        }
        if self.max_concurrent_requests == 0 {
            return Err(RestError::Config("max_concurrent_requests must be positive".into()));
        }
        if self.page_size == 0 {
            return Err(RestError::Config("page_size must be positive".into()));
        }
        Ok(())
    }

    /// Credentials with surrounding whitespace trimmed, still encoded.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.trim(), self.password.trim())
    }

    /// Configured request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Configured login timeout per endpoint.
    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }
}

/// Trim, drop empties and duplicates (first occurrence wins) and make every
/// endpoint end with `/` so the login path can be appended directly.
pub fn normalize_rest_urls<I, S>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for url in urls {
        let url = url.as_ref().trim();
        if url.is_empty() {
            continue;
        }
        let url = if url.ends_with('/') {
            url.to_string()
        } else {
            format!("{}/", url)
        };
        if !out.contains(&url) {
            out.push(url);
        }
    }
    out
}

fn deserialize_rest_urls<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RestUrls {
        Joined(String),
        List(Vec<String>),
    }

    Ok(match RestUrls::deserialize(deserializer)? {
        RestUrls::Joined(s) => normalize_rest_urls(s.split(';')),
        RestUrls::List(v) => normalize_rest_urls(v),
    })
}
