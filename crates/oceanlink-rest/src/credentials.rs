//! Array account credentials and their reversible obfuscation.
//!
//! Configuration files may store a value as `!$$$` followed by its base64
//! form. Values are decoded on every login attempt and the plaintext lives
//! only in [`Zeroizing`] buffers.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use zeroize::Zeroizing;

use crate::error::{RestError, Result};

/// Marker prefix of an obfuscated credential.
pub const OBFUSCATION_PREFIX: &str = "!$$$";

/// Whether `raw` is in obfuscated form.
pub fn is_obfuscated(raw: &str) -> bool {
    raw.starts_with(OBFUSCATION_PREFIX)
}

/// Produce the obfuscated form of a plaintext value.
pub fn encode_credential(plain: &str) -> String {
    format!("{}{}", OBFUSCATION_PREFIX, STANDARD.encode(plain.as_bytes()))
}

/// Decode a possibly obfuscated value. Plain values are returned as is.
pub fn decode_credential(field: &'static str, raw: &str) -> Result<Zeroizing<String>> {
    let Some(encoded) = raw.strip_prefix(OBFUSCATION_PREFIX) else {
        return Ok(Zeroizing::new(raw.to_string()));
    };
    let bytes = Zeroizing::new(STANDARD.decode(encoded).map_err(|e| {
        RestError::CredentialDecode {
            field,
            reason: e.to_string(),
        }
    })?);
    let text = std::str::from_utf8(&bytes).map_err(|e| RestError::CredentialDecode {
        field,
        reason: e.to_string(),
    })?;
    Ok(Zeroizing::new(text.to_string()))
}

/// Username and password as configured (possibly obfuscated).
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

/// Plaintext credentials for one login attempt.
pub struct DecodedCredentials {
    pub username: Zeroizing<String>,
    /// Wiped from memory on drop.
    pub password: Zeroizing<String>,
}

impl Credentials {
    /// Wrap credentials as stored in the configuration.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Decode both fields for a login request.
    pub fn decode(&self) -> Result<DecodedCredentials> {
        Ok(DecodedCredentials {
            username: decode_credential("username", &self.username)?,
            password: decode_credential("password", &self.password)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &"***")
            .field("password", &"***")
            .finish()
    }
}
