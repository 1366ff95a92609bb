//! Error types for the array REST session layer.
//!
//! Only local failures are errors. Anything the array answers, including
//! transport faults, travels back to callers as a [`crate::ResultEnvelope`].

use thiserror::Error;

/// Local failures raised by the session layer and the domain operations.
#[derive(Debug, Error)]
pub enum RestError {
    /// Every configured endpoint refused the login.
    #[error("login failed on all {attempted} configured endpoints")]
    AllEndpointsFailed { attempted: usize },

    /// The account must change its password before the array accepts work.
    #[error("password of user {username} has expired or is initial, change it on the array")]
    PasswordExpired { username: String },

    /// A credential carried the obfuscation prefix but did not decode.
    #[error("credential {field} is not valid obfuscated text: {reason}")]
    CredentialDecode { field: &'static str, reason: String },

    /// The configuration file is missing values or contradicts itself.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The array answered a domain operation with a non-zero code.
    #[error("{context} (code {code}: {description})")]
    Backend {
        context: String,
        code: i64,
        description: String,
    },

    /// A domain operation was asked for something it cannot express.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    HttpSetup(String),

    /// Reading a certificate or config file failed.
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, RestError>;
