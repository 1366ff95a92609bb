//! Reserved result codes and array-specific constants.
//!
//! The session-level codes are firmware dependent, so they live in
//! [`ReservedCodes`], which is part of the configuration and can be
//! overridden per deployment. Domain codes are fixed per resource type.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Synthesized locally when the array cannot be reached.
pub const ERROR_CONNECT_TO_SERVER: i64 = -403;
/// Synthesized locally when no session exists.
pub const ERROR_UNAUTHORIZED_TO_SERVER: i64 = -401;
/// Synthesized locally when a 2xx body is not an envelope.
pub const ERROR_MALFORMED_RESPONSE: i64 = -400;
/// Array reports the session token as offline or expired.
pub const ERROR_USER_OFFLINE: i64 = 1077949069;
/// Array reports the object as already present.
pub const ERROR_OBJECT_ALREADY_EXISTS: i64 = 1077948996;

/// Filesystem ID unknown to the array.
pub const FILESYSTEM_NOT_EXIST: i64 = 1073752065;
/// Share ID unknown to the array.
pub const SHARE_NOT_EXIST: i64 = 1077939717;
/// No share is exported at the queried path.
pub const SHARE_PATH_INVALID: i64 = 1077939729;
/// Snapshot ID unknown to the array.
pub const SNAPSHOT_NOT_EXIST: i64 = 1073754118;
/// HyperMetro pair unknown to the array.
pub const HYPERMETRO_NOT_EXIST: i64 = 1077674242;

/// Header carrying the session token.
pub const TOKEN_HEADER: &str = "iBaseToken";
/// Path appended to an endpoint to open a session.
pub const LOGIN_PATH: &str = "xx/sessions";
/// Path appended to the base URL to close a session.
pub const LOGOUT_PATH: &str = "/sessions";

/// Account states that force a password change before use.
pub const PWD_EXPIRED_OR_INITIAL: [&str; 2] = ["3", "4"];

/// Per-request timeout unless a call overrides it.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(52);
/// Timeout of one login attempt on one endpoint.
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(4);
/// Capacity of the concurrency gate.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 30;
/// Window size for paged listings.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Session-level codes the call coordinator recognizes structurally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservedCodes {
    /// Code used for the synthesized connect-failure envelope.
    pub connect_failure: i64,
    /// Code used for the synthesized no-session envelope.
    pub unauthorized: i64,
    /// Code used when a successful HTTP reply carries no envelope.
    pub malformed_response: i64,
    /// Codes that trigger the relogin protocol.
    pub relogin_required: Vec<i64>,
    /// Code that, on the retry after a relogin, means the first attempt
    /// already took effect.
    pub retry_succeeded: i64,
}

impl ReservedCodes {
    /// Whether `code` asks for the session to be re-established.
    pub fn requires_relogin(&self, code: i64) -> bool {
        self.relogin_required.contains(&code)
    }
}

impl Default for ReservedCodes {
    fn default() -> Self {
        Self {
            connect_failure: ERROR_CONNECT_TO_SERVER,
            unauthorized: ERROR_UNAUTHORIZED_TO_SERVER,
            malformed_response: ERROR_MALFORMED_RESPONSE,
            relogin_required: vec![
                ERROR_CONNECT_TO_SERVER,
                ERROR_UNAUTHORIZED_TO_SERVER,
                ERROR_USER_OFFLINE,
            ],
            retry_succeeded: ERROR_OBJECT_ALREADY_EXISTS,
        }
    }
}
