//! Authenticated session against one of several redundant array endpoints.
//!
//! [`Session`] owns everything that does not change after start-up: the
//! endpoint list, the credentials, the transport and the concurrency gate.
//! The mutable part, the base URL and token pair, is [`SessionState`]. The
//! session never locks that state itself; callers hand it in, shared for
//! ordinary calls and exclusive for login, logout and relogin. See
//! [`crate::client::ArrayClient`] for the locking discipline.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::codes::{ReservedCodes, LOGIN_PATH, LOGOUT_PATH, PWD_EXPIRED_OR_INITIAL};
use crate::credentials::Credentials;
use crate::envelope::ResultEnvelope;
use crate::error::{RestError, Result};
use crate::gate::ConcurrencyGate;
use crate::transport::{redact, HttpMethod, Transport, TransportRequest};

/// A logged-in session: device base URL and its token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    /// Endpoint joined with the device ID.
    pub base_url: String,
    /// Value of the `iBaseToken` header.
    pub token: String,
}

/// Current session state. Base URL and token are present together or not
/// at all.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    active: Option<ActiveSession>,
}

impl SessionState {
    /// Current base URL and token, if logged in.
    pub fn active(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    /// Whether a base URL and token are held.
    pub fn is_logged_in(&self) -> bool {
        self.active.is_some()
    }

    /// Device base URL of the session.
    pub fn base_url(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.base_url.as_str())
    }

    /// Token of the session.
    pub fn token(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.token.as_str())
    }

    fn set(&mut self, base_url: String, token: String) {
        self.active = Some(ActiveSession { base_url, token });
    }

    fn clear(&mut self) {
        self.active = None;
    }
}

/// Per-call knobs.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Overrides the configured request timeout.
    pub timeout: Option<Duration>,
    /// Skip request/response logging, for high-frequency polling.
    pub suppress_logging: bool,
}

impl CallOptions {
    /// Default timeout, no request/response logging.
    pub fn quiet() -> Self {
        Self {
            timeout: None,
            suppress_logging: true,
        }
    }

    /// Logged call with its own timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            suppress_logging: false,
        }
    }
}

/// Static session settings.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Candidate endpoints in login order.
    pub endpoints: Vec<String>,
    /// Stored credentials, decoded at each login.
    pub credentials: Credentials,
    /// Default per-request timeout.
    pub request_timeout: Duration,
    /// Timeout of each login attempt.
    pub login_timeout: Duration,
    /// Reserved session-level codes.
    pub codes: ReservedCodes,
}

/// Session lifecycle and request dispatch against the array.
pub struct Session {
    settings: SessionSettings,
    transport: Arc<dyn Transport>,
    gate: ConcurrencyGate,
}

impl Session {
    /// Session over `transport`, admitting requests through `gate`.
    pub fn new(settings: SessionSettings, transport: Arc<dyn Transport>, gate: ConcurrencyGate) -> Self {
        Self {
            settings,
            transport,
            gate,
        }
    }

    /// Reserved codes this session synthesizes and reacts to.
    pub fn codes(&self) -> &ReservedCodes {
        &self.settings.codes
    }

    /// Gate every request passes through.
    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Issue one request relative to `base_url` and normalize the outcome
    /// into an envelope. Never fails: every fault becomes an error envelope.
    pub async fn do_call(
        &self,
        base_url: &str,
        token: Option<&str>,
        path: &str,
        method: HttpMethod,
        body: Option<&Value>,
        options: &CallOptions,
    ) -> ResultEnvelope {
        let url = format!("{}{}", base_url, path);
        let timeout = options.timeout.unwrap_or(self.settings.request_timeout);
        let codes = &self.settings.codes;

        if !options.suppress_logging {
            let logged = body.map(redact).unwrap_or(Value::Null);
            info!(%method, url = %url, data = %logged, "array request");
        }

        let request = TransportRequest {
            method,
            url: url.clone(),
            token: token.map(str::to_string),
            body: body.cloned(),
            timeout,
        };

        let outcome = {
            let _permit = match self.gate.acquire().await {
                Ok(permit) => permit,
                Err(_) => {
                    error!(url = %url, "concurrency gate closed, request not sent");
                    return ResultEnvelope::connect_failure(codes);
                }
            };
            self.transport.execute(request).await
        };

        let reply = match outcome {
            Ok(reply) => reply,
            Err(e) => {
                error!(url = %url, error = %e, "bad response from server");
                return ResultEnvelope::connect_failure(codes);
            }
        };

        if !reply.is_success() {
            let text = format!("{} {} for url: {}", reply.status, reply.reason, url);
            warn!(status = reply.status, url = %url, "array returned HTTP error");
            return ResultEnvelope::http_error(reply.status, text);
        }

        let envelope = match serde_json::from_str::<ResultEnvelope>(&reply.body) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(url = %url, error = %e, "response is not a result envelope");
                return ResultEnvelope::failure(
                    codes.malformed_response,
                    format!("malformed response: {}", e),
                );
            }
        };

        if !options.suppress_logging {
            let logged = serde_json::to_value(&envelope)
                .map(|v| redact(&v))
                .unwrap_or(Value::Null);
            info!(url = %url, response = %logged, "array response");
        }
        envelope
    }

    /// Log in on the first endpoint that accepts the credentials.
    ///
    /// Endpoints are tried in configuration order. Fails when every endpoint
    /// refuses, or when the account must change its password, in which case
    /// the fresh session is logged out again before returning.
    pub async fn login(&self, state: &mut SessionState) -> Result<()> {
        let creds = self.settings.credentials.decode()?;
        state.clear();

        for endpoint in &self.settings.endpoints {
            let body = json!({
                "username": creds.username.as_str(),
                "password": creds.password.as_str(),
                "scope": "0",
            });

            info!(endpoint = %endpoint, "trying to log in");
            let result = self
                .do_call(
                    endpoint,
                    None,
                    LOGIN_PATH,
                    HttpMethod::Post,
                    Some(&body),
                    &CallOptions {
                        timeout: Some(self.settings.login_timeout),
                        suppress_logging: true,
                    },
                )
                .await;

            if !result.is_success() {
                error!(
                    endpoint = %endpoint,
                    code = result.code(),
                    description = %result.error.description,
                    "login failed, trying next endpoint"
                );
                continue;
            }

            let (Some(device_id), Some(token)) = (
                result.data_str("deviceid"),
                result.data_str("iBaseToken"),
            ) else {
                error!(endpoint = %endpoint, "login reply lacks device id or token, trying next endpoint");
                continue;
            };

            info!(endpoint = %endpoint, "login succeeded");
            state.set(format!("{}{}", endpoint, device_id), token);

            let account_state = result.data_str("accountstate");
            if account_state
                .as_deref()
                .is_some_and(|s| PWD_EXPIRED_OR_INITIAL.contains(&s))
            {
                self.logout(state).await;
                error!(endpoint = %endpoint, "password has expired or is initial, change it on the array");
                return Err(RestError::PasswordExpired {
                    username: creds.username.to_string(),
                });
            }
            return Ok(());
        }

        error!(endpoints = self.settings.endpoints.len(), "login failed on every endpoint");
        Err(RestError::AllEndpointsFailed {
            attempted: self.settings.endpoints.len(),
        })
    }

    /// Close the current session. Best effort: the local state is cleared
    /// whatever the array answers. Returns whether the array acknowledged.
    pub async fn logout(&self, state: &mut SessionState) -> bool {
        let Some(active) = state.active().cloned() else {
            return true;
        };
        let result = self
            .do_call(
                &active.base_url,
                Some(&active.token),
                LOGOUT_PATH,
                HttpMethod::Delete,
                None,
                &CallOptions::default(),
            )
            .await;
        state.clear();

        if result.is_success() {
            debug!(base_url = %active.base_url, "logged out");
            true
        } else {
            warn!(
                code = result.code(),
                description = %result.error.description,
                "logout session error"
            );
            false
        }
    }

    /// Re-establish the session after a caller saw it fail with `old_token`.
    ///
    /// Without a session this is a plain login. If the session still holds
    /// `old_token`, log out (failures tolerated) and log in again. Otherwise
    /// another caller already replaced the token and nothing is sent.
    /// Returns whether the session is usable afterwards.
    pub async fn relogin(&self, state: &mut SessionState, old_token: Option<&str>) -> bool {
        let old_url = state.base_url().map(str::to_string);
        let current_token = state.token().map(str::to_string);

        match current_token.as_deref() {
            None => {
                if let Err(e) = self.login(state).await {
                    error!(error = %e, "relogin failed");
                    return false;
                }
                info!(
                    old_url = ?old_url,
                    new_url = ?state.base_url(),
                    "relogin replaced url"
                );
            }
            Some(current) if Some(current) == old_token => {
                if !self.logout(state).await {
                    warn!("logout before relogin failed");
                }
                if let Err(e) = self.login(state).await {
                    error!(error = %e, "relogin failed");
                    return false;
                }
                info!(
                    old_url = ?old_url,
                    new_url = ?state.base_url(),
                    "first logout then login"
                );
            }
            Some(_) => {
                info!("relogin already done by another caller");
            }
        }
        true
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoints", &self.settings.endpoints)
            .field("gate", &self.gate)
            .finish()
    }
}
