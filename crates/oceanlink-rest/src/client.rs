//! Call coordinator: the single entry point for array requests.
//!
//! [`ArrayClient`] guards the [`SessionState`] with a `tokio::sync::RwLock`.
//! Ordinary calls hold the read side for the whole request, so any number
//! of them run together. Login, logout and relogin take the write side and
//! therefore wait for in-flight calls to drain, and hold new ones back until
//! the session is replaced.
//!
//! A call whose reply carries a re-login code escalates once: it takes the
//! write lock, runs [`Session::relogin`] with the token it used, and on
//! success retries exactly once. Callers that failed with the same stale
//! token find the token already replaced and skip the network work.

use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::config::ArrayConfig;
use crate::envelope::ResultEnvelope;
use crate::error::Result;
use crate::gate::ConcurrencyGate;
use crate::pager::{PageWindow, Pager};
use crate::session::{CallOptions, Session, SessionSettings, SessionState};
use crate::transport::{HttpMethod, HttpTransport, TlsOptions, Transport};

/// Authenticated, concurrency-bounded client for one array.
pub struct ArrayClient {
    session: Session,
    state: RwLock<SessionState>,
    pager: Pager,
    escalations: AtomicU64,
    retries: AtomicU64,
}

impl ArrayClient {
    /// Assemble a client from a session and a pager. Starts logged out.
    pub fn new(session: Session, pager: Pager) -> Self {
        Self {
            session,
            state: RwLock::new(SessionState::default()),
            pager,
            escalations: AtomicU64::new(0),
            retries: AtomicU64::new(0),
        }
    }

    /// Build a client with the `reqwest` transport described by `config`.
    pub fn from_config(config: &ArrayConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&TlsOptions {
            verify: config.ssl_cert_verify,
            ca_path: config.ssl_cert_path.clone(),
        })?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Build a client over an arbitrary transport.
    pub fn with_transport(config: &ArrayConfig, transport: Arc<dyn Transport>) -> Self {
        let settings = SessionSettings {
            endpoints: config.rest_urls.clone(),
            credentials: config.credentials(),
            request_timeout: config.request_timeout(),
            login_timeout: config.login_timeout(),
            codes: config.codes.clone(),
        };
        let gate = ConcurrencyGate::new(config.max_concurrent_requests);
        Self::new(
            Session::new(settings, transport, gate),
            Pager::new(config.page_size),
        )
    }

    /// Underlying session, mostly for inspection.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Gate shared by every request of this client.
    pub fn gate(&self) -> &ConcurrencyGate {
        self.session.gate()
    }

    /// Number of calls that escalated to a relogin.
    pub fn escalations(&self) -> u64 {
        self.escalations.load(Ordering::Relaxed)
    }

    /// Number of calls re-issued after a successful relogin.
    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Whether a session is currently held.
    pub async fn is_logged_in(&self) -> bool {
        self.state.read().await.is_logged_in()
    }

    /// Device base URL of the current session.
    pub async fn base_url(&self) -> Option<String> {
        self.state.read().await.base_url().map(str::to_string)
    }

    /// Log in, waiting for in-flight calls to finish first.
    pub async fn login(&self) -> Result<()> {
        let mut state = self.state.write().await;
        self.session.login(&mut state).await
    }

    /// Log out; see [`Session::logout`].
    pub async fn logout(&self) -> bool {
        let mut state = self.state.write().await;
        self.session.logout(&mut state).await
    }

    /// Log out once in-flight calls have drained, then close the gate.
    /// Later calls fail fast with the connect-failure envelope.
    pub async fn shutdown(&self) -> bool {
        let mut state = self.state.write().await;
        let acknowledged = self.session.logout(&mut state).await;
        self.gate().close();
        info!("array client shut down");
        acknowledged
    }

    /// Re-establish the session if it still holds `old_token`.
    pub async fn relogin(&self, old_token: Option<&str>) -> bool {
        let mut state = self.state.write().await;
        self.session.relogin(&mut state, old_token).await
    }

    /// Issue a request against the current session.
    ///
    /// Never fails. Faults come back as envelopes for the caller to inspect.
    pub async fn call(
        &self,
        path: &str,
        method: HttpMethod,
        body: Option<&Value>,
        options: CallOptions,
    ) -> ResultEnvelope {
        let codes = self.session.codes();
        if self.gate().is_closed() {
            debug!(path, "client is shut down, request not sent");
            return ResultEnvelope::connect_failure(codes);
        }

        let (old_token, result) = self.call_once(path, method, body, &options).await;
        if !codes.requires_relogin(result.code()) {
            return result;
        }

        error!(code = result.code(), "can't open the recent url, relogin");
        self.escalations.fetch_add(1, Ordering::Relaxed);

        let recovered = self.relogin(old_token.as_deref()).await;
        if !recovered {
            error!("relogin failed, no need to send again");
            return result;
        }

        self.retries.fetch_add(1, Ordering::Relaxed);
        let (_, mut retried) = self.call_once(path, method, body, &options).await;
        if retried.code() == codes.retry_succeeded {
            warn!(path, "this operation may have succeeded the first time");
            retried.error.code = 0;
        } else if retried.is_success() {
            info!(path, "succeeded the second time");
        } else {
            info!(
                path,
                code = retried.code(),
                description = %retried.error.description,
                "failed the second time"
            );
        }
        retried
    }

    /// One read-locked attempt. Returns the token it ran with.
    async fn call_once(
        &self,
        path: &str,
        method: HttpMethod,
        body: Option<&Value>,
        options: &CallOptions,
    ) -> (Option<String>, ResultEnvelope) {
        let state = self.state.read().await;
        match state.active() {
            Some(active) => {
                let result = self
                    .session
                    .do_call(&active.base_url, Some(&active.token), path, method, body, options)
                    .await;
                (Some(active.token.clone()), result)
            }
            None => (None, ResultEnvelope::unauthorized(self.session.codes())),
        }
    }

    /// `GET` through [`ArrayClient::call`] with default options.
    pub async fn get(&self, path: &str) -> ResultEnvelope {
        self.call(path, HttpMethod::Get, None, CallOptions::default()).await
    }

    /// `POST` a JSON body.
    pub async fn post(&self, path: &str, body: &Value) -> ResultEnvelope {
        self.call(path, HttpMethod::Post, Some(body), CallOptions::default()).await
    }

    /// `PUT` a JSON body.
    pub async fn put(&self, path: &str, body: &Value) -> ResultEnvelope {
        self.call(path, HttpMethod::Put, Some(body), CallOptions::default()).await
    }

    /// `DELETE`, with an optional body such as a vstore ID.
    pub async fn delete(&self, path: &str, body: Option<&Value>) -> ResultEnvelope {
        self.call(path, HttpMethod::Delete, body, CallOptions::default()).await
    }

    /// Walk a paged collection with the configured page size.
    pub async fn fetch_all<T, F, Fut>(&self, fetch_page: F) -> Result<Vec<T>>
    where
        F: FnMut(PageWindow) -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        self.pager.fetch_all(fetch_page).await
    }
}

impl std::fmt::Debug for ArrayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArrayClient")
            .field("session", &self.session)
            .field("page_size", &self.pager.page_size())
            .field("escalations", &self.escalations())
            .finish()
    }
}
