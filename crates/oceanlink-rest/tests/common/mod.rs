//! In-process mock of the array REST API for integration tests.

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use oceanlink_rest::codes::{ERROR_USER_OFFLINE, TOKEN_HEADER};
use oceanlink_rest::ArrayConfig;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

pub const DEVICE_ID: &str = "2102351";
pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "Admin@123";
pub const LOGIN_REFUSED: i64 = 1077987870;

#[derive(Default)]
pub struct MockArray {
    pub tokens: Mutex<HashSet<String>>,
    pub logins: AtomicUsize,
    pub logouts: AtomicUsize,
    pub domain_pages: AtomicUsize,
    pub refuse_login: AtomicBool,
    pub account_state: Mutex<String>,
    pub domains: usize,
    next_token: AtomicUsize,
}

impl MockArray {
    pub fn expire_tokens(&self) {
        self.tokens.lock().unwrap().clear();
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|t| self.tokens.lock().unwrap().contains(t))
            .unwrap_or(false)
    }
}

type Shared = Arc<MockArray>;

fn offline() -> Json<Value> {
    Json(json!({"error": {"code": ERROR_USER_OFFLINE, "description": "user offline"}}))
}

async fn login(State(array): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    array.logins.fetch_add(1, Ordering::SeqCst);
    let accepted = !array.refuse_login.load(Ordering::SeqCst)
        && body["username"] == USERNAME
        && body["password"] == PASSWORD
        && body["scope"] == "0";
    if !accepted {
        return Json(json!({"error": {"code": LOGIN_REFUSED, "description": "login refused"}}));
    }
    let token = format!("tok{}", array.next_token.fetch_add(1, Ordering::SeqCst));
    array.tokens.lock().unwrap().insert(token.clone());
    let account_state = array.account_state.lock().unwrap().clone();
    Json(json!({
        "data": {"deviceid": DEVICE_ID, "iBaseToken": token, "accountstate": account_state},
        "error": {"code": 0, "description": "0"}
    }))
}

async fn logout(State(array): State<Shared>, Path(_device): Path<String>, headers: HeaderMap) -> Json<Value> {
    array.logouts.fetch_add(1, Ordering::SeqCst);
    if let Some(token) = headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
        array.tokens.lock().unwrap().remove(token);
    }
    Json(json!({"error": {"code": 0}}))
}

async fn system(State(array): State<Shared>, Path(device): Path<String>, headers: HeaderMap) -> Json<Value> {
    if !array.authorized(&headers) {
        return offline();
    }
    Json(json!({"data": {"ID": device, "NAME": "mock-array"}, "error": {"code": 0}}))
}

fn parse_range(range: &str) -> Option<(usize, usize)> {
    let inner = range.strip_prefix('[')?.strip_suffix(']')?;
    let (a, b) = inner.split_once('-')?;
    Some((a.parse().ok()?, b.parse().ok()?))
}

async fn domains(
    State(array): State<Shared>,
    Path(_device): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    if !array.authorized(&headers) {
        return offline();
    }
    array.domain_pages.fetch_add(1, Ordering::SeqCst);
    let (start, end) = query
        .get("range")
        .and_then(|r| parse_range(r))
        .unwrap_or((0, array.domains));
    let items: Vec<Value> = (start..end.min(array.domains))
        .map(|i| json!({"ID": i.to_string(), "NAME": format!("domain{}", i)}))
        .collect();
    Json(json!({"data": items, "error": {"code": 0}}))
}

async fn broken(Path(_device): Path<String>) -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn slow(Path(_device): Path<String>) -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({"error": {"code": 0}}))
}

pub fn app(array: Shared) -> Router {
    Router::new()
        .route("/deviceManager/rest/xx/sessions", post(login))
        .route("/deviceManager/rest/:device/sessions", delete(logout))
        .route("/deviceManager/rest/:device/system/", get(system))
        .route("/deviceManager/rest/:device/HyperMetroDomain", get(domains))
        .route("/deviceManager/rest/:device/broken", get(broken))
        .route("/deviceManager/rest/:device/slow", get(slow))
        .with_state(array)
}

/// Start a mock array on an ephemeral port; returns its REST endpoint.
pub async fn spawn(domains: usize) -> (Arc<MockArray>, String) {
    let array = Arc::new(MockArray {
        domains,
        ..MockArray::default()
    });
    *array.account_state.lock().unwrap() = "1".into();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app(array.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (array, format!("http://{}/deviceManager/rest/", addr))
}

/// An endpoint nothing listens on.
pub fn dead_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/deviceManager/rest/", addr)
}

pub fn config(endpoints: Vec<String>) -> ArrayConfig {
    ArrayConfig {
        rest_urls: endpoints,
        username: USERNAME.into(),
        password: oceanlink_rest::credentials::encode_credential(PASSWORD),
        ..ArrayConfig::default()
    }
}
