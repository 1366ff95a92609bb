mod common;

use oceanlink_rest::{ArrayClient, CallOptions, HttpMethod, RestError};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_login_skips_dead_endpoint() {
    let (array, endpoint) = common::spawn(0).await;
    let dead = common::dead_endpoint();
    let client = ArrayClient::from_config(&common::config(vec![dead, endpoint.clone()])).unwrap();

    client.login().await.unwrap();

    assert_eq!(client.base_url().await, Some(format!("{}{}", endpoint, common::DEVICE_ID)));
    assert_eq!(array.logins.load(Ordering::SeqCst), 1);
    let info = client.get_array_info().await.unwrap().unwrap();
    assert_eq!(info["NAME"], "mock-array");
}

#[tokio::test]
async fn test_login_refused_everywhere() {
    let (array, endpoint) = common::spawn(0).await;
    array.refuse_login.store(true, Ordering::SeqCst);
    let client = ArrayClient::from_config(&common::config(vec![endpoint, common::dead_endpoint()])).unwrap();

    let err = client.login().await.unwrap_err();

    assert!(matches!(err, RestError::AllEndpointsFailed { attempted: 2 }));
    assert!(!client.is_logged_in().await);
}

#[tokio::test]
async fn test_expired_password_is_fatal() {
    let (array, endpoint) = common::spawn(0).await;
    *array.account_state.lock().unwrap() = "3".into();
    let client = ArrayClient::from_config(&common::config(vec![endpoint])).unwrap();

    let err = client.login().await.unwrap_err();

    assert!(matches!(err, RestError::PasswordExpired { .. }));
    assert_eq!(array.logouts.load(Ordering::SeqCst), 1);
    assert!(!client.is_logged_in().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_expired_session_recovers_with_one_relogin() {
    let (array, endpoint) = common::spawn(0).await;
    let client = Arc::new(ArrayClient::from_config(&common::config(vec![endpoint])).unwrap());
    client.login().await.unwrap();
    array.expire_tokens();

    let calls = (0..12).map(|_| {
        let client = client.clone();
        tokio::spawn(async move { client.get("/system/").await })
    });
    for result in futures::future::join_all(calls).await {
        assert!(result.unwrap().is_success());
    }

    assert_eq!(array.logins.load(Ordering::SeqCst), 2);
    assert_eq!(array.logouts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_paged_listing_over_http() {
    let (array, endpoint) = common::spawn(250).await;
    let client = ArrayClient::from_config(&common::config(vec![endpoint])).unwrap();
    client.login().await.unwrap();

    let domains = client.get_hypermetro_domains().await.unwrap();

    assert_eq!(domains.len(), 250);
    assert_eq!(domains[0]["NAME"], "domain0");
    assert_eq!(domains[249]["NAME"], "domain249");
    assert_eq!(array.domain_pages.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_http_error_status_becomes_envelope() {
    let (_array, endpoint) = common::spawn(0).await;
    let client = ArrayClient::from_config(&common::config(vec![endpoint])).unwrap();
    client.login().await.unwrap();

    let result = client.get("/broken").await;

    assert_eq!(result.code(), 500);
    assert_eq!(client.escalations(), 0);
}

#[tokio::test]
async fn test_timeout_becomes_connect_failure() {
    let (_array, endpoint) = common::spawn(0).await;
    let client = ArrayClient::from_config(&common::config(vec![endpoint])).unwrap();
    client.login().await.unwrap();

    let result = client
        .call("/slow", HttpMethod::Get, None, CallOptions::with_timeout(Duration::from_millis(200)))
        .await;

    assert_eq!(result.code(), client.session().codes().connect_failure);
    assert_eq!(client.retries(), 1);
}

#[tokio::test]
async fn test_connection_refused_becomes_connect_failure() {
    let dead = common::dead_endpoint();
    let client = ArrayClient::from_config(&common::config(vec![dead.clone()])).unwrap();

    let result = client
        .session()
        .do_call(&dead, Some("tok"), "/system/", HttpMethod::Get, None, &CallOptions::default())
        .await;

    assert_eq!(result.code(), client.session().codes().connect_failure);
    assert_eq!(client.gate().in_flight(), 0);
}

#[tokio::test]
async fn test_logout_then_call_relogs_in() {
    let (array, endpoint) = common::spawn(0).await;
    let client = ArrayClient::from_config(&common::config(vec![endpoint])).unwrap();
    client.login().await.unwrap();
    assert!(client.logout().await);
    assert!(!client.is_logged_in().await);

    let result = client.get("/system/").await;

    assert!(result.is_success());
    assert_eq!(array.logins.load(Ordering::SeqCst), 2);
}
