//! Tests for the HTTP client module

use super::*;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct NoSleep;

#[async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, _duration: Duration) {}
}

fn client(attempts: u32) -> HttpClient {
    let config = HttpClientConfig::default()
        .timeout(Duration::from_millis(500))
        .retry(RetryPolicy::new(
            attempts,
            Duration::from_millis(1),
            Duration::from_millis(5),
        ))
        .no_rate_limit();
    HttpClient::new(config)
        .unwrap()
        .with_sleeper(Arc::new(NoSleep))
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(900));
    assert_eq!(config.retry.max_attempts, 5);
    assert!(config.rate_limit.is_some());
    assert!(config.user_agent.starts_with("mc-extract/"));
}

#[tokio::test]
async fn test_post_soap_sends_action_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Service.asmx"))
        .and(header("SOAPAction", "Retrieve"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<ok/>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let body = client(1)
        .post_soap(
            &format!("{}/Service.asmx", mock_server.uri()),
            "Retrieve",
            "<envelope/>".to_string(),
        )
        .await
        .unwrap();
    assert_eq!(body, "<ok/>");
}

#[tokio::test]
async fn test_get_json_with_bearer_and_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hub/v1/campaigns"))
        .and(header("Authorization", "Bearer tok"))
        .and(query_param("$page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})))
        .mount(&mock_server)
        .await;

    let value = client(1)
        .get_json(
            &format!("{}/hub/v1/campaigns", mock_server.uri()),
            &[("$page".to_string(), "2".to_string())],
            "tok",
        )
        .await
        .unwrap();
    assert_eq!(value["items"], serde_json::json!([]));
}

#[tokio::test]
async fn test_execute_retries_server_errors() {
    let mock_server = MockServer::start().await;

    // First request fails, second succeeds
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = client(5);
    let url = format!("{}/flaky", mock_server.uri());
    let value = client
        .execute("flaky", |_| client.get_json(&url, &[], "tok"))
        .await
        .unwrap();
    assert_eq!(value["ok"], true);
}

#[tokio::test]
async fn test_execute_exhausts_budget() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = client(3);
    let url = format!("{}/down", mock_server.uri());
    let err = client
        .execute("down", |_| client.get_json(&url, &[], "tok"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SoapApi { attempts: 3, .. }));
}

#[tokio::test]
async fn test_client_errors_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(5);
    let url = format!("{}/missing", mock_server.uri());
    let err = client
        .execute("missing", |_| client.get_json(&url, &[], "tok"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MarketingCloud { .. }));
}

#[tokio::test]
async fn test_soap_fault_on_500_is_not_retried() {
    let mock_server = MockServer::start().await;
    let calls = Arc::new(AtomicU32::new(0));

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string(
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body>
            <soap:Fault><faultcode>soap:Client</faultcode>
            <faultstring>Unable to find ObjectType Foo</faultstring></soap:Fault>
            </soap:Body></soap:Envelope>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(3);
    let url = mock_server.uri();
    let err = client
        .execute("fault", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            client.post_soap(&url, "Retrieve", "<Envelope/>".to_string())
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(err, Error::MarketingCloud { ref message } if message.contains("Unable to find ObjectType Foo")));
    assert!(err.is_stream_recoverable());
}

#[tokio::test]
async fn test_plain_500_on_soap_is_still_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("gateway exploded"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client(2);
    let url = mock_server.uri();
    let err = client
        .execute("broken", |_| client.post_soap(&url, "Retrieve", "<Envelope/>".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SoapApi { attempts: 2, .. }));
}

#[tokio::test]
async fn test_forbidden_is_permission_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("insufficient privileges"))
        .mount(&mock_server)
        .await;

    let err = client(1)
        .get_json(&mock_server.uri(), &[], "tok")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PermissionFailure { .. }));
}

#[tokio::test]
async fn test_timeout_is_retried_then_wrapped() {
    let mock_server = MockServer::start().await;
    let calls = Arc::new(AtomicU32::new(0));

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let client = client(2);
    let url = mock_server.uri();
    let counter = Arc::clone(&calls);
    let err = client
        .execute("slow", |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            client.get_json(&url, &[], "tok")
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(matches!(err, Error::SoapApi { attempts: 2, .. }));
}

// ============================================================================
// Retry policy
// ============================================================================

#[derive(Default)]
struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

fn retry_policy() -> RetryPolicy {
    RetryPolicy::new(5, Duration::from_secs(1), Duration::from_secs(10))
}

#[test]
fn test_delay_curve_saturates() {
    let policy = retry_policy();
    assert_eq!(policy.delay_for(1), Duration::from_secs(1));
    assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    assert_eq!(policy.delay_for(3), Duration::from_secs(9));
    assert_eq!(policy.delay_for(4), Duration::from_secs(10));
    assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(10));
}

#[tokio::test]
async fn test_always_failing_makes_five_attempts() {
    let sleeper = RecordingSleeper::default();
    let calls = AtomicU32::new(0);

    let result: Result<()> = retry_policy()
        .run(&sleeper, "retrieve", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::Timeout { timeout_ms: 10 }) }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert!(matches!(result, Err(Error::SoapApi { attempts: 5, .. })));
    assert_eq!(
        *sleeper.delays.lock().unwrap(),
        vec![
            Duration::from_secs(1),
            Duration::from_secs(4),
            Duration::from_secs(9),
            Duration::from_secs(10)
        ]
    );
}

#[tokio::test]
async fn test_recovers_after_transient_fault() {
    let sleeper = RecordingSleeper::default();

    let result = retry_policy()
        .run(&sleeper, "retrieve", |attempt| async move {
            if attempt < 3 {
                Err(Error::http_status(503, "busy"))
            } else {
                Ok(attempt)
            }
        })
        .await;

    assert_eq!(result.unwrap(), 3);
    assert_eq!(sleeper.delays.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_logical_error_not_retried() {
    let sleeper = RecordingSleeper::default();
    let calls = AtomicU32::new(0);

    let result: Result<()> = retry_policy()
        .run(&sleeper, "retrieve", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::remote("Error: bad request")) }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(result, Err(Error::MarketingCloud { .. })));
    assert!(sleeper.delays.lock().unwrap().is_empty());
}
