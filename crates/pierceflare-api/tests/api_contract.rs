//! Contract Test: PierceFlare API Transport
//!
//! This test verifies the wire behavior of the API client against a mock
//! server.
//!
//! Constraints verified:
//! - Every request carries the bearer token
//! - Token validation returns the domain on 2xx and fails otherwise
//! - Updates are PUT as `{ip}` or `{ip, dummy: true}`
//! - Any 2xx is a success, with or without a parsable receipt
//! - Non-2xx answers map to typed errors with the server's message
//! - Exactly one request per call (no retries in the transport)

use pierceflare_api::PierceFlareClient;
use pierceflare_core::{Error, FlareApi, RemoteOperation};
use serde_json::json;
use std::net::IpAddr;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "pf_test_token_0123456789";

fn client_for(server: &MockServer) -> PierceFlareClient {
    PierceFlareClient::new(TOKEN, format!("{}/", server.uri())).expect("client builds")
}

/// Mount a single `PUT /api/flare` reply, expected exactly once
async fn flare_endpoint(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("PUT"))
        .and(path("/api/flare"))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

/// A URL on which nothing listens
fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind loopback listener");
    let addr = listener.local_addr().expect("listener address");
    drop(listener);
    format!("http://{}", addr)
}

#[tokio::test]
async fn token_check_returns_domain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/infos"))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string("home.pierceflare.com\n"))
        .expect(1)
        .mount(&server)
        .await;

    let domain = client_for(&server).check_token().await.expect("token valid");

    assert_eq!(domain, "home.pierceflare.com");
}

#[tokio::test]
async fn rejected_token_is_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/infos"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server).check_token().await;

    assert!(matches!(result, Err(Error::Authentication(_))));
}

#[tokio::test]
async fn real_update_omits_dummy_flag() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/flare"))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "ip": "203.0.113.7" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "op": "batch", "resolvedIp": "203.0.113.7" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let receipt = client_for(&server)
        .send_flare(IpAddr::from([203, 0, 113, 7]), false)
        .await
        .expect("update accepted")
        .expect("receipt parsed");

    assert_eq!(receipt.op, RemoteOperation::Batch);
    assert_eq!(receipt.resolved_ip, "203.0.113.7");
}

#[tokio::test]
async fn heartbeat_update_sets_dummy_flag() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/flare"))
        .and(body_json(json!({ "ip": "2001:db8::1", "dummy": true })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "op": "dummy", "resolvedIp": "2001:db8::1" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ip: IpAddr = "2001:db8::1".parse().unwrap();
    let receipt = client_for(&server).send_flare(ip, true).await.unwrap();

    assert_eq!(receipt.map(|r| r.op), Some(RemoteOperation::Dummy));
}

#[tokio::test]
async fn any_2xx_is_success() {
    let server = MockServer::start().await;
    flare_endpoint(&server, ResponseTemplate::new(204)).await;

    let result = client_for(&server)
        .send_flare(IpAddr::from([192, 0, 2, 1]), false)
        .await;

    assert!(matches!(result, Ok(None)));
}

#[tokio::test]
async fn structured_error_body_is_parsed() {
    let server = MockServer::start().await;
    // expect(1): no retry inside the transport
    flare_endpoint(
        &server,
        ResponseTemplate::new(500).set_body_json(json!({
            "errCode": "UNRESOLVABLE",
            "message": "Remote IP of flare emitter is unresolvable."
        })),
    )
    .await;

    let err = client_for(&server)
        .send_flare(IpAddr::from([192, 0, 2, 1]), false)
        .await
        .unwrap_err();

    match err {
        Error::Api {
            status,
            err_code,
            message,
        } => {
            assert_eq!(status, 500);
            assert_eq!(err_code.as_deref(), Some("UNRESOLVABLE"));
            assert!(message.contains("unresolvable"));
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn unstructured_error_keeps_body_snippet() {
    let server = MockServer::start().await;
    flare_endpoint(
        &server,
        ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"),
    )
    .await;

    let err = client_for(&server)
        .send_flare(IpAddr::from([192, 0, 2, 1]), false)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(502));
    assert!(err.to_string().contains("Bad Gateway"));
}

#[tokio::test]
async fn rate_limit_is_typed() {
    let server = MockServer::start().await;
    flare_endpoint(&server, ResponseTemplate::new(429).set_body_string("slow down")).await;

    let result = client_for(&server)
        .send_flare(IpAddr::from([192, 0, 2, 1]), true)
        .await;

    assert!(matches!(result, Err(Error::RateLimited(_))));
}

#[tokio::test]
async fn unreachable_server_is_http_error() {
    let client = PierceFlareClient::new(TOKEN, unreachable_url()).unwrap();

    let result = client.check_token().await;
    assert!(matches!(result, Err(Error::Http(_))));
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/flare"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client =
        PierceFlareClient::with_timeout(TOKEN, server.uri(), Duration::from_millis(200)).unwrap();

    let result = client.send_flare(IpAddr::from([192, 0, 2, 1]), false).await;
    assert!(matches!(result, Err(Error::Http(_))));
}
