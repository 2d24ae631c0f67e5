//! WebRTC session setup tests against a mocked signaling endpoint.

use std::time::Duration;

use giztoy_openai_realtime::{Client, ConnectConfig, ConnectStep, Transport, VOICE_SAGE};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> Client {
    Client::builder("sk-test")
        .http_url(format!("{}/v1/realtime", server.uri()))
        .timeout(Duration::from_secs(5))
        .ice_servers(Vec::new())
        .build()
        .unwrap()
}

fn token_body() -> serde_json::Value {
    json!({
        "id": "sess_rtc",
        "object": "realtime.session",
        "model": "gpt-4o-realtime-preview",
        "expires_at": 1735000000,
        "client_secret": { "value": "ek_test", "expires_at": 1734999960 },
    })
}

#[tokio::test]
async fn test_unauthorized_credential_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/realtime/sessions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({ "model": "gpt-4o-realtime-preview", "voice": "alloy" })))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "error": { "message": "Incorrect API key provided" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/realtime"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server)
        .connect(Transport::WebRtc, None)
        .await
        .err()
        .expect("connect should fail");

    assert_eq!(err.connect_step(), Some(ConnectStep::EphemeralCredential));
    assert_eq!(err.http_status(), Some(401));
    assert!(err.is_auth());
}

#[tokio::test]
async fn test_create_ephemeral_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/realtime/sessions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({ "voice": "sage" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .expect(1)
        .mount(&server)
        .await;

    let config = ConnectConfig {
        voice: VOICE_SAGE.to_string(),
        ..Default::default()
    };
    let token = client(&server)
        .create_ephemeral_token(Some(&config))
        .await
        .unwrap();
    assert_eq!(token.id, "sess_rtc");
    assert_eq!(token.client_secret.value, "ek_test");
}

#[tokio::test]
async fn test_sdp_exchange_uses_ephemeral_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/realtime/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/realtime"))
        .and(query_param("model", "gpt-4o-realtime-preview"))
        .and(header("authorization", "Bearer ek_test"))
        .and(header("content-type", "application/sdp"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad offer"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .connect_webrtc(None)
        .await
        .err()
        .expect("connect should fail");

    assert_eq!(err.connect_step(), Some(ConnectStep::SdpExchange));
    assert_eq!(err.http_status(), Some(400));
}

#[tokio::test]
async fn test_invalid_answer_fails_remote_description() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/realtime/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/realtime"))
        .respond_with(ResponseTemplate::new(201).set_body_string("this is not sdp"))
        .mount(&server)
        .await;

    let err = client(&server)
        .connect_webrtc(None)
        .await
        .err()
        .expect("connect should fail");

    assert_eq!(err.connect_step(), Some(ConnectStep::RemoteDescription));
    assert_eq!(err.http_status(), None);
}
