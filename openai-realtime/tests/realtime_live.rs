//! Live tests against the OpenAI Realtime API.
//!
//! Run with `OPENAI_API_KEY=... cargo test -p giztoy-openai-realtime -- --ignored`.

use std::time::Duration;

use futures::StreamExt;
use giztoy_openai_realtime::{
    Client, EventStream, ServerEvent, ServerEventKind, Session, SessionConfig, Transport,
    MODALITY_TEXT,
};

async fn next_event(events: &mut EventStream) -> ServerEvent {
    tokio::time::timeout(Duration::from_secs(30), events.next())
        .await
        .expect("timeout waiting for event")
        .expect("event stream ended")
        .expect("event error")
}

async fn text_turn(transport: Transport) {
    let client = Client::from_env().expect("OPENAI_API_KEY required");
    let session = client.connect(transport, None).await.expect("connect");
    let mut events = session.events();

    let created = next_event(&mut events).await;
    assert!(matches!(created.kind, ServerEventKind::SessionCreated(_)));
    assert!(session.session_id().is_some());

    let mut config = SessionConfig::with_vad_disabled();
    config.modalities = vec![MODALITY_TEXT.to_string()];
    session.update_session(&config).await.expect("update session");
    session
        .add_user_message("Reply with the single word: pong")
        .await
        .expect("add message");
    session.create_response(None).await.expect("create response");

    loop {
        let event = next_event(&mut events).await;
        if let Some(response) = event.response().filter(|_| event.is_response_done()) {
            assert!(response.is_completed(), "status: {}", response.status);
            break;
        }
    }

    session.close().await.expect("close");
    session.close().await.expect("second close");
}

#[tokio::test]
#[ignore]
async fn test_websocket_text_turn() {
    text_turn(Transport::WebSocket).await;
}

#[tokio::test]
#[ignore]
async fn test_webrtc_text_turn() {
    text_turn(Transport::WebRtc).await;
}
