//! WebSocket-based realtime session.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream, StreamExt};
use futures::SinkExt;
use http::header::AUTHORIZATION;
use http::HeaderValue;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, warn};

use crate::client::ClientConfig;
use crate::error::{ConnectStep, Error, Result};
use crate::event::ClientEvent;
use crate::session::{truncate_for_log, EventStream, Session, SessionCore, SessionState};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Upper bound on sending the close frame during [`Session::close`].
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// WebSocket-based realtime session.
pub struct WebSocketSession {
    core: Arc<SessionCore>,
    sink: Mutex<Option<SplitSink<WsStream, Message>>>,
    reader: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl WebSocketSession {
    /// Connects to the OpenAI Realtime API via WebSocket.
    pub(crate) async fn connect(config: Arc<ClientConfig>, model: &str) -> Result<Self> {
        // Build WebSocket URL with model query parameter
        let url = format!("{}?model={}", config.ws_url, model);
        debug!("Connecting to: {}", url);

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| Error::connect(ConnectStep::Dial, e))?;

        let headers = request.headers_mut();
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", config.api_key))?);
        headers.insert("openai-beta", HeaderValue::from_static("realtime=v1"));
        if let Some(ref org) = config.organization {
            headers.insert("openai-organization", header_value(org)?);
        }
        if let Some(ref project) = config.project {
            headers.insert("openai-project", header_value(project)?);
        }

        let (ws_stream, _response) = match tokio::time::timeout(config.timeout, connect_async(request)).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(tungstenite::Error::Http(response))) => {
                let status = response.status();
                let body = response
                    .body()
                    .as_deref()
                    .map(String::from_utf8_lossy)
                    .unwrap_or_default();
                error!(status = status.as_u16(), "websocket handshake rejected");
                return Err(Error::connect(
                    ConnectStep::Dial,
                    Error::http_status_error(
                        "connection_failed",
                        format!("handshake rejected with {}: {}", status, body),
                        status.as_u16(),
                    ),
                ));
            }
            Ok(Err(e)) => {
                error!("Failed to connect: {}", e);
                return Err(Error::connect(ConnectStep::Dial, e));
            }
            Err(_) => {
                return Err(Error::connect(
                    ConnectStep::Dial,
                    Error::Timeout(format!("handshake did not finish in {:?}", config.timeout)),
                ));
            }
        };

        let (write, read) = ws_stream.split();
        let core = Arc::new(SessionCore::new());
        core.activate();

        let reader = tokio::spawn(read_loop(read, core.clone()));

        Ok(Self {
            core,
            sink: Mutex::new(Some(write)),
            reader: parking_lot::Mutex::new(Some(reader)),
        })
    }

    /// Writes one text frame under the send lock.
    async fn send_text(&self, text: String) -> Result<()> {
        self.core.ensure_open()?;
        debug!("Sending event: {}", truncate_for_log(&text, 500));

        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(Error::SessionClosed)?;
        let result = tokio::select! {
            biased;
            _ = self.core.cancel_token().cancelled() => return Err(Error::SessionClosed),
            result = sink.send(Message::Text(text.into())) => result,
        };
        if let Err(e) = result {
            error!("Write error: {}", e);
            self.core.fail_write(&e);
            return Err(Error::WebSocket(e));
        }
        Ok(())
    }
}

#[async_trait]
impl Session for WebSocketSession {
    async fn send(&self, event: &ClientEvent) -> Result<()> {
        self.send_text(event.to_json()?).await
    }

    async fn send_raw(&self, event: serde_json::Value) -> Result<()> {
        self.send_text(serde_json::to_string(&event)?).await
    }

    fn events(&self) -> EventStream {
        self.core.events()
    }

    fn session_id(&self) -> Option<String> {
        self.core.session_id()
    }

    fn state(&self) -> SessionState {
        self.core.state()
    }

    async fn close(&self) -> Result<()> {
        if !self.core.begin_close() {
            return Ok(());
        }

        let sink = self.sink.lock().await.take();
        if let Some(mut sink) = sink {
            match tokio::time::timeout(CLOSE_TIMEOUT, sink.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Failed to close websocket: {}", e),
                Err(_) => warn!("Timed out sending close frame"),
            }
        }

        let reader = self.reader.lock().take();
        if let Some(reader) = reader {
            if let Err(e) = reader.await {
                warn!("Reader task failed: {}", e);
            }
        }
        Ok(())
    }
}

impl Drop for WebSocketSession {
    fn drop(&mut self) {
        self.core.cancel_token().cancel();
    }
}

// Read loop task
async fn read_loop(mut read: SplitStream<WsStream>, core: Arc<SessionCore>) {
    let cancel = core.reader_token().clone();
    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => break,
            msg = read.next() => msg,
        };

        match msg {
            Some(Ok(Message::Text(text))) => {
                if !core.handle_frame(Bytes::copy_from_slice(text.as_bytes())).await {
                    break;
                }
            }
            Some(Ok(Message::Binary(data))) => {
                if !core.handle_frame(data).await {
                    break;
                }
            }
            Some(Ok(Message::Close(frame))) => {
                debug!("WebSocket closed by server");
                let reason = frame
                    .map(|f| format!("{} {}", f.code, f.reason.as_str()))
                    .unwrap_or_else(|| "closed by server".to_string());
                core.fail(Error::ConnectionClosed(reason)).await;
                break;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                error!("Read error: {}", e);
                core.fail(Error::WebSocket(e)).await;
                break;
            }
            None => {
                core.fail(Error::ConnectionClosed("stream ended".to_string())).await;
                break;
            }
        }
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::InvalidConfig(format!("invalid header value: {}", e)))
}
