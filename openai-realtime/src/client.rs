//! Client for OpenAI Realtime API.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::signaling::{EphemeralToken, HttpClient};
use crate::peer::WebRtcSession;
use crate::session::Session;
use crate::types::*;
use crate::websocket::WebSocketSession;

/// Default WebSocket endpoint.
pub const DEFAULT_WEBSOCKET_URL: &str = "wss://api.openai.com/v1/realtime";

/// Default HTTP endpoint (for WebRTC session creation).
pub const DEFAULT_HTTP_URL: &str = "https://api.openai.com/v1/realtime";

/// Default STUN server for WebRTC sessions.
pub const DEFAULT_STUN_SERVER: &str = "stun:stun.l.google.com:19302";

/// Default timeout for the WebSocket handshake and HTTP calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// OpenAI Realtime API client.
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
}

/// Client configuration.
#[derive(Debug, Clone)]
pub(crate) struct ClientConfig {
    pub api_key: String,
    pub organization: Option<String>,
    pub project: Option<String>,
    pub ws_url: String,
    pub http_url: String,
    pub timeout: Duration,
    pub ice_servers: Vec<String>,
}

impl ClientConfig {
    fn new(api_key: String) -> Self {
        Self {
            api_key,
            organization: None,
            project: None,
            ws_url: DEFAULT_WEBSOCKET_URL.to_string(),
            http_url: DEFAULT_HTTP_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            ice_servers: vec![DEFAULT_STUN_SERVER.to_string()],
        }
    }
}

impl Client {
    /// Creates a new OpenAI Realtime client.
    ///
    /// The api_key is required and can be obtained from:
    /// https://platform.openai.com/api-keys
    ///
    /// # Panics
    ///
    /// Panics if `api_key` is empty. Use [`ClientBuilder`] to get an error instead.
    pub fn new(api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        if api_key.is_empty() {
            panic!("openai-realtime: API key is required");
        }

        Self {
            config: Arc::new(ClientConfig::new(api_key)),
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads `OPENAI_API_KEY` (required), and optionally `OPENAI_ORG_ID`,
    /// `OPENAI_PROJECT_ID`, `OPENAI_REALTIME_WS_URL` and `OPENAI_REALTIME_HTTP_URL`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::InvalidConfig("OPENAI_API_KEY is not set".to_string()))?;

        let mut builder = ClientBuilder::new(api_key);
        if let Some(org) = env_opt("OPENAI_ORG_ID") {
            builder = builder.organization(org);
        }
        if let Some(project) = env_opt("OPENAI_PROJECT_ID") {
            builder = builder.project(project);
        }
        if let Some(url) = env_opt("OPENAI_REALTIME_WS_URL") {
            builder = builder.websocket_url(url);
        }
        if let Some(url) = env_opt("OPENAI_REALTIME_HTTP_URL") {
            builder = builder.http_url(url);
        }
        builder.build()
    }

    /// Returns a builder for configuring a client.
    pub fn builder(api_key: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(api_key)
    }

    /// Sets the organization ID for API requests.
    pub fn with_organization(mut self, org_id: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).organization = Some(org_id.into());
        self
    }

    /// Sets the project ID for API requests.
    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).project = Some(project_id.into());
        self
    }

    /// Sets the WebSocket URL.
    pub fn with_websocket_url(mut self, url: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).ws_url = url.into();
        self
    }

    /// Sets the HTTP URL for WebRTC session creation.
    pub fn with_http_url(mut self, url: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).http_url = url.into();
        self
    }

    /// Connects over the given transport.
    pub async fn connect(
        &self,
        transport: Transport,
        config: Option<&ConnectConfig>,
    ) -> Result<Box<dyn Session>> {
        match transport {
            Transport::WebSocket => Ok(Box::new(self.connect_websocket(config).await?)),
            Transport::WebRtc => Ok(Box::new(self.connect_webrtc(config).await?)),
        }
    }

    /// Establishes a WebSocket connection to the Realtime API.
    /// This is suitable for server-side applications.
    pub async fn connect_websocket(&self, config: Option<&ConnectConfig>) -> Result<WebSocketSession> {
        let config = config.cloned().unwrap_or_default();
        WebSocketSession::connect(self.config.clone(), config.model_or_default()).await
    }

    /// Establishes a WebRTC connection to the Realtime API.
    ///
    /// Events travel over the "oai-events" data channel; model audio arrives
    /// as a remote media track.
    pub async fn connect_webrtc(&self, config: Option<&ConnectConfig>) -> Result<WebRtcSession> {
        let config = config.cloned().unwrap_or_default();
        WebRtcSession::connect(
            self.config.clone(),
            config.model_or_default(),
            config.voice_or_default(),
        )
        .await
    }

    /// Mints a short-lived client secret, e.g. for a browser peer.
    pub async fn create_ephemeral_token(&self, config: Option<&ConnectConfig>) -> Result<EphemeralToken> {
        let config = config.cloned().unwrap_or_default();
        HttpClient::new(&self.config)?
            .create_ephemeral_token(config.model_or_default(), config.voice_or_default())
            .await
    }
}

/// Builder for creating a Client with options.
pub struct ClientBuilder {
    api_key: String,
    organization: Option<String>,
    project: Option<String>,
    ws_url: Option<String>,
    http_url: Option<String>,
    timeout: Option<Duration>,
    ice_servers: Option<Vec<String>>,
}

impl ClientBuilder {
    /// Creates a new client builder.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            organization: None,
            project: None,
            ws_url: None,
            http_url: None,
            timeout: None,
            ice_servers: None,
        }
    }

    /// Sets the organization ID.
    pub fn organization(mut self, org_id: impl Into<String>) -> Self {
        self.organization = Some(org_id.into());
        self
    }

    /// Sets the project ID.
    pub fn project(mut self, project_id: impl Into<String>) -> Self {
        self.project = Some(project_id.into());
        self
    }

    /// Sets the WebSocket URL.
    pub fn websocket_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = Some(url.into());
        self
    }

    /// Sets the HTTP URL.
    pub fn http_url(mut self, url: impl Into<String>) -> Self {
        self.http_url = Some(url.into());
        self
    }

    /// Sets the handshake and HTTP request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the ICE server URLs used by WebRTC sessions.
    pub fn ice_servers(mut self, urls: Vec<String>) -> Self {
        self.ice_servers = Some(urls);
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<Client> {
        if self.api_key.is_empty() {
            return Err(Error::InvalidConfig("API key is required".to_string()));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(Error::InvalidConfig("timeout must be positive".to_string()));
        }

        let mut config = ClientConfig::new(self.api_key);
        config.organization = self.organization;
        config.project = self.project;
        if let Some(url) = self.ws_url {
            config.ws_url = url;
        }
        if let Some(url) = self.http_url {
            config.http_url = url;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(servers) = self.ice_servers {
            config.ice_servers = servers;
        }

        Ok(Client {
            config: Arc::new(config),
        })
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
