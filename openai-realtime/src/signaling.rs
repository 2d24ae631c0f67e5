//! HTTP signaling for WebRTC sessions: client secrets and SDP exchange.

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client as ReqwestClient, Response, StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::ClientConfig;
use crate::error::{Error, Result};

/// Short-lived credential minted for one WebRTC negotiation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EphemeralToken {
    /// Session ID the secret was minted for.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    /// Session expiry (unix seconds).
    #[serde(default)]
    pub expires_at: i64,
    pub client_secret: ClientSecret,
}

/// Client secret of an ephemeral token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientSecret {
    pub value: String,
    /// Secret expiry (unix seconds).
    #[serde(default)]
    pub expires_at: i64,
}

#[derive(Serialize)]
struct SessionRequest<'a> {
    model: &'a str,
    voice: &'a str,
}

/// HTTP client for the realtime REST endpoints.
pub(crate) struct HttpClient<'a> {
    client: ReqwestClient,
    config: &'a ClientConfig,
}

impl<'a> HttpClient<'a> {
    pub(crate) fn new(config: &'a ClientConfig) -> Result<Self> {
        let client = ReqwestClient::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Exchanges the API key for a client secret.
    pub(crate) async fn create_ephemeral_token(&self, model: &str, voice: &str) -> Result<EphemeralToken> {
        let url = format!("{}/sessions", self.config.http_url);
        debug!(model, voice, "creating ephemeral token");

        let response = self
            .client
            .post(&url)
            .headers(self.api_headers()?)
            .json(&SessionRequest { model, voice })
            .send()
            .await?;

        let response = check_status(response, "session_creation_failed", &[StatusCode::OK]).await?;
        let token: EphemeralToken = response.json().await?;
        if token.client_secret.value.is_empty() {
            return Err(Error::http_status_error(
                "session_creation_failed",
                "response carries no client secret",
                StatusCode::OK.as_u16(),
            ));
        }
        Ok(token)
    }

    /// Posts the local SDP offer and returns the SDP answer.
    pub(crate) async fn send_offer(&self, model: &str, ephemeral_key: &str, sdp: &str) -> Result<String> {
        let url = format!("{}?model={}", self.config.http_url, model);
        debug!(model, "exchanging sdp");

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, bearer(ephemeral_key)?)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/sdp"))
            .body(sdp.to_string())
            .send()
            .await?;

        let response = check_status(
            response,
            "sdp_exchange_failed",
            &[StatusCode::OK, StatusCode::CREATED],
        )
        .await?;
        Ok(response.text().await?)
    }

    fn api_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer(&self.config.api_key)?);
        if let Some(ref org) = self.config.organization {
            headers.insert("openai-organization", header_value(org)?);
        }
        if let Some(ref project) = self.config.project {
            headers.insert("openai-project", header_value(project)?);
        }
        Ok(headers)
    }
}

async fn check_status(response: Response, code: &str, accepted: &[StatusCode]) -> Result<Response> {
    let status = response.status();
    if accepted.contains(&status) {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::http_status_error(
        code,
        format!("unexpected status {}: {}", status, body),
        status.as_u16(),
    ))
}

fn bearer(token: &str) -> Result<HeaderValue> {
    header_value(&format!("Bearer {}", token))
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::InvalidConfig(format!("invalid header value: {}", e)))
}
