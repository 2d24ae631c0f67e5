//! WebRTC-based realtime session.
//!
//! Connecting takes several ordered steps: mint an ephemeral client secret,
//! create a peer connection with a receive-only audio transceiver and the
//! "oai-events" data channel, gather ICE candidates completely, then trade
//! SDP with the API using the client secret. A failure at any step closes
//! whatever was already allocated.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MediaEngine, MIME_TYPE_OPUS};
use webrtc::api::APIBuilder;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;
use webrtc::data_channel::RTCDataChannel;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

use crate::client::ClientConfig;
use crate::error::{ConnectStep, Error, Result};
use crate::event::ClientEvent;
use crate::signaling::HttpClient;
use crate::session::{truncate_for_log, EventStream, Session, SessionCore, SessionState};

/// Label of the data channel carrying JSON events.
pub const DATA_CHANNEL_LABEL: &str = "oai-events";

/// WebRTC-based realtime session.
pub struct WebRtcSession {
    core: Arc<SessionCore>,
    pc: Arc<RTCPeerConnection>,
    dc: OnceLock<Arc<RTCDataChannel>>,
    send_lock: tokio::sync::Mutex<()>,
    remote_audio: Arc<Mutex<Option<Arc<TrackRemote>>>>,
    local_audio: Mutex<Option<Arc<TrackLocalStaticSample>>>,
}

impl WebRtcSession {
    /// Connects to the OpenAI Realtime API via WebRTC.
    pub(crate) async fn connect(config: Arc<ClientConfig>, model: &str, voice: &str) -> Result<Self> {
        let http = HttpClient::new(&config).map_err(|e| Error::connect(ConnectStep::EphemeralCredential, e))?;

        let token = http
            .create_ephemeral_token(model, voice)
            .await
            .map_err(|e| Error::connect(ConnectStep::EphemeralCredential, e))?;
        debug!(session_id = %token.id, "ephemeral token created");

        let pc = new_peer_connection(&config.ice_servers)
            .await
            .map_err(|e| Error::connect(ConnectStep::PeerConnection, e))?;

        let session = Self::with_peer_connection(pc);

        if let Err(e) = session
            .negotiate(&http, model, &token.client_secret.value)
            .await
        {
            error!(step = ?e.connect_step(), error = %e, "webrtc setup failed");
            if let Err(close_err) = session.close().await {
                warn!("Failed to release peer connection: {}", close_err);
            }
            return Err(e);
        }

        session.core.activate();
        info!(model, "webrtc session connected");
        Ok(session)
    }

    fn with_peer_connection(pc: RTCPeerConnection) -> Self {
        Self {
            core: Arc::new(SessionCore::new()),
            pc: Arc::new(pc),
            dc: OnceLock::new(),
            send_lock: tokio::sync::Mutex::new(()),
            remote_audio: Arc::new(Mutex::new(None)),
            local_audio: Mutex::new(None),
        }
    }

    async fn negotiate(&self, http: &HttpClient<'_>, model: &str, ephemeral_key: &str) -> Result<()> {
        self.pc
            .add_transceiver_from_kind(
                RTPCodecType::Audio,
                Some(RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Recvonly,
                    send_encodings: vec![],
                }),
            )
            .await
            .map_err(|e| Error::connect(ConnectStep::AudioTransceiver, e))?;

        let dc = self
            .pc
            .create_data_channel(DATA_CHANNEL_LABEL, None)
            .await
            .map_err(|e| Error::connect(ConnectStep::DataChannel, e))?;
        self.register_data_channel(&dc);
        let _ = self.dc.set(dc);
        self.register_peer_handlers();

        let offer = self
            .create_offer()
            .await
            .map_err(|e| Error::connect(ConnectStep::Offer, e))?;

        let answer = http
            .send_offer(model, ephemeral_key, &offer)
            .await
            .map_err(|e| Error::connect(ConnectStep::SdpExchange, e))?;

        let answer = RTCSessionDescription::answer(answer)
            .map_err(|e| Error::connect(ConnectStep::RemoteDescription, e))?;
        self.pc
            .set_remote_description(answer)
            .await
            .map_err(|e| Error::connect(ConnectStep::RemoteDescription, e))?;
        Ok(())
    }

    /// Creates the offer and waits for ICE gathering to complete.
    async fn create_offer(&self) -> Result<String> {
        let offer = self.pc.create_offer(None).await?;
        let mut gather_complete = self.pc.gathering_complete_promise().await;
        self.pc.set_local_description(offer).await?;
        let _ = gather_complete.recv().await;

        let local = self
            .pc
            .local_description()
            .await
            .ok_or_else(|| Error::ConnectionClosed("no local description after ICE gathering".to_string()))?;
        Ok(local.sdp)
    }

    fn register_data_channel(&self, dc: &Arc<RTCDataChannel>) {
        dc.on_open(Box::new(|| {
            Box::pin(async {
                debug!("data channel open");
            })
        }));

        let core = self.core.clone();
        dc.on_message(Box::new(move |msg: DataChannelMessage| {
            let core = core.clone();
            Box::pin(async move {
                core.handle_frame(msg.data).await;
            })
        }));

        let core = self.core.clone();
        dc.on_close(Box::new(move || {
            let core = core.clone();
            Box::pin(async move {
                debug!("data channel closed");
                core.fail(Error::ConnectionClosed("data channel closed".to_string()))
                    .await;
            })
        }));
    }

    fn register_peer_handlers(&self) {
        let remote_audio = self.remote_audio.clone();
        self.pc.on_track(Box::new(move |track: Arc<TrackRemote>, _receiver, _transceiver| {
            if track.kind() == RTPCodecType::Audio {
                debug!(
                    codec = %track.codec().capability.mime_type,
                    "remote audio track received"
                );
                *remote_audio.lock() = Some(track);
            }
            Box::pin(async {})
        }));

        let core = self.core.clone();
        self.pc
            .on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
                let core = core.clone();
                debug!(state = %state, "peer connection state changed");
                Box::pin(async move {
                    if state == RTCPeerConnectionState::Failed {
                        core.fail(Error::ConnectionClosed("peer connection failed".to_string()))
                            .await;
                    }
                })
            }));
    }

    async fn send_text(&self, text: String) -> Result<()> {
        self.core.ensure_open()?;
        let dc = self
            .dc
            .get()
            .filter(|dc| dc.ready_state() == RTCDataChannelState::Open)
            .ok_or(Error::ChannelNotReady)?;

        debug!("Sending event: {}", truncate_for_log(&text, 500));
        let _guard = self.send_lock.lock().await;
        if let Err(e) = dc.send_text(text).await {
            error!("Write error: {}", e);
            self.core.fail_write(&e);
            return Err(e.into());
        }
        Ok(())
    }

    /// Returns the underlying peer connection.
    pub fn peer_connection(&self) -> &Arc<RTCPeerConnection> {
        &self.pc
    }

    /// Returns the event data channel.
    pub fn data_channel(&self) -> Option<&Arc<RTCDataChannel>> {
        self.dc.get()
    }

    /// Returns the remote audio track once the server has sent it.
    pub fn remote_audio_track(&self) -> Option<Arc<TrackRemote>> {
        self.remote_audio.lock().clone()
    }

    /// Attaches the outbound audio track. Only one track may be attached.
    ///
    /// Samples written to the track are streamed to the server as media,
    /// bypassing input_audio_buffer.append.
    pub async fn add_local_audio_track(&self, track: Arc<TrackLocalStaticSample>) -> Result<Arc<RTCRtpSender>> {
        self.core.ensure_open()?;
        {
            let mut local = self.local_audio.lock();
            if local.is_some() {
                return Err(Error::AudioTrackExists);
            }
            *local = Some(track.clone());
        }

        match self.pc.add_track(track as Arc<dyn TrackLocal + Send + Sync>).await {
            Ok(sender) => Ok(sender),
            Err(e) => {
                self.local_audio.lock().take();
                Err(e.into())
            }
        }
    }

    /// Creates an Opus track suitable for [`add_local_audio_track`](Self::add_local_audio_track).
    pub fn new_opus_track() -> Arc<TrackLocalStaticSample> {
        Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            "audio".to_owned(),
            "giztoy".to_owned(),
        ))
    }
}

#[async_trait]
impl Session for WebRtcSession {
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

    /// Closes the data channel, then the peer connection.
    async fn close(&self) -> Result<()> {
        if !self.core.begin_close() {
            return Ok(());
        }

        if let Some(dc) = self.dc.get() {
            if let Err(e) = dc.close().await {
                warn!("Failed to close data channel: {}", e);
            }
        }
        self.pc.close().await?;
        Ok(())
    }
}

/// A session dropped without [`Session::close`] releases the peer connection
/// on the current tokio runtime, if there is one.
impl Drop for WebRtcSession {
    fn drop(&mut self) {
        if !self.core.begin_close() {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("webrtc session dropped outside a runtime; peer connection not closed");
            return;
        };

        let pc = self.pc.clone();
        let dc = self.dc.get().cloned();
        handle.spawn(async move {
            if let Some(dc) = dc {
                if let Err(e) = dc.close().await {
                    warn!("Failed to close data channel: {}", e);
                }
            }
            if let Err(e) = pc.close().await {
                warn!("Failed to close peer connection: {}", e);
            }
        });
    }
}

async fn new_peer_connection(ice_servers: &[String]) -> Result<RTCPeerConnection> {
    let mut media_engine = MediaEngine::default();
    media_engine.register_default_codecs()?;

    let mut registry = Registry::new();
    registry = register_default_interceptors(registry, &mut media_engine)?;

    let api = APIBuilder::new()
        .with_media_engine(media_engine)
        .with_interceptor_registry(registry)
        .build();

    let mut config = RTCConfiguration::default();
    if !ice_servers.is_empty() {
        config.ice_servers = vec![RTCIceServer {
            urls: ice_servers.to_vec(),
            ..Default::default()
        }];
    }

    Ok(api.new_peer_connection(config).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_opus_track() {
        let track = WebRtcSession::new_opus_track();
        assert_eq!(track.codec().mime_type, MIME_TYPE_OPUS);
        assert_eq!(track.kind(), RTPCodecType::Audio);
    }

    async fn unnegotiated_session() -> WebRtcSession {
        WebRtcSession::with_peer_connection(new_peer_connection(&[]).await.unwrap())
    }

    async fn wait_for_closed(pc: &RTCPeerConnection) {
        for _ in 0..100 {
            if pc.connection_state() == RTCPeerConnectionState::Closed {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("peer connection not closed: {}", pc.connection_state());
    }

    #[tokio::test]
    async fn test_send_without_data_channel() {
        let session = unnegotiated_session().await;
        assert!(matches!(
            session.send(&ClientEvent::commit_input()).await,
            Err(Error::ChannelNotReady)
        ));
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_send_before_data_channel_opens() {
        let session = unnegotiated_session().await;
        let dc = session.pc.create_data_channel(DATA_CHANNEL_LABEL, None).await.unwrap();
        session.register_data_channel(&dc);
        let _ = session.dc.set(dc);

        assert!(matches!(
            session.send_raw(serde_json::json!({ "type": "input_audio_buffer.clear" })).await,
            Err(Error::ChannelNotReady)
        ));
        assert!(matches!(session.commit_input().await, Err(Error::ChannelNotReady)));
        assert_ne!(session.state(), SessionState::Closed);

        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_second_local_audio_track_rejected() {
        let session = unnegotiated_session().await;

        session
            .add_local_audio_track(WebRtcSession::new_opus_track())
            .await
            .unwrap();
        assert!(matches!(
            session.add_local_audio_track(WebRtcSession::new_opus_track()).await,
            Err(Error::AudioTrackExists)
        ));

        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_before_setup_finished_is_idempotent() {
        let session = unnegotiated_session().await;
        let dc = session.pc.create_data_channel(DATA_CHANNEL_LABEL, None).await.unwrap();
        session.register_data_channel(&dc);
        let _ = session.dc.set(dc);
        let mut events = session.events();

        session.close().await.unwrap();
        session.close().await.unwrap();

        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.pc.connection_state(), RTCPeerConnectionState::Closed);
        assert!(matches!(session.commit_input().await, Err(Error::SessionClosed)));
        assert!(matches!(
            session.add_local_audio_track(WebRtcSession::new_opus_track()).await,
            Err(Error::SessionClosed)
        ));

        let end = tokio::time::timeout(std::time::Duration::from_secs(1), futures::StreamExt::next(&mut events))
            .await
            .expect("stream did not end after close");
        assert!(end.is_none());
    }

    #[tokio::test]
    async fn test_drop_closes_peer_connection() {
        let session = unnegotiated_session().await;
        let pc = session.peer_connection().clone();

        drop(session);
        wait_for_closed(&pc).await;
    }

    #[tokio::test]
    async fn test_peer_connection_with_default_stun() {
        let pc = new_peer_connection(&[crate::client::DEFAULT_STUN_SERVER.to_string()])
            .await
            .unwrap();
        assert_eq!(pc.connection_state(), RTCPeerConnectionState::New);
        pc.close().await.unwrap();
    }
}
