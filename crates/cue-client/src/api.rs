//! HTTP collaborator client for the performer backend.
//!
//! Thin request/response plumbing: session start, live interaction
//! injection, and the read-only lookups (status, history, characters) the
//! console needs to populate a start command. No session state lives here.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use cue_core::{CharacterId, SessionId, VoiceConfigId};

use crate::error::ClientError;

/// Parameters for starting a performance session.
#[derive(Clone, Debug, Serialize)]
pub struct StartLive {
    pub topic: String,
    pub character_id: CharacterId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_config_id: Option<VoiceConfigId>,
    pub max_steps: u32,
}

/// Acknowledgement for a start command. The session id here is
/// provisional; the durable identity arrives later on the finish event.
#[derive(Clone, Debug, Deserialize)]
pub struct StartAck {
    pub session_id: SessionId,
    #[serde(default)]
    pub message: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LiveStatus {
    pub is_running: bool,
    pub session_id: Option<SessionId>,
}

/// One past session, as listed by the history collaborator.
#[derive(Clone, Debug, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub topic: String,
    pub name: String,
    pub timestamp: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct VoiceConfig {
    pub id: VoiceConfigId,
    pub voice_name: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CharacterProfile {
    pub id: CharacterId,
    pub name: String,
    #[serde(default)]
    pub voice_configs: Vec<VoiceConfig>,
}

impl CharacterProfile {
    /// The voice the start form would pick: the config flagged default,
    /// else the first one.
    pub fn default_voice(&self) -> Option<&VoiceConfig> {
        self.voice_configs
            .iter()
            .find(|v| v.is_default)
            .or_else(|| self.voice_configs.first())
    }
}

/// Client for the backend's control endpoints.
pub struct ControlApi {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ControlApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The WebSocket endpoint derived from the HTTP base URL.
    pub fn ws_url(&self) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };
        format!("{ws_base}/ws")
    }

    pub fn download_url(&self, session_id: &SessionId) -> String {
        format!("{}/api/download/{}", self.base_url, session_id)
    }

    pub async fn start_live(&self, req: &StartLive) -> Result<StartAck, ClientError> {
        let resp = self
            .request(reqwest::Method::POST, "/api/start")
            .json(req)
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Inject a live interaction. The backend takes these as query-string
    /// parameters, not a JSON body.
    pub async fn send_danmaku(&self, text: &str, user: &str) -> Result<(), ClientError> {
        let resp = self
            .request(reqwest::Method::POST, "/api/danmaku")
            .query(&[("text", text), ("user", user)])
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(ClientError::from_status(status.as_u16(), &body))
        }
    }

    pub async fn status(&self) -> Result<LiveStatus, ClientError> {
        let resp = self.request(reqwest::Method::GET, "/api/status").send().await?;
        Self::decode(resp).await
    }

    pub async fn history(&self) -> Result<Vec<SessionSummary>, ClientError> {
        let resp = self.request(reqwest::Method::GET, "/api/history").send().await?;
        Self::decode(resp).await
    }

    pub async fn characters(&self) -> Result<Vec<CharacterProfile>, ClientError> {
        let resp = self
            .request(reqwest::Method::GET, "/api/characters")
            .send()
            .await?;
        Self::decode(resp).await
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            resp.json::<T>()
                .await
                .map_err(|e| ClientError::InvalidResponse(e.to_string()))
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(ClientError::from_status(status.as_u16(), &body))
        }
    }
}
