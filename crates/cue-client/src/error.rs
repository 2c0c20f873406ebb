/// Errors surfaced by the stream transport and the control API.
/// Command rejections carry the backend's human-readable detail so the
/// caller can display it.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("stream transport error: {0}")]
    Transport(String),

    #[error("command rejected ({status}): {detail}")]
    CommandRejected { status: u16, detail: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Build a command rejection from an HTTP error status, extracting the
    /// `detail` field the backend puts in error bodies when present.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
            .unwrap_or_else(|| body.to_string());
        Self::CommandRejected { status, detail }
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Connect(_) => "connect",
            Self::Transport(_) => "transport",
            Self::CommandRejected { .. } => "command_rejected",
            Self::Network(_) => "network",
            Self::InvalidResponse(_) => "invalid_response",
        }
    }
}
