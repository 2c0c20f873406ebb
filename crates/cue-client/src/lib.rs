//! Transport for the cue console: the live WebSocket stream, the HTTP
//! control API, and the session controller that issues user commands.

pub mod api;
pub mod controller;
pub mod error;
pub mod stream;

pub use api::{
    CharacterProfile, ControlApi, LiveStatus, SessionSummary, StartAck, StartLive, VoiceConfig,
};
pub use controller::SessionController;
pub use error::ClientError;
pub use stream::LiveStream;
