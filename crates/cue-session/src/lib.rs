//! Session state reconstruction and sequential audio playback.
//!
//! Everything in this crate is synchronous and transport-free: the stream
//! consumer is fed decoded events by whoever owns the connection, and the
//! playback queue talks to an injected [`PlaybackSink`]. That keeps the
//! ordering and failure-handling logic testable without a network or an
//! audio device.

pub mod audio;
pub mod consumer;
pub mod state;

pub use audio::{AudioPlaybackQueue, PlaybackSignal, PlaybackSink};
pub use consumer::StreamConsumer;
pub use state::{SessionState, SessionStatus};
