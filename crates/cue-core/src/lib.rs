//! Shared types for the cue console: identifiers, the stream event
//! envelope, and the step/memory wire types. No I/O lives here.

pub mod events;
pub mod ids;
pub mod step;

pub use events::StreamEvent;
pub use ids::{CharacterId, SessionId, VoiceConfigId};
pub use step::{EmotionBreak, MemorySnapshot, Promise, StepRecord};
