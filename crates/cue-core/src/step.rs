use serde::{Deserialize, Serialize};

/// One unit of performed speech, as carried by a `step` stream event.
/// Immutable once appended to the transcript.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub speech: String,
    pub stage: String,
    pub step: u32,
    /// Inbound interaction echoed back by the performer, if this line
    /// responds to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub danmaku: Option<String>,
    /// Server-relative path to the synthesized utterance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_snapshot: Option<MemorySnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_monologue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion_break: Option<EmotionBreak>,
}

/// The backend's current summary of recalled story points, open promises,
/// and emotion trend. Always replaced wholesale, never field-merged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    #[serde(default)]
    pub story_points: Vec<String>,
    #[serde(default)]
    pub promises: Vec<Promise>,
    /// Recent emotion levels, oldest first, for a sparkline.
    #[serde(default)]
    pub emotion_trend: Vec<f32>,
}

/// An unfulfilled commitment the performer made on air.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Promise {
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmotionBreak {
    pub level: f32,
}
