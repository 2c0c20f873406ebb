use cue_core::StreamEvent;

use crate::audio::{AudioPlaybackQueue, PlaybackSink};
use crate::state::SessionState;

/// Applies decoded stream events to the session view and feeds the audio
/// queue when autoplay is on.
///
/// The owner drives this from a single task: stream frames and playback
/// signals are handled in the order they arrive, so the transcript order
/// and the playback order are both the production order.
pub struct StreamConsumer<S> {
    state: SessionState,
    audio: AudioPlaybackQueue<S>,
    autoplay: bool,
}

impl<S: PlaybackSink> StreamConsumer<S> {
    pub fn new(sink: S) -> Self {
        Self::with_autoplay(sink, true)
    }

    pub fn with_autoplay(sink: S, autoplay: bool) -> Self {
        Self {
            state: SessionState::new(),
            audio: AudioPlaybackQueue::new(sink),
            autoplay,
        }
    }

    /// Reset view state and playback for a new session. Runs synchronously
    /// before the start command goes out.
    pub fn begin(&mut self) {
        self.state.begin();
        self.audio.reset();
    }

    /// Apply one event in arrival order. Autoplay only gates the audio side
    /// effect; transcript, reasoning, and memory updates always happen.
    pub fn apply(&mut self, event: StreamEvent) {
        self.state.apply(&event);
        if let StreamEvent::Step { data } = event {
            if self.autoplay {
                if let Some(reference) = data.audio_url {
                    self.audio.enqueue(reference);
                }
            }
        }
    }

    pub fn autoplay(&self) -> bool {
        self.autoplay
    }

    /// Toggle autoplay. Switching off flushes the queue immediately:
    /// already-enqueued audio is abandoned, not buffered for later.
    pub fn set_autoplay(&mut self, on: bool) {
        if self.autoplay && !on {
            self.audio.reset();
        }
        self.autoplay = on;
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn audio(&self) -> &AudioPlaybackQueue<S> {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut AudioPlaybackQueue<S> {
        &mut self.audio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::tests::RecordingSink;
    use crate::state::SessionStatus;
    use cue_core::{SessionId, StepRecord};

    fn consumer() -> StreamConsumer<RecordingSink> {
        let mut c = StreamConsumer::new(RecordingSink::default());
        c.begin();
        c
    }

    fn step_event(n: u32, audio_url: Option<&str>) -> StreamEvent {
        StreamEvent::Step {
            data: StepRecord {
                speech: format!("line {n}"),
                stage: "banter".into(),
                step: n,
                danmaku: None,
                audio_url: audio_url.map(String::from),
                memory_snapshot: None,
                inner_monologue: None,
                emotion_break: None,
            },
        }
    }

    #[test]
    fn steps_with_audio_feed_the_queue_in_order() {
        let mut c = consumer();
        c.apply(step_event(1, Some("/a/1.mp3")));
        c.apply(step_event(2, Some("/a/2.mp3")));
        assert_eq!(c.state().transcript().len(), 2);
        assert_eq!(c.audio().current(), Some("/a/1.mp3"));
        assert_eq!(c.audio().pending_len(), 1);

        c.audio_mut().playback_finished();
        assert_eq!(c.audio().current(), Some("/a/2.mp3"));
    }

    #[test]
    fn steps_without_audio_do_not_touch_the_queue() {
        let mut c = consumer();
        c.apply(step_event(1, None));
        assert!(!c.audio().is_playing());
        assert_eq!(c.state().transcript().len(), 1);
    }

    #[test]
    fn autoplay_off_gates_audio_but_not_state() {
        let mut c = consumer();
        c.set_autoplay(false);
        c.apply(step_event(1, Some("/a/1.mp3")));
        c.apply(StreamEvent::Reasoning { content: "still thinking".into() });
        // Transcript and reasoning keep flowing; audio never reaches the queue.
        assert_eq!(c.state().transcript().len(), 1);
        assert_eq!(c.state().reasoning_log().len(), 1);
        assert!(!c.audio().is_playing());
        assert_eq!(c.audio().pending_len(), 0);
    }

    #[test]
    fn switching_autoplay_off_flushes_in_flight_audio() {
        let mut c = consumer();
        c.apply(step_event(1, Some("/a/1.mp3")));
        c.apply(step_event(2, Some("/a/2.mp3")));
        c.apply(step_event(3, Some("/a/3.mp3")));
        assert!(c.audio().is_playing());

        c.set_autoplay(false);
        assert!(!c.audio().is_playing());
        assert_eq!(c.audio().pending_len(), 0);

        // Re-enable: nothing plays until a new step arrives.
        c.set_autoplay(true);
        assert!(!c.audio().is_playing());
        c.apply(step_event(4, Some("/a/4.mp3")));
        assert_eq!(c.audio().current(), Some("/a/4.mp3"));
    }

    #[test]
    fn finish_leaves_queue_draining() {
        let mut c = consumer();
        c.apply(step_event(1, Some("/a/1.mp3")));
        c.apply(StreamEvent::Finish {
            session_id: SessionId::from_raw("sess-42"),
        });
        // Session is over, but already-queued audio keeps playing out.
        assert_eq!(c.state().status(), SessionStatus::Idle);
        assert_eq!(c.audio().current(), Some("/a/1.mp3"));
    }

    #[test]
    fn begin_resets_state_and_queue() {
        let mut c = consumer();
        c.apply(step_event(1, Some("/a/1.mp3")));
        c.apply(step_event(2, Some("/a/2.mp3")));
        c.begin();
        assert_eq!(c.state().status(), SessionStatus::Running);
        assert!(c.state().transcript().is_empty());
        assert!(!c.audio().is_playing());
        assert_eq!(c.audio().pending_len(), 0);
    }

    #[test]
    fn scenario_two_steps_play_sequentially() {
        let mut c = consumer();
        for text in [
            r#"{"type":"step","data":{"speech":"hi","stage":"intro","step":1,"audio_url":"/a/1.mp3"}}"#,
            r#"{"type":"step","data":{"speech":"bye","stage":"outro","step":2,"audio_url":"/a/2.mp3"}}"#,
        ] {
            c.apply(StreamEvent::decode(text).unwrap());
        }
        assert_eq!(c.state().transcript().len(), 2);
        assert_eq!(c.audio().current(), Some("/a/1.mp3"));
        c.audio_mut().playback_finished();
        assert_eq!(c.audio().current(), Some("/a/2.mp3"));
        c.audio_mut().playback_finished();
        assert!(!c.audio().is_playing());
    }
}
