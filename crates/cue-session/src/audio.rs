use std::collections::VecDeque;

/// Where playable audio actually goes. `begin` must be non-blocking: the
/// sink starts playback and later reports the outcome as a
/// [`PlaybackSignal`] through whatever channel its owner wired up.
pub trait PlaybackSink {
    fn begin(&mut self, reference: &str);
    /// Stop the in-flight playback, if any. No signal should be delivered
    /// for a stopped reference.
    fn stop(&mut self);
}

/// Named transition triggers for the queue, in place of opaque platform
/// callbacks. Both advance to the next pending reference; a failure is
/// skipped, never retried, so one bad utterance cannot stall the queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackSignal {
    Finished,
    Failed { reason: String },
}

/// Plays audio references strictly one at a time, in enqueue order.
///
/// All mutation happens on the single orchestrating task (stream events and
/// playback signals are both handled there), so no locking is needed.
#[derive(Debug)]
pub struct AudioPlaybackQueue<S> {
    pending: VecDeque<String>,
    current: Option<String>,
    sink: S,
}

impl<S: PlaybackSink> AudioPlaybackQueue<S> {
    pub fn new(sink: S) -> Self {
        Self {
            pending: VecDeque::new(),
            current: None,
            sink,
        }
    }

    /// Append a reference; starts playback immediately if the queue is idle.
    pub fn enqueue(&mut self, reference: impl Into<String>) {
        self.pending.push_back(reference.into());
        if self.current.is_none() {
            self.drain_next();
        }
    }

    /// The active playback ended naturally.
    pub fn playback_finished(&mut self) {
        self.current = None;
        self.drain_next();
    }

    /// The active playback failed. Skip forward; retrying after later
    /// utterances were queued would break production order.
    pub fn playback_failed(&mut self, reason: &str) {
        if let Some(reference) = self.current.take() {
            tracing::debug!(reference = %reference, reason = reason, "Skipping failed utterance");
        }
        self.drain_next();
    }

    pub fn handle_signal(&mut self, signal: PlaybackSignal) {
        match signal {
            PlaybackSignal::Finished => self.playback_finished(),
            PlaybackSignal::Failed { reason } => self.playback_failed(&reason),
        }
    }

    /// Flush everything: clear pending references and stop the active
    /// playback. Invoked when autoplay is switched off.
    pub fn reset(&mut self) {
        self.pending.clear();
        if self.current.take().is_some() {
            self.sink.stop();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn drain_next(&mut self) {
        match self.pending.pop_front() {
            Some(reference) => {
                self.sink.begin(&reference);
                self.current = Some(reference);
            }
            None => {
                // Idle until the next enqueue.
                self.current = None;
            }
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every sink call so tests can assert exact playback order.
    #[derive(Clone, Default)]
    pub struct RecordingSink {
        pub ops: Rc<RefCell<Vec<String>>>,
    }

    impl PlaybackSink for RecordingSink {
        fn begin(&mut self, reference: &str) {
            self.ops.borrow_mut().push(format!("begin:{reference}"));
        }

        fn stop(&mut self) {
            self.ops.borrow_mut().push("stop".into());
        }
    }

    fn queue() -> (AudioPlaybackQueue<RecordingSink>, Rc<RefCell<Vec<String>>>) {
        let sink = RecordingSink::default();
        let ops = Rc::clone(&sink.ops);
        (AudioPlaybackQueue::new(sink), ops)
    }

    #[test]
    fn first_enqueue_starts_playback() {
        let (mut q, ops) = queue();
        q.enqueue("/a/1.mp3");
        assert!(q.is_playing());
        assert_eq!(q.current(), Some("/a/1.mp3"));
        assert_eq!(q.pending_len(), 0);
        assert_eq!(&*ops.borrow(), &["begin:/a/1.mp3"]);
    }

    #[test]
    fn bursty_enqueues_never_overlap() {
        let (mut q, ops) = queue();
        q.enqueue("/a/1.mp3");
        q.enqueue("/a/2.mp3");
        q.enqueue("/a/3.mp3");
        // Still only the first playing; the rest wait their turn.
        assert_eq!(q.current(), Some("/a/1.mp3"));
        assert_eq!(q.pending_len(), 2);
        assert_eq!(&*ops.borrow(), &["begin:/a/1.mp3"]);
    }

    #[test]
    fn playback_order_matches_enqueue_order() {
        let (mut q, ops) = queue();
        for n in 1..=4 {
            q.enqueue(format!("/a/{n}.mp3"));
        }
        while q.is_playing() {
            q.playback_finished();
        }
        assert_eq!(
            &*ops.borrow(),
            &["begin:/a/1.mp3", "begin:/a/2.mp3", "begin:/a/3.mp3", "begin:/a/4.mp3"]
        );
    }

    #[test]
    fn error_skips_forward_without_retry() {
        let (mut q, ops) = queue();
        q.enqueue("/a/1.mp3");
        q.enqueue("/a/2.mp3");
        q.enqueue("/a/3.mp3");
        q.playback_finished();
        assert_eq!(q.current(), Some("/a/2.mp3"));
        q.playback_failed("404 not found");
        // Straight to a3 — a2 is never re-attempted.
        assert_eq!(q.current(), Some("/a/3.mp3"));
        assert_eq!(
            &*ops.borrow(),
            &["begin:/a/1.mp3", "begin:/a/2.mp3", "begin:/a/3.mp3"]
        );
    }

    #[test]
    fn drains_to_idle_then_restarts_on_enqueue() {
        let (mut q, _ops) = queue();
        q.enqueue("/a/1.mp3");
        q.playback_finished();
        assert!(!q.is_playing());
        q.enqueue("/a/2.mp3");
        assert_eq!(q.current(), Some("/a/2.mp3"));
    }

    #[test]
    fn reset_flushes_pending_and_stops_active() {
        let (mut q, ops) = queue();
        q.enqueue("/a/2.mp3");
        q.enqueue("/a/3.mp3");
        q.enqueue("/a/4.mp3");
        assert!(q.is_playing());

        q.reset();
        assert!(!q.is_playing());
        assert_eq!(q.pending_len(), 0);
        assert_eq!(&*ops.borrow(), &["begin:/a/2.mp3", "stop"]);

        // Nothing restarts until a fresh enqueue.
        q.playback_finished();
        assert!(!q.is_playing());
    }

    #[test]
    fn reset_when_idle_does_not_touch_the_sink() {
        let (mut q, ops) = queue();
        q.reset();
        assert!(ops.borrow().is_empty());
    }

    #[test]
    fn signals_map_to_named_triggers() {
        let (mut q, _ops) = queue();
        q.enqueue("/a/1.mp3");
        q.enqueue("/a/2.mp3");
        q.handle_signal(PlaybackSignal::Finished);
        assert_eq!(q.current(), Some("/a/2.mp3"));
        q.handle_signal(PlaybackSignal::Failed { reason: "decode error".into() });
        assert!(!q.is_playing());
    }
}
