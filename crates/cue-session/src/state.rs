use cue_core::{MemorySnapshot, SessionId, StepRecord, StreamEvent};

/// Lifecycle of the currently monitored session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
}

/// The reconstructed view of an in-progress performance: everything the
/// presentation layer reads, rebuilt from stream events in arrival order.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    status: SessionStatus,
    /// Durable identifier, assigned by the backend at completion.
    session_id: Option<SessionId>,
    transcript: Vec<StepRecord>,
    reasoning_log: Vec<String>,
    memory: MemorySnapshot,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset for a fresh session and mark it running. Called synchronously
    /// before the start command is issued, so events arriving right after
    /// start land on clean state.
    pub fn begin(&mut self) {
        self.status = SessionStatus::Running;
        self.session_id = None;
        self.transcript.clear();
        self.reasoning_log.clear();
        self.memory = MemorySnapshot::default();
    }

    /// Apply one stream event. Transcript and reasoning log only ever grow;
    /// the memory snapshot is replaced wholesale when a step carries one.
    pub fn apply(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::Reasoning { content } => {
                self.reasoning_log.push(content.clone());
            }
            StreamEvent::Step { data } => {
                if let Some(snapshot) = &data.memory_snapshot {
                    self.memory = snapshot.clone();
                }
                self.transcript.push(data.clone());
            }
            StreamEvent::Finish { session_id } => {
                self.status = SessionStatus::Idle;
                self.session_id = Some(session_id.clone());
            }
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn transcript(&self) -> &[StepRecord] {
        &self.transcript
    }

    pub fn reasoning_log(&self) -> &[String] {
        &self.reasoning_log
    }

    pub fn memory(&self) -> &MemorySnapshot {
        &self.memory
    }
}
