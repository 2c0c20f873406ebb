//! Audio output on a dedicated thread.
//!
//! rodio's output handles are not `Send`, so the device lives on its own
//! thread and the async side talks to it over channels: commands in,
//! playback signals out. Stale signals from a stopped clip are filtered
//! with an epoch counter so a reset queue never sees them.

use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use cue_session::{PlaybackSignal, PlaybackSink};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, thiserror::Error)]
enum PlayerError {
    #[error("no audio output device: {0}")]
    Device(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("undecodable audio: {0}")]
    Decode(String),
}

enum PlayerCommand {
    Play { reference: String, epoch: u64 },
    Stop,
}

/// What became of one clip on the playback thread.
enum Outcome {
    Finished,
    Stopped,
    Preempted(PlayerCommand),
}

/// Command side of the playback thread. Implements [`PlaybackSink`] so the
/// playback queue can drive it directly.
pub struct RodioSink {
    cmd_tx: std_mpsc::Sender<PlayerCommand>,
    epoch: Arc<AtomicU64>,
}

/// Signal side of the playback thread.
pub struct PlayerSignals {
    rx: mpsc::UnboundedReceiver<(u64, PlaybackSignal)>,
    epoch: Arc<AtomicU64>,
}

impl RodioSink {
    /// Spawn the playback thread. `base_url` resolves server-relative audio
    /// references. If no output device exists the thread stays up and
    /// answers every play with a failure signal, so the queue skips ahead
    /// instead of wedging.
    pub fn spawn(base_url: impl Into<String>) -> (RodioSink, PlayerSignals) {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let (cmd_tx, cmd_rx) = std_mpsc::channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let epoch = Arc::new(AtomicU64::new(0));

        thread::Builder::new()
            .name("cue-player".into())
            .spawn(move || playback_thread(base_url, cmd_rx, signal_tx))
            .ok();

        (
            RodioSink {
                cmd_tx,
                epoch: epoch.clone(),
            },
            PlayerSignals { rx: signal_rx, epoch },
        )
    }
}

impl PlaybackSink for RodioSink {
    fn begin(&mut self, reference: &str) {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let _ = self.cmd_tx.send(PlayerCommand::Play {
            reference: reference.to_string(),
            epoch,
        });
    }

    fn stop(&mut self) {
        // Bumping the epoch first makes any in-flight signal for the
        // stopped clip stale before the thread even sees the command.
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let _ = self.cmd_tx.send(PlayerCommand::Stop);
    }
}

impl PlayerSignals {
    /// Next signal for a clip started in the current epoch. Signals from
    /// clips stopped by a reset are dropped here.
    pub async fn recv(&mut self) -> Option<PlaybackSignal> {
        while let Some((epoch, signal)) = self.rx.recv().await {
            if epoch == self.epoch.load(Ordering::SeqCst) {
                return Some(signal);
            }
            debug!("dropping stale playback signal");
        }
        None
    }
}

fn playback_thread(
    base_url: String,
    cmd_rx: std_mpsc::Receiver<PlayerCommand>,
    signal_tx: mpsc::UnboundedSender<(u64, PlaybackSignal)>,
) {
    let output = OutputStream::try_default();
    let handle = match &output {
        Ok((_stream, handle)) => Some(handle.clone()),
        Err(e) => {
            warn!(error = %e, "audio output unavailable, playback will be skipped");
            None
        }
    };

    let mut next = cmd_rx.recv().ok();
    while let Some(command) = next.take() {
        match command {
            PlayerCommand::Stop => {}
            PlayerCommand::Play { reference, epoch } => {
                let result = match &handle {
                    Some(handle) => play_clip(handle, &base_url, &reference, &cmd_rx),
                    None => Err(PlayerError::Device("no output stream".into())),
                };
                match result {
                    Ok(Outcome::Finished) => {
                        let _ = signal_tx.send((epoch, PlaybackSignal::Finished));
                    }
                    Ok(Outcome::Stopped) => {}
                    Ok(Outcome::Preempted(command)) => {
                        next = Some(command);
                        continue;
                    }
                    Err(e) => {
                        let _ = signal_tx.send((
                            epoch,
                            PlaybackSignal::Failed { reason: e.to_string() },
                        ));
                    }
                }
            }
        }
        next = cmd_rx.recv().ok();
    }
}

fn play_clip(
    handle: &rodio::OutputStreamHandle,
    base_url: &str,
    reference: &str,
    cmd_rx: &std_mpsc::Receiver<PlayerCommand>,
) -> Result<Outcome, PlayerError> {
    let url = resolve(base_url, reference);
    debug!(%url, "fetching clip");
    let bytes = reqwest::blocking::get(&url)
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.bytes())
        .map_err(|e| PlayerError::Fetch(e.to_string()))?;
    let source = Decoder::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| PlayerError::Decode(e.to_string()))?;
    let sink = Sink::try_new(handle).map_err(|e| PlayerError::Device(e.to_string()))?;
    sink.append(source);

    loop {
        match cmd_rx.try_recv() {
            Ok(PlayerCommand::Stop) => {
                sink.stop();
                return Ok(Outcome::Stopped);
            }
            Ok(play @ PlayerCommand::Play { .. }) => {
                sink.stop();
                return Ok(Outcome::Preempted(play));
            }
            Err(std_mpsc::TryRecvError::Empty) => {}
            Err(std_mpsc::TryRecvError::Disconnected) => {
                sink.stop();
                return Ok(Outcome::Stopped);
            }
        }
        if sink.empty() {
            return Ok(Outcome::Finished);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Resolve a server-relative audio reference against the backend base URL.
fn resolve(base_url: &str, reference: &str) -> String {
    if reference.starts_with("http://") || reference.starts_with("https://") {
        reference.to_string()
    } else {
        format!("{base_url}{reference}")
    }
}
