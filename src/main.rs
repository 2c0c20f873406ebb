use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::{debug, warn};

use cue_client::{ClientError, ControlApi, LiveStream, SessionController, StartLive};
use cue_core::{StreamEvent, VoiceConfigId};
use cue_player::RodioSink;
use cue_session::{PlaybackSink, SessionStatus, StreamConsumer};
use cue_telemetry::{init_telemetry, TelemetryConfig};

/// Control console for live AI performer sessions.
#[derive(Parser, Debug)]
#[command(name = "cue", version, about)]
struct Cli {
    /// Backend base URL
    #[arg(long, default_value = "http://localhost:8000")]
    server: String,

    /// Bearer token for the control API
    #[arg(long, env = "CUE_TOKEN")]
    token: Option<String>,

    /// Character to perform (name or id)
    #[arg(long)]
    character: String,

    /// Topic for the performance
    #[arg(long)]
    topic: String,

    /// Voice config id (defaults to the character's default voice)
    #[arg(long)]
    voice: Option<VoiceConfigId>,

    /// Maximum number of performance steps
    #[arg(long, default_value_t = 15)]
    max_steps: u32,

    /// Do not play clip audio locally
    #[arg(long)]
    no_autoplay: bool,

    /// Author name attached to interactions typed at the console
    #[arg(long, default_value = "console")]
    author: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut telemetry = TelemetryConfig::default();
    if cli.verbose {
        telemetry.log_level = tracing::Level::DEBUG;
    }
    telemetry.json = cli.json_logs;
    init_telemetry(telemetry);

    let mut api = ControlApi::new(cli.server.clone());
    if let Some(token) = &cli.token {
        api = api.with_token(token.clone());
    }

    let status = api.status().await.context("backend unreachable")?;
    if status.is_running {
        bail!("a session is already running on the backend; wait for it to finish");
    }

    let characters = api.characters().await.context("listing characters")?;
    let character = characters
        .iter()
        .find(|c| c.name == cli.character || c.id.as_str() == cli.character)
        .with_context(|| format!("no character named '{}'", cli.character))?;
    let voice_config_id = cli
        .voice
        .clone()
        .or_else(|| character.default_voice().map(|v| v.id.clone()));

    let (sink, mut signals) = RodioSink::spawn(api.base_url());
    let mut consumer = StreamConsumer::with_autoplay(sink, !cli.no_autoplay);

    // Connect before starting so no early events are missed.
    let mut stream = LiveStream::connect(&api.ws_url())
        .await
        .context("connecting to the live stream")?;

    let controller = Arc::new(SessionController::new(api, cli.author.clone()));
    let request = StartLive {
        topic: cli.topic.clone(),
        character_id: character.id.clone(),
        voice_config_id,
        max_steps: cli.max_steps,
    };
    let ack = controller.start(&mut consumer, &request).await?;
    println!("session starting: {} ({})", ack.session_id, ack.message);
    println!("type a message to send it to the performer; /mute /unmute /history /quit");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut finished = false;
    let mut stream_open = true;
    let mut signals_open = true;
    let mut stdin_open = true;

    loop {
        // Without a live playback thread the queue can never drain further.
        if finished && (!consumer.audio().is_playing() || !signals_open) {
            break;
        }
        tokio::select! {
            event = stream.next_event(), if stream_open => match event {
                Ok(Some(event)) => {
                    render(&event);
                    if matches!(event, StreamEvent::Finish { .. }) {
                        finished = true;
                    }
                    consumer.apply(event);
                }
                Ok(None) => {
                    stream_open = false;
                    if !finished {
                        warn!("stream closed before the session finished");
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, kind = e.error_kind(), "stream failed");
                    break;
                }
            },
            signal = signals.recv(), if signals_open => match signal {
                Some(signal) => consumer.audio_mut().handle_signal(signal),
                None => {
                    debug!("playback thread gone");
                    signals_open = false;
                }
            },
            line = next_line(&mut stdin), if stdin_open => match line {
                Some(line) => {
                    if handle_command(&controller, &mut consumer, line.trim()) {
                        break;
                    }
                }
                None => stdin_open = false,
            },
        }
    }

    if stream_open {
        if let Err(e) = stream.close().await {
            debug!(error = %e, "closing stream");
        }
    }

    let state = consumer.state();
    println!();
    println!(
        "session over: {} steps, {} reasoning notes",
        state.transcript().len(),
        state.reasoning_log().len()
    );
    if state.status() == SessionStatus::Idle {
        if let Some(session_id) = state.session_id() {
            println!("recording: {}", controller.api().download_url(session_id));
        }
    }
    Ok(())
}

/// Read one console line. `None` means end of input (or a read error) and
/// the caller must stop polling; re-polling a finished stdin resolves
/// immediately and would spin the select loop.
async fn next_line<R>(lines: &mut Lines<R>) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    match lines.next_line().await {
        Ok(line) => line,
        Err(e) => {
            debug!(error = %e, "console input closed");
            None
        }
    }
}

/// Handle one console line. Returns true when the user asked to quit.
///
/// Network commands are spawned so a slow backend response never stalls
/// the run loop; their outcome is printed when the request resolves.
fn handle_command<S: PlaybackSink>(
    controller: &Arc<SessionController>,
    consumer: &mut StreamConsumer<S>,
    line: &str,
) -> bool {
    match line {
        "" => false,
        "/quit" | "/q" => true,
        "/mute" => {
            consumer.set_autoplay(false);
            println!("audio muted");
            false
        }
        "/unmute" => {
            consumer.set_autoplay(true);
            println!("audio on (from the next step)");
            false
        }
        "/history" => {
            let controller = Arc::clone(controller);
            tokio::spawn(async move {
                match controller.api().history().await {
                    Ok(sessions) if sessions.is_empty() => println!("no recorded sessions"),
                    Ok(sessions) => {
                        for session in sessions {
                            println!(
                                "{}  {}  {}",
                                session.timestamp, session.session_id, session.topic
                            );
                        }
                    }
                    Err(e) => println!("history unavailable: {e}"),
                }
            });
            false
        }
        text => {
            let controller = Arc::clone(controller);
            let text = text.to_string();
            tokio::spawn(async move {
                match controller.send_interaction(&text).await {
                    Ok(()) => println!("sent"),
                    Err(ClientError::CommandRejected { detail, .. }) => {
                        println!("rejected: {detail}");
                    }
                    Err(e) => println!("send failed: {e}"),
                }
            });
            false
        }
    }
}

fn render(event: &StreamEvent) {
    let stamp = chrono::Local::now().format("%H:%M:%S");
    match event {
        StreamEvent::Reasoning { content } => {
            println!("[{stamp}]   ({content})");
        }
        StreamEvent::Step { data } => {
            println!("[{stamp}] {}#{} {}", data.stage, data.step, data.speech);
            if let Some(danmaku) = &data.danmaku {
                println!("           replying to: {danmaku}");
            }
            if let Some(monologue) = &data.inner_monologue {
                println!("           [inner] {monologue}");
            }
            if let Some(emotion) = &data.emotion_break {
                println!("           [emotion break: {:.2}]", emotion.level);
            }
        }
        StreamEvent::Finish { session_id } => {
            println!("[{stamp}] -- finished ({session_id}) --");
        }
    }
}
