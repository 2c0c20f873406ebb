use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use cue_core::StreamEvent;

use crate::error::ClientError;

/// WebSocket connection to the backend's live event stream.
///
/// The stream is read-only from our side: the backend pushes frames, we
/// decode the ones we understand and ignore the rest. There is no
/// reconnection; a closed or failed stream ends the session view.
pub struct LiveStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl LiveStream {
    /// Connect to the live stream endpoint. Connect before starting a
    /// session so no early events are missed.
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (socket, _resp) = connect_async(url)
            .await
            .map_err(|e| ClientError::Connect(e.to_string()))?;
        info!(url, "live stream connected");
        Ok(Self { socket })
    }

    /// Next decodable event. Non-text frames and unknown or malformed
    /// payloads are skipped; `Ok(None)` means the server closed the stream.
    pub async fn next_event(&mut self) -> Result<Option<StreamEvent>, ClientError> {
        loop {
            let frame = match self.socket.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => return Err(ClientError::Transport(e.to_string())),
                None => return Ok(None),
            };
            match frame {
                Message::Text(text) => {
                    if let Some(event) = StreamEvent::decode(&text) {
                        return Ok(Some(event));
                    }
                }
                Message::Close(_) => {
                    debug!("live stream closed by server");
                    return Ok(None);
                }
                Message::Ping(_) | Message::Pong(_) => {}
                other => {
                    debug!(?other, "skipping non-text frame");
                }
            }
        }
    }

    pub async fn close(&mut self) -> Result<(), ClientError> {
        self.socket
            .close(None)
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }
}
