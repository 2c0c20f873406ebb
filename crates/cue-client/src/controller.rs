use tracing::{info, warn};

use cue_session::{PlaybackSink, StreamConsumer};

use crate::api::{ControlApi, StartAck, StartLive};
use crate::error::ClientError;

/// Issues user commands against the control API and keeps the local
/// consumer in step with them.
pub struct SessionController {
    api: ControlApi,
    author: String,
}

impl SessionController {
    pub fn new(api: ControlApi, author: impl Into<String>) -> Self {
        Self {
            api,
            author: author.into(),
        }
    }

    pub fn api(&self) -> &ControlApi {
        &self.api
    }

    /// Start a session. The consumer is reset to a fresh Running view
    /// before the command goes out, so the first stream event lands on a
    /// clean slate. The reset is not rolled back on rejection; the next
    /// successful start replaces the view anyway.
    pub async fn start<S: PlaybackSink>(
        &self,
        consumer: &mut StreamConsumer<S>,
        req: &StartLive,
    ) -> Result<StartAck, ClientError> {
        consumer.begin();
        let ack = self.api.start_live(req).await?;
        info!(session_id = %ack.session_id, topic = %req.topic, "session started");
        Ok(ack)
    }

    /// Forward a viewer interaction to the running performance. Rejections
    /// are logged and returned; the session view is untouched either way.
    pub async fn send_interaction(&self, text: &str) -> Result<(), ClientError> {
        match self.api.send_danmaku(text, &self.author).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(error = %e, kind = e.error_kind(), "interaction rejected");
                Err(e)
            }
        }
    }
}
