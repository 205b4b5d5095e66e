//! Streaming analysis-progress feed
//!
//! One WebSocket subscription per watched project. The wire frames are maps
//! keyed by project id whose values are JSON-encoded strings carrying a
//! `process` percentage, which itself may be a number or a numeric string
//! (it arrives as the string `"100"` at completion). Frames are decoded
//! fail-closed: a malformed frame for the watched project surfaces as a feed
//! error instead of being skipped.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Deserialize;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

/// A single inbound progress event, already scoped to the watched project.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEvent {
    pub percent: f64,
}

/// Errors from the streaming channel.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("could not open progress connection: {0}")]
    Connect(String),

    #[error("progress connection error: {0}")]
    Connection(String),

    #[error("malformed progress frame: {0}")]
    Decode(String),
}

/// Stream of progress events for one project; ends when the connection closes.
pub type ProgressStream = BoxStream<'static, Result<ProgressEvent, FeedError>>;

/// Source of live progress events, one subscription per call.
#[async_trait]
pub trait ProgressFeed: Send + Sync {
    async fn subscribe(&self, project_id: &str) -> Result<ProgressStream, FeedError>;
}

#[derive(Debug, Deserialize)]
struct ProcessPayload {
    process: PercentValue,
}

/// The service emits the percentage as a number or a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PercentValue {
    Number(f64),
    Text(String),
}

impl PercentValue {
    fn as_percent(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Decode one text frame. `None` means the frame does not concern
/// `project_id`; a frame that does but cannot be decoded is an error.
fn decode_frame(text: &str, project_id: &str) -> Option<Result<ProgressEvent, FeedError>> {
    let outer: HashMap<String, String> = match serde_json::from_str(text) {
        Ok(map) => map,
        Err(e) => return Some(Err(FeedError::Decode(e.to_string()))),
    };
    let inner = outer.get(project_id)?;
    let payload: ProcessPayload = match serde_json::from_str(inner) {
        Ok(p) => p,
        Err(e) => return Some(Err(FeedError::Decode(e.to_string()))),
    };
    match payload.process.as_percent() {
        Some(percent) => Some(Ok(ProgressEvent { percent })),
        None => Some(Err(FeedError::Decode(
            "process field is not a percentage".into(),
        ))),
    }
}

/// WebSocket-backed progress feed.
pub struct WebSocketFeed {
    ws_base_url: String,
}

impl WebSocketFeed {
    /// `ws_base_url` is the service URL with its scheme rewritten to `ws(s)`.
    pub fn new(ws_base_url: String) -> Self {
        Self { ws_base_url }
    }
}

#[async_trait]
impl ProgressFeed for WebSocketFeed {
    async fn subscribe(&self, project_id: &str) -> Result<ProgressStream, FeedError> {
        let url = format!("{}/api/projects/{project_id}/progress", self.ws_base_url);
        let (socket, _response) = connect_async(&url)
            .await
            .map_err(|e| FeedError::Connect(e.to_string()))?;
        debug!(%project_id, "progress subscription opened");

        let project = project_id.to_string();
        let stream = socket.filter_map(move |message| {
            let event = match message {
                Ok(Message::Text(text)) => decode_frame(&text, &project),
                // Control frames and non-text payloads carry no progress.
                Ok(_) => None,
                Err(e) => Some(Err(FeedError::Connection(e.to_string()))),
            };
            async move { event }
        });

        Ok(stream.boxed())
    }
}
