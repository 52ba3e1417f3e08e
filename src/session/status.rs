use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::protocol::PingStatus;

/// Snapshot of the session published by the event loop after every change
///
/// Consumed by the heartbeat (status + key) and the status API (everything but the key).
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    /// BUSY while a client is connected
    pub status: PingStatus,

    pub connected: bool,

    /// Key a routed client must present; never exposed over HTTP
    #[serde(skip)]
    pub key: String,

    /// When the current client connected
    pub connected_since: Option<DateTime<Utc>>,

    /// Peer address of the current client
    pub remote_uri: Option<String>,

    /// Open utterance, if any
    pub open_utterance: Option<i32>,

    /// Sequence number of the last message sent on this connection
    pub last_sequence: i32,

    /// Outbound audio waiting for a full chunk
    pub buffered_bytes: usize,
}
