use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::key::SessionKey;
use super::status::SessionStatus;
use super::utterance::UtteranceTracker;
use crate::audio::AudioRelayBuffer;
use crate::pipeline::Notification;
use crate::protocol::PingStatus;

/// Result of a transport-level connection attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Client accepted; the notifications must be forwarded to the pipeline
    Accepted(Vec<Notification>),
    /// Another client already holds the session
    Rejected,
}

/// State of the single client session served by this endpoint
///
/// Owned by the event loop; nothing else mutates it.
#[derive(Debug)]
pub struct Session {
    key: SessionKey,
    connected: bool,
    remote_uri: Option<String>,
    connected_since: Option<DateTime<Utc>>,
    sequence: i32,
    utterances: UtteranceTracker,
    relay: AudioRelayBuffer,
    playing_utterance: Option<i32>,
}

impl Session {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            key: SessionKey::generate(),
            connected: false,
            remote_uri: None,
            connected_since: None,
            sequence: 0,
            utterances: UtteranceTracker::new(),
            relay: AudioRelayBuffer::new(chunk_size),
            playing_utterance: None,
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn remote_uri(&self) -> Option<&str> {
        self.remote_uri.as_deref()
    }

    /// Sequence number of the last outbound message (0 before the first)
    pub fn sequence(&self) -> i32 {
        self.sequence
    }

    pub fn utterances(&self) -> &UtteranceTracker {
        &self.utterances
    }

    pub fn utterances_mut(&mut self) -> &mut UtteranceTracker {
        &mut self.utterances
    }

    pub fn relay(&self) -> &AudioRelayBuffer {
        &self.relay
    }

    pub fn relay_mut(&mut self) -> &mut AudioRelayBuffer {
        &mut self.relay
    }

    /// Accept a new client unless one is already connected
    ///
    /// The key is left as advertised: the routed client learned it from our last ping.
    pub fn on_connect(&mut self, remote_uri: &str) -> ConnectOutcome {
        if self.connected {
            warn!(
                "Rejecting connection from {}: session already held by {}",
                remote_uri,
                self.remote_uri.as_deref().unwrap_or("unknown")
            );
            return ConnectOutcome::Rejected;
        }

        self.reset();
        self.sequence = 0;
        self.connected = true;
        self.remote_uri = Some(remote_uri.to_string());
        self.connected_since = Some(Utc::now());

        info!("Client connected: {}", remote_uri);

        ConnectOutcome::Accepted(vec![
            Notification::IncomingCall {
                remote_uri: remote_uri.to_string(),
            },
            Notification::CallConfirmed {
                remote_uri: remote_uri.to_string(),
            },
        ])
    }

    /// Drop the client and invalidate its key
    pub fn on_disconnect(&mut self, code: Option<u16>) -> Option<Notification> {
        if !self.connected {
            return None;
        }

        let remote_uri = self.remote_uri.take().unwrap_or_default();
        self.connected = false;
        self.connected_since = None;
        self.reset();
        self.sequence = 0;
        self.key = SessionKey::generate();

        info!("Client disconnected: {} (code={:?})", remote_uri, code);

        Some(Notification::CallDisconnected { remote_uri, code })
    }

    pub fn authenticate(&self, key: &str) -> bool {
        let accepted = self.key.matches(key);
        if !accepted {
            debug!("Dropping message with mismatched session key");
        }
        accepted
    }

    /// Sequence number for the next outbound message; the first one on a connection is 1
    pub fn next_sequence(&mut self) -> i32 {
        self.sequence += 1;
        self.sequence
    }

    /// Reinitialize playback state
    ///
    /// The transport, the key and the sequence counter are untouched: sequence numbers
    /// only restart with a new connection.
    pub fn reset(&mut self) {
        let dropped = self.relay.clear();
        if dropped > 0 {
            debug!("Reset discarded {} buffered bytes", dropped);
        }
        self.utterances.reset();
        self.playing_utterance = None;
    }

    /// Record the utterance the client reports playing; returns a notification on change
    pub fn update_playing_utterance(&mut self, utterance_id: i32) -> Option<Notification> {
        if self.playing_utterance == Some(utterance_id) {
            return None;
        }

        self.playing_utterance = Some(utterance_id);
        Some(Notification::CurrentlyPlaying { utterance_id })
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            status: PingStatus::from_connected(self.connected),
            connected: self.connected,
            key: self.key.to_string(),
            connected_since: self.connected_since,
            remote_uri: self.remote_uri.clone(),
            open_utterance: self.utterances.open_utterance(),
            last_sequence: self.sequence,
            buffered_bytes: self.relay.buffered(),
        }
    }
}
