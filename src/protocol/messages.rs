use bytes::Bytes;
use serde::Serialize;

/// Priority stamped on every outbound message; clients treat it as advisory
pub const DEFAULT_PRIORITY: i32 = -1;

/// Message sent by the client: microphone audio plus playback progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientToAlex {
    /// Session key the client obtained from the router
    pub key: String,
    /// Raw microphone audio (16-bit PCM, passed through untouched)
    pub speech: Bytes,
    /// Utterance the client reports it is currently playing
    pub currently_playing_utterance: i32,
}

/// Wire tag of an outbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Speech,
    SpeechBegin,
    SpeechEnd,
    AsrResult,
    SystemPrompt,
    FlushOutAudio,
}

impl MessageType {
    pub fn tag(self) -> u8 {
        match self {
            MessageType::Speech => 0,
            MessageType::SpeechBegin => 1,
            MessageType::SpeechEnd => 2,
            MessageType::AsrResult => 3,
            MessageType::SystemPrompt => 4,
            MessageType::FlushOutAudio => 5,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(MessageType::Speech),
            1 => Some(MessageType::SpeechBegin),
            2 => Some(MessageType::SpeechEnd),
            3 => Some(MessageType::AsrResult),
            4 => Some(MessageType::SystemPrompt),
            5 => Some(MessageType::FlushOutAudio),
            _ => None,
        }
    }
}

/// Body of an outbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundPayload {
    /// One fixed-size chunk of playback audio
    Speech(Bytes),
    SpeechBegin { utterance_id: i32 },
    SpeechEnd { utterance_id: i32 },
    /// Best recognition hypothesis, lower-cased
    AsrResult(String),
    /// Text of the prompt currently being synthesized
    SystemPrompt(String),
    /// Client must drop any audio it has buffered for playback
    FlushOutAudio,
}

impl OutboundPayload {
    pub fn kind(&self) -> MessageType {
        match self {
            OutboundPayload::Speech(_) => MessageType::Speech,
            OutboundPayload::SpeechBegin { .. } => MessageType::SpeechBegin,
            OutboundPayload::SpeechEnd { .. } => MessageType::SpeechEnd,
            OutboundPayload::AsrResult(_) => MessageType::AsrResult,
            OutboundPayload::SystemPrompt(_) => MessageType::SystemPrompt,
            OutboundPayload::FlushOutAudio => MessageType::FlushOutAudio,
        }
    }
}

/// Message sent to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlexToClient {
    pub seq: i32,
    pub priority: i32,
    pub payload: OutboundPayload,
}

impl AlexToClient {
    pub fn new(seq: i32, payload: OutboundPayload) -> Self {
        Self {
            seq,
            priority: DEFAULT_PRIORITY,
            payload,
        }
    }

    pub fn kind(&self) -> MessageType {
        self.payload.kind()
    }
}

/// Availability reported to the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PingStatus {
    Busy,
    Available,
}

impl PingStatus {
    pub fn from_connected(connected: bool) -> Self {
        if connected {
            PingStatus::Busy
        } else {
            PingStatus::Available
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            PingStatus::Busy => 0,
            PingStatus::Available => 1,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(PingStatus::Busy),
            1 => Some(PingStatus::Available),
            _ => None,
        }
    }
}

/// Heartbeat payload: status, the key a routed client must present, and where to reach us
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingMessage {
    pub status: PingStatus,
    pub key: String,
    pub addr: String,
}

/// Request sent to the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterRequest {
    Ping(PingMessage),
}

impl RouterRequest {
    pub const PING_TAG: u8 = 0;
}
