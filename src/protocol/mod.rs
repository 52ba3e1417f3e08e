//! Wire messages exchanged with the client and the router
//!
//! - `ClientToAlex`: client → endpoint (audio + playback progress)
//! - `AlexToClient`: endpoint → client (audio chunks, utterance boundaries, text results)
//! - `RouterRequest`: endpoint → router (availability pings)
//!
//! Every message travels as one binary WebSocket frame; see `codec` for the layout.

pub mod codec;
pub mod messages;

pub use messages::{
    AlexToClient, ClientToAlex, MessageType, OutboundPayload, PingMessage, PingStatus,
    RouterRequest, DEFAULT_PRIORITY,
};
