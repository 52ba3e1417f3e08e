pub mod audio;
pub mod bridge;
pub mod config;
pub mod error;
pub mod heartbeat;
pub mod http;
pub mod pipeline;
pub mod protocol;
pub mod server;
pub mod session;

pub use audio::{AudioFrame, AudioRelayBuffer};
pub use bridge::{CommandBridge, Effects};
pub use config::Config;
pub use error::{CodecError, CommandParseError, RelayError};
pub use heartbeat::{HeartbeatClient, HeartbeatConfig, RouterConnector, RouterLink, WebSocketRouter};
pub use http::{create_router, AppState};
pub use pipeline::{
    Command, CommandKind, LoopbackPipeline, Notification, PipelineEndpoint, PipelineEvent,
    PipelineHandle, SessionEvent,
};
pub use protocol::{AlexToClient, ClientToAlex, OutboundPayload, PingMessage, PingStatus, RouterRequest};
pub use server::{EventLoop, RelayServer, Shutdown};
pub use session::{Session, SessionKey, SessionStatus, UtteranceTracker};
