//! Boundary to the speech pipeline
//!
//! The pipeline is a separate actor; it talks to the event loop only through the
//! bounded channels created by [`channel`].

pub mod channel;
pub mod command;
pub mod loopback;

pub use channel::{channel, PipelineEndpoint, PipelineEvent, PipelineHandle, SessionEvent};
pub use command::{Command, CommandKind, Notification, COMPONENT_NAME};
pub use loopback::LoopbackPipeline;
