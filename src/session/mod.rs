//! Client session management
//!
//! This module owns the state of the one client connection served by the endpoint:
//! - Authentication key issued through the router and rotated on disconnect
//! - Outbound sequence numbering
//! - Utterance boundary tracking
//! - Published status snapshots for the heartbeat and the status API

mod key;
mod session;
mod status;
mod utterance;

pub use key::SessionKey;
pub use session::{ConnectOutcome, Session};
pub use status::SessionStatus;
pub use utterance::{Boundary, UtteranceTracker};
