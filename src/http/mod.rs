//! HTTP status API
//!
//! - GET /health - Health check
//! - GET /status - Session availability, connection and utterance state

mod handlers;
mod routes;
mod state;

pub use handlers::StatusResponse;
pub use routes::create_router;
pub use state::AppState;
