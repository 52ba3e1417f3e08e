use tokio::sync::watch;

use crate::session::SessionStatus;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service_name: String,
    /// Latest snapshot published by the event loop
    pub status: watch::Receiver<SessionStatus>,
}

impl AppState {
    pub fn new(service_name: String, status: watch::Receiver<SessionStatus>) -> Self {
        Self {
            service_name,
            status,
        }
    }
}
