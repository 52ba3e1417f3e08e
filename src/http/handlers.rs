use super::state::AppState;
use crate::session::SessionStatus;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub service: String,
    #[serde(flatten)]
    pub session: SessionStatus,
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /status
/// Current availability as reported to the router (without the session key)
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.status.borrow().clone();

    (
        StatusCode::OK,
        Json(StatusResponse {
            service: state.service_name.clone(),
            session,
        }),
    )
}
