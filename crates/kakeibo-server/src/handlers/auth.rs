//! Identity handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response};
use serde_json::json;

use crate::{success_response, ApiError, AppState};

/// GET /api/me - The identity attributed to requests
///
/// Returns the configured stand-in until session integration lands.
pub async fn get_me(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    Ok(success_response(
        StatusCode::OK,
        json!({
            "userId": state.current_user(),
        }),
    ))
}
