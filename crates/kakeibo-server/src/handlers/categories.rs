//! Category handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response};
use serde_json::json;

use crate::{success_response, ApiError, AppState};
use kakeibo_core::Record;

/// GET /api/categories - A user's visible categories in manual sort order
pub async fn list_categories(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let user_id = state.current_user();

    let categories = state.service.categories(user_id).await?;

    Ok(success_response(
        StatusCode::OK,
        json!({
            "categories": categories.iter().map(|c| c.to_json()).collect::<Vec<_>>(),
            "count": categories.len(),
        }),
    ))
}
