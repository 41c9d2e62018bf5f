//! Export handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Response,
};
use serde_json::json;

use crate::{success_response, ApiError, AppState};
use kakeibo_core::{expenses_to_csv, ExpenseFilters};

/// GET /api/export/expenses - Filtered expenses as CSV
pub async fn export_expenses(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<ExpenseFilters>,
) -> Result<Response, ApiError> {
    let user_id = state.current_user();

    let expenses = state.service.list_expenses(user_id, &filters).await?;
    let csv = expenses_to_csv(&expenses)?;

    Ok(success_response(
        StatusCode::OK,
        json!({
            "data": csv,
            "count": expenses.len(),
            "format": "csv",
        }),
    ))
}
