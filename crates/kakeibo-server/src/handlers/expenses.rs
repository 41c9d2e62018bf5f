//! Expense handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;
use serde_json::json;

use crate::{success_response, ApiError, AppState};
use kakeibo_core::{CreateExpenseDto, ExpenseFilters, Record, UpdateExpenseDto};

/// Maximum accepted request body size
const MAX_BODY_SIZE: usize = 64 * 1024;

/// Read and parse a JSON request body, mapping failures to a 400
pub(super) async fn parse_body<T: serde::de::DeserializeOwned>(
    request: Request,
) -> Result<T, ApiError> {
    let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|_| ApiError::bad_request("Invalid request body"))?;
    serde_json::from_slice(&bytes).map_err(|_| ApiError::bad_request("Invalid JSON format"))
}

/// GET /api/expenses - List expenses with optional filters
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<ExpenseFilters>,
) -> Result<Response, ApiError> {
    let user_id = state.current_user();

    let expenses = state.service.list_expenses(user_id, &filters).await?;

    Ok(success_response(
        StatusCode::OK,
        json!({
            "expenses": expenses.iter().map(|e| e.to_json()).collect::<Vec<_>>(),
            "count": expenses.len(),
        }),
    ))
}

/// POST /api/expenses - Create an expense
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, ApiError> {
    let user_id = state.current_user().to_string();
    let dto: CreateExpenseDto = parse_body(request).await?;

    let expense = state.service.create_expense(&user_id, dto).await?;

    Ok(success_response(StatusCode::CREATED, expense.to_json()))
}

/// Request body for bulk deletion
#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<String>,
}

/// DELETE /api/expenses - Delete several expenses at once
pub async fn bulk_delete_expenses(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, ApiError> {
    let user_id = state.current_user().to_string();
    let req: BulkDeleteRequest = parse_body(request).await?;

    if req.ids.is_empty() {
        return Err(ApiError::bad_request(
            "IDs array is required and cannot be empty",
        ));
    }

    for id in &req.ids {
        state.service.delete_expense(id, &user_id).await?;
    }

    Ok(success_response(
        StatusCode::OK,
        json!({
            "message": format!("{} expenses deleted successfully", req.ids.len()),
            "deletedIds": req.ids,
        }),
    ))
}

/// Query parameters for the expensive-purchase listing
#[derive(Debug, Deserialize)]
pub struct ExpensiveQuery {
    pub threshold: Option<f64>,
    pub month: Option<String>,
}

/// GET /api/expenses/expensive - Purchases above the threshold
pub async fn expensive_purchases(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExpensiveQuery>,
) -> Result<Response, ApiError> {
    let user_id = state.current_user();
    let threshold = params.threshold.unwrap_or(kakeibo_core::EXPENSIVE_THRESHOLD);

    let purchases = state
        .service
        .expensive_purchases(user_id, Some(threshold), params.month.as_deref())
        .await?;

    Ok(success_response(
        StatusCode::OK,
        json!({
            "purchases": purchases.iter().map(|e| e.to_json()).collect::<Vec<_>>(),
            "threshold": threshold,
            "count": purchases.len(),
        }),
    ))
}

/// GET /api/expenses/:id - Get a single expense
pub async fn get_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let user_id = state.current_user();

    let expense = state.service.get_expense(&id, user_id).await?;

    Ok(success_response(StatusCode::OK, expense.to_json()))
}

/// PUT /api/expenses/:id - Update an expense
pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    let user_id = state.current_user().to_string();
    let dto: UpdateExpenseDto = parse_body(request).await?;

    let expense = state.service.update_expense(&id, &user_id, dto).await?;

    Ok(success_response(StatusCode::OK, expense.to_json()))
}

/// DELETE /api/expenses/:id - Delete an expense
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let user_id = state.current_user();

    state.service.delete_expense(&id, user_id).await?;

    Ok(success_response(
        StatusCode::OK,
        json!({
            "message": "Expense deleted successfully",
            "deletedId": id,
        }),
    ))
}
