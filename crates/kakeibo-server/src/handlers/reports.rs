//! Report handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;
use serde_json::json;

use crate::{success_response, ApiError, AppState};
use kakeibo_core::Record;

/// GET /api/reports/:month - Monthly spending report
pub async fn monthly_report(
    State(state): State<Arc<AppState>>,
    Path(month): Path<String>,
) -> Result<Response, ApiError> {
    let user_id = state.current_user();

    let report = state.service.monthly_report(user_id, &month).await?;

    Ok(success_response(
        StatusCode::OK,
        json!({
            "expenses": report.expenses.iter().map(|e| e.to_json()).collect::<Vec<_>>(),
            "categoryTotals": report.category_totals,
            "totalAmount": report.total_amount,
            "count": report.count,
            "averageAmount": report.average_amount,
        }),
    ))
}

/// Query parameters for category statistics
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub month: Option<String>,
}

/// GET /api/stats/categories - Category totals with share of spending
pub async fn category_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsQuery>,
) -> Result<Response, ApiError> {
    let user_id = state.current_user();

    let stats = state
        .service
        .category_stats(user_id, params.month.as_deref())
        .await?;

    Ok(success_response(StatusCode::OK, json!(stats)))
}
