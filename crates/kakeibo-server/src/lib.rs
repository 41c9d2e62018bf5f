//! Kakeibo Web Server
//!
//! Axum-based REST API for the Kakeibo expense tracker. Every endpoint
//! responds with the uniform envelope
//! `{success, data|error, timestamp}`; domain errors are translated to
//! status codes in exactly one place ([`ApiError`]).

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use kakeibo_core::{Database, Error as CoreError, ExpenseService};

mod handlers;


/// Identity attributed to every request until real session integration
/// lands. An explicit stand-in, not a hidden default: the domain layer
/// takes the user id as a parameter and never fabricates one.
pub const PLACEHOLDER_USER_ID: &str = "550e8400-e29b-41d4-a716-446655440000";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// User id injected at the controller boundary (see [`PLACEHOLDER_USER_ID`]).
    /// Session integration replaces this value with the verified identity.
    pub default_user_id: String,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            default_user_id: PLACEHOLDER_USER_ID.to_string(),
            allowed_origins: vec![],
        }
    }
}

/// Shared application state
pub struct AppState {
    pub service: ExpenseService,
    pub config: ServerConfig,
}

impl AppState {
    /// The authenticated user for this request (mocked; see [`ServerConfig`])
    pub fn current_user(&self) -> &str {
        &self.config.default_user_id
    }
}

/// Create the application router
pub fn create_router(db: Database, config: ServerConfig) -> Router {
    let state = Arc::new(AppState {
        service: ExpenseService::new(db),
        config: config.clone(),
    });

    let api_routes = Router::new()
        // Identity
        .route("/me", get(handlers::get_me))
        // Expenses
        .route(
            "/expenses",
            get(handlers::list_expenses)
                .post(handlers::create_expense)
                .delete(handlers::bulk_delete_expenses),
        )
        .route("/expenses/expensive", get(handlers::expensive_purchases))
        .route(
            "/expenses/:id",
            get(handlers::get_expense)
                .put(handlers::update_expense)
                .delete(handlers::delete_expense),
        )
        // Categories
        .route("/categories", get(handlers::list_categories))
        // Reports
        .route("/reports/:month", get(handlers::monthly_report))
        .route("/stats/categories", get(handlers::category_stats))
        // Export
        .route("/export/expenses", get(handlers::export_expenses));

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE])
    };

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the server
pub async fn serve(db: Database, host: &str, port: u16, config: ServerConfig) -> anyhow::Result<()> {
    let app = create_router(db, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Response envelope
// ============================================================================

/// Wrap a payload in the success envelope
pub(crate) fn success_response(status: StatusCode, data: serde_json::Value) -> Response {
    (
        status,
        Json(serde_json::json!({
            "success": true,
            "data": data,
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
        .into_response()
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error with its HTTP status code
///
/// The single error-translation boundary: domain code raises typed
/// failures, this type maps them to status codes, renders the error
/// envelope, and is the only place request failures are logged.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => Self {
                status: StatusCode::BAD_REQUEST,
                message: msg,
            },
            CoreError::NotFound(msg) => Self {
                status: StatusCode::NOT_FOUND,
                message: msg,
            },
            CoreError::Unauthorized(msg) => Self {
                status: StatusCode::FORBIDDEN,
                message: msg,
            },
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                // Surface the underlying message for diagnostics
                message: format!("Internal server error: {}", other),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, message = %self.message, "Request failed");
        }

        let body = Json(serde_json::json!({
            "success": false,
            "error": self.message,
            "timestamp": Utc::now().to_rfc3339(),
        }));

        (self.status, body).into_response()
    }
}
