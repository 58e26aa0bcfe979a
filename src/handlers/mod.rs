pub mod api;
pub mod stats;
pub mod today;

use axum::routing::{get, post};
use axum::Router;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        // Pages
        .route("/", get(today::index))
        .route("/stats", get(stats::index))
        // Ledger
        .route("/expenses/create", post(today::create))
        .route("/expenses/:id/delete", post(today::delete))
        // API (JSON)
        .route("/api/expenses", get(api::list_expenses))
        .route("/api/stats", get(api::stats))
        .route("/api/categories", get(api::categories))
        // Health check
        .route("/health", get(health))
}

async fn health() -> &'static str {
    "OK"
}

/// Fallback handler for unmatched routes.
pub async fn not_found() -> AppError {
    AppError::NotFound("The page you're looking for doesn't exist.".into())
}
