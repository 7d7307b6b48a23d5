//! HTTP admin surface.
//!
//! Thin axum layer over the approval workflow and the wallet read models.
//! The acting admin's identity arrives as an explicit `x-admin-id` header
//! set by the upstream auth gateway; this layer performs no authentication
//! of its own.

pub mod handlers;

use crate::error::AppError;
use crate::AppState;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Build the admin API router
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/admin/funds-requests", get(handlers::list_requests))
        .route("/api/admin/funds-requests/:id", get(handlers::get_request))
        .route(
            "/api/admin/funds-requests/:id/approve",
            post(handlers::approve_request),
        )
        .route(
            "/api/admin/funds-requests/:id/reject",
            post(handlers::reject_request),
        )
        .route("/api/admin/wallets/:user_id", get(handlers::get_wallet))
        .route(
            "/api/admin/wallets/:user_id/ledger",
            get(handlers::get_ledger),
        )
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
