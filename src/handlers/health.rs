// src/handlers/health.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
};

// GET /api/health
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Servidor no ar"))
)]
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "message": "Server is running",
        "timestamp": Utc::now(),
    }))
}

// Fallback para rotas desconhecidas
pub async fn not_found(State(app_state): State<AppState>, locale: Locale) -> ApiError {
    ApiError::new(
        StatusCode::NOT_FOUND,
        app_state.i18n_store.translate(locale.as_str(), "errors.route_not_found"),
    )
}
