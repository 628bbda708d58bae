// src/handlers/sheets.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::sheet::{ExportQuery, PastePayload, SetCellPayload, SheetSnapshot},
};

// GET /api/sheets/{name}
#[utoipa::path(
    get,
    path = "/api/sheets/{name}",
    tag = "Sheets",
    params(("name" = String, Path, description = "Nome da planilha, ex: daily")),
    responses(
        (status = 200, description = "Células preenchidas; planilha nova vem vazia", body = SheetSnapshot),
        (status = 400, description = "Nome inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_sheet(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let sheet = app_state
        .sheet_service
        .get_sheet(&app_state.db_pool, user.id, &name)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(sheet)))
}

// PUT /api/sheets/{name}/cells/{cell_id}
#[utoipa::path(
    put,
    path = "/api/sheets/{name}/cells/{cell_id}",
    tag = "Sheets",
    request_body = SetCellPayload,
    params(
        ("name" = String, Path, description = "Nome da planilha"),
        ("cell_id" = String, Path, description = "Célula de A1 a Z100")
    ),
    responses(
        (status = 200, description = "Planilha recalculada", body = SheetSnapshot),
        (status = 400, description = "Célula ou nome inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_cell(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((name, cell_id)): Path<(String, String)>,
    Json(payload): Json<SetCellPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let sheet = app_state
        .sheet_service
        .set_cell(&app_state.db_pool, user.id, &name, &cell_id, payload.raw)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(sheet)))
}

// POST /api/sheets/{name}/paste
#[utoipa::path(
    post,
    path = "/api/sheets/{name}/paste",
    tag = "Sheets",
    request_body = PastePayload,
    params(("name" = String, Path, description = "Nome da planilha")),
    responses(
        (status = 200, description = "Bloco colado; desfazer restaura o bloco todo", body = SheetSnapshot),
        (status = 400, description = "Âncora inválida, bloco grande demais ou fora da grade")
    ),
    security(("api_jwt" = []))
)]
pub async fn paste(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(name): Path<String>,
    Json(payload): Json<PastePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let sheet = app_state
        .sheet_service
        .paste(&app_state.db_pool, user.id, &name, &payload.anchor, payload.rows)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(sheet)))
}

// GET /api/sheets/{name}/export
#[utoipa::path(
    get,
    path = "/api/sheets/{name}/export",
    tag = "Sheets",
    params(("name" = String, Path, description = "Nome da planilha"), ExportQuery),
    responses(
        (status = 200, description = "Planilha em CSV, a partir de A1", content_type = "text/csv", body = String),
        (status = 400, description = "Nome inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_csv(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(name): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (name, csv) = app_state
        .sheet_service
        .export_csv(&app_state.db_pool, user.id, &name, query.values)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}.csv\"", name)),
        ],
        csv,
    ))
}

// POST /api/sheets/{name}/undo
#[utoipa::path(
    post,
    path = "/api/sheets/{name}/undo",
    tag = "Sheets",
    params(("name" = String, Path, description = "Nome da planilha")),
    responses(
        (status = 200, description = "Última edição desfeita", body = SheetSnapshot),
        (status = 409, description = "Nada para desfazer")
    ),
    security(("api_jwt" = []))
)]
pub async fn undo(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let sheet = app_state
        .sheet_service
        .undo(&app_state.db_pool, user.id, &name)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(sheet)))
}

// POST /api/sheets/{name}/redo
#[utoipa::path(
    post,
    path = "/api/sheets/{name}/redo",
    tag = "Sheets",
    params(("name" = String, Path, description = "Nome da planilha")),
    responses(
        (status = 200, description = "Edição refeita", body = SheetSnapshot),
        (status = 409, description = "Nada para refazer")
    ),
    security(("api_jwt" = []))
)]
pub async fn redo(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let sheet = app_state
        .sheet_service
        .redo(&app_state.db_pool, user.id, &name)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(sheet)))
}

// DELETE /api/sheets/{name}
#[utoipa::path(
    delete,
    path = "/api/sheets/{name}",
    tag = "Sheets",
    params(("name" = String, Path, description = "Nome da planilha")),
    responses((status = 204, description = "Planilha apagada (ou já inexistente)")),
    security(("api_jwt" = []))
)]
pub async fn delete_sheet(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .sheet_service
        .delete_sheet(&app_state.db_pool, user.id, &name)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
