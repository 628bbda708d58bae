// src/handlers/inventory.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        validation::{validate_initial_stock, validate_price, validate_quantity},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::inventory::{Category, NewProduct, Product, ProductChanges, StockTransaction, StockTransactionKind},
};

// =============================================================================
//  PRODUTOS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    pub category_id: Option<Uuid>,

    #[validate(length(min = 1, max = 100, message = "validation.required"))]
    #[schema(example = "Bosch")]
    pub brand: String,

    #[validate(length(min = 1, max = 100, message = "validation.required"))]
    #[schema(example = "GSR 120-LI")]
    pub model: String,

    // Estoque inicial; gera uma entrada no histórico
    #[validate(custom(function = "validate_initial_stock"))]
    #[serde(default)]
    pub quantity: i32,

    #[validate(custom(function = "validate_price"))]
    #[serde(default)]
    pub cost_price: Decimal,

    #[validate(custom(function = "validate_price"))]
    #[serde(default)]
    pub selling_price: Decimal,

    #[validate(length(max = 50, message = "validation.too_long"))]
    pub rack_location: Option<String>,

    #[validate(length(max = 1000, message = "validation.too_long"))]
    pub description: Option<String>,

    #[validate(url(message = "validation.url"), length(max = 2048, message = "validation.too_long"))]
    #[schema(example = "https://cdn.example.com/gsr-120.jpg")]
    pub image_url: Option<String>,
}

// Só os campos enviados são alterados. A quantidade muda apenas por /stock.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    pub category_id: Option<Uuid>,

    #[validate(length(min = 1, max = 100, message = "validation.required"))]
    pub brand: Option<String>,

    #[validate(length(min = 1, max = 100, message = "validation.required"))]
    pub model: Option<String>,

    #[validate(custom(function = "validate_price"))]
    pub cost_price: Option<Decimal>,

    #[validate(custom(function = "validate_price"))]
    pub selling_price: Option<Decimal>,

    #[validate(length(max = 50, message = "validation.too_long"))]
    pub rack_location: Option<String>,

    #[validate(length(max = 1000, message = "validation.too_long"))]
    pub description: Option<String>,

    #[validate(url(message = "validation.url"), length(max = 2048, message = "validation.too_long"))]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Busca em marca, modelo e descrição
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    /// Só produtos abaixo do limite de estoque baixo da loja
    pub low_stock: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StockAdjustmentPayload {
    pub kind: StockTransactionKind,

    #[validate(custom(function = "validate_quantity"))]
    #[schema(example = 5)]
    pub quantity: i32,

    #[validate(length(max = 200, message = "validation.too_long"))]
    #[schema(example = "Reposição do fornecedor")]
    pub note: Option<String>,
}

// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Inventory",
    params(ProductQuery),
    responses((status = 200, description = "Produtos do usuário, mais recentes primeiro", body = Vec<Product>)),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .inventory_service
        .list_products(
            &app_state.db_pool,
            user.id,
            query.search,
            query.category_id,
            query.low_stock.unwrap_or(false),
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(products)))
}

// POST /api/products
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Inventory",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Categoria não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let input = NewProduct {
        category_id: payload.category_id,
        brand: payload.brand.trim().to_string(),
        model: payload.model.trim().to_string(),
        quantity: payload.quantity,
        cost_price: payload.cost_price,
        selling_price: payload.selling_price,
        rack_location: payload.rack_location,
        description: payload.description,
        image_url: payload.image_url,
    };

    let product = app_state
        .inventory_service
        .create_product(&app_state.db_pool, user.id, input)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(product)))
}

// GET /api/products/{id}
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto", body = Product),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .inventory_service
        .get_product(&app_state.db_pool, user.id, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(product)))
}

// PUT /api/products/{id}
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Inventory",
    request_body = UpdateProductPayload,
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto atualizado", body = Product),
        (status = 404, description = "Produto ou categoria não encontrados")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let changes = ProductChanges {
        category_id: payload.category_id,
        brand: payload.brand.map(|b| b.trim().to_string()),
        model: payload.model.map(|m| m.trim().to_string()),
        cost_price: payload.cost_price,
        selling_price: payload.selling_price,
        rack_location: payload.rack_location,
        description: payload.description,
        image_url: payload.image_url,
    };

    let product = app_state
        .inventory_service
        .update_product(&app_state.db_pool, user.id, id, changes)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(product)))
}

// DELETE /api/products/{id}
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 204, description = "Produto excluído"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .inventory_service
        .delete_product(&app_state.db_pool, user.id, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/products/{id}/stock
#[utoipa::path(
    post,
    path = "/api/products/{id}/stock",
    tag = "Inventory",
    request_body = StockAdjustmentPayload,
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Estoque ajustado", body = Product),
        (status = 404, description = "Produto não encontrado"),
        (status = 409, description = "Saída maior que o saldo")
    ),
    security(("api_jwt" = []))
)]
pub async fn adjust_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<StockAdjustmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .inventory_service
        .adjust_stock(
            &app_state.db_pool,
            user.id,
            id,
            payload.kind,
            payload.quantity,
            payload.note.as_deref(),
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(product)))
}

// GET /api/products/{id}/transactions
#[utoipa::path(
    get,
    path = "/api/products/{id}/transactions",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Movimentações, mais recentes primeiro", body = Vec<StockTransaction>),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_transactions(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let transactions = app_state
        .inventory_service
        .list_transactions(&app_state.db_pool, user.id, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(transactions)))
}

// =============================================================================
//  CATEGORIAS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CategoryPayload {
    #[validate(length(min = 2, max = 50, message = "validation.name_length"))]
    #[schema(example = "Power Tools")]
    pub name: String,

    #[validate(length(max = 500, message = "validation.too_long"))]
    pub description: Option<String>,
}

// GET /api/categories
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Inventory",
    responses((status = 200, description = "Categorias em ordem alfabética", body = Vec<Category>)),
    security(("api_jwt" = []))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let categories = app_state
        .inventory_service
        .list_categories(&app_state.db_pool, user.id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(categories)))
}

// POST /api/categories
#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "Inventory",
    request_body = CategoryPayload,
    responses(
        (status = 201, description = "Categoria criada", body = Category),
        (status = 409, description = "Já existe categoria com esse slug")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let category = app_state
        .inventory_service
        .create_category(&app_state.db_pool, user.id, &payload.name, payload.description.as_deref())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(category)))
}

// GET /api/categories/{slug}
#[utoipa::path(
    get,
    path = "/api/categories/{slug}",
    tag = "Inventory",
    params(("slug" = String, Path, description = "Slug da categoria")),
    responses(
        (status = 200, description = "Categoria", body = Category),
        (status = 404, description = "Categoria não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_category(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let category = app_state
        .inventory_service
        .get_category(&app_state.db_pool, user.id, &slug)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(category)))
}

// PUT /api/categories/{slug}
#[utoipa::path(
    put,
    path = "/api/categories/{slug}",
    tag = "Inventory",
    request_body = CategoryPayload,
    params(("slug" = String, Path, description = "Slug atual da categoria")),
    responses(
        (status = 200, description = "Categoria renomeada (o slug acompanha o nome)", body = Category),
        (status = 404, description = "Categoria não encontrada"),
        (status = 409, description = "Novo slug já usado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_category(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(slug): Path<String>,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let category = app_state
        .inventory_service
        .update_category(&app_state.db_pool, user.id, &slug, &payload.name, payload.description.as_deref())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(category)))
}

// DELETE /api/categories/{slug}
#[utoipa::path(
    delete,
    path = "/api/categories/{slug}",
    tag = "Inventory",
    params(("slug" = String, Path, description = "Slug da categoria")),
    responses(
        (status = 204, description = "Categoria excluída; produtos ficam sem categoria"),
        (status = 404, description = "Categoria não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_category(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .inventory_service
        .delete_category(&app_state.db_pool, user.id, &slug)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_prices_and_blank_names() {
        let payload: CreateProductPayload = serde_json::from_value(serde_json::json!({
            "brand": "",
            "model": "X1",
            "costPrice": -1.5
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("brand"));
        assert!(fields.contains_key("cost_price"));
        assert!(!fields.contains_key("selling_price"));
    }

    #[test]
    fn prices_must_fit_the_price_column() {
        let payload: CreateProductPayload = serde_json::from_value(serde_json::json!({
            "brand": "Bosch",
            "model": "GSR",
            "costPrice": 7.9e28,
            "sellingPrice": 12.345,
            "imageUrl": "not a url"
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("cost_price"));
        assert!(fields.contains_key("selling_price"));
        assert!(fields.contains_key("image_url"));
    }

    #[test]
    fn stock_adjustment_quantity_is_bounded() {
        let zero: StockAdjustmentPayload =
            serde_json::from_value(serde_json::json!({ "kind": "OUT", "quantity": 0 })).unwrap();
        assert!(zero.validate().is_err());
        assert_eq!(zero.kind, StockTransactionKind::Out);

        let huge: StockAdjustmentPayload =
            serde_json::from_value(serde_json::json!({ "kind": "IN", "quantity": 2_147_483_647 })).unwrap();
        assert!(huge.validate().is_err());

        let fine: StockAdjustmentPayload =
            serde_json::from_value(serde_json::json!({ "kind": "IN", "quantity": 250 })).unwrap();
        assert!(fine.validate().is_ok());
    }
}
