// src/handlers/operations.rs

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
        validation::{validate_price, validate_quantity},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{RequireRole, RoleAdmin},
    },
    models::operations::{Order, OrderChanges, OrderDetail, OrderScope, OrderStatus, PaymentStatus},
    services::operation_service::{NewOrder, RequestedItem},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPayload {
    pub product_id: Uuid,

    #[validate(custom(function = "validate_quantity"))]
    #[schema(example = 2)]
    pub quantity: i32,

    /// Sem valor, vale o preço de venda do produto
    #[validate(custom(function = "validate_price"))]
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderPayload {
    pub customer_id: Option<Uuid>,

    #[validate(length(max = 300, message = "validation.too_long"))]
    pub shipping_address: Option<String>,

    #[validate(length(max = 1000, message = "validation.too_long"))]
    pub notes: Option<String>,

    // Lista vazia é recusada pelo serviço (errors.empty_order)
    #[validate(nested)]
    pub items: Vec<OrderItemPayload>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderPayload {
    #[validate(length(max = 300, message = "validation.too_long"))]
    pub shipping_address: Option<String>,

    #[validate(length(max = 1000, message = "validation.too_long"))]
    pub notes: Option<String>,

    pub payment_status: Option<PaymentStatus>,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeStatusPayload {
    #[schema(example = "PROCESSING")]
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
}

// POST /api/orders
#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    request_body = CreateOrderPayload,
    responses(
        (status = 201, description = "Pedido criado e estoque baixado", body = OrderDetail),
        (status = 400, description = "Pedido vazio ou dados inválidos"),
        (status = 404, description = "Cliente ou produto não encontrado"),
        (status = 409, description = "Estoque insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let input = NewOrder {
        customer_id: payload.customer_id,
        shipping_address: payload.shipping_address,
        notes: payload.notes,
        items: payload
            .items
            .into_iter()
            .map(|item| RequestedItem {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect(),
    };

    let order = app_state
        .operations_service
        .create_order(&app_state.db_pool, user.id, input)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(order)))
}

// GET /api/orders
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    params(OrderQuery),
    responses((status = 200, description = "Pedidos, mais recentes primeiro; administradores veem os de todos", body = Vec<Order>)),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<OrderQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = app_state
        .operations_service
        .list_orders(&app_state.db_pool, OrderScope::for_user(&user), query.status)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(orders)))
}

// GET /api/orders/{id}
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido com itens", body = OrderDetail),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .operations_service
        .get_order(&app_state.db_pool, OrderScope::for_user(&user), id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

// PUT /api/orders/{id}
#[utoipa::path(
    put,
    path = "/api/orders/{id}",
    tag = "Orders",
    request_body = UpdateOrderPayload,
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido atualizado", body = OrderDetail),
        (status = 404, description = "Pedido não encontrado"),
        (status = 409, description = "Transição de status inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let changes = OrderChanges {
        shipping_address: payload.shipping_address,
        notes: payload.notes,
        payment_status: payload.payment_status,
        status: payload.status,
    };

    let order = app_state
        .operations_service
        .update_order(&app_state.db_pool, OrderScope::for_user(&user), id, changes)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

// PATCH /api/orders/{id}/status
#[utoipa::path(
    patch,
    path = "/api/orders/{id}/status",
    tag = "Orders",
    request_body = ChangeStatusPayload,
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Status alterado; cancelamento devolve o estoque", body = OrderDetail),
        (status = 403, description = "Apenas administradores"),
        (status = 404, description = "Pedido não encontrado"),
        (status = 409, description = "Transição de status inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_order_status(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<RoleAdmin>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .operations_service
        .change_status(&app_state.db_pool, OrderScope::for_user(&user), id, payload.status)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_items_are_validated() {
        let payload: CreateOrderPayload = serde_json::from_value(serde_json::json!({
            "items": [
                { "productId": Uuid::new_v4(), "quantity": 2 },
                { "productId": Uuid::new_v4(), "quantity": 0, "unitPrice": -3 }
            ]
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        assert!(errors.errors().contains_key("items"));
    }

    #[test]
    fn out_of_range_unit_price_is_a_validation_error() {
        let payload: CreateOrderPayload = serde_json::from_value(serde_json::json!({
            "items": [{ "productId": Uuid::new_v4(), "quantity": 10, "unitPrice": 7.9e28 }]
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn status_filter_uses_wire_names() {
        let query: OrderQuery = serde_json::from_value(serde_json::json!({ "status": "SHIPPED" })).unwrap();
        assert_eq!(query.status, Some(OrderStatus::Shipped));
    }
}
