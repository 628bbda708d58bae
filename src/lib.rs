// src/lib.rs

use axum::{
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod sheet;

use crate::{
    config::{AppState, Config},
    docs::ApiDoc,
    middleware::auth::auth_guard,
};

/// Monta o router completo da API.
pub fn create_app(app_state: AppState, config: &Config) -> Router {
    // Rotas públicas
    let public_routes = Router::new()
        .route("/api/health", get(handlers::health::health))
        .route("/api/users/register", post(handlers::auth::register))
        .route("/api/users/login", post(handlers::auth::login));

    // Todo o resto exige token. route_layer mantém o 404 para rotas desconhecidas.
    let protected_routes = Router::new()
        // --- Usuário ---
        .route("/api/users/logout", post(handlers::auth::logout))
        .route(
            "/api/users/profile",
            get(handlers::auth::get_profile).patch(handlers::auth::update_profile),
        )
        .route("/api/users/password", patch(handlers::auth::change_password))
        // --- Produtos ---
        .route(
            "/api/products",
            get(handlers::inventory::list_products).post(handlers::inventory::create_product),
        )
        .route(
            "/api/products/{id}",
            get(handlers::inventory::get_product)
                .put(handlers::inventory::update_product)
                .delete(handlers::inventory::delete_product),
        )
        .route("/api/products/{id}/stock", post(handlers::inventory::adjust_stock))
        .route("/api/products/{id}/transactions", get(handlers::inventory::list_transactions))
        // --- Categorias ---
        .route(
            "/api/categories",
            get(handlers::inventory::list_categories).post(handlers::inventory::create_category),
        )
        .route(
            "/api/categories/{slug}",
            get(handlers::inventory::get_category)
                .put(handlers::inventory::update_category)
                .delete(handlers::inventory::delete_category),
        )
        // --- Clientes ---
        .route(
            "/api/customers",
            get(handlers::crm::list_customers).post(handlers::crm::create_customer),
        )
        .route(
            "/api/customers/{id}",
            get(handlers::crm::get_customer)
                .put(handlers::crm::update_customer)
                .delete(handlers::crm::delete_customer),
        )
        // --- Pedidos ---
        .route(
            "/api/orders",
            get(handlers::operations::list_orders).post(handlers::operations::create_order),
        )
        .route(
            "/api/orders/{id}",
            get(handlers::operations::get_order).put(handlers::operations::update_order),
        )
        .route("/api/orders/{id}/status", patch(handlers::operations::change_order_status))
        // --- Dashboard ---
        .route("/api/dashboard/summary", get(handlers::dashboard::get_summary))
        .route("/api/dashboard/stock-chart", get(handlers::dashboard::get_stock_chart))
        .route("/api/dashboard/top-products", get(handlers::dashboard::get_top_products))
        // --- Configurações ---
        .route(
            "/api/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        // --- Planilhas ---
        .route(
            "/api/sheets/{name}",
            get(handlers::sheets::get_sheet).delete(handlers::sheets::delete_sheet),
        )
        .route("/api/sheets/{name}/cells/{cell_id}", put(handlers::sheets::set_cell))
        .route("/api/sheets/{name}/paste", post(handlers::sheets::paste))
        .route("/api/sheets/{name}/export", get(handlers::sheets::export_csv))
        .route("/api/sheets/{name}/undo", post(handlers::sheets::undo))
        .route("/api/sheets/{name}/redo", post(handlers::sheets::redo))
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(handlers::health::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
        .with_state(app_state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Origem CORS ignorada: '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
