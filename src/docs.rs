// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Health ---
        handlers::health::health,

        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::logout,

        // --- Users ---
        handlers::auth::get_profile,
        handlers::auth::update_profile,
        handlers::auth::change_password,

        // --- Inventory ---
        handlers::inventory::list_products,
        handlers::inventory::create_product,
        handlers::inventory::get_product,
        handlers::inventory::update_product,
        handlers::inventory::delete_product,
        handlers::inventory::adjust_stock,
        handlers::inventory::list_transactions,
        handlers::inventory::list_categories,
        handlers::inventory::create_category,
        handlers::inventory::get_category,
        handlers::inventory::update_category,
        handlers::inventory::delete_category,

        // --- Customers ---
        handlers::crm::list_customers,
        handlers::crm::create_customer,
        handlers::crm::get_customer,
        handlers::crm::update_customer,
        handlers::crm::delete_customer,

        // --- Orders ---
        handlers::operations::create_order,
        handlers::operations::list_orders,
        handlers::operations::get_order,
        handlers::operations::update_order,
        handlers::operations::change_order_status,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
        handlers::dashboard::get_stock_chart,
        handlers::dashboard::get_top_products,

        // --- Settings ---
        handlers::settings::get_settings,
        handlers::settings::update_settings,

        // --- Sheets ---
        handlers::sheets::get_sheet,
        handlers::sheets::set_cell,
        handlers::sheets::paste,
        handlers::sheets::export_csv,
        handlers::sheets::undo,
        handlers::sheets::redo,
        handlers::sheets::delete_sheet,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::UserStatus,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::UpdateProfilePayload,
            models::auth::ChangePasswordPayload,
            models::auth::AuthResponse,

            // --- Inventory ---
            models::inventory::StockTransactionKind,
            models::inventory::Category,
            models::inventory::Product,
            models::inventory::StockTransaction,
            handlers::inventory::CreateProductPayload,
            handlers::inventory::UpdateProductPayload,
            handlers::inventory::StockAdjustmentPayload,
            handlers::inventory::CategoryPayload,

            // --- Customers ---
            models::crm::Customer,
            handlers::crm::CustomerPayload,

            // --- Orders ---
            models::operations::OrderStatus,
            models::operations::PaymentStatus,
            models::operations::Order,
            models::operations::OrderItem,
            models::operations::OrderDetail,
            handlers::operations::CreateOrderPayload,
            handlers::operations::OrderItemPayload,
            handlers::operations::UpdateOrderPayload,
            handlers::operations::ChangeStatusPayload,

            // --- Dashboard ---
            models::dashboard::DashboardSummary,
            models::dashboard::StockChartEntry,
            models::dashboard::TopProductEntry,

            // --- Settings ---
            models::settings::StoreSettings,
            models::settings::UpdateSettingsRequest,

            // --- Sheets ---
            models::sheet::SheetSnapshot,
            models::sheet::SetCellPayload,
            models::sheet::PastePayload,
        )
    ),
    tags(
        (name = "Health", description = "Status do servidor"),
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Inventory", description = "Produtos, Categorias e Movimentações de Estoque"),
        (name = "Customers", description = "Cadastro de Clientes"),
        (name = "Orders", description = "Pedidos e Fluxo de Status"),
        (name = "Dashboard", description = "Indicadores e Gráficos Gerenciais"),
        (name = "Settings", description = "Configurações da Loja"),
        (name = "Sheets", description = "Planilha de Dados Diários com Fórmulas")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("api_jwt", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_protected_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/products/{id}/stock",
            "/api/orders/{id}/status",
            "/api/sheets/{name}/cells/{cell_id}",
            "/api/sheets/{name}/paste",
            "/api/sheets/{name}/export",
            "/api/dashboard/stock-chart",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{} ausente", path);
        }
        assert!(doc.components.unwrap().security_schemes.contains_key("api_jwt"));
    }
}
