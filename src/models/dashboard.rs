// src/models/dashboard.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// 1. Cards do topo
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_products: i64,
    pub low_stock_count: i64,    // quantidade abaixo do limite da loja
    pub low_stock_threshold: i32,
    pub stock_in_count: i64,     // movimentações de entrada
    pub stock_out_count: i64,    // movimentações de saída
    pub total_orders: i64,
    pub revenue: Decimal,        // pedidos não cancelados
    pub inventory_value: Decimal, // quantidade x custo
}

// 2. Gráfico de entradas/saídas (últimos 30 dias)
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockChartEntry {
    pub date: NaiveDate,
    pub stock_in: i64,
    pub stock_out: i64,
}

// 3. Mais vendidos
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopProductEntry {
    // Nulo para produtos já excluídos (agrupados pelo nome gravado na venda)
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub total_quantity: i64,
    pub total_revenue: Decimal,
}
