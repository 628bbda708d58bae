// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stock_transaction_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockTransactionKind {
    In,
    Out,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    #[schema(ignore)]
    #[serde(skip)]
    pub owner_id: Uuid,
    #[schema(example = "Power Tools")]
    pub name: String,
    #[schema(example = "power-tools")]
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(ignore)]
    #[serde(skip)]
    pub owner_id: Uuid,
    pub category_id: Option<Uuid>,
    #[schema(example = "Bosch")]
    pub brand: String,
    #[schema(example = "GSR 120-LI")]
    pub model: String,
    #[schema(example = 25)]
    pub quantity: i32,
    #[schema(example = 80.5)]
    pub cost_price: Decimal,
    #[schema(example = 129.9)]
    pub selling_price: Decimal,
    #[schema(example = "R3-B2")]
    pub rack_location: Option<String>,
    pub description: Option<String>,
    #[schema(example = "https://cdn.example.com/gsr-120.jpg")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    // Nome exibido nos pedidos e no ranking do dashboard
    pub fn display_name(&self) -> String {
        format!("{} {}", self.brand, self.model)
    }
}

// Movimentação de estoque (entrada/saída)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockTransaction {
    pub id: Uuid,
    #[schema(ignore)]
    #[serde(skip)]
    pub owner_id: Uuid,
    pub product_id: Uuid,
    pub kind: StockTransactionKind,
    pub quantity: i32,
    pub note: Option<String>,
    pub order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub category_id: Option<Uuid>,
    pub brand: String,
    pub model: String,
    pub quantity: i32,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub rack_location: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

// Alterações aceitas num produto; `None` mantém o valor atual
#[derive(Debug, Default)]
pub struct ProductChanges {
    pub category_id: Option<Uuid>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub cost_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub rack_location: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Default)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    // Limite de "estoque baixo" já resolvido pelas configurações da loja
    pub low_stock_below: Option<i32>,
}
