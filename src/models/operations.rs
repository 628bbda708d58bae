// src/models/operations.rs

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::auth::{User, UserRole};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Fluxo PENDING -> PROCESSING -> SHIPPED -> DELIVERED. Qualquer status não
    /// terminal pode ser cancelado; repetir o status atual é permitido (no-op).
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        match (self, next) {
            (current, next) if current == next => true,
            (Pending, Processing) | (Processing, Shipped) | (Shipped, Delivered) => true,
            (current, Cancelled) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

// --- Structs de Operação ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    #[schema(ignore)]
    #[serde(skip)]
    pub owner_id: Uuid,
    pub customer_id: Option<Uuid>,
    // Vem do LEFT JOIN com customers
    #[schema(example = "Oficina do João")]
    pub customer_name: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    #[schema(example = 259.8)]
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    // Nulo quando o produto foi excluído depois da venda
    pub product_id: Option<Uuid>,
    #[schema(example = "Bosch GSR 120-LI")]
    pub product_name: String,
    #[schema(example = 2)]
    pub quantity: i32,
    #[schema(example = 129.9)]
    pub unit_price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

// Linha já resolvida (produto conferido, preço definido) pronta para gravar
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Default)]
pub struct OrderChanges {
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub status: Option<OrderStatus>,
}

/// Quais pedidos um usuário enxerga. Administradores veem os de todos os donos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    Owner(Uuid),
    Any,
}

impl OrderScope {
    pub fn for_user(user: &User) -> Self {
        match user.role {
            UserRole::Admin => OrderScope::Any,
            UserRole::User => OrderScope::Owner(user.id),
        }
    }

    /// Filtro para `$n::uuid IS NULL OR owner_id = $n`
    pub fn owner_filter(self) -> Option<Uuid> {
        match self {
            OrderScope::Owner(owner_id) => Some(owner_id),
            OrderScope::Any => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;
    use super::{OrderScope, User, UserRole};
    use crate::models::auth::UserStatus;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            email: "ana@loja.com".into(),
            password_hash: String::new(),
            role,
            phone: None,
            bio: None,
            status: UserStatus::Active,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn admins_see_every_owner() {
        let admin = user(UserRole::Admin);
        assert_eq!(OrderScope::for_user(&admin), OrderScope::Any);
        assert_eq!(OrderScope::for_user(&admin).owner_filter(), None);

        let regular = user(UserRole::User);
        assert_eq!(OrderScope::for_user(&regular).owner_filter(), Some(regular.id));
    }

    #[test]
    fn follows_the_fulfilment_flow() {
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));

        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Shipped.can_transition_to(Processing));
        assert!(!Delivered.can_transition_to(Pending));
    }

    #[test]
    fn only_open_orders_can_be_cancelled() {
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Shipped.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
    }

    #[test]
    fn same_status_is_allowed() {
        assert!(Delivered.can_transition_to(Delivered));
        assert!(Cancelled.can_transition_to(Cancelled));
    }

    #[test]
    fn displays_as_database_label() {
        assert_eq!(Processing.to_string(), "PROCESSING");
    }
}
