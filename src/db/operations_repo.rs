// src/db/operations_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::operations::{Order, OrderChanges, OrderItem, OrderLine, OrderStatus},
};

// Cabeçalho do pedido + nome do cliente (LEFT JOIN)
const ORDER_SELECT: &str = r#"
    SELECT
        o.id, o.owner_id, o.customer_id, c.name AS customer_name,
        o.status, o.payment_status, o.shipping_address, o.notes,
        o.total_amount, o.created_at, o.updated_at
    FROM orders o
    LEFT JOIN customers c ON c.id = o.customer_id
"#;

#[derive(Clone, Default)]
pub struct OperationsRepository;

impl OperationsRepository {
    pub fn new() -> Self {
        Self
    }

    /// `owner_id` nulo lista os pedidos de todos os donos (visão de administrador).
    pub async fn list_orders<'e, E>(
        &self,
        executor: E,
        owner_id: Option<Uuid>,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "{ORDER_SELECT} WHERE ($1::uuid IS NULL OR o.owner_id = $1) AND ($2::order_status IS NULL OR o.status = $2) \
             ORDER BY o.created_at DESC"
        ))
        .bind(owner_id)
        .bind(status)
        .fetch_all(executor)
        .await?;
        Ok(orders)
    }

    pub async fn find_order<'e, E>(
        &self,
        executor: E,
        owner_id: Option<Uuid>,
        id: Uuid,
    ) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>(&format!(
            "{ORDER_SELECT} WHERE ($1::uuid IS NULL OR o.owner_id = $1) AND o.id = $2"
        ))
        .bind(owner_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(order)
    }

    /// Trava o pedido para mudança de status; devolve o dono e o status atual.
    pub async fn lock_order_status<'e, E>(
        &self,
        executor: E,
        owner_id: Option<Uuid>,
        id: Uuid,
    ) -> Result<Option<(Uuid, OrderStatus)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let locked = sqlx::query_as::<_, (Uuid, OrderStatus)>(
            "SELECT owner_id, status FROM orders \
             WHERE ($1::uuid IS NULL OR owner_id = $1) AND id = $2 FOR UPDATE",
        )
        .bind(owner_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(locked)
    }

    pub async fn insert_order<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        customer_id: Option<Uuid>,
        shipping_address: Option<&str>,
        notes: Option<&str>,
        total_amount: Decimal,
    ) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO orders (owner_id, customer_id, shipping_address, notes, total_amount)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(owner_id)
        .bind(customer_id)
        .bind(shipping_address)
        .bind(notes)
        .bind(total_amount)
        .fetch_one(executor)
        .await?;
        Ok(id)
    }

    pub async fn insert_order_item<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        line: &OrderLine,
    ) -> Result<OrderItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, OrderItem>(
            r#"
            INSERT INTO order_items (order_id, product_id, product_name, quantity, unit_price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(line.product_id)
        .bind(&line.product_name)
        .bind(line.quantity)
        .bind(line.unit_price)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    pub async fn list_order_items<'e, E>(&self, executor: E, order_id: Uuid) -> Result<Vec<OrderItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(order_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn update_order<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        id: Uuid,
        changes: &OrderChanges,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET shipping_address = COALESCE($3, shipping_address),
                notes = COALESCE($4, notes),
                payment_status = COALESCE($5, payment_status),
                status = COALESCE($6, status),
                updated_at = NOW()
            WHERE owner_id = $1 AND id = $2
            "#,
        )
        .bind(owner_id)
        .bind(id)
        .bind(changes.shipping_address.as_deref())
        .bind(changes.notes.as_deref())
        .bind(changes.payment_status)
        .bind(changes.status)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
