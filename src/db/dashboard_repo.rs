// src/db/dashboard_repo.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::dashboard::{DashboardSummary, StockChartEntry, TopProductEntry},
};

#[derive(Clone, Default)]
pub struct DashboardRepository;

impl DashboardRepository {
    pub fn new() -> Self {
        Self
    }

    // 1. Resumo geral
    pub async fn get_summary<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        low_stock_threshold: i32,
    ) -> Result<DashboardSummary, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        // READ COMMITTED tiraria um snapshot por consulta; aqui todas leem o mesmo
        let mut tx = executor.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let (total_products, low_stock_count, inventory_value) = sqlx::query_as::<_, (i64, i64, Decimal)>(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE quantity < $2),
                COALESCE(SUM(quantity * cost_price), 0)
            FROM products
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .bind(low_stock_threshold)
        .fetch_one(&mut *tx)
        .await?;

        let (stock_in_count, stock_out_count) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE kind = 'IN'),
                COUNT(*) FILTER (WHERE kind = 'OUT')
            FROM stock_transactions
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;

        let (total_orders, revenue) = sqlx::query_as::<_, (i64, Decimal)>(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(total_amount) FILTER (WHERE status <> 'CANCELLED'), 0)
            FROM orders
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(DashboardSummary {
            total_products,
            low_stock_count,
            low_stock_threshold,
            stock_in_count,
            stock_out_count,
            total_orders,
            revenue,
            inventory_value,
        })
    }

    // 2. Entradas e saídas por dia; dias sem movimento aparecem zerados
    pub async fn get_stock_chart<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        days: i32,
    ) -> Result<Vec<StockChartEntry>, AppError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let entries = sqlx::query_as::<_, StockChartEntry>(
            r#"
            SELECT
                d::date AS date,
                COALESCE(SUM(t.quantity) FILTER (WHERE t.kind = 'IN'), 0)::BIGINT AS stock_in,
                COALESCE(SUM(t.quantity) FILTER (WHERE t.kind = 'OUT'), 0)::BIGINT AS stock_out
            FROM generate_series(
                (CURRENT_DATE - ($2::int - 1) * INTERVAL '1 day')::timestamp,
                CURRENT_DATE::timestamp,
                INTERVAL '1 day'
            ) AS d
            LEFT JOIN stock_transactions t
                ON t.owner_id = $1 AND t.created_at::date = d::date
            GROUP BY d
            ORDER BY d ASC
            "#,
        )
        .bind(owner_id)
        .bind(days)
        .fetch_all(executor)
        .await?;
        Ok(entries)
    }

    // 3. Mais vendidos (pedidos cancelados não contam). Agrupa pelo produto, com
    // o nome da venda mais recente; produtos excluídos agrupam pelo nome gravado.
    pub async fn get_top_products<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        limit: i64,
    ) -> Result<Vec<TopProductEntry>, AppError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let entries = sqlx::query_as::<_, TopProductEntry>(
            r#"
            SELECT
                oi.product_id,
                (ARRAY_AGG(oi.product_name ORDER BY oi.created_at DESC))[1] AS product_name,
                SUM(oi.quantity)::BIGINT AS total_quantity,
                COALESCE(SUM(oi.quantity * oi.unit_price), 0) AS total_revenue
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.owner_id = $1 AND o.status <> 'CANCELLED'
            GROUP BY oi.product_id, CASE WHEN oi.product_id IS NULL THEN oi.product_name END
            ORDER BY total_quantity DESC, product_name ASC
            LIMIT $2
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(executor)
        .await?;
        Ok(entries)
    }
}
