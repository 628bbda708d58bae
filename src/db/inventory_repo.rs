// src/db/inventory_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::inventory::{
        Category, NewProduct, Product, ProductChanges, ProductFilter, StockTransaction,
        StockTransactionKind,
    },
};

const PRODUCT_COLUMNS: &str = "id, owner_id, category_id, brand, model, quantity, cost_price, \
                               selling_price, rack_location, description, image_url, created_at, updated_at";

fn category_conflict(e: sqlx::Error, slug: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() && db_err.constraint() == Some("categories_owner_slug_key") {
            return AppError::CategoryAlreadyExists(slug.to_string());
        }
    }
    e.into()
}

// Busca é por texto literal: `%` e `_` digitados não viram curingas
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Clone, Default)]
pub struct InventoryRepository;

impl InventoryRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Categorias
    // ---

    pub async fn list_categories<'e, E>(&self, executor: E, owner_id: Uuid) -> Result<Vec<Category>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE owner_id = $1 ORDER BY name ASC",
        )
        .bind(owner_id)
        .fetch_all(executor)
        .await?;
        Ok(categories)
    }

    pub async fn find_category_by_slug<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        slug: &str,
    ) -> Result<Option<Category>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let category = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE owner_id = $1 AND slug = $2",
        )
        .bind(owner_id)
        .bind(slug)
        .fetch_optional(executor)
        .await?;
        Ok(category)
    }

    pub async fn category_exists<'e, E>(&self, executor: E, owner_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM categories WHERE owner_id = $1 AND id = $2)",
        )
        .bind(owner_id)
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn create_category<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        name: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Category, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (owner_id, name, slug, description)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(name)
        .bind(slug)
        .bind(description)
        .fetch_one(executor)
        .await
        .map_err(|e| category_conflict(e, slug))
    }

    /// Renomeia a categoria identificada por `current_slug`. `None` se não existir.
    pub async fn update_category<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        current_slug: &str,
        name: &str,
        new_slug: &str,
        description: Option<&str>,
    ) -> Result<Option<Category>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $3, slug = $4, description = COALESCE($5, description), updated_at = NOW()
            WHERE owner_id = $1 AND slug = $2
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(current_slug)
        .bind(name)
        .bind(new_slug)
        .bind(description)
        .fetch_optional(executor)
        .await
        .map_err(|e| category_conflict(e, new_slug))
    }

    pub async fn delete_category<'e, E>(&self, executor: E, owner_id: Uuid, slug: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM categories WHERE owner_id = $1 AND slug = $2")
            .bind(owner_id)
            .bind(slug)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---
    // Produtos
    // ---

    pub async fn list_products<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Filtros opcionais: parâmetro nulo desliga a condição
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE owner_id = $1
              AND ($2::text IS NULL
                   OR brand ILIKE '%' || $2 || '%' ESCAPE '\'
                   OR model ILIKE '%' || $2 || '%' ESCAPE '\'
                   OR description ILIKE '%' || $2 || '%' ESCAPE '\')
              AND ($3::uuid IS NULL OR category_id = $3)
              AND ($4::int IS NULL OR quantity < $4)
            ORDER BY created_at DESC
            "#
        ))
        .bind(owner_id)
        .bind(filter.search.as_deref().map(escape_like))
        .bind(filter.category_id)
        .bind(filter.low_stock_below)
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    pub async fn find_product<'e, E>(&self, executor: E, owner_id: Uuid, id: Uuid) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE owner_id = $1 AND id = $2"
        ))
        .bind(owner_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    /// Igual a `find_product`, mas trava a linha até o fim da transação.
    pub async fn find_product_for_update<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE owner_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(owner_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        input: &NewProduct,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (
                owner_id, category_id, brand, model, quantity,
                cost_price, selling_price, rack_location, description, image_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(input.category_id)
        .bind(&input.brand)
        .bind(&input.model)
        .bind(input.quantity)
        .bind(input.cost_price)
        .bind(input.selling_price)
        .bind(input.rack_location.as_deref())
        .bind(input.description.as_deref())
        .bind(input.image_url.as_deref())
        .fetch_one(executor)
        .await?;
        Ok(product)
    }

    pub async fn update_product<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        id: Uuid,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET category_id = COALESCE($3, category_id),
                brand = COALESCE($4, brand),
                model = COALESCE($5, model),
                cost_price = COALESCE($6, cost_price),
                selling_price = COALESCE($7, selling_price),
                rack_location = COALESCE($8, rack_location),
                description = COALESCE($9, description),
                image_url = COALESCE($10, image_url),
                updated_at = NOW()
            WHERE owner_id = $1 AND id = $2
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(id)
        .bind(changes.category_id)
        .bind(changes.brand.as_deref())
        .bind(changes.model.as_deref())
        .bind(changes.cost_price)
        .bind(changes.selling_price)
        .bind(changes.rack_location.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.image_url.as_deref())
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    pub async fn delete_product<'e, E>(&self, executor: E, owner_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM products WHERE owner_id = $1 AND id = $2")
            .bind(owner_id)
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soma `delta` (positivo ou negativo) à quantidade em estoque.
    /// A constraint `quantity >= 0` da tabela é a última barreira contra saldo negativo.
    pub async fn adjust_quantity<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        id: Uuid,
        delta: i32,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET quantity = quantity + $3, updated_at = NOW()
            WHERE owner_id = $1 AND id = $2
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(id)
        .bind(delta)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::ProductNotFound)
    }

    // ---
    // Movimentações
    // ---

    pub async fn record_transaction<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        product_id: Uuid,
        kind: StockTransactionKind,
        quantity: i32,
        note: Option<&str>,
        order_id: Option<Uuid>,
    ) -> Result<StockTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transaction = sqlx::query_as::<_, StockTransaction>(
            r#"
            INSERT INTO stock_transactions (owner_id, product_id, kind, quantity, note, order_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(product_id)
        .bind(kind)
        .bind(quantity)
        .bind(note)
        .bind(order_id)
        .fetch_one(executor)
        .await?;
        Ok(transaction)
    }

    pub async fn list_transactions<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        product_id: Uuid,
    ) -> Result<Vec<StockTransaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transactions = sqlx::query_as::<_, StockTransaction>(
            r#"
            SELECT * FROM stock_transactions
            WHERE owner_id = $1 AND product_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .bind(product_id)
        .fetch_all(executor)
        .await?;
        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_matched_literally() {
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c:\\tmp"), "c:\\\\tmp");
        assert_eq!(escape_like("GSR 120"), "GSR 120");
    }
}
