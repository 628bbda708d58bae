// src/services/inventory_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::{error::AppError, slug::slugify, validation::field_error},
    db::{InventoryRepository, SettingsRepository},
    models::inventory::{
        Category, NewProduct, Product, ProductChanges, ProductFilter, StockTransaction,
        StockTransactionKind,
    },
};

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
    settings_repo: SettingsRepository,
}

impl InventoryService {
    pub fn new(inventory_repo: InventoryRepository, settings_repo: SettingsRepository) -> Self {
        Self { inventory_repo, settings_repo }
    }

    // --- PRODUTOS ---

    pub async fn list_products<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        search: Option<String>,
        category_id: Option<Uuid>,
        low_stock: bool,
    ) -> Result<Vec<Product>, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        // "Estoque baixo" usa o limite configurado pela loja
        let low_stock_below = if low_stock {
            let settings = self.settings_repo.get_settings(&mut *conn, owner_id).await?;
            Some(settings.low_stock_threshold)
        } else {
            None
        };

        let filter = ProductFilter {
            search: search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            category_id,
            low_stock_below,
        };

        self.inventory_repo.list_products(&mut *conn, owner_id, &filter).await
    }

    pub async fn get_product<'e, E>(&self, executor: E, owner_id: Uuid, id: Uuid) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo
            .find_product(executor, owner_id, id)
            .await?
            .ok_or(AppError::ProductNotFound)
    }

    /// Cria o produto; estoque inicial positivo gera uma movimentação de entrada.
    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        input: NewProduct,
    ) -> Result<Product, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        if let Some(category_id) = input.category_id {
            if !self.inventory_repo.category_exists(&mut *tx, owner_id, category_id).await? {
                return Err(AppError::CategoryNotFound);
            }
        }

        let product = self.inventory_repo.create_product(&mut *tx, owner_id, &input).await?;

        if product.quantity > 0 {
            self.inventory_repo
                .record_transaction(
                    &mut *tx,
                    owner_id,
                    product.id,
                    StockTransactionKind::In,
                    product.quantity,
                    Some("Initial stock"),
                    None,
                )
                .await?;
        }

        tx.commit().await?;
        Ok(product)
    }

    pub async fn update_product<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        id: Uuid,
        changes: ProductChanges,
    ) -> Result<Product, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        if let Some(category_id) = changes.category_id {
            if !self.inventory_repo.category_exists(&mut *conn, owner_id, category_id).await? {
                return Err(AppError::CategoryNotFound);
            }
        }

        self.inventory_repo
            .update_product(&mut *conn, owner_id, id, &changes)
            .await?
            .ok_or(AppError::ProductNotFound)
    }

    pub async fn delete_product<'e, E>(&self, executor: E, owner_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.inventory_repo.delete_product(executor, owner_id, id).await? {
            return Err(AppError::ProductNotFound);
        }
        Ok(())
    }

    // --- ESTOQUE ---

    /// Entrada ou saída manual. A linha do produto fica travada durante a
    /// conferência de saldo, então saídas concorrentes não deixam saldo negativo.
    pub async fn adjust_stock<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        product_id: Uuid,
        kind: StockTransactionKind,
        quantity: i32,
        note: Option<&str>,
    ) -> Result<Product, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let product = self
            .inventory_repo
            .find_product_for_update(&mut *tx, owner_id, product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        let delta = stock_delta(&product, kind, quantity)?;

        let updated = self
            .inventory_repo
            .adjust_quantity(&mut *tx, owner_id, product_id, delta)
            .await?;
        self.inventory_repo
            .record_transaction(&mut *tx, owner_id, product_id, kind, quantity, note, None)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Estoque ajustado: produto {} {:?} {} (saldo {})",
            product_id, kind, quantity, updated.quantity
        );
        Ok(updated)
    }

    pub async fn list_transactions<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        product_id: Uuid,
    ) -> Result<Vec<StockTransaction>, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        if self.inventory_repo.find_product(&mut *conn, owner_id, product_id).await?.is_none() {
            return Err(AppError::ProductNotFound);
        }

        self.inventory_repo.list_transactions(&mut *conn, owner_id, product_id).await
    }

    // --- CATEGORIAS ---

    pub async fn list_categories<'e, E>(&self, executor: E, owner_id: Uuid) -> Result<Vec<Category>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo.list_categories(executor, owner_id).await
    }

    pub async fn get_category<'e, E>(&self, executor: E, owner_id: Uuid, slug: &str) -> Result<Category, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo
            .find_category_by_slug(executor, owner_id, slug)
            .await?
            .ok_or(AppError::CategoryNotFound)
    }

    pub async fn create_category<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slug = category_slug(name)?;
        self.inventory_repo
            .create_category(executor, owner_id, name.trim(), &slug, description)
            .await
    }

    /// Renomear a categoria também troca o slug.
    pub async fn update_category<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        slug: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let new_slug = category_slug(name)?;
        self.inventory_repo
            .update_category(executor, owner_id, slug, name.trim(), &new_slug, description)
            .await?
            .ok_or(AppError::CategoryNotFound)
    }

    pub async fn delete_category<'e, E>(&self, executor: E, owner_id: Uuid, slug: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.inventory_repo.delete_category(executor, owner_id, slug).await? {
            return Err(AppError::CategoryNotFound);
        }
        Ok(())
    }
}

// Entrada que estouraria o INTEGER da coluna é erro de validação, não erro de banco
fn stock_delta(product: &Product, kind: StockTransactionKind, quantity: i32) -> Result<i32, AppError> {
    match kind {
        StockTransactionKind::In => match product.quantity.checked_add(quantity) {
            Some(_) => Ok(quantity),
            None => Err(AppError::ValidationError(field_error(
                "quantity",
                "range",
                "validation.stock_overflow",
            ))),
        },
        StockTransactionKind::Out if quantity > product.quantity => Err(AppError::InsufficientStock {
            product: product.display_name(),
            available: product.quantity,
        }),
        StockTransactionKind::Out => Ok(-quantity),
    }
}

// Nome sem nenhuma letra/dígito não gera slug: erro de validação no campo "name"
fn category_slug(name: &str) -> Result<String, AppError> {
    let slug = slugify(name);
    if slug.is_empty() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("invalid_slug");
        err.message = Some("validation.invalid_slug".into());
        errors.add("name", err);
        return Err(AppError::ValidationError(errors));
    }
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn product(quantity: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            category_id: None,
            brand: "Bosch".into(),
            model: "GSR 120-LI".into(),
            quantity,
            cost_price: Decimal::new(8050, 2),
            selling_price: Decimal::new(12990, 2),
            rack_location: None,
            description: None,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn stock_in_that_would_overflow_is_a_validation_error() {
        let full = product(i32::MAX - 10);
        assert!(matches!(
            stock_delta(&full, StockTransactionKind::In, 1_000_000),
            Err(AppError::ValidationError(_))
        ));
        assert_eq!(stock_delta(&full, StockTransactionKind::In, 10).unwrap(), 10);
    }

    #[test]
    fn stock_out_cannot_go_below_zero() {
        let shelf = product(3);
        assert_eq!(stock_delta(&shelf, StockTransactionKind::Out, 3).unwrap(), -3);
        assert!(matches!(
            stock_delta(&shelf, StockTransactionKind::Out, 4),
            Err(AppError::InsufficientStock { available: 3, .. })
        ));
    }

    #[test]
    fn category_slug_rejects_symbol_only_names() {
        assert_eq!(category_slug("Hand Tools").unwrap(), "hand-tools");
        assert!(matches!(category_slug("!!!"), Err(AppError::ValidationError(_))));
    }
}
