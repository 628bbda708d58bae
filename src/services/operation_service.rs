// src/services/operation_service.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        validation::{field_error, MAX_ORDER_TOTAL},
    },
    db::{CrmRepository, InventoryRepository, OperationsRepository},
    models::{
        inventory::StockTransactionKind,
        operations::{Order, OrderChanges, OrderDetail, OrderLine, OrderScope, OrderStatus},
    },
};

/// Item pedido pelo cliente, antes de conferir produto e estoque.
#[derive(Debug, Clone)]
pub struct RequestedItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone, Default)]
pub struct NewOrder {
    pub customer_id: Option<Uuid>,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<RequestedItem>,
}

/// Soma dos subtotais. Estouro ou total acima do que a coluna guarda é erro de validação.
pub fn order_total(lines: &[OrderLine]) -> Result<Decimal, AppError> {
    lines
        .iter()
        .try_fold(Decimal::ZERO, |total, line| {
            line.unit_price
                .checked_mul(Decimal::from(line.quantity))
                .and_then(|subtotal| total.checked_add(subtotal))
        })
        .filter(|total| *total <= MAX_ORDER_TOTAL)
        .ok_or_else(|| {
            AppError::ValidationError(field_error("items", "total", "validation.total_too_large"))
        })
}

#[derive(Clone)]
pub struct OperationsService {
    repo: OperationsRepository,
    inventory_repo: InventoryRepository,
    crm_repo: CrmRepository,
}

impl OperationsService {
    pub fn new(repo: OperationsRepository, inventory_repo: InventoryRepository, crm_repo: CrmRepository) -> Self {
        Self { repo, inventory_repo, crm_repo }
    }

    // --- PEDIDOS ---

    /// Cria o pedido, baixa o estoque e registra as saídas numa única transação.
    /// Qualquer falha (produto inexistente, saldo insuficiente) desfaz tudo.
    pub async fn create_order<'e, E>(&self, executor: E, owner_id: Uuid, input: NewOrder) -> Result<OrderDetail, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        if input.items.is_empty() {
            return Err(AppError::EmptyOrder);
        }

        let mut tx = executor.begin().await?;

        if let Some(customer_id) = input.customer_id {
            if self.crm_repo.find_customer(&mut *tx, owner_id, customer_id).await?.is_none() {
                return Err(AppError::CustomerNotFound);
            }
        }

        // 1. Trava os produtos sempre em ordem de id, seja qual for a ordem das linhas
        let mut product_ids: Vec<Uuid> = input.items.iter().map(|item| item.product_id).collect();
        product_ids.sort_unstable();
        product_ids.dedup();

        let mut products = HashMap::with_capacity(product_ids.len());
        for product_id in product_ids {
            let product = self
                .inventory_repo
                .find_product_for_update(&mut *tx, owner_id, product_id)
                .await?
                .ok_or(AppError::ProductNotFound)?;
            products.insert(product_id, product);
        }

        // 2. Confere o saldo. O mesmo produto em várias linhas soma.
        let mut reserved: HashMap<Uuid, i32> = HashMap::new();
        let mut lines = Vec::with_capacity(input.items.len());

        for item in &input.items {
            let product = products.get(&item.product_id).ok_or(AppError::ProductNotFound)?;

            let already = reserved.entry(product.id).or_insert(0);
            let available = product.quantity - *already;
            if item.quantity > available {
                return Err(AppError::InsufficientStock {
                    product: product.display_name(),
                    available,
                });
            }
            *already += item.quantity;

            lines.push(OrderLine {
                product_id: product.id,
                product_name: product.display_name(),
                quantity: item.quantity,
                unit_price: item.unit_price.unwrap_or(product.selling_price),
            });
        }

        let total = order_total(&lines)?;

        // 3. Cabeçalho e itens
        let order_id = self
            .repo
            .insert_order(
                &mut *tx,
                owner_id,
                input.customer_id,
                input.shipping_address.as_deref(),
                input.notes.as_deref(),
                total,
            )
            .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            items.push(self.repo.insert_order_item(&mut *tx, order_id, line).await?);

            // 4. Baixa de estoque
            self.inventory_repo
                .adjust_quantity(&mut *tx, owner_id, line.product_id, -line.quantity)
                .await?;
            self.inventory_repo
                .record_transaction(
                    &mut *tx,
                    owner_id,
                    line.product_id,
                    StockTransactionKind::Out,
                    line.quantity,
                    Some("Order"),
                    Some(order_id),
                )
                .await?;
        }

        let order = self
            .repo
            .find_order(&mut *tx, Some(owner_id), order_id)
            .await?
            .ok_or(AppError::OrderNotFound)?;

        tx.commit().await?;

        tracing::info!("Pedido {} criado com {} item(ns), total {}", order.id, items.len(), order.total_amount);
        Ok(OrderDetail { order, items })
    }

    pub async fn list_orders<'e, E>(
        &self,
        executor: E,
        scope: OrderScope,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_orders(executor, scope.owner_filter(), status).await
    }

    pub async fn get_order<'e, E>(&self, executor: E, scope: OrderScope, id: Uuid) -> Result<OrderDetail, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;
        self.load_detail(&mut *conn, scope, id).await
    }

    /// Atualiza endereço, observações, pagamento e status. Mudança de status
    /// passa pelas mesmas regras de `change_status`. O estoque devolvido num
    /// cancelamento é sempre o do dono do pedido, mesmo quando quem cancela é admin.
    pub async fn update_order<'e, E>(
        &self,
        executor: E,
        scope: OrderScope,
        id: Uuid,
        changes: OrderChanges,
    ) -> Result<OrderDetail, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let (owner_id, current) = self
            .repo
            .lock_order_status(&mut *tx, scope.owner_filter(), id)
            .await?
            .ok_or(AppError::OrderNotFound)?;

        if let Some(next) = changes.status {
            self.apply_transition(&mut *tx, owner_id, id, current, next).await?;
        }

        self.repo.update_order(&mut *tx, owner_id, id, &changes).await?;
        let detail = self.load_detail(&mut *tx, OrderScope::Owner(owner_id), id).await?;

        tx.commit().await?;
        Ok(detail)
    }

    pub async fn change_status<'e, E>(
        &self,
        executor: E,
        scope: OrderScope,
        id: Uuid,
        next: OrderStatus,
    ) -> Result<OrderDetail, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let changes = OrderChanges { status: Some(next), ..OrderChanges::default() };
        self.update_order(executor, scope, id, changes).await
    }

    // --- TRANSIÇÃO ---

    // Valida a transição; cancelar devolve ao estoque o que o pedido baixou
    async fn apply_transition(
        &self,
        conn: &mut PgConnection,
        owner_id: Uuid,
        order_id: Uuid,
        current: OrderStatus,
        next: OrderStatus,
    ) -> Result<(), AppError> {
        if !current.can_transition_to(next) {
            return Err(AppError::InvalidStatusTransition { from: current, to: next });
        }
        if current == next || next != OrderStatus::Cancelled {
            return Ok(());
        }

        let items = self.repo.list_order_items(&mut *conn, order_id).await?;
        for item in items {
            // Produto excluído depois da venda: não há o que devolver
            let Some(product_id) = item.product_id else {
                continue;
            };
            self.inventory_repo
                .adjust_quantity(&mut *conn, owner_id, product_id, item.quantity)
                .await?;
            self.inventory_repo
                .record_transaction(
                    &mut *conn,
                    owner_id,
                    product_id,
                    StockTransactionKind::In,
                    item.quantity,
                    Some("Order cancelled"),
                    Some(order_id),
                )
                .await?;
        }

        tracing::info!("Pedido {} cancelado; estoque devolvido", order_id);
        Ok(())
    }

    async fn load_detail(&self, conn: &mut PgConnection, scope: OrderScope, id: Uuid) -> Result<OrderDetail, AppError> {
        let order = self
            .repo
            .find_order(&mut *conn, scope.owner_filter(), id)
            .await?
            .ok_or(AppError::OrderNotFound)?;
        let items = self.repo.list_order_items(&mut *conn, id).await?;
        Ok(OrderDetail { order, items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn line(quantity: i32, price: &str) -> OrderLine {
        OrderLine {
            product_id: Uuid::new_v4(),
            product_name: "Bosch GSR".into(),
            quantity,
            unit_price: Decimal::from_str(price).unwrap(),
        }
    }

    #[test]
    fn total_is_the_sum_of_line_subtotals() {
        let lines = vec![line(2, "129.90"), line(1, "0.20"), line(3, "10")];
        assert_eq!(order_total(&lines).unwrap(), Decimal::from_str("290.00").unwrap());
    }

    #[test]
    fn empty_order_totals_zero() {
        assert_eq!(order_total(&[]).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn overflowing_total_is_rejected_instead_of_panicking() {
        let lines = vec![line(10, "79000000000000000000000000000")];
        assert!(matches!(order_total(&lines), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn total_above_the_column_limit_is_rejected() {
        let lines = vec![line(1_000_000, "9999999999.99")];
        assert!(matches!(order_total(&lines), Err(AppError::ValidationError(_))));

        let at_limit = vec![line(100, "9999999999.99")];
        assert_eq!(order_total(&at_limit).unwrap(), Decimal::from_str("999999999999.00").unwrap());
    }
}
