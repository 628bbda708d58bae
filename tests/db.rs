// Testes contra um Postgres real. O `sqlx::test` cria um banco novo por teste
// (a partir de DATABASE_URL) e roda as migrações antes.

use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use stockdesk::{
    common::error::AppError,
    db::{
        CrmRepository, DashboardRepository, InventoryRepository, OperationsRepository,
        SettingsRepository, SheetRepository, UserRepository,
    },
    models::{
        auth::{User, UserRole},
        inventory::{NewProduct, Product, ProductChanges, StockTransactionKind},
        operations::{OrderScope, OrderStatus},
    },
    services::{
        dashboard_service::DashboardService,
        inventory_service::InventoryService,
        operation_service::{NewOrder, OperationsService, RequestedItem},
        sheet_service::SheetService,
    },
};

fn money(text: &str) -> Decimal {
    Decimal::from_str(text).unwrap()
}

fn inventory() -> InventoryService {
    InventoryService::new(InventoryRepository::new(), SettingsRepository::new())
}

fn operations() -> OperationsService {
    OperationsService::new(OperationsRepository::new(), InventoryRepository::new(), CrmRepository::new())
}

async fn user(pool: &PgPool, email: &str, role: UserRole) -> User {
    UserRepository::new()
        .create_user(pool, "Ana", email, "hash", role)
        .await
        .unwrap()
}

async fn product(pool: &PgPool, owner_id: Uuid, model: &str, quantity: i32) -> Product {
    inventory()
        .create_product(
            pool,
            owner_id,
            NewProduct {
                category_id: None,
                brand: "Bosch".into(),
                model: model.into(),
                quantity,
                cost_price: money("80.50"),
                selling_price: money("129.90"),
                rack_location: Some("R3-B2".into()),
                description: None,
                image_url: None,
            },
        )
        .await
        .unwrap()
}

fn order_of(items: &[(Uuid, i32)]) -> NewOrder {
    NewOrder {
        items: items
            .iter()
            .map(|(product_id, quantity)| RequestedItem {
                product_id: *product_id,
                quantity: *quantity,
                unit_price: None,
            })
            .collect(),
        ..NewOrder::default()
    }
}

async fn quantity_of(pool: &PgPool, owner_id: Uuid, id: Uuid) -> i32 {
    inventory().get_product(pool, owner_id, id).await.unwrap().quantity
}

#[sqlx::test(migrations = "./migrations")]
async fn order_decrements_stock_and_records_outgoing_movements(pool: PgPool) {
    let owner = user(&pool, "ana@loja.com", UserRole::User).await;
    let drill = product(&pool, owner.id, "GSR 120-LI", 10).await;

    let detail = operations()
        .create_order(&pool, owner.id, order_of(&[(drill.id, 3), (drill.id, 2)]))
        .await
        .unwrap();

    assert_eq!(detail.items.len(), 2);
    assert_eq!(detail.order.total_amount, money("649.50"));
    assert_eq!(quantity_of(&pool, owner.id, drill.id).await, 5);

    let movements = inventory().list_transactions(&pool, owner.id, drill.id).await.unwrap();
    let outgoing: Vec<_> = movements
        .iter()
        .filter(|m| m.kind == StockTransactionKind::Out)
        .collect();
    assert_eq!(outgoing.len(), 2);
    assert!(outgoing.iter().all(|m| m.order_id == Some(detail.order.id)));
}

#[sqlx::test(migrations = "./migrations")]
async fn insufficient_stock_rolls_back_the_whole_order(pool: PgPool) {
    let owner = user(&pool, "ana@loja.com", UserRole::User).await;
    let drill = product(&pool, owner.id, "GSR 120-LI", 10).await;
    let saw = product(&pool, owner.id, "GKS 190", 1).await;

    let err = operations()
        .create_order(&pool, owner.id, order_of(&[(drill.id, 4), (saw.id, 2)]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { available: 1, .. }));

    assert_eq!(quantity_of(&pool, owner.id, drill.id).await, 10);
    assert_eq!(quantity_of(&pool, owner.id, saw.id).await, 1);
    let orders = operations()
        .list_orders(&pool, OrderScope::Owner(owner.id), None)
        .await
        .unwrap();
    assert!(orders.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_orders_listing_products_in_opposite_order_both_commit(pool: PgPool) {
    let owner = user(&pool, "ana@loja.com", UserRole::User).await;
    let drill = product(&pool, owner.id, "GSR 120-LI", 50).await;
    let saw = product(&pool, owner.id, "GKS 190", 50).await;
    let service = operations();

    for _ in 0..10 {
        let (first, second) = tokio::join!(
            service.create_order(&pool, owner.id, order_of(&[(drill.id, 1), (saw.id, 1)])),
            service.create_order(&pool, owner.id, order_of(&[(saw.id, 1), (drill.id, 1)])),
        );
        first.unwrap();
        second.unwrap();
    }

    assert_eq!(quantity_of(&pool, owner.id, drill.id).await, 30);
    assert_eq!(quantity_of(&pool, owner.id, saw.id).await, 30);
}

#[sqlx::test(migrations = "./migrations")]
async fn cancelling_restores_stock_once(pool: PgPool) {
    let owner = user(&pool, "ana@loja.com", UserRole::User).await;
    let drill = product(&pool, owner.id, "GSR 120-LI", 10).await;
    let scope = OrderScope::Owner(owner.id);

    let detail = operations()
        .create_order(&pool, owner.id, order_of(&[(drill.id, 4)]))
        .await
        .unwrap();
    assert_eq!(quantity_of(&pool, owner.id, drill.id).await, 6);

    let cancelled = operations()
        .change_status(&pool, scope, detail.order.id, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
    assert_eq!(quantity_of(&pool, owner.id, drill.id).await, 10);

    // Repetir o status é no-op: o estoque não volta duas vezes
    operations()
        .change_status(&pool, scope, detail.order.id, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(quantity_of(&pool, owner.id, drill.id).await, 10);

    let err = operations()
        .change_status(&pool, scope, detail.order.id, OrderStatus::Processing)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStatusTransition { .. }));
}

#[sqlx::test(migrations = "./migrations")]
async fn admins_reach_other_owners_orders_and_users_do_not(pool: PgPool) {
    let owner = user(&pool, "ana@loja.com", UserRole::User).await;
    let stranger = user(&pool, "bia@loja.com", UserRole::User).await;
    let admin = user(&pool, "dono@loja.com", UserRole::Admin).await;
    let drill = product(&pool, owner.id, "GSR 120-LI", 10).await;

    let detail = operations()
        .create_order(&pool, owner.id, order_of(&[(drill.id, 4)]))
        .await
        .unwrap();
    let id = detail.order.id;

    let err = operations()
        .get_order(&pool, OrderScope::for_user(&stranger), id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::OrderNotFound));
    assert!(operations()
        .list_orders(&pool, OrderScope::for_user(&stranger), None)
        .await
        .unwrap()
        .is_empty());

    let admin_scope = OrderScope::for_user(&admin);
    assert_eq!(operations().get_order(&pool, admin_scope, id).await.unwrap().order.id, id);
    assert_eq!(operations().list_orders(&pool, admin_scope, None).await.unwrap().len(), 1);

    // O estoque devolvido é o do dono do pedido
    operations()
        .change_status(&pool, admin_scope, id, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(quantity_of(&pool, owner.id, drill.id).await, 10);
}

#[sqlx::test(migrations = "./migrations")]
async fn configured_admin_emails_are_promoted(pool: PgPool) {
    user(&pool, "dono@loja.com", UserRole::User).await;
    user(&pool, "ana@loja.com", UserRole::User).await;

    let repo = UserRepository::new();
    let promoted = repo.promote_admins(&pool, &["dono@loja.com".to_string()]).await.unwrap();
    assert_eq!(promoted, 1);

    let dono = repo.find_by_email(&pool, "dono@loja.com").await.unwrap().unwrap();
    let ana = repo.find_by_email(&pool, "ana@loja.com").await.unwrap().unwrap();
    assert_eq!(dono.role, UserRole::Admin);
    assert_eq!(ana.role, UserRole::User);
}

#[sqlx::test(migrations = "./migrations")]
async fn product_update_only_touches_the_given_fields(pool: PgPool) {
    let owner = user(&pool, "ana@loja.com", UserRole::User).await;
    let drill = product(&pool, owner.id, "GSR 120-LI", 10).await;

    let updated = inventory()
        .update_product(
            &pool,
            owner.id,
            drill.id,
            ProductChanges {
                selling_price: Some(money("139.90")),
                image_url: Some("https://cdn.example.com/gsr-120.jpg".into()),
                ..ProductChanges::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.selling_price, money("139.90"));
    assert_eq!(updated.image_url.as_deref(), Some("https://cdn.example.com/gsr-120.jpg"));
    assert_eq!(updated.cost_price, drill.cost_price);
    assert_eq!(updated.quantity, 10);
    assert_eq!(updated.rack_location.as_deref(), Some("R3-B2"));
    assert_eq!(updated.model, "GSR 120-LI");
}

#[sqlx::test(migrations = "./migrations")]
async fn search_treats_wildcards_literally(pool: PgPool) {
    let owner = user(&pool, "ana@loja.com", UserRole::User).await;
    product(&pool, owner.id, "GSR_120", 1).await;
    product(&pool, owner.id, "GSRX120", 1).await;

    let found = inventory()
        .list_products(&pool, owner.id, Some("GSR_".into()), None, false)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].model, "GSR_120");
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_category_slug_is_a_conflict(pool: PgPool) {
    let owner = user(&pool, "ana@loja.com", UserRole::User).await;

    inventory()
        .create_category(&pool, owner.id, "Hand Tools", None)
        .await
        .unwrap();
    let err = inventory()
        .create_category(&pool, owner.id, "hand tools!", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CategoryAlreadyExists(ref slug) if slug == "hand-tools"));

    // O slug é único por dono
    let other = user(&pool, "bia@loja.com", UserRole::User).await;
    assert!(inventory().create_category(&pool, other.id, "Hand Tools", None).await.is_ok());
}

#[sqlx::test(migrations = "./migrations")]
async fn stock_in_past_the_column_limit_is_rejected(pool: PgPool) {
    let owner = user(&pool, "ana@loja.com", UserRole::User).await;
    let drill = product(&pool, owner.id, "GSR 120-LI", i32::MAX - 5).await;

    let err = inventory()
        .adjust_stock(&pool, owner.id, drill.id, StockTransactionKind::In, 10, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
    assert_eq!(quantity_of(&pool, owner.id, drill.id).await, i32::MAX - 5);
}

#[sqlx::test(migrations = "./migrations")]
async fn top_products_group_by_product_across_renames(pool: PgPool) {
    let owner = user(&pool, "ana@loja.com", UserRole::User).await;
    let drill = product(&pool, owner.id, "GSR 120-LI", 10).await;

    operations()
        .create_order(&pool, owner.id, order_of(&[(drill.id, 2)]))
        .await
        .unwrap();
    inventory()
        .update_product(
            &pool,
            owner.id,
            drill.id,
            ProductChanges { model: Some("GSR 12V".into()), ..ProductChanges::default() },
        )
        .await
        .unwrap();
    operations()
        .create_order(&pool, owner.id, order_of(&[(drill.id, 3)]))
        .await
        .unwrap();

    let dashboard = DashboardService::new(DashboardRepository::new(), SettingsRepository::new());
    let top = dashboard.get_top_products(&pool, owner.id).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].product_id, Some(drill.id));
    assert_eq!(top[0].product_name, "Bosch GSR 12V");
    assert_eq!(top[0].total_quantity, 5);

    let summary = dashboard.get_summary(&pool, owner.id).await.unwrap();
    assert_eq!(summary.total_orders, 2);
    assert_eq!(summary.stock_out_count, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_sheet_edits_are_both_kept(pool: PgPool) {
    let owner = user(&pool, "ana@loja.com", UserRole::User).await;
    let sheets = SheetService::new(SheetRepository::new());

    let (a, b) = tokio::join!(
        sheets.set_cell(&pool, owner.id, "daily", "A1", "2".into()),
        sheets.set_cell(&pool, owner.id, "daily", "B1", "=A1*3".into()),
    );
    a.unwrap();
    b.unwrap();

    let snapshot = sheets.get_sheet(&pool, owner.id, "daily").await.unwrap();
    assert_eq!(snapshot.cells.len(), 2);
    assert_eq!(snapshot.cells["B1"].raw, "=A1*3");

    sheets.undo(&pool, owner.id, "daily").await.unwrap();
    sheets.undo(&pool, owner.id, "daily").await.unwrap();
    let err = sheets.undo(&pool, owner.id, "daily").await.unwrap_err();
    assert!(matches!(err, AppError::NothingToUndo));
}

#[sqlx::test(migrations = "./migrations")]
async fn pasted_block_is_undone_in_one_step(pool: PgPool) {
    let owner = user(&pool, "ana@loja.com", UserRole::User).await;
    let sheets = SheetService::new(SheetRepository::new());

    let rows = vec![vec!["10".to_string(), "=A1*2".to_string()], vec!["5".to_string()]];
    let snapshot = sheets.paste(&pool, owner.id, "daily", "A1", rows).await.unwrap();
    assert_eq!(snapshot.cells.len(), 3);

    let (_, csv) = sheets.export_csv(&pool, owner.id, "Daily", true).await.unwrap();
    assert_eq!(csv, "10,20\r\n5,\r\n");

    let snapshot = sheets.undo(&pool, owner.id, "daily").await.unwrap();
    assert!(snapshot.cells.is_empty());
    assert!(!snapshot.can_undo);
}
