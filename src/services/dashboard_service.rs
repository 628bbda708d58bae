// src/services/dashboard_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{DashboardRepository, SettingsRepository},
    models::dashboard::{DashboardSummary, StockChartEntry, TopProductEntry},
};

const CHART_DAYS: i32 = 30;
const TOP_PRODUCTS: i64 = 10;

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
    settings_repo: SettingsRepository,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository, settings_repo: SettingsRepository) -> Self {
        Self { repo, settings_repo }
    }

    pub async fn get_summary<'e, E>(&self, executor: E, owner_id: Uuid) -> Result<DashboardSummary, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;
        let settings = self.settings_repo.get_settings(&mut *conn, owner_id).await?;
        self.repo
            .get_summary(&mut *conn, owner_id, settings.low_stock_threshold)
            .await
    }

    pub async fn get_stock_chart<'e, E>(&self, executor: E, owner_id: Uuid) -> Result<Vec<StockChartEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.get_stock_chart(executor, owner_id, CHART_DAYS).await
    }

    pub async fn get_top_products<'e, E>(&self, executor: E, owner_id: Uuid) -> Result<Vec<TopProductEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.get_top_products(executor, owner_id, TOP_PRODUCTS).await
    }
}
