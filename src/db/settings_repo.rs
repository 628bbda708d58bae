// src/db/settings_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::settings::{StoreSettings, UpdateSettingsRequest, DEFAULT_CURRENCY, DEFAULT_LOW_STOCK_THRESHOLD},
};

#[derive(Clone, Default)]
pub struct SettingsRepository;

impl SettingsRepository {
    pub fn new() -> Self {
        Self
    }

    // Sem linha salva, devolve os valores padrão
    pub async fn get_settings<'e, E>(&self, executor: E, owner_id: Uuid) -> Result<StoreSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = sqlx::query_as::<_, StoreSettings>(
            "SELECT * FROM store_settings WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_optional(executor)
        .await?;

        Ok(settings.unwrap_or_else(|| StoreSettings::defaults(owner_id)))
    }

    // UPSERT: campos ausentes mantêm o valor salvo (ou o padrão, na primeira vez)
    pub async fn update_settings<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        input: &UpdateSettingsRequest,
    ) -> Result<StoreSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = sqlx::query_as::<_, StoreSettings>(
            r#"
            INSERT INTO store_settings (
                owner_id, store_name, store_description, currency,
                low_stock_threshold, notify_low_stock, notify_new_order
            )
            VALUES ($1, $2, $3, COALESCE($4, $8), COALESCE($5, $9), COALESCE($6, TRUE), COALESCE($7, TRUE))
            ON CONFLICT (owner_id)
            DO UPDATE SET
                store_name = COALESCE($2, store_settings.store_name),
                store_description = COALESCE($3, store_settings.store_description),
                currency = COALESCE($4, store_settings.currency),
                low_stock_threshold = COALESCE($5, store_settings.low_stock_threshold),
                notify_low_stock = COALESCE($6, store_settings.notify_low_stock),
                notify_new_order = COALESCE($7, store_settings.notify_new_order),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(input.store_name.as_deref())
        .bind(input.store_description.as_deref())
        .bind(input.currency.as_deref())
        .bind(input.low_stock_threshold)
        .bind(input.notify_low_stock)
        .bind(input.notify_new_order)
        .bind(DEFAULT_CURRENCY)
        .bind(DEFAULT_LOW_STOCK_THRESHOLD)
        .fetch_one(executor)
        .await?;

        Ok(settings)
    }
}
