// src/db/sheet_repo.rs

use sqlx::{types::Json, Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, sheet::SheetDocument};

#[derive(Clone, Default)]
pub struct SheetRepository;

impl SheetRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn load<'e, E>(&self, executor: E, owner_id: Uuid, name: &str) -> Result<Option<SheetDocument>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let document = sqlx::query_scalar::<_, Json<SheetDocument>>(
            "SELECT document FROM sheets WHERE owner_id = $1 AND name = $2",
        )
        .bind(owner_id)
        .bind(name)
        .fetch_optional(executor)
        .await?;
        Ok(document.map(|Json(doc)| doc))
    }

    /// Cria a planilha vazia se preciso. Chamado antes de `load_for_update`
    /// para que sempre exista uma linha a travar.
    pub async fn ensure_exists<'e, E>(&self, executor: E, owner_id: Uuid, name: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO sheets (owner_id, name, document)
            VALUES ($1, $2, $3)
            ON CONFLICT (owner_id, name) DO NOTHING
            "#,
        )
        .bind(owner_id)
        .bind(name)
        .bind(Json(SheetDocument::default()))
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn load_for_update<'e, E>(&self, executor: E, owner_id: Uuid, name: &str) -> Result<SheetDocument, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let Json(document) = sqlx::query_scalar::<_, Json<SheetDocument>>(
            "SELECT document FROM sheets WHERE owner_id = $1 AND name = $2 FOR UPDATE",
        )
        .bind(owner_id)
        .bind(name)
        .fetch_one(executor)
        .await?;
        Ok(document)
    }

    pub async fn save<'e, E>(&self, executor: E, owner_id: Uuid, name: &str, document: &SheetDocument) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE sheets SET document = $3, updated_at = NOW() WHERE owner_id = $1 AND name = $2")
            .bind(owner_id)
            .bind(name)
            .bind(Json(document))
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn delete<'e, E>(&self, executor: E, owner_id: Uuid, name: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM sheets WHERE owner_id = $1 AND name = $2")
            .bind(owner_id)
            .bind(name)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
