// src/services/sheet_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::SheetRepository,
    models::sheet::SheetSnapshot,
    sheet::{Sheet, SheetError},
};

const MAX_NAME_LEN: usize = 64;

/// Nomes de planilha: 1 a 64 caracteres `a-z`, `0-9`, `-` ou `_`.
/// Maiúsculas são aceitas e normalizadas.
pub fn normalize_sheet_name(name: &str) -> Result<String, AppError> {
    let normalized = name.trim().to_ascii_lowercase();
    let valid = !normalized.is_empty()
        && normalized.len() <= MAX_NAME_LEN
        && normalized
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');

    if valid {
        Ok(normalized)
    } else {
        Err(AppError::InvalidSheetName(name.to_string()))
    }
}

#[derive(Clone)]
pub struct SheetService {
    repo: SheetRepository,
}

impl SheetService {
    pub fn new(repo: SheetRepository) -> Self {
        Self { repo }
    }

    /// Planilha inexistente é uma grade vazia.
    pub async fn get_sheet<'e, E>(&self, executor: E, owner_id: Uuid, name: &str) -> Result<SheetSnapshot, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let name = normalize_sheet_name(name)?;
        let sheet = match self.repo.load(executor, owner_id, &name).await? {
            Some(document) => Sheet::from_document(document),
            None => Sheet::new(),
        };
        Ok(SheetSnapshot::of(&name, &sheet))
    }

    pub async fn set_cell<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        name: &str,
        cell: &str,
        raw: String,
    ) -> Result<SheetSnapshot, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        // Célula inválida falha antes de abrir transação
        Sheet::cell_id(cell)?;
        self.edit(executor, owner_id, name, |sheet| sheet.set_cell(cell, raw).map(|_| ()))
            .await
    }

    /// Cola o bloco inteiro como um único passo do histórico.
    pub async fn paste<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        name: &str,
        anchor: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<SheetSnapshot, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        Sheet::cell_id(anchor)?;
        self.edit(executor, owner_id, name, |sheet| {
            let changed = sheet.paste(anchor, &rows)?;
            tracing::debug!("Bloco colado em {}: {} célula(s) alterada(s)", anchor, changed);
            Ok(())
        })
        .await
    }

    /// CSV da planilha (entradas brutas ou valores calculados). Devolve também
    /// o nome normalizado, usado no nome do arquivo.
    pub async fn export_csv<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        name: &str,
        values: bool,
    ) -> Result<(String, String), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let name = normalize_sheet_name(name)?;
        let sheet = match self.repo.load(executor, owner_id, &name).await? {
            Some(document) => Sheet::from_document(document),
            None => Sheet::new(),
        };
        let csv = sheet.export_csv(values);
        Ok((name, csv))
    }

    pub async fn undo<'e, E>(&self, executor: E, owner_id: Uuid, name: &str) -> Result<SheetSnapshot, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        self.edit(executor, owner_id, name, |sheet| sheet.undo().map(|_| ())).await
    }

    pub async fn redo<'e, E>(&self, executor: E, owner_id: Uuid, name: &str) -> Result<SheetSnapshot, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        self.edit(executor, owner_id, name, |sheet| sheet.redo().map(|_| ())).await
    }

    pub async fn delete_sheet<'e, E>(&self, executor: E, owner_id: Uuid, name: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let name = normalize_sheet_name(name)?;
        if self.repo.delete(executor, owner_id, &name).await? {
            tracing::info!("Planilha '{}' excluída", name);
        }
        Ok(())
    }

    // Carrega com a linha travada, aplica a edição e salva na mesma transação.
    // Edições concorrentes na mesma planilha ficam em fila.
    async fn edit<'e, E, F>(&self, executor: E, owner_id: Uuid, name: &str, apply: F) -> Result<SheetSnapshot, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
        F: FnOnce(&mut Sheet) -> Result<(), SheetError>,
    {
        let name = normalize_sheet_name(name)?;
        let mut tx = executor.begin().await?;

        self.repo.ensure_exists(&mut *tx, owner_id, &name).await?;
        let document = self.repo.load_for_update(&mut *tx, owner_id, &name).await?;

        let mut sheet = Sheet::from_document(document);
        apply(&mut sheet)?;

        self.repo.save(&mut *tx, owner_id, &name, &sheet.to_document()).await?;
        tx.commit().await?;

        Ok(SheetSnapshot::of(&name, &sheet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_names_are_normalised() {
        assert_eq!(normalize_sheet_name(" Daily-2024_Q1 ").unwrap(), "daily-2024_q1");
    }

    #[test]
    fn rejects_bad_sheet_names() {
        let long = "x".repeat(65);
        for bad in ["", "   ", "a b", "../etc", "planilha!", long.as_str()] {
            assert!(
                matches!(normalize_sheet_name(bad), Err(AppError::InvalidSheetName(_))),
                "{bad:?} deveria ser rejeitado"
            );
        }
    }
}
