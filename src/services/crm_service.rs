// src/services/crm_service.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CrmRepository,
    models::crm::{Customer, CustomerInput},
};

#[derive(Clone)]
pub struct CrmService {
    repo: CrmRepository,
}

impl CrmService {
    pub fn new(repo: CrmRepository) -> Self {
        Self { repo }
    }

    pub async fn list_customers<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        self.repo.list_customers(executor, owner_id, search).await
    }

    pub async fn get_customer<'e, E>(&self, executor: E, owner_id: Uuid, id: Uuid) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_customer(executor, owner_id, id)
            .await?
            .ok_or(AppError::CustomerNotFound)
    }

    pub async fn create_customer<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        input: CustomerInput,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.create_customer(executor, owner_id, &normalize(input)).await
    }

    pub async fn update_customer<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        id: Uuid,
        input: CustomerInput,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .update_customer(executor, owner_id, id, &normalize(input))
            .await?
            .ok_or(AppError::CustomerNotFound)
    }

    pub async fn delete_customer<'e, E>(&self, executor: E, owner_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.repo.delete_customer(executor, owner_id, id).await? {
            return Err(AppError::CustomerNotFound);
        }
        Ok(())
    }
}

// Espaços nas pontas saem; campo opcional em branco vira nulo
fn normalize(input: CustomerInput) -> CustomerInput {
    fn clean(value: Option<String>) -> Option<String> {
        value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    CustomerInput {
        name: input.name.trim().to_string(),
        email: clean(input.email).map(|e| e.to_lowercase()),
        phone: clean(input.phone),
        address: clean(input.address),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_optional_fields_become_null() {
        let input = normalize(CustomerInput {
            name: "  Oficina ".into(),
            email: Some(" Joao@Oficina.com ".into()),
            phone: Some("   ".into()),
            address: None,
        });
        assert_eq!(input.name, "Oficina");
        assert_eq!(input.email.as_deref(), Some("joao@oficina.com"));
        assert_eq!(input.phone, None);
    }
}
