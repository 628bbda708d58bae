// src/config.rs

use std::{env, fmt::Display, str::FromStr, sync::Arc, time::Duration};

use anyhow::{bail, Context};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        CrmRepository, DashboardRepository, InventoryRepository, OperationsRepository,
        SettingsRepository, SheetRepository, UserRepository,
    },
    services::{
        auth::AuthService, crm_service::CrmService, dashboard_service::DashboardService,
        inventory_service::InventoryService, operation_service::OperationsService,
        sheet_service::SheetService,
    },
};

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub db_connect_retries: u32,
    pub db_connect_retry_delay: Duration,
    pub cors_origins: Vec<String>,
    // E-mails (minúsculos) que recebem o perfil ADMIN no registro e na partida
    pub admin_emails: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = required(&lookup, "DATABASE_URL")?;
        let jwt_secret = required(&lookup, "JWT_SECRET")?;

        let port = parsed(&lookup, "PORT", 5000u16)?;
        let db_max_connections = parsed(&lookup, "DB_MAX_CONNECTIONS", 5u32)?;
        let db_connect_retries = parsed(&lookup, "DB_CONNECT_RETRIES", 5u32)?;
        let retry_delay_secs = parsed(&lookup, "DB_CONNECT_RETRY_DELAY_SECS", 5u64)?;

        if db_max_connections == 0 {
            bail!("DB_MAX_CONNECTIONS deve ser maior que zero");
        }
        if db_connect_retries == 0 {
            bail!("DB_CONNECT_RETRIES deve ser maior que zero");
        }

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let admin_emails = lookup("ADMIN_EMAILS")
            .unwrap_or_default()
            .split(',')
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty())
            .collect();

        Ok(Self {
            database_url,
            jwt_secret,
            port,
            db_max_connections,
            db_connect_retries,
            db_connect_retry_delay: Duration::from_secs(retry_delay_secs),
            cors_origins,
            admin_emails,
        })
    }
}

fn required<F>(lookup: &F, key: &str) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!("{} deve ser definida", key),
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("valor inválido para {}: '{}'", key, raw)),
        _ => Ok(default),
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub inventory_service: InventoryService,
    pub crm_service: CrmService,
    pub operations_service: OperationsService,
    pub dashboard_service: DashboardService,
    pub sheet_service: SheetService,
    pub settings_repo: SettingsRepository,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db_pool = connect_with_retry(config).await?;
        Self::with_pool(db_pool, config)
    }

    // Monta o gráfico de dependências sobre um pool já criado
    pub fn with_pool(db_pool: PgPool, config: &Config) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::load()?);

        let settings_repo = SettingsRepository::new();
        let inventory_repo = InventoryRepository::new();
        let crm_repo = CrmRepository::new();

        let auth_service = AuthService::new(
            UserRepository::new(),
            config.jwt_secret.clone(),
            config.admin_emails.clone(),
            db_pool.clone(),
        );
        let inventory_service = InventoryService::new(inventory_repo.clone(), settings_repo.clone());
        let crm_service = CrmService::new(crm_repo.clone());
        let operations_service = OperationsService::new(OperationsRepository::new(), inventory_repo, crm_repo);
        let dashboard_service = DashboardService::new(DashboardRepository::new(), settings_repo.clone());
        let sheet_service = SheetService::new(SheetRepository::new());

        Ok(Self {
            db_pool,
            i18n_store,
            auth_service,
            inventory_service,
            crm_service,
            operations_service,
            dashboard_service,
            sheet_service,
            settings_repo,
        })
    }
}

// Tenta conectar algumas vezes antes de desistir (o banco pode subir depois da API)
async fn connect_with_retry(config: &Config) -> anyhow::Result<PgPool> {
    let options = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(3));

    let mut attempt = 1;
    loop {
        match options.clone().connect(&config.database_url).await {
            Ok(pool) => {
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
                return Ok(pool);
            }
            Err(e) if attempt < config.db_connect_retries => {
                tracing::warn!(
                    "Falha ao conectar ao banco (tentativa {}/{}): {}. Nova tentativa em {:?}",
                    attempt,
                    config.db_connect_retries,
                    e,
                    config.db_connect_retry_delay
                );
                tokio::time::sleep(config.db_connect_retry_delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("não foi possível conectar ao banco após {} tentativas", attempt)
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn applies_defaults() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/db"), ("JWT_SECRET", "s")]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.db_connect_retries, 5);
        assert_eq!(config.db_connect_retry_delay, Duration::from_secs(5));
        assert_eq!(config.cors_origins, vec!["http://localhost:3000", "http://localhost:5173"]);
        assert!(config.admin_emails.is_empty());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("JWT_SECRET", "s"),
            ("PORT", "8080"),
            ("DB_CONNECT_RETRIES", "2"),
            ("CORS_ORIGINS", "https://admin.loja.com, ,https://loja.com"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_connect_retries, 2);
        assert_eq!(config.cors_origins, vec!["https://admin.loja.com", "https://loja.com"]);
    }

    #[test]
    fn admin_emails_are_normalised() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("JWT_SECRET", "s"),
            ("ADMIN_EMAILS", " Dono@Loja.com,, gerente@loja.com "),
        ])
        .unwrap();
        assert_eq!(config.admin_emails, vec!["dono@loja.com", "gerente@loja.com"]);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = config_from(&[("DATABASE_URL", "postgres://localhost/db")]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn invalid_numbers_are_errors() {
        let err = config_from(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("JWT_SECRET", "s"),
            ("PORT", "porta"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("PORT"));

        assert!(config_from(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("JWT_SECRET", "s"),
            ("DB_MAX_CONNECTIONS", "0"),
        ])
        .is_err());
    }
}
