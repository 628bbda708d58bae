// src/models/settings.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// Mesmo limite que o painel usava fixo no código
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;
pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    #[schema(ignore)]
    #[serde(skip)]
    pub owner_id: Uuid,

    #[schema(example = "Loja do Centro")]
    pub store_name: Option<String>,

    pub store_description: Option<String>,

    #[schema(example = "BRL")]
    pub currency: String,

    #[schema(example = 10)]
    pub low_stock_threshold: i32,

    pub notify_low_stock: bool,
    pub notify_new_order: bool,

    pub updated_at: Option<DateTime<Utc>>,
}

impl StoreSettings {
    // Valores usados enquanto o dono não salvou nada
    pub fn defaults(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            store_name: None,
            store_description: None,
            currency: DEFAULT_CURRENCY.to_string(),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            notify_low_stock: true,
            notify_new_order: true,
            updated_at: None,
        }
    }
}

fn validate_currency(code: &str) -> Result<(), ValidationError> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        return Ok(());
    }
    let mut err = ValidationError::new("currency");
    err.message = Some("validation.currency".into());
    Err(err)
}

// Campos ausentes mantêm o valor salvo
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[validate(length(max = 100, message = "validation.too_long"))]
    #[schema(example = "Minha Nova Loja")]
    pub store_name: Option<String>,

    #[validate(length(max = 500, message = "validation.too_long"))]
    pub store_description: Option<String>,

    #[validate(custom(function = "validate_currency"))]
    #[schema(example = "EUR")]
    pub currency: Option<String>,

    #[validate(range(min = 0, message = "validation.not_negative"))]
    #[schema(example = 5)]
    pub low_stock_threshold: Option<i32>,

    pub notify_low_stock: Option<bool>,
    pub notify_new_order: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_currency_and_negative_threshold() {
        let payload = UpdateSettingsRequest {
            store_name: None,
            store_description: None,
            currency: Some("euro".into()),
            low_stock_threshold: Some(-1),
            notify_low_stock: None,
            notify_new_order: None,
        };
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("currency"));
        assert!(fields.contains_key("low_stock_threshold"));
    }

    #[test]
    fn defaults_match_the_dashboard_threshold() {
        let settings = StoreSettings::defaults(Uuid::nil());
        assert_eq!(settings.low_stock_threshold, 10);
        assert_eq!(settings.currency, "USD");
    }
}
