// src/models/sheet.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::sheet::{CellSnapshot, Sheet, COLS, ROWS};

const MAX_RAW_LEN: usize = 1000;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SheetSnapshot {
    #[schema(example = "daily")]
    pub name: String,
    /// Células não vazias: `{"A1": {"raw": "=B1*2", "value": 84}}`.
    /// `value` é número, texto, booleano, null ou um código de erro (`#DIV/0!`).
    #[schema(value_type = Object)]
    pub cells: BTreeMap<String, CellSnapshot>,
    pub can_undo: bool,
    pub can_redo: bool,
}

impl SheetSnapshot {
    pub fn of(name: &str, sheet: &Sheet) -> Self {
        Self {
            name: name.to_string(),
            cells: sheet.snapshot(),
            can_undo: sheet.can_undo(),
            can_redo: sheet.can_redo(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetCellPayload {
    /// Entrada bruta; começa com `=` para fórmulas. Vazio limpa a célula.
    #[validate(length(max = 1000, message = "validation.too_long"))]
    #[schema(example = "=SUM(A1:A10)")]
    pub raw: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PastePayload {
    /// Canto superior esquerdo do bloco
    #[schema(example = "B2")]
    pub anchor: String,

    /// Linhas do bloco, cada uma com as entradas brutas das colunas
    #[validate(custom(function = "validate_block"))]
    #[schema(example = json!([["10", "=B2*2"], ["5", "=B3*2"]]))]
    pub rows: Vec<Vec<String>>,
}

// Bloco maior que a grade ou com entradas longas demais
fn validate_block(rows: &Vec<Vec<String>>) -> Result<(), ValidationError> {
    let fits = rows.len() <= ROWS as usize
        && rows.iter().all(|row| {
            row.len() <= COLS as usize && row.iter().all(|raw| raw.chars().count() <= MAX_RAW_LEN)
        });
    if fits {
        Ok(())
    } else {
        let mut err = ValidationError::new("paste_too_large");
        err.message = Some("validation.paste_too_large".into());
        Err(err)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// `true` exporta os valores calculados; o padrão são as entradas brutas
    #[serde(default)]
    pub values: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(rows: Vec<Vec<String>>) -> PastePayload {
        PastePayload { anchor: "A1".into(), rows }
    }

    #[test]
    fn paste_blocks_must_fit_the_grid() {
        assert!(payload(vec![vec!["1".into(); 26]; 100]).validate().is_ok());
        assert!(payload(vec![vec!["1".into(); 27]]).validate().is_err());
        assert!(payload(vec![vec![]; 101]).validate().is_err());
        assert!(payload(vec![vec!["x".repeat(1001)]]).validate().is_err());
    }

    #[test]
    fn export_defaults_to_raw_input() {
        let query: ExportQuery = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(!query.values);
    }
}
