// src/common/error.rs

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::{
    common::i18n::I18nStore,
    middleware::i18n::Locale,
    models::operations::OrderStatus,
    sheet::SheetError,
};

// Erros da aplicação. Cada variante vira uma chave de mensagem traduzida.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Conta inativa")]
    AccountInactive,

    #[error("Perfil '{0}' exigido")]
    RoleRequired(&'static str),

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Produto não encontrado")]
    ProductNotFound,

    #[error("Categoria não encontrada")]
    CategoryNotFound,

    #[error("Cliente não encontrado")]
    CustomerNotFound,

    #[error("Pedido não encontrado")]
    OrderNotFound,

    #[error("Categoria '{0}' já existe")]
    CategoryAlreadyExists(String),

    #[error("Estoque insuficiente para {product} (disponível: {available})")]
    InsufficientStock { product: String, available: i32 },

    #[error("Transição de status inválida: {from} -> {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("Pedido sem itens")]
    EmptyOrder,

    #[error("Célula inválida: {0}")]
    InvalidCell(String),

    #[error("Nome de planilha inválido: {0}")]
    InvalidSheetName(String),

    #[error("Bloco colado em {0} passa da borda da grade")]
    PasteOutOfBounds(String),

    #[error("Nada para desfazer")]
    NothingToUndo,

    #[error("Nada para refazer")]
    NothingToRedo,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl From<SheetError> for AppError {
    fn from(err: SheetError) -> Self {
        match err {
            SheetError::InvalidCell(cell) => AppError::InvalidCell(cell),
            SheetError::NothingToUndo => AppError::NothingToUndo,
            SheetError::NothingToRedo => AppError::NothingToRedo,
            SheetError::PasteOutOfBounds { anchor } => AppError::PasteOutOfBounds(anchor),
        }
    }
}

// Erro já traduzido, pronto para virar resposta HTTP
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self { status, error: error.into(), details: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::EmptyOrder
            | AppError::InvalidCell(_)
            | AppError::InvalidSheetName(_)
            | AppError::PasteOutOfBounds(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials
            | AppError::InvalidToken
            | AppError::AccountInactive => StatusCode::UNAUTHORIZED,
            AppError::RoleRequired(_) => StatusCode::FORBIDDEN,
            AppError::UserNotFound
            | AppError::ProductNotFound
            | AppError::CategoryNotFound
            | AppError::CustomerNotFound
            | AppError::OrderNotFound => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists
            | AppError::CategoryAlreadyExists(_)
            | AppError::InsufficientStock { .. }
            | AppError::InvalidStatusTransition { .. }
            | AppError::NothingToUndo
            | AppError::NothingToRedo => StatusCode::CONFLICT,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Traduz o erro para o idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status_code();
        let lang = locale.as_str();

        let (key, args): (&str, Vec<(&str, String)>) = match &self {
            AppError::ValidationError(errors) => {
                let mut details = BTreeMap::new();
                collect_field_errors(errors, "", lang, i18n, &mut details);
                return ApiError {
                    status,
                    error: i18n.translate(lang, "errors.validation"),
                    details: Some(json!(details)),
                };
            }
            AppError::EmailAlreadyExists => ("errors.email_taken", vec![]),
            AppError::InvalidCredentials => ("errors.invalid_credentials", vec![]),
            AppError::InvalidToken => ("errors.invalid_token", vec![]),
            AppError::AccountInactive => ("errors.account_inactive", vec![]),
            AppError::RoleRequired(role) => ("errors.role_required", vec![("role", role.to_string())]),
            AppError::UserNotFound => ("errors.user_not_found", vec![]),
            AppError::ProductNotFound => ("errors.product_not_found", vec![]),
            AppError::CategoryNotFound => ("errors.category_not_found", vec![]),
            AppError::CustomerNotFound => ("errors.customer_not_found", vec![]),
            AppError::OrderNotFound => ("errors.order_not_found", vec![]),
            AppError::CategoryAlreadyExists(slug) => {
                ("errors.category_exists", vec![("slug", slug.clone())])
            }
            AppError::InsufficientStock { product, available } => (
                "errors.insufficient_stock",
                vec![("product", product.clone()), ("available", available.to_string())],
            ),
            AppError::InvalidStatusTransition { from, to } => (
                "errors.invalid_status_transition",
                vec![("from", from.to_string()), ("to", to.to_string())],
            ),
            AppError::EmptyOrder => ("errors.empty_order", vec![]),
            AppError::InvalidCell(cell) => ("errors.invalid_cell", vec![("cell", cell.clone())]),
            AppError::InvalidSheetName(_) => ("errors.invalid_sheet_name", vec![]),
            AppError::PasteOutOfBounds(anchor) => {
                ("errors.paste_out_of_bounds", vec![("anchor", anchor.clone())])
            }
            AppError::NothingToUndo => ("errors.nothing_to_undo", vec![]),
            AppError::NothingToRedo => ("errors.nothing_to_redo", vec![]),
            e => {
                // Detalhes internos só vão para o log
                tracing::error!("Erro Interno do Servidor: {}", e);
                ("errors.internal", vec![])
            }
        };

        ApiError::new(status, i18n.translate_with(lang, key, &args))
    }
}

// Achata erros aninhados (ex: "items[0].quantity") traduzindo as mensagens,
// que nos payloads são chaves do catálogo.
fn collect_field_errors(
    errors: &ValidationErrors,
    prefix: &str,
    lang: &str,
    i18n: &I18nStore,
    out: &mut BTreeMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors
                    .iter()
                    .map(|e| match &e.message {
                        Some(key) => i18n.translate(lang, key),
                        None => e.code.to_string(),
                    })
                    .collect();
                out.insert(path, messages);
            }
            ValidationErrorsKind::Struct(inner) => {
                collect_field_errors(inner, &path, lang, i18n, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_field_errors(inner, &format!("{}[{}]", path, index), lang, i18n, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationError;

    fn store() -> I18nStore {
        I18nStore::load().unwrap()
    }

    #[test]
    fn maps_domain_errors_to_status_codes() {
        assert_eq!(AppError::OrderNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::RoleRequired("admin").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::InsufficientStock { product: "x".into(), available: 0 }.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let api = AppError::InternalServerError(anyhow::anyhow!("senha do banco: 123"))
            .to_api_error(&Locale::default(), &store());
        assert_eq!(api.error, "An unexpected error occurred.");
        assert!(api.details.is_none());
    }

    #[test]
    fn validation_errors_are_translated_per_field() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("email");
        err.message = Some("validation.email".into());
        errors.add("email", err);

        let api = AppError::ValidationError(errors).to_api_error(&Locale("pt".into()), &store());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.error, "Um ou mais campos são inválidos.");
        assert_eq!(
            api.details.unwrap()["email"][0],
            "O e-mail fornecido é inválido."
        );
    }

    #[test]
    fn sheet_errors_convert() {
        let err: AppError = SheetError::InvalidCell("AA1".into()).into();
        let api = err.to_api_error(&Locale::default(), &store());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.error, "'AA1' is not a valid cell (A1 to Z100).");

        let err: AppError = SheetError::PasteOutOfBounds { anchor: "Z100".into() }.into();
        let api = err.to_api_error(&Locale::default(), &store());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert!(api.error.contains("Z100"));
    }
}
