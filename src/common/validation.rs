// src/common/validation.rs

use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors};

// Limites das colunas: preços são NUMERIC(12,2), total do pedido NUMERIC(14,2)
pub const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2); // 9_999_999_999.99
pub const MAX_ORDER_TOTAL: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2); // 999_999_999_999.99
pub const PRICE_SCALE: u32 = 2;

/// Maior quantidade aceita numa única operação (criação, entrada, item de pedido).
pub const MAX_QUANTITY: i32 = 1_000_000;

/// Preço entre 0 e o máximo da coluna, com no máximo 2 casas decimais.
pub fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(price_error("validation.not_negative"));
    }
    if *price > MAX_PRICE {
        return Err(price_error("validation.price_too_large"));
    }
    if price.normalize().scale() > PRICE_SCALE {
        return Err(price_error("validation.price_scale"));
    }
    Ok(())
}

/// Quantidade de uma entrada ou item de pedido: de 1 a `MAX_QUANTITY`.
pub fn validate_quantity(quantity: i32) -> Result<(), ValidationError> {
    if (1..=MAX_QUANTITY).contains(&quantity) {
        return Ok(());
    }
    let mut err = ValidationError::new("range");
    err.message = Some("validation.quantity_range".into());
    Err(err)
}

/// Estoque inicial de um produto: zero é permitido.
pub fn validate_initial_stock(quantity: i32) -> Result<(), ValidationError> {
    match quantity {
        q if q < 0 => {
            let mut err = ValidationError::new("range");
            err.message = Some("validation.not_negative".into());
            Err(err)
        }
        0 => Ok(()),
        _ => validate_quantity(quantity),
    }
}

fn price_error(message: &'static str) -> ValidationError {
    let mut err = ValidationError::new("price");
    err.message = Some(message.into());
    err
}

/// Erro de validação de um único campo, para regras checadas fora do payload.
pub fn field_error(field: &'static str, code: &'static str, message: &'static str) -> ValidationErrors {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    let mut errors = ValidationErrors::new();
    errors.add(field, err);
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn limits_match_the_columns() {
        assert_eq!(MAX_PRICE, dec("9999999999.99"));
        assert_eq!(MAX_ORDER_TOTAL, dec("999999999999.99"));
    }

    #[test]
    fn accepts_prices_that_fit_numeric_12_2() {
        for ok in ["0", "0.00", "129.9", "9999999999.99", "10.500"] {
            assert!(validate_price(&dec(ok)).is_ok(), "{} deveria passar", ok);
        }
    }

    #[test]
    fn rejects_negative_huge_or_too_precise_prices() {
        let cases = [
            ("-0.01", "validation.not_negative"),
            ("10000000000", "validation.price_too_large"),
            ("79000000000000000000000000000", "validation.price_too_large"),
            ("1.999", "validation.price_scale"),
        ];
        for (raw, message) in cases {
            let err = validate_price(&dec(raw)).unwrap_err();
            assert_eq!(err.message.as_deref(), Some(message), "{}", raw);
        }
    }

    #[test]
    fn quantities_are_bounded() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(MAX_QUANTITY + 1).is_err());
        assert!(validate_quantity(i32::MAX).is_err());

        assert!(validate_initial_stock(0).is_ok());
        assert!(validate_initial_stock(-1).is_err());
        assert!(validate_initial_stock(MAX_QUANTITY + 1).is_err());
    }
}
