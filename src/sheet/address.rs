// src/sheet/address.rs

use std::fmt;

pub const ROWS: u32 = 100;
pub const COLS: u32 = 26;

/// Endereço de uma célula dentro da grade. `col` começa em 0 (A), `row` em 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId {
    pub col: u32,
    pub row: u32,
}

impl CellId {
    pub fn new(col: u32, row: u32) -> Option<Self> {
        (col < COLS && (1..=ROWS).contains(&row)).then_some(CellId { col, row })
    }

    /// Lê "A1", "z100" etc. Retorna `None` se o texto não for um endereço ou
    /// se apontar para fora da grade.
    pub fn parse(input: &str) -> Option<Self> {
        let (col, row) = split_reference(input.trim())?;
        CellId::new(col, row)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.col), self.row)
    }
}

/// Separa letras e dígitos de uma referência, sem checar os limites da grade.
/// Colunas com várias letras seguem a numeração de planilhas (AA = 26).
pub(crate) fn split_reference(input: &str) -> Option<(u32, u32)> {
    let digits_at = input.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = input.split_at(digits_at);

    if letters.is_empty()
        || !letters.chars().all(|c| c.is_ascii_alphabetic())
        || !digits.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        let value = (c.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        col = col.checked_mul(26)?.checked_add(value)?;
    }
    let row: u32 = digits.parse().ok()?;

    Some((col - 1, row))
}

fn column_name(mut col: u32) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalises_ids() {
        let id = CellId::parse("b12").unwrap();
        assert_eq!(id, CellId { col: 1, row: 12 });
        assert_eq!(id.to_string(), "B12");
        assert_eq!(CellId::parse(" Z100 ").unwrap().to_string(), "Z100");
    }

    #[test]
    fn rejects_ids_outside_the_grid() {
        assert!(CellId::parse("A0").is_none());
        assert!(CellId::parse("A101").is_none());
        assert!(CellId::parse("AA1").is_none());
        assert!(CellId::parse("1A").is_none());
        assert!(CellId::parse("A1B").is_none());
        assert!(CellId::parse("").is_none());
    }

    #[test]
    fn multi_letter_columns_follow_spreadsheet_numbering() {
        assert_eq!(split_reference("AA1"), Some((26, 1)));
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(25), "Z");
    }
}
