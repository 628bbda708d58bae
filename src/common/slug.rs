// src/common/slug.rs

/// Deriva o slug de uma categoria a partir do nome: letras e dígitos ASCII em
/// minúsculas, qualquer outra sequência vira um único `-`.
/// Retorna string vazia quando o nome não tem nenhum caractere aproveitável.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn collapses_separators() {
        assert_eq!(slugify("Power Tools"), "power-tools");
        assert_eq!(slugify("  Nuts & Bolts!! "), "nuts-bolts");
        assert_eq!(slugify("USB-C / Cables"), "usb-c-cables");
    }

    #[test]
    fn drops_non_ascii() {
        assert_eq!(slugify("Ferramentas Elétricas"), "ferramentas-el-tricas");
        assert_eq!(slugify("---"), "");
    }
}
