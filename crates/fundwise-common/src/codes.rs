//! Field-code normalisation.
//!
//! Reference artifacts spell the same field several ways: `"4601"`, `4601`,
//! `" 4601 "` and, in the similarity artifacts, `"field-4601"`. Everything
//! is reduced to the trimmed bare code before comparison.

const FIELD_ID_PREFIX: &str = "field-";

/// Trim a raw field code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_string()
}

/// `"field-3001"` → `"3001"`. Bare codes pass through trimmed.
pub fn field_id_to_code(field_id: &str) -> String {
    let trimmed = field_id.trim();
    trimmed
        .strip_prefix(FIELD_ID_PREFIX)
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// `"3001"` → `"field-3001"`.
pub fn code_to_field_id(code: &str) -> String {
    format!("{FIELD_ID_PREFIX}{}", normalize_code(code))
}

/// Parent category derived from the code itself: its first two digits.
/// Used when the taxonomy has no record for a field.
pub fn parent_category_from_code(code: &str) -> String {
    code.chars().filter(|c| c.is_ascii_digit()).take(2).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_id_round_trip() {
        assert_eq!(field_id_to_code("field-3001"), "3001");
        assert_eq!(field_id_to_code(" 3001 "), "3001");
        assert_eq!(code_to_field_id(" 3001"), "field-3001");
    }

    #[test]
    fn test_parent_category_ignores_non_digits() {
        assert_eq!(parent_category_from_code("4601"), "46");
        assert_eq!(parent_category_from_code("FOR-4601"), "46");
        assert_eq!(parent_category_from_code("7"), "7");
        assert_eq!(parent_category_from_code(""), "");
    }
}
