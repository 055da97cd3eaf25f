//! Category defaults and input validation.

use crate::analytics::CategoryKind;

/// Longest accepted category name, in characters.
pub const MAX_CATEGORY_NAME_LEN: usize = 64;

/// Categories seeded for a user on first use.
pub const DEFAULT_CATEGORIES: &[(&str, CategoryKind)] = &[
    ("Salary", CategoryKind::Income),
    ("Freelance", CategoryKind::Income),
    ("Gifts", CategoryKind::Income),
    ("Food", CategoryKind::Expense),
    ("Transport", CategoryKind::Expense),
    ("Shopping", CategoryKind::Expense),
    ("Entertainment", CategoryKind::Expense),
    ("Health", CategoryKind::Expense),
    ("Bills", CategoryKind::Expense),
];

/// Trims a category name and checks its length.
///
/// Returns `None` for blank or overlong names.
#[must_use]
pub fn normalize_category_name(raw: &str) -> Option<String> {
    let name = raw.trim();
    (!name.is_empty() && name.chars().count() <= MAX_CATEGORY_NAME_LEN).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_both_kinds() {
        let income = DEFAULT_CATEGORIES
            .iter()
            .filter(|(_, kind)| *kind == CategoryKind::Income)
            .count();
        assert_eq!(income, 3);
        assert_eq!(DEFAULT_CATEGORIES.len() - income, 6);
    }

    #[test]
    fn test_normalize_category_name() {
        assert_eq!(normalize_category_name("  Coffee "), Some("Coffee".into()));
        assert_eq!(normalize_category_name("   "), None);
        assert_eq!(normalize_category_name(&"x".repeat(65)), None);
    }
}
