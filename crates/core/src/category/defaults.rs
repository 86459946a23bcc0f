//! Embedded default category data.

use serde::Deserialize;

const DEFAULT_CATEGORIES_JSON: &str = include_str!("../../assets/default_categories.json");

/// A top-level category with its child names.
///
/// Children are plain names: the tree is exactly two levels deep, so a child
/// can never have children of its own.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryGroup {
    /// Display name (emoji-prefixed for top-level groups).
    pub name: String,
    /// Child category names.
    #[serde(default)]
    pub children: Vec<String>,
}

/// The full default tree, split by transaction kind.
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultCategoryTree {
    /// Expense groups.
    pub expense: Vec<CategoryGroup>,
    /// Income groups.
    pub income: Vec<CategoryGroup>,
}

impl DefaultCategoryTree {
    /// Number of top-level groups across both kinds.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.expense.len() + self.income.len()
    }
}

/// Parses the embedded default category tree.
///
/// # Errors
///
/// Returns an error if the embedded asset is not valid JSON for the
/// expected shape.
pub fn default_category_tree() -> Result<DefaultCategoryTree, serde_json::Error> {
    serde_json::from_str(DEFAULT_CATEGORIES_JSON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_parses() {
        let tree = default_category_tree().expect("embedded asset must parse");
        assert_eq!(tree.expense.len(), 16);
        assert_eq!(tree.income.len(), 3);
        assert_eq!(tree.group_count(), 19);
    }

    #[test]
    fn test_no_empty_names() {
        let tree = default_category_tree().unwrap();
        for group in tree.expense.iter().chain(tree.income.iter()) {
            assert!(!group.name.trim().is_empty());
            for child in &group.children {
                assert!(!child.trim().is_empty());
            }
        }
    }

    #[test]
    fn test_salary_group_children() {
        let tree = default_category_tree().unwrap();
        let salary = tree
            .income
            .iter()
            .find(|g| g.name.contains("Lương"))
            .expect("salary group present");
        assert_eq!(salary.children.len(), 3);
    }

    #[test]
    fn test_no_duplicate_group_names() {
        let tree = default_category_tree().unwrap();
        let mut names: Vec<&str> = tree
            .expense
            .iter()
            .map(|g| g.name.as_str())
            .chain(tree.income.iter().map(|g| g.name.as_str()))
            .collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
