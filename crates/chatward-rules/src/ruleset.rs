//! Rules grouped by category

use crate::error::LoadError;
use crate::rule::Rule;
use chatward_core::Category;
use std::collections::HashMap;

/// Ordered rule lists keyed by category
///
/// Each category is inserted at most once; a missing category behaves as an
/// empty list.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: HashMap<Category, Vec<Rule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the rules of one category
    pub fn insert(&mut self, category: Category, rules: Vec<Rule>) -> Result<(), LoadError> {
        if self.rules.contains_key(&category) {
            return Err(LoadError::DuplicateCategory {
                file: category.file_name().to_string(),
            });
        }

        self.rules.insert(category, rules);
        Ok(())
    }

    /// Rules of a category in file order
    pub fn get(&self, category: Category) -> &[Rule] {
        self.rules.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, category: Category) -> bool {
        self.rules.contains_key(&category)
    }

    /// Loaded categories in load order with their rule counts
    pub fn counts(&self) -> Vec<(Category, usize)> {
        Category::ALL
            .iter()
            .filter_map(|category| self.rules.get(category).map(|rules| (*category, rules.len())))
            .collect()
    }

    /// Total number of rules
    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleBuilder;

    #[test]
    fn test_duplicate_category() {
        let mut set = RuleSet::new();
        set.insert(Category::Chat, vec![RuleBuilder::new("a").build()]).unwrap();

        let err = set.insert(Category::Chat, Vec::new()).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateCategory { ref file } if file == "chat.txt"));
        assert_eq!(set.get(Category::Chat).len(), 1);
    }

    #[test]
    fn test_missing_category_is_empty() {
        let set = RuleSet::new();
        assert!(set.get(Category::Sign).is_empty());
        assert!(!set.contains(Category::Sign));
        assert!(set.is_empty());
    }

    #[test]
    fn test_counts_follow_load_order() {
        let mut set = RuleSet::new();
        set.insert(Category::Packet, vec![RuleBuilder::packet("p").build()]).unwrap();
        set.insert(Category::Global, vec![RuleBuilder::new("a").build(), RuleBuilder::new("b").build()])
            .unwrap();

        assert_eq!(set.counts(), vec![(Category::Global, 2), (Category::Packet, 1)]);
        assert_eq!(set.len(), 3);
    }
}
