//! Entity name and category inference for corpus records.
//!
//! This is a heuristic. Callers depend on [`EntityClassifier`] so a better
//! classifier can be swapped in without touching ingestion.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Name and category assigned to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityInfo {
    pub name: String,
    pub category: String,
}

pub trait EntityClassifier: Send + Sync {
    fn classify(&self, opportunity: &str) -> EntityInfo;
}

/// Maps a lowercase keyword to a category label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub keyword: String,
    pub category: String,
}

impl CategoryRule {
    pub fn new(keyword: &str, category: &str) -> Self {
        Self {
            keyword: keyword.to_lowercase(),
            category: category.to_string(),
        }
    }
}

pub fn default_category_rules() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new("food", "FoodTech"),
        CategoryRule::new("route", "Logistics SaaS"),
        CategoryRule::new("skin", "HealthTech"),
    ]
}

/// Takes the leading capitalized word as the name and the first matching
/// keyword rule as the category.
pub struct KeywordClassifier {
    rules: Vec<CategoryRule>,
    fallback_name: String,
    fallback_category: String,
}

fn name_pattern() -> Option<&'static Regex> {
    static NAME_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    NAME_PATTERN
        .get_or_init(|| Regex::new(r"^([A-Z][A-Za-z0-9]+)").ok())
        .as_ref()
}

impl KeywordClassifier {
    /// Rules may come from config in any case; they are matched lowercase.
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|rule| CategoryRule::new(&rule.keyword, &rule.category))
                .collect(),
            fallback_name: "Unknown".to_string(),
            fallback_category: "General".to_string(),
        }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(default_category_rules())
    }
}

impl EntityClassifier for KeywordClassifier {
    fn classify(&self, opportunity: &str) -> EntityInfo {
        let trimmed = opportunity.trim();
        let name = name_pattern()
            .and_then(|pattern| pattern.captures(trimmed))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| self.fallback_name.clone());

        let lowered = trimmed.to_lowercase();
        let category = self
            .rules
            .iter()
            .find(|rule| lowered.contains(&rule.keyword))
            .map(|rule| rule.category.clone())
            .unwrap_or_else(|| self.fallback_category.clone());

        EntityInfo { name, category }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_name_and_category() {
        let classifier = KeywordClassifier::default();
        let info = classifier.classify("Foodly delivers healthy food to offices.");
        assert_eq!(info.name, "Foodly");
        assert_eq!(info.category, "FoodTech");
    }

    #[test]
    fn rules_apply_in_order() {
        let classifier = KeywordClassifier::default();
        let info = classifier.classify("Routify plans food truck routes.");
        assert_eq!(info.category, "FoodTech");
    }

    #[test]
    fn falls_back_when_nothing_matches() {
        let classifier = KeywordClassifier::default();
        let info = classifier.classify("  a tool for accountants");
        assert_eq!(info.name, "Unknown");
        assert_eq!(info.category, "General");
    }

    #[test]
    fn custom_rules_replace_defaults() {
        let classifier = KeywordClassifier::new(vec![CategoryRule::new("Ledger", "FinTech")]);
        let info = classifier.classify("Ledgerly automates ledger reconciliation.");
        assert_eq!(info.category, "FinTech");
    }

    #[test]
    fn configured_rules_match_regardless_of_case() {
        let settings = crate::core::config::RagSettings::from_config(&serde_json::json!({
            "classifier": { "rules": [{ "keyword": "Food", "category": "FoodTech" }] }
        }))
        .unwrap();
        let classifier = KeywordClassifier::new(settings.classifier.rules);
        let info = classifier.classify("Foodly ships food kits.");
        assert_eq!(info.name, "Foodly");
        assert_eq!(info.category, "FoodTech");
    }
}
