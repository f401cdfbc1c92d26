use crate::error::{AnalysisError, Result};
use marketlens_protocol::{Category, Query};
use serde::Deserialize;
use std::path::Path;

const BUILTIN_RULES: &str = include_str!("../rules/default.toml");

/// One `(keywords → category)` entry. Matches when any keyword is a substring of the
/// lowercased query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    pub category: Category,
    pub keywords: Vec<String>,
}

impl Rule {
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|kw| lowered.contains(kw.as_str()))
    }
}

/// Ordered rule list; the first matching rule decides.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleTable {
    #[serde(default = "default_fallback")]
    pub fallback: Category,
    #[serde(default, rename = "rule")]
    pub rules: Vec<Rule>,
}

const fn default_fallback() -> Category {
    Category::General
}

impl RuleTable {
    /// The rule table shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_RULES)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut table: Self =
            toml::from_str(raw).map_err(|err| AnalysisError::InvalidRules(err.to_string()))?;
        for (idx, rule) in table.rules.iter_mut().enumerate() {
            rule.keywords = rule
                .keywords
                .iter()
                .map(|kw| kw.trim().to_lowercase())
                .filter(|kw| !kw.is_empty())
                .collect();
            if rule.keywords.is_empty() {
                return Err(AnalysisError::InvalidRules(format!(
                    "rule #{} ({}) has no keywords",
                    idx + 1,
                    rule.category
                )));
            }
        }
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw).map_err(|err| match err {
            AnalysisError::InvalidRules(msg) => {
                AnalysisError::InvalidRules(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }
}

/// Assigns a [`Category`] to free-text queries.
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    table: RuleTable,
}

impl QueryClassifier {
    #[must_use]
    pub const fn new(table: RuleTable) -> Self {
        Self { table }
    }

    pub fn builtin() -> Result<Self> {
        Ok(Self::new(RuleTable::builtin()?))
    }

    #[must_use]
    pub fn classify(&self, text: &str) -> Category {
        let lowered = text.to_lowercase();
        self.table
            .rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map_or(self.table.fallback, |rule| rule.category)
    }

    /// Return the query with its category assigned.
    #[must_use]
    pub fn classify_query(&self, mut query: Query) -> Query {
        query.category = Some(self.classify(&query.text));
        query
    }

    #[must_use]
    pub const fn rules(&self) -> &RuleTable {
        &self.table
    }
}
