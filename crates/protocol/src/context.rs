use crate::{Category, TemplateId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTruncation {
    MaxChars,
}

/// Size accounting for an assembled context.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ContextBudget {
    pub max_chars: usize,
    pub used_chars: usize,
    pub truncated: bool,
    pub dropped_items: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncation: Option<BudgetTruncation>,
}

impl ContextBudget {
    #[must_use]
    pub const fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            used_chars: 0,
            truncated: false,
            dropped_items: 0,
            truncation: None,
        }
    }
}

/// The only artifact handed to the generation service.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AnalysisContext {
    pub category: Category,
    pub template: TemplateId,
    /// False when no data matched; generation must not run on such a context.
    pub available: bool,
    pub text: String,
    pub items: usize,
    pub budget: ContextBudget,
}

impl AnalysisContext {
    /// Explicit "no data" context for a category.
    #[must_use]
    pub fn not_available(category: Category, max_chars: usize) -> Self {
        let text = format!("No {} data available.", category.display_name());
        let mut budget = ContextBudget::new(max_chars);
        budget.used_chars = text.chars().count();
        Self {
            category,
            template: category.template(),
            available: false,
            text,
            items: 0,
            budget,
        }
    }
}
