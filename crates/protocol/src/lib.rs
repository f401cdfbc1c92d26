use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod context;
mod records;

pub use context::{AnalysisContext, BudgetTruncation, ContextBudget};
pub use records::{
    GenericRow, Headline, HoldingRow, KeyValue, MoverBoard, MoverRecord, ParseIssue, PeerRow,
    PeriodValue, Record, RecordKind, StatementKind, StatementRow, TextBlock,
};

pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Topic/intent tag shared by records, chunks and queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    TopGainers,
    LargeCap,
    Announcement,
    Result,
    Shareholding,
    ProfitLoss,
    General,
}

impl Category {
    pub const ALL: [Self; 7] = [
        Self::TopGainers,
        Self::LargeCap,
        Self::Announcement,
        Self::Result,
        Self::Shareholding,
        Self::ProfitLoss,
        Self::General,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TopGainers => "top_gainers",
            Self::LargeCap => "large_cap",
            Self::Announcement => "announcement",
            Self::Result => "result",
            Self::Shareholding => "shareholding",
            Self::ProfitLoss => "profit_loss",
            Self::General => "general",
        }
    }

    /// Human readable name used in "not available" messages.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::TopGainers => "top gainers",
            Self::LargeCap => "large-cap stocks",
            Self::Announcement => "announcements",
            Self::Result => "results",
            Self::Shareholding => "shareholding",
            Self::ProfitLoss => "profit & loss",
            Self::General => "market data",
        }
    }

    /// Every category maps to exactly one analysis template.
    #[must_use]
    pub const fn template(self) -> TemplateId {
        match self {
            Self::TopGainers => TemplateId::TopGainers,
            Self::LargeCap => TemplateId::LargeCap,
            Self::Announcement => TemplateId::Announcements,
            Self::Result => TemplateId::Results,
            Self::Shareholding => TemplateId::Shareholding,
            Self::ProfitLoss => TemplateId::ProfitLoss,
            Self::General => TemplateId::General,
        }
    }

    /// Categories answered only from structured records. When no record of such a category
    /// exists the answer is "not available" rather than free-text retrieval.
    #[must_use]
    pub const fn requires_records(self) -> bool {
        matches!(
            self,
            Self::TopGainers | Self::LargeCap | Self::Shareholding | Self::ProfitLoss
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| format!("unknown category '{raw}'"))
    }
}

/// Identifier of an analysis prompt template. The template text itself is an external asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateId {
    TopGainers,
    LargeCap,
    Announcements,
    Results,
    Shareholding,
    ProfitLoss,
    General,
}

impl TemplateId {
    pub const ALL: [Self; 7] = [
        Self::TopGainers,
        Self::LargeCap,
        Self::Announcements,
        Self::Results,
        Self::Shareholding,
        Self::ProfitLoss,
        Self::General,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TopGainers => "top_gainers",
            Self::LargeCap => "large_cap",
            Self::Announcements => "announcements",
            Self::Results => "results",
            Self::Shareholding => "shareholding",
            Self::ProfitLoss => "profit_loss",
            Self::General => "general",
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user query. The category is assigned by the classifier, never by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub category: Option<Category>,
}

impl Query {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: None,
        }
    }
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}
