use crate::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A normalized entity extracted from one section of a source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Source identifier (URL or symbol) of the document the record came from
    pub source: String,

    /// Numeric ranking key for rankable records (percent change, latest holding, ...)
    pub sort_key: Option<f64>,

    /// Typed payload
    pub kind: RecordKind,
}

impl Record {
    #[must_use]
    pub fn new(source: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            source: source.into(),
            sort_key: None,
            kind,
        }
    }

    #[must_use]
    pub const fn with_sort_key(mut self, sort_key: Option<f64>) -> Self {
        self.sort_key = sort_key;
        self
    }

    #[must_use]
    pub fn category(&self) -> Option<Category> {
        self.kind.category()
    }

    /// Single-line rendering used for context assembly and chunking.
    #[must_use]
    pub fn render(&self) -> String {
        self.kind.to_string()
    }
}

/// One variant per record shape; the category is derived from the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordKind {
    Mover(MoverRecord),
    Statement(StatementRow),
    Holding(HoldingRow),
    Headline(Headline),
    KeyValue(KeyValue),
    Peer(PeerRow),
    Text(TextBlock),
    Generic(GenericRow),
}

impl RecordKind {
    #[must_use]
    pub fn category(&self) -> Option<Category> {
        match self {
            Self::Mover(mover) => Some(mover.board.category()),
            Self::Statement(row) => row.statement.category(),
            Self::Holding(_) => Some(Category::Shareholding),
            Self::Headline(_) => Some(Category::Announcement),
            Self::KeyValue(_) | Self::Peer(_) | Self::Text(_) | Self::Generic(_) => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mover(mover) => {
                write!(f, "{}: {} ({:+.2}%)", mover.company, mover.price, mover.change_percent)?;
                if !mover.change.is_empty() {
                    write!(f, ", change {}", mover.change)?;
                }
                if let Some(sector) = &mover.sector {
                    write!(f, ", sector {sector}")?;
                }
                if let Some(market_cap) = &mover.market_cap {
                    write!(f, ", market cap {market_cap}")?;
                }
                Ok(())
            }
            Self::Statement(row) => {
                write!(f, "[{}] {} - ", row.statement.label(), row.metric)?;
                write_period_values(f, &row.values)
            }
            Self::Holding(row) => {
                write!(f, "[Shareholding] {} - ", row.holder)?;
                write_period_values(f, &row.values)
            }
            Self::Headline(headline) => match &headline.link {
                Some(link) => write!(f, "{} ({link})", headline.title),
                None => f.write_str(&headline.title),
            },
            Self::KeyValue(kv) => write!(f, "{}: {}", kv.name, kv.value),
            Self::Peer(row) => {
                f.write_str("[Peer] ")?;
                for (idx, (header, value)) in row.fields.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{header}: {value}")?;
                }
                Ok(())
            }
            Self::Text(block) => write!(f, "=== {} ===\n{}", block.label, block.text),
            Self::Generic(row) => {
                for (idx, (column, value)) in row.cells.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{column}: {value}")?;
                }
                Ok(())
            }
        }
    }
}

fn write_period_values(f: &mut fmt::Formatter<'_>, values: &[PeriodValue]) -> fmt::Result {
    for (idx, pv) in values.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}: {}", pv.period, pv.value)?;
    }
    Ok(())
}

/// Which market-movers board a row was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoverBoard {
    Gainers,
    LargeCap,
}

impl MoverBoard {
    #[must_use]
    pub const fn category(self) -> Category {
        match self {
            Self::Gainers => Category::TopGainers,
            Self::LargeCap => Category::LargeCap,
        }
    }
}

/// A row of a market-movers table. Both known board layouts converge on these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoverRecord {
    pub board: MoverBoard,
    pub company: String,
    pub sector: Option<String>,
    pub price: String,
    pub change: String,
    pub change_percent: f64,
    pub market_cap: Option<String>,
}

/// Financial statement tables keyed by their section on a screener page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Quarterly,
    ProfitLoss,
    BalanceSheet,
    CashFlow,
    Ratios,
}

impl StatementKind {
    #[must_use]
    pub const fn category(self) -> Option<Category> {
        match self {
            Self::Quarterly => Some(Category::Result),
            Self::ProfitLoss => Some(Category::ProfitLoss),
            Self::BalanceSheet | Self::CashFlow | Self::Ratios => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Quarterly => "Quarterly Results",
            Self::ProfitLoss => "Profit & Loss",
            Self::BalanceSheet => "Balance Sheet",
            Self::CashFlow => "Cash Flow",
            Self::Ratios => "Ratios",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodValue {
    pub period: String,
    pub value: String,
}

impl PeriodValue {
    #[must_use]
    pub fn new(period: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            period: period.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRow {
    pub statement: StatementKind,
    pub metric: String,
    pub values: Vec<PeriodValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingRow {
    pub holder: String,
    pub values: Vec<PeriodValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRow {
    pub fields: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub label: String,
    pub text: String,
}

/// Fallback for tables whose column layout was not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericRow {
    pub cells: BTreeMap<usize, String>,
}

/// A malformed field that was normalized to a safe default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseIssue {
    pub source: String,
    pub field: String,
    pub raw: String,
    pub reason: String,
}
