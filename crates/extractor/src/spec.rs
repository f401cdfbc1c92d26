use marketlens_protocol::StatementKind;
use serde::{Deserialize, Serialize};

/// How a section is located and what it is interpreted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "statement", rename_all = "snake_case")]
pub enum SectionKind {
    /// Table inside the container, read as a financial statement
    Statement(StatementKind),
    /// Table inside the container, read as a shareholding pattern
    Shareholding,
    /// Table inside the container, read as a peer comparison
    Peers,
    /// Last table inside the container, read with a detected market-movers layout
    Movers,
    /// `li` items carrying `span.name` / `span.value` pairs
    Ratios,
    /// Collapsed text of the container
    Text,
    /// Visible page text split into blocks and sanitized
    PageText,
    /// Text of each `li` in the container
    Bullets,
    /// Every matching anchor
    Headlines,
}

impl SectionKind {
    #[must_use]
    pub const fn is_table(self) -> bool {
        matches!(
            self,
            Self::Statement(_) | Self::Shareholding | Self::Peers | Self::Movers
        )
    }
}

/// A `(label, selector)` pair. The selector is a comma-separated priority list: the first
/// alternative that matches anything wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpec {
    pub label: String,
    pub selector: String,
    pub kind: SectionKind,
}

impl SectionSpec {
    #[must_use]
    pub fn new(label: impl Into<String>, selector: impl Into<String>, kind: SectionKind) -> Self {
        Self {
            label: label.into(),
            selector: selector.into(),
            kind,
        }
    }

    /// Sections of a screener.in company page.
    #[must_use]
    pub fn screener_company() -> Vec<Self> {
        vec![
            Self::new("Company Name", "h1", SectionKind::Text),
            Self::new(
                "About Company",
                "div.company-profile div.about, div.company-profile .about",
                SectionKind::Text,
            ),
            Self::new(
                "Key Business Highlights",
                "div.company-profile div.commentary",
                SectionKind::Text,
            ),
            Self::new("Pros", "section#analysis div.pros, div.pros", SectionKind::Bullets),
            Self::new("Cons", "section#analysis div.cons, div.cons", SectionKind::Bullets),
            Self::new("Company Ratios", "ul#top-ratios", SectionKind::Ratios),
            Self::new(
                "Quarterly Results",
                "section#quarters",
                SectionKind::Statement(StatementKind::Quarterly),
            ),
            Self::new("Peer Comparison", "section#peers", SectionKind::Peers),
            Self::new(
                "Profit & Loss",
                "section#profit-loss",
                SectionKind::Statement(StatementKind::ProfitLoss),
            ),
            Self::new(
                "Balance Sheet",
                "section#balance-sheet",
                SectionKind::Statement(StatementKind::BalanceSheet),
            ),
            Self::new(
                "Cash Flow",
                "section#cash-flow",
                SectionKind::Statement(StatementKind::CashFlow),
            ),
            Self::new(
                "Ratios",
                "section#ratios",
                SectionKind::Statement(StatementKind::Ratios),
            ),
            Self::new(
                "Shareholding Pattern",
                "section#shareholding",
                SectionKind::Shareholding,
            ),
        ]
    }

    /// Headlines plus the main text of a market-news page.
    #[must_use]
    pub fn news_page() -> Vec<Self> {
        vec![
            Self::new("Headlines", "article h2 a, h2 a, h3 a", SectionKind::Headlines),
            Self::new("Page Text", "article, main, body", SectionKind::PageText),
        ]
    }

    /// The movers table of a gainers / large-cap listing page.
    #[must_use]
    pub fn market_movers() -> Vec<Self> {
        vec![Self::new("Market Movers", "body", SectionKind::Movers)]
    }
}
