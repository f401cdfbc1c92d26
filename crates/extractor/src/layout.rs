use marketlens_protocol::MoverBoard;

/// Column names every recognized movers layout maps onto.
pub const COL_COMPANY: &str = "Company";
pub const COL_SECTOR: &str = "Sector";
pub const COL_PRICE: &str = "Last Price";
pub const COL_CHANGE: &str = "Change";
pub const COL_CHANGE_PERCENT: &str = "Change %";
pub const COL_MARKET_CAP: &str = "Market Cap (Cr.)";

const GAINERS_HEADERS: &[&str] = &[
    COL_COMPANY,
    "High",
    "Low",
    COL_PRICE,
    "Prev Close",
    COL_CHANGE,
    COL_CHANGE_PERCENT,
];

const LARGE_CAP_HEADERS: &[&str] = &[
    COL_COMPANY,
    COL_SECTOR,
    COL_MARKET_CAP,
    COL_PRICE,
    COL_CHANGE_PERCENT,
    COL_CHANGE,
];

/// Known column orderings of market-movers tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoverLayout {
    Gainers,
    LargeCap,
}

impl MoverLayout {
    /// Detect the layout from a discriminating substring of the document identifier.
    #[must_use]
    pub fn detect(source: &str) -> Option<Self> {
        let lowered = source.to_lowercase();
        if lowered.contains("gainer") {
            return Some(Self::Gainers);
        }
        if ["large-cap", "largecap", "large_cap", "large cap", "large%20cap"]
            .iter()
            .any(|needle| lowered.contains(needle))
        {
            return Some(Self::LargeCap);
        }
        None
    }

    #[must_use]
    pub fn headers(self) -> Vec<String> {
        let template = match self {
            Self::Gainers => GAINERS_HEADERS,
            Self::LargeCap => LARGE_CAP_HEADERS,
        };
        template.iter().map(|h| (*h).to_string()).collect()
    }

    #[must_use]
    pub const fn board(self) -> MoverBoard {
        match self {
            Self::Gainers => MoverBoard::Gainers,
            Self::LargeCap => MoverBoard::LargeCap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_layout_from_url() {
        assert_eq!(
            MoverLayout::detect("https://www.moneycontrol.com/stocks/marketstats/nsegainer/index.php"),
            Some(MoverLayout::Gainers)
        );
        assert_eq!(
            MoverLayout::detect("https://example.test/markets/Large-Cap-stocks"),
            Some(MoverLayout::LargeCap)
        );
        assert_eq!(MoverLayout::detect("https://example.test/losers"), None);
    }

    #[test]
    fn both_layouts_share_core_columns() {
        for layout in [MoverLayout::Gainers, MoverLayout::LargeCap] {
            let headers = layout.headers();
            for col in [COL_COMPANY, COL_PRICE, COL_CHANGE, COL_CHANGE_PERCENT] {
                assert!(headers.iter().any(|h| h == col), "{layout:?} lacks {col}");
            }
        }
    }
}
