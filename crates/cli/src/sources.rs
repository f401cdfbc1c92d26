//! Turning command-line source arguments into fetchable locations.
//!
//! A source is a URL, a local HTML file, or a bare ticker symbol such as `TCS`, which maps to
//! its company page. Named news presets cover the market news desks.

use anyhow::{bail, Result};
use std::path::Path;

const COMPANY_URL_PREFIX: &str = "https://www.screener.in/company/";
const MAX_SYMBOL_LEN: usize = 20;

/// A named market news page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewsPreset {
    pub name: &'static str,
    pub title: &'static str,
    pub url: &'static str,
}

pub const NEWS_PRESETS: &[NewsPreset] = &[
    NewsPreset {
        name: "economic-times",
        title: "Economic Times",
        url: "https://economictimes.indiatimes.com/markets/stocks/news",
    },
    NewsPreset {
        name: "moneycontrol",
        title: "MoneyControl",
        url: "https://www.moneycontrol.com/news/business/markets",
    },
    NewsPreset {
        name: "livemint",
        title: "LiveMint",
        url: "https://www.livemint.com/market/stock-market-news",
    },
    NewsPreset {
        name: "cnbc-tv18",
        title: "CNBC TV18",
        url: "https://www.cnbctv18.com/market/",
    },
    NewsPreset {
        name: "financial-express",
        title: "Financial Express",
        url: "https://www.financialexpress.com/market/",
    },
];

/// Presets used when a command is given no source at all.
pub const DEFAULT_NEWS_PRESETS: usize = 3;

fn is_url(raw: &str) -> bool {
    raw.starts_with("http://") || raw.starts_with("https://")
}

/// `TCS`, `M&M`, `BAJAJ-AUTO`: uppercase letters, digits, `&` and `-`, with at least one letter.
#[must_use]
pub fn is_symbol(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= MAX_SYMBOL_LEN
        && raw.chars().any(|c| c.is_ascii_uppercase())
        && raw
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '&' | '-'))
}

/// Consolidated company page for a ticker symbol.
#[must_use]
pub fn company_url(symbol: &str) -> String {
    format!("{COMPANY_URL_PREFIX}{}/consolidated/", symbol.trim().to_ascii_uppercase())
}

/// URLs and existing files pass through; a bare symbol becomes its company page.
#[must_use]
pub fn resolve_source(raw: &str) -> String {
    let raw = raw.trim();
    if is_url(raw) || Path::new(raw).exists() || !is_symbol(raw) {
        return raw.to_string();
    }
    let url = company_url(raw);
    log::debug!("resolved symbol {raw} to {url}");
    url
}

/// Look a preset up by name (case-insensitive); `all` selects every preset.
pub fn news_urls(names: &[String]) -> Result<Vec<String>> {
    let mut urls = Vec::new();
    for name in names {
        if name.eq_ignore_ascii_case("all") {
            urls.extend(NEWS_PRESETS.iter().map(|preset| preset.url.to_string()));
            continue;
        }
        let Some(preset) = NEWS_PRESETS
            .iter()
            .find(|preset| preset.name.eq_ignore_ascii_case(name))
        else {
            let known: Vec<&str> = NEWS_PRESETS.iter().map(|preset| preset.name).collect();
            bail!("unknown news preset '{name}' (known: {}, all)", known.join(", "));
        };
        urls.push(preset.url.to_string());
    }
    Ok(urls)
}

/// Every source of one command, in argument order with duplicates removed. With nothing
/// given, the default news presets are used.
pub fn collect_sources(
    sources: &[String],
    symbols: &[String],
    news: &[String],
) -> Result<Vec<String>> {
    let mut resolved: Vec<String> = sources.iter().map(|raw| resolve_source(raw)).collect();
    resolved.extend(symbols.iter().map(|symbol| company_url(symbol)));
    resolved.extend(news_urls(news)?);
    if resolved.is_empty() {
        log::info!("no sources given; using the default news desks");
        resolved.extend(
            NEWS_PRESETS
                .iter()
                .take(DEFAULT_NEWS_PRESETS)
                .map(|preset| preset.url.to_string()),
        );
    }
    let mut seen = std::collections::HashSet::new();
    resolved.retain(|source| seen.insert(source.clone()));
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn bare_symbols_resolve_to_company_pages() {
        assert_eq!(
            resolve_source("TCS"),
            "https://www.screener.in/company/TCS/consolidated/"
        );
        assert_eq!(
            resolve_source("M&M"),
            "https://www.screener.in/company/M&M/consolidated/"
        );
        assert_eq!(resolve_source("https://example.test/a"), "https://example.test/a");
        assert_eq!(resolve_source("page.html"), "page.html");
        assert_eq!(resolve_source("tcs"), "tcs");
        assert_eq!(resolve_source("500"), "500");
    }

    #[test]
    fn existing_files_win_over_symbols() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("INFY");
        std::fs::write(&file, "<p></p>").unwrap();
        let raw = file.to_string_lossy().to_string();
        assert_eq!(resolve_source(&raw), raw);
    }

    #[test]
    fn news_presets_by_name() {
        assert_eq!(
            news_urls(&strings(&["LiveMint"])).unwrap(),
            vec!["https://www.livemint.com/market/stock-market-news"]
        );
        assert_eq!(news_urls(&strings(&["all"])).unwrap().len(), NEWS_PRESETS.len());
        let err = news_urls(&strings(&["reuters"])).unwrap_err().to_string();
        assert!(err.contains("economic-times"));
    }

    #[test]
    fn collected_sources_are_deduplicated_and_defaulted() {
        let sources = collect_sources(
            &strings(&["TCS"]),
            &strings(&["tcs", "INFY"]),
            &strings(&["moneycontrol"]),
        )
        .unwrap();
        assert_eq!(
            sources,
            vec![
                "https://www.screener.in/company/TCS/consolidated/",
                "https://www.screener.in/company/INFY/consolidated/",
                "https://www.moneycontrol.com/news/business/markets",
            ]
        );

        let defaults = collect_sources(&[], &[], &[]).unwrap();
        assert_eq!(defaults.len(), DEFAULT_NEWS_PRESETS);
        assert_eq!(defaults[0], NEWS_PRESETS[0].url);
    }
}
