//! Cell and text cleanup shared by every extraction path.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

/// Canonical currency symbol.
pub const CURRENCY: &str = "₹";

/// Known mis-decodings, longest first.
const ENCODING_REPAIRS: &[(&str, &str)] = &[
    ("Ã¢â€šÂ¹", "₹"),
    ("â‚¹", "₹"),
    ("âˆ’", "-"),
    ("â€“", "-"),
    ("â€”", "-"),
    ("â€¢", "•"),
    ("‚Ä¢", "•"),
    ("â€™", "'"),
    ("Â\u{a0}", " "),
    ("Â ", " "),
    ("\u{a0}", " "),
    ("\u{2212}", "-"),
    ("\u{2013}", "-"),
    ("\u{2014}", "-"),
    ("Â", ""),
];

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s.,%-]+").expect("allow-list regex"));
static CURRENCY_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:Rs\.?|INR|₹)\s*)+([-+]?\d)").expect("currency prefix regex")
});

/// Replace known encoding artifacts with their intended characters.
#[must_use]
pub fn repair_encoding(raw: &str) -> String {
    let mut out = raw.to_string();
    for (broken, fixed) in ENCODING_REPAIRS {
        if out.contains(broken) {
            out = out.replace(broken, fixed);
        }
    }
    out
}

/// Collapse runs of whitespace (including newlines) to single spaces.
#[must_use]
pub fn collapse_whitespace(raw: &str) -> String {
    WHITESPACE.replace_all(raw, " ").trim().to_string()
}

/// Free-text cleanup: repair, drop characters outside the allow-list, collapse whitespace.
#[must_use]
pub fn sanitize_text(raw: &str) -> String {
    let repaired = repair_encoding(raw);
    let allowed = DISALLOWED.replace_all(&repaired, "");
    collapse_whitespace(&allowed)
}

/// Rewrite `Rs.`/`INR` prefixes to the canonical symbol and collapse duplicated prefixes.
#[must_use]
pub fn normalize_currency(raw: &str) -> String {
    CURRENCY_PREFIX
        .replace(raw, format!("{CURRENCY}$1").as_str())
        .into_owned()
}

/// Canonical form of a table cell.
#[must_use]
pub fn normalize_cell(raw: &str) -> String {
    normalize_currency(&collapse_whitespace(&repair_encoding(raw)))
}

/// Row labels carry expander glyphs on screener pages (`Sales +`).
#[must_use]
pub fn clean_label(raw: &str) -> String {
    normalize_cell(raw)
        .trim_end_matches(|c: char| c == '+' || c.is_whitespace())
        .to_string()
}

/// `Promoters (12)` → `Promoters`
#[must_use]
pub fn strip_parenthetical(raw: &str) -> String {
    raw.split('(').next().unwrap_or_default().trim().to_string()
}

/// Parse a percentage-like string into a signed float.
///
/// Accepts unicode minus signs, `+` prefixes, thousands separators, a trailing `%` and
/// accounting-style parentheses for negatives.
pub fn parse_percent(raw: &str) -> Result<f64, String> {
    parse_signed(raw, &['%'])
}

/// Never fails: unparsable input maps to `0.0`. Use [`parse_percent`] when the caller needs
/// to flag the failure.
#[must_use]
pub fn normalize_percent(raw: &str) -> f64 {
    parse_percent(raw).unwrap_or(0.0)
}

/// Parse a plain numeric cell such as `₹1,234.5` or `12,345`.
pub fn parse_number(raw: &str) -> Result<f64, String> {
    parse_signed(raw, &['%', '₹'])
}

fn parse_signed(raw: &str, strip: &[char]) -> Result<f64, String> {
    let repaired = repair_encoding(raw);
    let trimmed = repaired.trim();
    if trimmed.is_empty() {
        return Err("empty value".to_string());
    }

    let parenthesised = trimmed.starts_with('(') && trimmed.ends_with(')');
    let digits: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, ',' | '+' | '(' | ')') && !strip.contains(c))
        .collect();
    let digits = digits.strip_prefix("Rs.").unwrap_or(&digits);

    let value: f64 = digits
        .parse()
        .map_err(|_| format!("not a number: '{trimmed}'"))?;
    if !value.is_finite() {
        return Err(format!("not a finite number: '{trimmed}'"));
    }
    Ok(if parenthesised { -value.abs() } else { value })
}

/// Titlecase every word, lowercasing the rest of it.
#[must_use]
pub fn titlecase(raw: &str) -> String {
    let collapsed = collapse_whitespace(raw);
    let mut out = String::with_capacity(collapsed.len());
    for word in collapsed.split_word_bounds() {
        let mut chars = word.chars();
        match chars.next() {
            Some(first) if first.is_alphabetic() => {
                out.extend(first.to_uppercase());
                out.push_str(&chars.as_str().to_lowercase());
            }
            _ => out.push_str(word),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn percent_handles_unicode_minus() {
        assert_eq!(normalize_percent("−2.3%"), -2.3);
        assert_eq!(normalize_percent("+1.75 %"), 1.75);
        assert_eq!(normalize_percent("(4.5%)"), -4.5);
        assert_eq!(normalize_percent("1,204.5%"), 1204.5);
    }

    #[test]
    fn percent_never_fails() {
        assert_eq!(normalize_percent(""), 0.0);
        assert_eq!(normalize_percent("n/a"), 0.0);
        assert_eq!(normalize_percent("%"), 0.0);
        assert!(parse_percent("").is_err());
        assert!(parse_percent("abc%").is_err());
        assert!(parse_percent("NaN").is_err());
    }

    #[test]
    fn repairs_mojibake_currency() {
        assert_eq!(normalize_cell("â‚¹ 1,234.50"), "₹1,234.50");
        assert_eq!(normalize_cell("Rs. 982"), "₹982");
        assert_eq!(normalize_cell("INR 12"), "₹12");
    }

    #[test]
    fn collapses_duplicate_currency_prefix() {
        assert_eq!(normalize_cell("₹ ₹1,234"), "₹1,234");
        assert_eq!(normalize_cell("₹₹ 77.1"), "₹77.1");
        assert_eq!(normalize_cell("₹"), "₹");
    }

    #[test]
    fn sanitize_keeps_allow_list_only() {
        assert_eq!(
            sanitize_text("Sensex  up 1.2%!\n\nNifty @ 22,000 — strong"),
            "Sensex up 1.2% Nifty 22,000 - strong"
        );
    }

    #[test]
    fn labels_lose_expanders() {
        assert_eq!(clean_label("Sales\u{a0}+"), "Sales");
        assert_eq!(strip_parenthetical("Promoters (12)"), "Promoters");
    }

    #[test]
    fn titlecase_sector_names() {
        assert_eq!(titlecase("IT - SOFTWARE"), "It - Software");
        assert_eq!(titlecase("  banks  "), "Banks");
        assert_eq!(titlecase("oil & gas"), "Oil & Gas");
    }

    #[test]
    fn numbers_parse_with_currency() {
        assert_eq!(parse_number("₹1,234.5"), Ok(1234.5));
        assert_eq!(parse_number("12%"), Ok(12.0));
        assert!(parse_number("-").is_err());
    }
}
