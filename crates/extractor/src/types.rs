use crate::spec::SectionKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder written into the first column of rows that are one cell short.
pub const PLACEHOLDER_CELL: &str = "-";

/// An HTML/text payload plus the identifier it was fetched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    /// URL or symbol the payload belongs to
    pub source: String,

    /// Completed HTML (or plain text) payload
    pub body: String,
}

impl RawDocument {
    #[must_use]
    pub fn new(source: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            body: body.into(),
        }
    }
}

/// One data row of an [`ExtractedTable`]; always exactly as wide as the headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    cells: Vec<String>,
}

impl TableRow {
    #[must_use]
    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A labeled table with unique, ordered headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedTable {
    pub label: String,
    headers: Vec<String>,
    rows: Vec<TableRow>,
}

impl ExtractedTable {
    /// Create an empty table. Headers are made unique and non-empty.
    #[must_use]
    pub fn new(label: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            label: label.into(),
            headers: unique_headers(headers),
            rows: Vec::new(),
        }
    }

    /// Apply the row acceptance rule: an exact-width row is kept as is, a row one cell short
    /// gets [`PLACEHOLDER_CELL`] prepended, anything else is dropped. Returns whether the row
    /// was kept.
    pub fn push_row(&mut self, mut cells: Vec<String>) -> bool {
        let width = self.headers.len();
        if width == 0 {
            return false;
        }
        if cells.len() + 1 == width {
            cells.insert(0, PLACEHOLDER_CELL.to_string());
        }
        if cells.len() != width {
            log::debug!(
                "dropping row with {} cells from table '{}' ({} headers)",
                cells.len(),
                self.label,
                width
            );
            return false;
        }
        self.rows.push(TableRow { cells });
        true
    }

    /// Drop a column from the headers and every row.
    pub(crate) fn remove_column(&mut self, idx: usize) {
        if idx >= self.headers.len() {
            return;
        }
        self.headers.remove(idx);
        for row in &mut self.rows {
            row.cells.remove(idx);
        }
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Cell of `row` under `header`.
    #[must_use]
    pub fn get<'a>(&'a self, row: &'a TableRow, header: &str) -> Option<&'a str> {
        self.column(header)
            .and_then(|idx| row.cells.get(idx))
            .map(String::as_str)
    }

    /// Header → value view of one row.
    #[must_use]
    pub fn row_map<'a>(&'a self, row: &'a TableRow) -> BTreeMap<&'a str, &'a str> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(row.cells.iter().map(String::as_str))
            .collect()
    }
}

fn unique_headers(headers: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(headers.len());
    for header in headers {
        let base = if header.trim().is_empty() {
            "Item".to_string()
        } else {
            header.trim().to_string()
        };
        let mut candidate = base.clone();
        let mut n = 2;
        while out.contains(&candidate) {
            candidate = format!("{base} ({n})");
            n += 1;
        }
        out.push(candidate);
    }
    out
}

/// An anchor pulled from a headline list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub href: Option<String>,
}

/// Content of one extracted section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionContent {
    Table { table: ExtractedTable },
    KeyValues { pairs: Vec<(String, String)> },
    Text { text: String },
    Items { items: Vec<String> },
    Links { links: Vec<Link> },
}

/// A named region of a document. At most one per label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub label: String,
    pub kind: SectionKind,
    pub content: SectionContent,
}

/// Everything the extractor found in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentExtract {
    pub source: String,
    pub sections: Vec<Section>,
    /// Labels whose section was absent (a normal partial result)
    pub missing: Vec<String>,
}

impl DocumentExtract {
    #[must_use]
    pub fn section(&self, label: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.label == label)
    }

    #[must_use]
    pub fn table(&self, label: &str) -> Option<&ExtractedTable> {
        match &self.section(label)?.content {
            SectionContent::Table { table } => Some(table),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn headers_are_made_unique_and_non_empty() {
        let table = ExtractedTable::new("t", cells(&["", "Mar 2024", "Mar 2024", " "]));
        assert_eq!(
            table.headers(),
            &cells(&["Item", "Mar 2024", "Mar 2024 (2)", "Item (2)"])[..]
        );
    }

    #[test]
    fn short_rows_are_padded_in_first_column() {
        let mut table = ExtractedTable::new("peers", cells(&["S", "Name", "P/E"]));
        assert!(table.push_row(cells(&["TCS", "31.2"])));
        let row = &table.rows()[0];
        assert_eq!(table.get(row, "S"), Some(PLACEHOLDER_CELL));
        assert_eq!(table.get(row, "Name"), Some("TCS"));
    }

    #[test]
    fn misaligned_rows_are_dropped() {
        let mut table = ExtractedTable::new("peers", cells(&["A", "B", "C"]));
        assert!(!table.push_row(cells(&["1"])));
        assert!(!table.push_row(cells(&["1", "2", "3", "4"])));
        assert!(table.push_row(cells(&["1", "2", "3"])));
        assert_eq!(table.rows().len(), 1);
        for row in table.rows() {
            assert_eq!(row.len(), table.headers().len());
        }
    }

    #[test]
    fn row_map_keys_equal_headers() {
        let mut table = ExtractedTable::new("t", cells(&["A", "B"]));
        table.push_row(cells(&["1", "2"]));
        let map = table.row_map(&table.rows()[0]);
        let keys: Vec<&str> = map.keys().copied().collect();
        assert_eq!(keys, vec!["A", "B"]);
    }
}
