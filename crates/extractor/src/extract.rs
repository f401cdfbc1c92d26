use crate::error::{ExtractError, Result};
use crate::layout::MoverLayout;
use crate::normalize::{collapse_whitespace, normalize_cell, sanitize_text};
use crate::spec::{SectionKind, SectionSpec};
use crate::types::{
    DocumentExtract, ExtractedTable, Link, RawDocument, Section, SectionContent,
};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

static TABLE: Lazy<Selector> = Lazy::new(|| static_selector("table"));
static DATA_TABLE: Lazy<Selector> = Lazy::new(|| static_selector("table.data-table"));
static ROW: Lazy<Selector> = Lazy::new(|| static_selector("tr"));
static HEADER_CELL: Lazy<Selector> = Lazy::new(|| static_selector("th"));
static DATA_CELL: Lazy<Selector> = Lazy::new(|| static_selector("td"));
static LIST_ITEM: Lazy<Selector> = Lazy::new(|| static_selector("li"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| static_selector("a"));
static SPAN: Lazy<Selector> = Lazy::new(|| static_selector("span"));
static SPAN_NAME: Lazy<Selector> = Lazy::new(|| static_selector("span.name"));
static SPAN_VALUE: Lazy<Selector> = Lazy::new(|| static_selector("span.value"));

const SERIAL_HEADERS: &[&str] = &["S.No.", "S.No", "Sr.No."];
const UNITLESS: &[&str] = &["Rs.", "%"];
const INVISIBLE: &[&str] = &["script", "style", "noscript", "template", "svg"];

fn static_selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

struct CompiledSection {
    spec: SectionSpec,
    alternatives: Vec<Selector>,
}

/// Pulls labeled sections out of HTML documents.
///
/// Selectors are parsed once; extraction itself is a pure function of the document.
pub struct Extractor {
    sections: Vec<CompiledSection>,
}

impl Extractor {
    pub fn new(specs: Vec<SectionSpec>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut sections = Vec::with_capacity(specs.len());
        for spec in specs {
            if !seen.insert(spec.label.clone()) {
                log::warn!("duplicate section label '{}' ignored", spec.label);
                continue;
            }
            let alternatives = compile_alternatives(&spec.selector)?;
            sections.push(CompiledSection { spec, alternatives });
        }
        Ok(Self { sections })
    }

    /// Labels in extraction order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.spec.label.as_str())
    }

    /// Extract every configured section. Absent sections are listed in
    /// [`DocumentExtract::missing`] and never fail the call.
    #[must_use]
    pub fn extract(&self, document: &RawDocument) -> DocumentExtract {
        let html = Html::parse_document(&document.body);
        let mut out = DocumentExtract {
            source: document.source.clone(),
            ..DocumentExtract::default()
        };

        for section in &self.sections {
            match read_section(&html, section, &document.source) {
                Some(content) => out.sections.push(Section {
                    label: section.spec.label.clone(),
                    kind: section.spec.kind,
                    content,
                }),
                None => {
                    log::debug!(
                        "section '{}' not found in {}",
                        section.spec.label,
                        document.source
                    );
                    out.missing.push(section.spec.label.clone());
                }
            }
        }

        log::debug!(
            "extracted {} sections ({} missing) from {}",
            out.sections.len(),
            out.missing.len(),
            document.source
        );
        out
    }
}

fn compile_alternatives(selector: &str) -> Result<Vec<Selector>> {
    let mut alternatives = Vec::new();
    for part in selector.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let parsed = Selector::parse(part).map_err(|err| ExtractError::InvalidSelector {
            selector: selector.to_string(),
            reason: err.to_string(),
        })?;
        alternatives.push(parsed);
    }
    if alternatives.is_empty() {
        return Err(ExtractError::InvalidSelector {
            selector: selector.to_string(),
            reason: "empty selector".to_string(),
        });
    }
    Ok(alternatives)
}

/// Every match of the first alternative that matches anything.
fn first_matching<'a>(html: &'a Html, alternatives: &[Selector]) -> Vec<ElementRef<'a>> {
    for selector in alternatives {
        let found: Vec<ElementRef<'a>> = html.select(selector).collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

fn read_section(html: &Html, section: &CompiledSection, source: &str) -> Option<SectionContent> {
    let matches = first_matching(html, &section.alternatives);
    let container = *matches.first()?;
    let label = section.spec.label.as_str();

    match section.spec.kind {
        SectionKind::Statement(_) | SectionKind::Shareholding | SectionKind::Peers => {
            let table = container
                .select(&DATA_TABLE)
                .next()
                .or_else(|| container.select(&TABLE).next())?;
            Some(SectionContent::Table {
                table: read_table(label, table),
            })
        }
        SectionKind::Movers => {
            let table = container.select(&TABLE).last()?;
            Some(SectionContent::Table {
                table: read_movers_table(label, table, source),
            })
        }
        SectionKind::Ratios => {
            let pairs: Vec<(String, String)> = container
                .select(&LIST_ITEM)
                .filter_map(|li| {
                    let name = li.select(&SPAN_NAME).next().map(element_text)?;
                    let value = li.select(&SPAN_VALUE).next().map(element_text)?;
                    (!name.is_empty()).then(|| (normalize_cell(&name), normalize_cell(&value)))
                })
                .collect();
            (!pairs.is_empty()).then_some(SectionContent::KeyValues { pairs })
        }
        SectionKind::Text => {
            let text = normalize_cell(&element_text(container));
            (!text.is_empty()).then_some(SectionContent::Text { text })
        }
        SectionKind::PageText => {
            let text = page_text(container);
            (!text.is_empty()).then_some(SectionContent::Text { text })
        }
        SectionKind::Bullets => {
            let items: Vec<String> = container
                .select(&LIST_ITEM)
                .map(|li| normalize_cell(&element_text(li)))
                .filter(|item| !item.is_empty())
                .collect();
            (!items.is_empty()).then_some(SectionContent::Items { items })
        }
        SectionKind::Headlines => {
            let links: Vec<Link> = matches
                .into_iter()
                .filter_map(|anchor| {
                    let text = normalize_cell(&element_text(anchor));
                    if text.is_empty() {
                        return None;
                    }
                    let href = anchor.value().attr("href").map(str::to_string);
                    Some(Link { text, href })
                })
                .collect();
            (!links.is_empty()).then_some(SectionContent::Links { links })
        }
    }
}

/// The last table of a page, read with its own header row (or positional headers when it has
/// none).
pub fn last_table(document: &RawDocument) -> Result<ExtractedTable> {
    let html = Html::parse_document(&document.body);
    let table = html
        .select(&TABLE)
        .last()
        .ok_or_else(|| ExtractError::not_found(format!("table in {}", document.source)))?;
    Ok(read_table("Last Table", table))
}

fn read_movers_table(label: &str, table: ElementRef<'_>, source: &str) -> ExtractedTable {
    let data_rows = data_rows(table, None);
    let headers = match MoverLayout::detect(source) {
        Some(layout) => layout.headers(),
        None => {
            log::debug!("no known movers layout for {source}; using positional columns");
            positional_headers(data_rows.first().map_or(0, Vec::len))
        }
    };
    let mut out = ExtractedTable::new(label, headers);
    for cells in data_rows {
        out.push_row(cells);
    }
    out
}

fn read_table(label: &str, table: ElementRef<'_>) -> ExtractedTable {
    let header_row = table
        .select(&ROW)
        .find(|row| row.select(&HEADER_CELL).next().is_some());

    let Some(header_row) = header_row else {
        let rows = data_rows(table, None);
        let mut out = ExtractedTable::new(label, positional_headers(rows.first().map_or(0, Vec::len)));
        for cells in rows {
            out.push_row(cells);
        }
        return out;
    };

    let headers: Vec<String> = header_row.select(&HEADER_CELL).map(header_text).collect();
    let serial_columns: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| SERIAL_HEADERS.contains(&h.as_str()))
        .map(|(idx, _)| idx)
        .collect();

    let mut out = ExtractedTable::new(label, headers);
    for cells in data_rows(table, Some(header_row)) {
        out.push_row(cells);
    }
    for idx in serial_columns.into_iter().rev() {
        out.remove_column(idx);
    }
    out
}

/// Cells of every row holding `td` cells, after the header row when one is given.
fn data_rows(table: ElementRef<'_>, header_row: Option<ElementRef<'_>>) -> Vec<Vec<String>> {
    let mut past_header = header_row.is_none();
    let mut rows = Vec::new();
    for row in table.select(&ROW) {
        if !past_header {
            past_header = header_row.is_some_and(|h| h.id() == row.id());
            continue;
        }
        let cells: Vec<String> = row.select(&DATA_CELL).map(cell_text).collect();
        if !cells.is_empty() {
            rows.push(cells);
        }
    }
    rows
}

fn positional_headers(width: usize) -> Vec<String> {
    (0..width).map(|idx| idx.to_string()).collect()
}

/// Header text with its unit span folded in as `Header (Unit)`.
fn header_text(th: ElementRef<'_>) -> String {
    let full = normalize_cell(&element_text(th));
    let Some(unit_span) = th.select(&SPAN).next() else {
        return full;
    };
    let unit = normalize_cell(&element_text(unit_span));
    if unit.is_empty() {
        return full;
    }
    let base = collapse_whitespace(&full.replacen(&unit, "", 1));
    if UNITLESS.contains(&unit.as_str()) || base.is_empty() {
        base
    } else {
        format!("{base} ({unit})")
    }
}

fn cell_text(td: ElementRef<'_>) -> String {
    let is_text_cell = td.value().classes().any(|class| class == "text");
    let raw = match td.select(&ANCHOR).next() {
        Some(link) if is_text_cell => element_text(link),
        _ => element_text(td),
    };
    normalize_cell(&raw)
}

fn element_text(element: ElementRef<'_>) -> String {
    let joined: String = element.text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&joined)
}

/// Block-level text of a page root: headings, paragraphs and list items separated by blank
/// lines. Pages without such blocks fall back to all visible text.
fn page_text(root: ElementRef<'_>) -> String {
    let blocks: Vec<String> = root
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| {
            matches!(
                el.value().name(),
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "p" | "li"
            )
        })
        .map(|el| sanitize_text(&element_text(el)))
        .filter(|block| !block.is_empty())
        .collect();
    if !blocks.is_empty() {
        return blocks.join("\n\n");
    }

    let visible: Vec<&str> = root
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent()?.value().as_element()?;
            (!INVISIBLE.contains(&parent.name())).then_some(&**text)
        })
        .collect();
    sanitize_text(&visible.join(" "))
}
