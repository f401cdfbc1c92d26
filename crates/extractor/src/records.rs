use crate::layout::{
    COL_CHANGE, COL_CHANGE_PERCENT, COL_COMPANY, COL_MARKET_CAP, COL_PRICE, COL_SECTOR,
};
use crate::normalize::{
    clean_label, normalize_currency, parse_number, parse_percent, strip_parenthetical, titlecase,
};
use crate::spec::SectionKind;
use crate::types::{DocumentExtract, ExtractedTable, Section, SectionContent, TableRow};
use marketlens_protocol::{
    GenericRow, Headline, HoldingRow, KeyValue, MoverBoard, MoverRecord, ParseIssue, PeerRow,
    PeriodValue, Record, RecordKind, StatementKind, StatementRow, TextBlock,
};
use serde::{Deserialize, Serialize};

/// Records of one or more documents plus every value that had to be defaulted on the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    pub records: Vec<Record>,
    pub issues: Vec<ParseIssue>,
}

impl RecordSet {
    pub fn extend(&mut self, other: Self) {
        self.records.extend(other.records);
        self.issues.extend(other.issues);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Converts extracted sections into typed [`Record`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordBuilder;

impl RecordBuilder {
    #[must_use]
    pub fn build(extract: &DocumentExtract) -> RecordSet {
        let mut out = RecordSet::default();
        for section in &extract.sections {
            Self::build_section(&extract.source, section, &mut out);
        }
        log::debug!(
            "built {} records ({} parse issues) from {}",
            out.records.len(),
            out.issues.len(),
            extract.source
        );
        out
    }

    fn build_section(source: &str, section: &Section, out: &mut RecordSet) {
        match (&section.content, section.kind) {
            (SectionContent::Table { table }, SectionKind::Movers) => {
                movers(source, table, out);
            }
            (SectionContent::Table { table }, SectionKind::Statement(statement)) => {
                for row in table.rows() {
                    if let Some(record) = statement_row(source, statement, table, row, out) {
                        out.records.push(record);
                    }
                }
            }
            (SectionContent::Table { table }, SectionKind::Shareholding) => {
                for row in table.rows() {
                    if let Some(record) = holding_row(source, table, row, out) {
                        out.records.push(record);
                    }
                }
            }
            (SectionContent::Table { table }, _) => {
                for row in table.rows() {
                    let fields = table
                        .headers()
                        .iter()
                        .cloned()
                        .zip(row.cells().iter().cloned())
                        .collect();
                    out.records
                        .push(Record::new(source, RecordKind::Peer(PeerRow { fields })));
                }
            }
            (SectionContent::KeyValues { pairs }, _) => {
                out.records.extend(pairs.iter().map(|(name, value)| {
                    Record::new(
                        source,
                        RecordKind::KeyValue(KeyValue {
                            name: name.clone(),
                            value: value.clone(),
                        }),
                    )
                }));
            }
            (SectionContent::Text { text }, _) => {
                out.records.push(Record::new(
                    source,
                    RecordKind::Text(TextBlock {
                        label: section.label.clone(),
                        text: text.clone(),
                    }),
                ));
            }
            (SectionContent::Items { items }, _) => {
                let text = items
                    .iter()
                    .map(|item| format!("• {item}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                out.records.push(Record::new(
                    source,
                    RecordKind::Text(TextBlock {
                        label: section.label.clone(),
                        text,
                    }),
                ));
            }
            (SectionContent::Links { links }, _) => {
                out.records.extend(links.iter().map(|link| {
                    Record::new(
                        source,
                        RecordKind::Headline(Headline {
                            title: link.text.clone(),
                            link: link.href.clone(),
                        }),
                    )
                }));
            }
        }
    }
}

fn movers(source: &str, table: &ExtractedTable, out: &mut RecordSet) {
    let board = match (table.column(COL_COMPANY), table.column(COL_SECTOR)) {
        (Some(_), Some(_)) => Some(MoverBoard::LargeCap),
        (Some(_), None) => Some(MoverBoard::Gainers),
        _ => None,
    };
    let Some(board) = board else {
        for row in table.rows() {
            let cells = row.cells().iter().cloned().enumerate().collect();
            out.records
                .push(Record::new(source, RecordKind::Generic(GenericRow { cells })));
        }
        return;
    };

    for row in table.rows() {
        let field = |header: &str| table.get(row, header).unwrap_or_default().to_string();
        let company = field(COL_COMPANY);
        if company.is_empty() {
            continue;
        }

        let raw_percent = field(COL_CHANGE_PERCENT);
        let change_percent = match parse_percent(&raw_percent) {
            Ok(value) => value,
            Err(reason) => {
                log::warn!("unparsable change percent '{raw_percent}' for {company} in {source}");
                out.issues.push(ParseIssue {
                    source: source.to_string(),
                    field: format!("{company}/{COL_CHANGE_PERCENT}"),
                    raw: raw_percent.clone(),
                    reason,
                });
                0.0
            }
        };

        let optional = |header: &str| {
            table
                .get(row, header)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        let record = MoverRecord {
            board,
            company,
            sector: optional(COL_SECTOR).map(|s| titlecase(&s)),
            price: normalize_currency(&field(COL_PRICE)),
            change: field(COL_CHANGE),
            change_percent,
            market_cap: optional(COL_MARKET_CAP),
        };
        out.records.push(
            Record::new(source, RecordKind::Mover(record)).with_sort_key(Some(change_percent)),
        );
    }
}

fn period_values(table: &ExtractedTable, row: &TableRow) -> Vec<PeriodValue> {
    table
        .headers()
        .iter()
        .zip(row.cells())
        .skip(1)
        .map(|(period, value)| PeriodValue::new(period.clone(), value.clone()))
        .collect()
}

fn latest_value_issue(source: &str, label: &str, latest: &PeriodValue, reason: String) -> ParseIssue {
    log::warn!(
        "unparsable {} value '{}' for {label} in {source}",
        latest.period,
        latest.value
    );
    ParseIssue {
        source: source.to_string(),
        field: format!("{label}/{}", latest.period),
        raw: latest.value.clone(),
        reason,
    }
}

/// Statement rows sort by their latest period. A blank latest cell has no key; any other
/// unparsable value also has none and is flagged.
fn statement_row(
    source: &str,
    statement: StatementKind,
    table: &ExtractedTable,
    row: &TableRow,
    out: &mut RecordSet,
) -> Option<Record> {
    let metric = clean_label(row.cells().first()?);
    if metric.is_empty() {
        return None;
    }
    let values = period_values(table, row);
    let sort_key = values.last().and_then(|latest| {
        if latest.value.trim().is_empty() {
            return None;
        }
        match parse_number(&latest.value) {
            Ok(value) => Some(value),
            Err(reason) => {
                out.issues
                    .push(latest_value_issue(source, &metric, latest, reason));
                None
            }
        }
    });
    Some(
        Record::new(
            source,
            RecordKind::Statement(StatementRow {
                statement,
                metric,
                values,
            }),
        )
        .with_sort_key(sort_key),
    )
}

/// Holding rows sort by their latest percentage; an unparsable one counts as 0.0 and is
/// flagged, like a mover's change percent.
fn holding_row(
    source: &str,
    table: &ExtractedTable,
    row: &TableRow,
    out: &mut RecordSet,
) -> Option<Record> {
    let holder = clean_label(&strip_parenthetical(row.cells().first()?));
    if holder.is_empty() {
        return None;
    }
    let values = period_values(table, row);
    let sort_key = values.last().map(|latest| match parse_percent(&latest.value) {
        Ok(value) => value,
        Err(reason) => {
            out.issues
                .push(latest_value_issue(source, &holder, latest, reason));
            0.0
        }
    });
    Some(Record::new(source, RecordKind::Holding(HoldingRow { holder, values })).with_sort_key(sort_key))
}
