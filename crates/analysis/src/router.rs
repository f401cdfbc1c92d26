use marketlens_protocol::{Category, Record};
use std::cmp::Ordering;

/// Selects the records that answer a category.
pub struct Router;

impl Router {
    /// Records of `category`, highest `sort_key` first. Records without a key keep their
    /// relative order after every keyed record.
    #[must_use]
    pub fn filter(category: Category, records: &[Record]) -> Vec<Record> {
        let mut selected: Vec<Record> = records
            .iter()
            .filter(|record| record.category() == Some(category))
            .cloned()
            .collect();
        selected.sort_by(|a, b| match (a.sort_key, b.sort_key) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketlens_protocol::{Headline, HoldingRow, RecordKind};
    use pretty_assertions::assert_eq;

    fn holding(holder: &str, key: Option<f64>) -> Record {
        Record::new(
            "TCS",
            RecordKind::Holding(HoldingRow {
                holder: holder.to_string(),
                values: vec![],
            }),
        )
        .with_sort_key(key)
    }

    fn names(records: &[Record]) -> Vec<String> {
        records
            .iter()
            .map(|r| match &r.kind {
                RecordKind::Holding(h) => h.holder.clone(),
                other => panic!("unexpected {other:?}"),
            })
            .collect()
    }

    #[test]
    fn keeps_only_category_sorted_descending() {
        let records = vec![
            holding("DIIs", Some(10.5)),
            Record::new(
                "news",
                RecordKind::Headline(Headline {
                    title: "x".to_string(),
                    link: None,
                }),
            ),
            holding("Promoters", Some(71.8)),
            holding("Shareholders", None),
            holding("Public", Some(-0.0)),
            holding("FIIs", Some(12.4)),
            holding("Government", None),
        ];
        let routed = Router::filter(Category::Shareholding, &records);
        assert_eq!(
            names(&routed),
            vec!["Promoters", "FIIs", "DIIs", "Public", "Shareholders", "Government"]
        );
        assert!(Router::filter(Category::TopGainers, &records).is_empty());
    }
}
