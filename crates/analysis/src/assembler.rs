use marketlens_protocol::{
    AnalysisContext, BudgetTruncation, Category, ContextBudget, Record,
};
use marketlens_vector_store::ScoredChunk;

const RECORD_SEPARATOR: &str = "\n";
const CHUNK_SEPARATOR: &str = "\n\n";

/// Builds the bounded context handed to the generation service.
///
/// Items are appended in the order given until the next one would exceed `max_chars`; that
/// item and everything after it are dropped whole. Output depends only on the input.
#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    max_chars: usize,
}

impl ContextAssembler {
    #[must_use]
    pub const fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    #[must_use]
    pub const fn max_chars(&self) -> usize {
        self.max_chars
    }

    #[must_use]
    pub fn assemble_records(&self, category: Category, records: &[Record]) -> AnalysisContext {
        let items: Vec<String> = records.iter().map(Record::render).collect();
        self.assemble(category, &items, RECORD_SEPARATOR)
    }

    #[must_use]
    pub fn assemble_chunks(&self, category: Category, chunks: &[ScoredChunk]) -> AnalysisContext {
        let items: Vec<String> = chunks
            .iter()
            .map(|hit| format!("[{}]\n{}", hit.chunk.source_label, hit.chunk.text.trim()))
            .collect();
        self.assemble(category, &items, CHUNK_SEPARATOR)
    }

    #[must_use]
    pub fn not_available(&self, category: Category) -> AnalysisContext {
        AnalysisContext::not_available(category, self.max_chars)
    }

    fn assemble(&self, category: Category, items: &[String], separator: &str) -> AnalysisContext {
        let separator_chars = separator.chars().count();
        let mut text = String::new();
        let mut used_chars = 0usize;
        let mut kept = 0usize;

        for item in items {
            let item_chars = item.chars().count();
            let extra = if kept == 0 {
                item_chars
            } else {
                item_chars + separator_chars
            };
            if used_chars.saturating_add(extra) > self.max_chars {
                break;
            }
            if kept > 0 {
                text.push_str(separator);
            }
            text.push_str(item);
            used_chars += extra;
            kept += 1;
        }

        let dropped_items = items.len() - kept;
        if dropped_items > 0 {
            log::debug!(
                "context for {category} dropped {dropped_items} of {} items (max {} chars)",
                items.len(),
                self.max_chars
            );
        }

        if kept == 0 {
            let mut empty = self.not_available(category);
            empty.budget.dropped_items = dropped_items;
            empty.budget.truncated = dropped_items > 0;
            empty.budget.truncation = empty.budget.truncated.then_some(BudgetTruncation::MaxChars);
            return empty;
        }

        let truncated = dropped_items > 0;
        AnalysisContext {
            category,
            template: category.template(),
            available: true,
            text,
            items: kept,
            budget: ContextBudget {
                max_chars: self.max_chars,
                used_chars,
                truncated,
                dropped_items,
                truncation: truncated.then_some(BudgetTruncation::MaxChars),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketlens_protocol::{KeyValue, RecordKind, TemplateId};
    use marketlens_vector_store::Chunk;
    use pretty_assertions::assert_eq;

    fn kv(name: &str, value: &str) -> Record {
        Record::new(
            "src",
            RecordKind::KeyValue(KeyValue {
                name: name.to_string(),
                value: value.to_string(),
            }),
        )
    }

    #[test]
    fn fits_everything_under_budget() {
        let ctx = ContextAssembler::new(100)
            .assemble_records(Category::General, &[kv("A", "1"), kv("B", "2")]);
        assert!(ctx.available);
        assert_eq!(ctx.text, "A: 1\nB: 2");
        assert_eq!(ctx.items, 2);
        assert_eq!(ctx.budget.used_chars, 9);
        assert!(!ctx.budget.truncated);
        assert_eq!(ctx.template, TemplateId::General);
    }

    #[test]
    fn drops_whole_trailing_items() {
        // "A: 1" = 4, "\nB: 2" = 5, "\nC: 3" would make 14
        let ctx = ContextAssembler::new(12).assemble_records(
            Category::General,
            &[kv("A", "1"), kv("B", "2"), kv("C", "3"), kv("D", "4")],
        );
        assert_eq!(ctx.text, "A: 1\nB: 2");
        assert_eq!(ctx.items, 2);
        assert_eq!(ctx.budget.dropped_items, 2);
        assert!(ctx.budget.truncated);
        assert_eq!(ctx.budget.truncation, Some(BudgetTruncation::MaxChars));
        assert!(ctx.text.chars().count() <= 12);
    }

    #[test]
    fn oversized_first_item_leaves_nothing_available() {
        let ctx = ContextAssembler::new(3).assemble_records(Category::General, &[kv("Long", "x")]);
        assert!(!ctx.available);
        assert_eq!(ctx.items, 0);
        assert_eq!(ctx.budget.dropped_items, 1);
    }

    #[test]
    fn identical_input_gives_identical_context() {
        let records = vec![kv("A", "1"), kv("B", "2")];
        let assembler = ContextAssembler::new(50);
        assert_eq!(
            assembler.assemble_records(Category::General, &records),
            assembler.assemble_records(Category::General, &records)
        );
    }

    #[test]
    fn chunks_carry_their_source_label() {
        let hit = ScoredChunk {
            chunk: Chunk {
                source_label: "https://example.test/news".to_string(),
                sequence_index: 0,
                text: "Sensex closes higher. ".to_string(),
                char_start: 0,
                char_end: 22,
            },
            score: 0.9,
        };
        let ctx = ContextAssembler::new(500).assemble_chunks(Category::Announcement, &[hit]);
        assert_eq!(ctx.text, "[https://example.test/news]\nSensex closes higher.");
        assert_eq!(ctx.template, TemplateId::Announcements);
    }

    #[test]
    fn not_available_is_explicit() {
        let ctx = ContextAssembler::new(500).not_available(Category::LargeCap);
        assert!(!ctx.available);
        assert_eq!(ctx.text, "No large-cap stocks data available.");
    }
}
