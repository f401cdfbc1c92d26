//! Human-readable renderings. `--json` bypasses these and prints the serde form.

use marketlens_analysis::{AnalysisOutcome, AnalysisReport, ExtractedDocument};
use std::fmt::Write as _;

#[must_use]
pub fn render_analysis(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let category = report
        .query
        .category
        .map_or_else(|| "unclassified".to_string(), |c| c.to_string());
    let _ = writeln!(out, "Query: {} [{category}]", report.query.text);
    let budget = &report.context.budget;
    let _ = writeln!(
        out,
        "Context: {} items, {}/{} chars{}",
        report.context.items,
        budget.used_chars,
        budget.max_chars,
        if budget.truncated {
            format!(", {} dropped", budget.dropped_items)
        } else {
            String::new()
        }
    );
    for failure in &report.failures {
        let _ = writeln!(
            out,
            "Failed ({:?}): {}: {}",
            failure.stage, failure.source, failure.message
        );
    }
    if !report.issues.is_empty() {
        let _ = writeln!(out, "Parse issues: {}", report.issues.len());
    }
    out.push('\n');
    match &report.outcome {
        AnalysisOutcome::Answered { text } => out.push_str(text.trim_end()),
        AnalysisOutcome::NoData => out.push_str(&report.context.text),
        AnalysisOutcome::GenerationFailed { message } => {
            let _ = write!(out, "Generation failed: {message}\n\n{}", report.context.text);
        }
    }
    out.push('\n');
    out
}

#[must_use]
pub fn render_extract(doc: &ExtractedDocument) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Source: {} ({:?})", doc.extract.source, doc.page);
    for section in &doc.extract.sections {
        let _ = writeln!(out, "  found   {}", section.label);
    }
    for label in &doc.extract.missing {
        let _ = writeln!(out, "  missing {label}");
    }
    let _ = writeln!(out, "\n{} records:", doc.records.len());
    for record in &doc.records.records {
        let category = record.category().map_or("-", |c| c.as_str());
        let _ = writeln!(out, "[{category}] {}", record.render());
    }
    for issue in &doc.records.issues {
        let _ = writeln!(
            out,
            "issue: {} {} = '{}': {}",
            issue.source, issue.field, issue.raw, issue.reason
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketlens_analysis::{FailureStage, SourceFailure};
    use marketlens_protocol::{AnalysisContext, Category, Query, REPORT_SCHEMA_VERSION};

    #[test]
    fn no_data_report_shows_the_explicit_message() {
        let report = AnalysisReport {
            schema_version: REPORT_SCHEMA_VERSION,
            query: Query {
                text: "shareholding trend".to_string(),
                category: Some(Category::Shareholding),
            },
            context: AnalysisContext::not_available(Category::Shareholding, 100),
            outcome: AnalysisOutcome::NoData,
            failures: vec![SourceFailure {
                source: "https://example.test".to_string(),
                stage: FailureStage::Fetch,
                message: "HTTP 503".to_string(),
            }],
            issues: vec![],
        };
        let text = render_analysis(&report);
        assert!(text.starts_with("Query: shareholding trend [shareholding]\n"));
        assert!(text.contains("Failed (Fetch): https://example.test: HTTP 503"));
        assert!(text.ends_with("No shareholding data available.\n"));
    }
}
