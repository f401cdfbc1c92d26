use crate::assembler::ContextAssembler;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::query_classifier::QueryClassifier;
use crate::router::Router;
use crate::service::{DocumentFetcher, GenerationService};
use crate::templates::TemplateLibrary;
use marketlens_chunker::Chunker;
use marketlens_extractor::{
    DocumentExtract, Extractor, MoverLayout, RawDocument, RecordBuilder, RecordSet, SectionSpec,
};
use marketlens_protocol::{
    AnalysisContext, Category, ParseIssue, Query, Record, REPORT_SCHEMA_VERSION,
};
use marketlens_vector_store::{ContentFingerprint, EmbeddingProvider, IndexStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which preset of section specs applies to a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Movers,
    Company,
    News,
}

impl PageKind {
    #[must_use]
    pub fn detect(source: &str) -> Self {
        if MoverLayout::detect(source).is_some() {
            return Self::Movers;
        }
        let lowered = source.to_lowercase();
        if lowered.contains("/company/") || lowered.contains("screener") {
            Self::Company
        } else {
            Self::News
        }
    }
}

/// External handles the pipeline runs against.
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn DocumentFetcher>,
    pub generator: Arc<dyn GenerationService>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub store: IndexStore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Fetch,
    Index,
}

/// A source or stage that failed while the rest of the run continued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source: String,
    pub stage: FailureStage,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Answered { text: String },
    /// No context was available; generation was not invoked
    NoData,
    GenerationFailed { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub schema_version: u32,
    pub query: Query,
    pub context: AnalysisContext,
    pub outcome: AnalysisOutcome,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<SourceFailure>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ParseIssue>,
}

/// Extraction output for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub page: PageKind,
    pub extract: DocumentExtract,
    pub records: RecordSet,
}

/// Fetch → extract → classify → route or retrieve → assemble → generate.
pub struct Analyzer {
    config: AnalysisConfig,
    classifier: QueryClassifier,
    templates: TemplateLibrary,
    assembler: ContextAssembler,
    chunker: Chunker,
    movers: Extractor,
    company: Extractor,
    news: Extractor,
    collaborators: Collaborators,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig, collaborators: Collaborators) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier: QueryClassifier::builtin()?,
            templates: TemplateLibrary::builtin(),
            assembler: ContextAssembler::new(config.context.max_context_size),
            chunker: Chunker::new(config.chunking)?,
            movers: Extractor::new(SectionSpec::market_movers())?,
            company: Extractor::new(SectionSpec::screener_company())?,
            news: Extractor::new(SectionSpec::news_page())?,
            config,
            collaborators,
        })
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: QueryClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    #[must_use]
    pub fn with_templates(mut self, templates: TemplateLibrary) -> Self {
        self.templates = templates;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    #[must_use]
    pub const fn classifier(&self) -> &QueryClassifier {
        &self.classifier
    }

    /// Extract sections and build records with the preset matching the source.
    #[must_use]
    pub fn extract(&self, document: &RawDocument) -> ExtractedDocument {
        let page = PageKind::detect(&document.source);
        let extractor = match page {
            PageKind::Movers => &self.movers,
            PageKind::Company => &self.company,
            PageKind::News => &self.news,
        };
        let extract = extractor.extract(document);
        if !extract.missing.is_empty() {
            log::debug!(
                "{}: sections not found: {}",
                document.source,
                extract.missing.join(", ")
            );
        }
        let records = RecordBuilder::build(&extract);
        ExtractedDocument {
            page,
            extract,
            records,
        }
    }

    /// Fetch every source and analyze whatever could be fetched. A failing source is recorded
    /// and the others continue.
    pub async fn analyze<S: AsRef<str>>(&self, sources: &[S], query: &str) -> AnalysisReport {
        let mut documents = Vec::with_capacity(sources.len());
        let mut failures = Vec::new();
        for source in sources {
            let source = source.as_ref();
            match self.collaborators.fetcher.fetch(source).await {
                Ok(document) => documents.push(document),
                Err(err) => {
                    log::warn!("skipping {source}: {err}");
                    failures.push(SourceFailure {
                        source: source.to_string(),
                        stage: FailureStage::Fetch,
                        message: err.to_string(),
                    });
                }
            }
        }

        let mut report = self.analyze_documents(&documents, query).await;
        failures.append(&mut report.failures);
        report.failures = failures;
        report
    }

    /// Analyze already fetched documents.
    pub async fn analyze_documents(&self, documents: &[RawDocument], query: &str) -> AnalysisReport {
        let query = self.classifier.classify_query(Query::new(query.trim()));
        let category = query.category.unwrap_or(Category::General);
        log::info!("query classified as {category}");

        let extracted: Vec<ExtractedDocument> =
            documents.iter().map(|doc| self.extract(doc)).collect();
        let issues: Vec<ParseIssue> = extracted
            .iter()
            .flat_map(|doc| doc.records.issues.iter().cloned())
            .collect();
        let all_records: Vec<Record> = extracted
            .iter()
            .flat_map(|doc| doc.records.records.iter().cloned())
            .collect();

        let mut failures = Vec::new();
        let routed = Router::filter(category, &all_records);
        let context = if !routed.is_empty() {
            log::debug!("{} records routed to {category}", routed.len());
            self.assembler.assemble_records(category, &routed)
        } else if category.requires_records() {
            log::info!("no {category} records in {} documents", documents.len());
            self.assembler.not_available(category)
        } else {
            match self.retrieve(category, &query.text, &extracted).await {
                Ok(context) => context,
                Err(err) => {
                    log::warn!("retrieval failed: {err}");
                    failures.push(SourceFailure {
                        source: "similarity index".to_string(),
                        stage: FailureStage::Index,
                        message: err.to_string(),
                    });
                    self.assembler.not_available(category)
                }
            }
        };

        let outcome = self.generate(&query, &context).await;
        AnalysisReport {
            schema_version: REPORT_SCHEMA_VERSION,
            query,
            context,
            outcome,
            failures,
            issues,
        }
    }

    /// Chunk the rendered records of every document, load or build their index and assemble
    /// the top hits.
    async fn retrieve(
        &self,
        category: Category,
        query: &str,
        extracted: &[ExtractedDocument],
    ) -> Result<AnalysisContext> {
        let mut texts: Vec<(String, String)> = extracted
            .iter()
            .map(|doc| (doc.extract.source.clone(), document_text(&doc.records.records)))
            .filter(|(_, text)| !text.trim().is_empty())
            .collect();
        // chunk numbering must not depend on source order; the fingerprint doesn't
        texts.sort_unstable();
        let chunks = self.chunker.chunk_documents(&texts);
        if chunks.is_empty() {
            return Ok(self.assembler.not_available(category));
        }

        let embedder = Arc::clone(&self.collaborators.embedder);
        let fingerprint =
            ContentFingerprint::of(&texts, &self.config.chunking, embedder.model_id());
        let index = self
            .collaborators
            .store
            .build_or_load(fingerprint.clone(), chunks, Arc::clone(&embedder))
            .await?;
        let hits = index
            .query_checked(&fingerprint, query, self.config.retrieval.top_k, embedder.as_ref())
            .await?;
        log::debug!("retrieved {} of {} chunks", hits.len(), index.len());
        Ok(self.assembler.assemble_chunks(category, &hits))
    }

    async fn generate(&self, query: &Query, context: &AnalysisContext) -> AnalysisOutcome {
        if !context.available {
            return AnalysisOutcome::NoData;
        }
        let system_prompt = self.templates.render(context.template, &query.text);
        let user_content = format!(
            "Data ({}, {} items):\n\n{}",
            context.category.display_name(),
            context.items,
            context.text
        );
        match self
            .collaborators
            .generator
            .generate(&system_prompt, &user_content)
            .await
        {
            Ok(text) if text.trim().is_empty() => AnalysisOutcome::GenerationFailed {
                message: "generation service returned no text".to_string(),
            },
            Ok(text) => AnalysisOutcome::Answered { text },
            Err(err) => {
                log::warn!("generation failed: {err}");
                AnalysisOutcome::GenerationFailed {
                    message: err.to_string(),
                }
            }
        }
    }
}

/// Text of one document as indexed for retrieval: one rendered record per line.
#[must_use]
pub fn document_text(records: &[Record]) -> String {
    records
        .iter()
        .map(Record::render)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_kind_follows_source() {
        assert_eq!(
            PageKind::detect("https://example.test/markets/nsegainer.html"),
            PageKind::Movers
        );
        assert_eq!(
            PageKind::detect("https://example.test/stocks/large-cap"),
            PageKind::Movers
        );
        assert_eq!(
            PageKind::detect("https://www.screener.in/company/TCS/"),
            PageKind::Company
        );
        assert_eq!(
            PageKind::detect("https://example.test/news/markets"),
            PageKind::News
        );
    }
}
