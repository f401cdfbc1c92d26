use anyhow::{Context as AnyhowContext, Result};
use clap::{Parser, Subcommand};
use marketlens_analysis::{
    document_text, Analyzer, Collaborators, DocumentFetcher, EmbeddingMode, GenerationService,
    QueryClassifier, RuleTable, TemplateLibrary,
};
use marketlens_chunker::{Chunk, Chunker, ChunkingStats};
use marketlens_protocol::{Category, TemplateId};
use marketlens_vector_store::{
    ContentFingerprint, EmbeddingProvider, IndexStore, ScoredChunk, StubEmbedder,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod providers;
mod report;
mod settings;
mod sources;

pub use providers::{HttpFetcher, OpenAiChatClient, OpenAiEmbedder, UnconfiguredGenerator};
pub use settings::Settings;
pub use sources::{collect_sources, company_url, resolve_source, NewsPreset, NEWS_PRESETS};

#[derive(Parser)]
#[command(name = "marketlens")]
#[command(about = "Extract, index and analyze financial market pages", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file (chunking, retrieval, context, embedding, generation)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory of persisted similarity indexes (overrides MARKETLENS_INDEX_DIR)
    #[arg(long, global = true)]
    index_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract sections and records from one page (URL, local file or ticker symbol)
    Extract {
        source: String,

        #[arg(long)]
        json: bool,
    },

    /// Show the category and template a query is routed to
    Classify {
        query: String,

        /// Rule table replacing the built-in one
        #[arg(long)]
        rules: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Split a text file into overlapping chunks
    Chunk {
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Build (or reuse) the similarity index of the given pages, optionally querying it
    Index {
        /// Page URLs, local HTML files or ticker symbols
        sources: Vec<String>,

        /// Company page of this ticker symbol; repeatable
        #[arg(long = "symbol")]
        symbols: Vec<String>,

        /// News preset by name, or `all`; repeatable
        #[arg(long)]
        news: Vec<String>,

        /// Return the top-k chunks for this text
        #[arg(long)]
        query: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Answer a question about the given pages
    Analyze {
        query: String,

        /// Page URL, local HTML file or ticker symbol; repeatable. With no source, symbol
        /// or preset the default news desks are read.
        #[arg(short, long = "source")]
        sources: Vec<String>,

        /// Company page of this ticker symbol; repeatable
        #[arg(long = "symbol")]
        symbols: Vec<String>,

        /// News preset by name, or `all`; repeatable
        #[arg(long)]
        news: Vec<String>,

        /// Rule table replacing the built-in one
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Directory of `<template_id>.md` files overriding built-in templates
        #[arg(long)]
        templates: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    const fn json(&self) -> bool {
        match self {
            Self::Extract { json, .. }
            | Self::Classify { json, .. }
            | Self::Chunk { json, .. }
            | Self::Index { json, .. }
            | Self::Analyze { json, .. } => *json,
        }
    }
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // stdout is reserved for JSON when it is requested
    if cli.command.json() {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // reqwest/hyper internals are noisy below warn
    if !cli.verbose {
        builder.filter_module("hyper", log::LevelFilter::Warn);
        builder.filter_module("reqwest", log::LevelFilter::Warn);
    }
    builder.target(env_logger::Target::Stderr).init();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(dir) = cli.index_dir {
        settings.index_dir = dir;
    }

    match cli.command {
        Commands::Extract { source, json } => {
            run_extract(&settings, &resolve_source(&source), json).await
        }
        Commands::Classify { query, rules, json } => run_classify(&query, rules.as_deref(), json),
        Commands::Chunk { file, json } => run_chunk(&settings, &file, json).await,
        Commands::Index {
            sources,
            symbols,
            news,
            query,
            json,
        } => {
            let sources = collect_sources(&sources, &symbols, &news)?;
            run_index(&settings, &sources, query.as_deref(), json).await
        }
        Commands::Analyze {
            query,
            sources,
            symbols,
            news,
            rules,
            templates,
            json,
        } => {
            let sources = collect_sources(&sources, &symbols, &news)?;
            run_analyze(
                &settings,
                &query,
                &sources,
                rules.as_deref(),
                templates.as_deref(),
                json,
            )
            .await
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_embedder(settings: &Settings) -> Result<Arc<dyn EmbeddingProvider>> {
    match settings.analysis.embedding.mode {
        EmbeddingMode::Stub => Ok(Arc::new(StubEmbedder::default())),
        EmbeddingMode::OpenAi => {
            let key = settings
                .openai_api_key
                .as_deref()
                .context("embedding mode 'openai' requires OPENAI_API_KEY")?;
            Ok(Arc::new(OpenAiEmbedder::new(
                key,
                &settings.openai_base_url,
                &settings.analysis.embedding.model,
            )?))
        }
    }
}

fn build_generator(settings: &Settings) -> Result<Arc<dyn GenerationService>> {
    let Some(key) = settings.openai_api_key.as_deref() else {
        log::warn!("OPENAI_API_KEY is not set; generation is disabled");
        return Ok(Arc::new(UnconfiguredGenerator));
    };
    let generation = &settings.analysis.generation;
    Ok(Arc::new(OpenAiChatClient::new(
        key,
        &settings.openai_base_url,
        &generation.model,
        generation.temperature,
    )?))
}

fn load_classifier(rules: Option<&Path>) -> Result<QueryClassifier> {
    let table = match rules {
        Some(path) => RuleTable::load(path)
            .with_context(|| format!("Failed to load rules {}", path.display()))?,
        None => RuleTable::builtin()?,
    };
    Ok(QueryClassifier::new(table))
}

fn build_analyzer(
    settings: &Settings,
    rules: Option<&Path>,
    templates: Option<&Path>,
) -> Result<Analyzer> {
    let collaborators = Collaborators {
        fetcher: Arc::new(HttpFetcher::new()?),
        generator: build_generator(settings)?,
        embedder: build_embedder(settings)?,
        store: IndexStore::new(&settings.index_dir),
    };
    let mut analyzer = Analyzer::new(settings.analysis.clone(), collaborators)?
        .with_classifier(load_classifier(rules)?);
    if let Some(dir) = templates {
        analyzer = analyzer.with_templates(TemplateLibrary::with_overrides(dir)?);
    }
    Ok(analyzer)
}

async fn run_extract(settings: &Settings, source: &str, json: bool) -> Result<()> {
    let document = HttpFetcher::new()?
        .fetch(source)
        .await
        .with_context(|| format!("Failed to fetch {source}"))?;
    let extracted = build_analyzer(settings, None, None)?.extract(&document);
    if json {
        print_json(&extracted)
    } else {
        print!("{}", report::render_extract(&extracted));
        Ok(())
    }
}

#[derive(Serialize)]
struct ClassifyOutput<'a> {
    query: &'a str,
    category: Category,
    template: TemplateId,
}

fn run_classify(query: &str, rules: Option<&Path>, json: bool) -> Result<()> {
    let category = load_classifier(rules)?.classify(query);
    let output = ClassifyOutput {
        query,
        category,
        template: category.template(),
    };
    if json {
        print_json(&output)
    } else {
        println!("{} (template: {})", output.category, output.template);
        Ok(())
    }
}

async fn run_chunk(settings: &Settings, file: &Path, json: bool) -> Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let chunks: Vec<Chunk> =
        Chunker::new(settings.analysis.chunking)?.chunk(&file.display().to_string(), &text);
    if json {
        return print_json(&chunks);
    }
    println!("{}", ChunkingStats::of(&chunks));
    for chunk in &chunks {
        println!(
            "#{} [{}..{}) {} chars",
            chunk.sequence_index,
            chunk.char_start,
            chunk.char_end,
            chunk.char_len()
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct IndexOutput {
    fingerprint: ContentFingerprint,
    path: PathBuf,
    chunks: usize,
    model: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    hits: Vec<ScoredChunk>,
}

async fn run_index(
    settings: &Settings,
    sources: &[String],
    query: Option<&str>,
    json: bool,
) -> Result<()> {
    let analyzer = build_analyzer(settings, None, None)?;
    let fetcher = HttpFetcher::new()?;
    let mut texts = Vec::with_capacity(sources.len());
    for source in sources {
        let document = fetcher
            .fetch(source)
            .await
            .with_context(|| format!("Failed to fetch {source}"))?;
        let extracted = analyzer.extract(&document);
        texts.push((source.clone(), document_text(&extracted.records.records)));
    }

    texts.sort_unstable();
    let config = settings.analysis.chunking;
    let chunks = Chunker::new(config)?.chunk_documents(&texts);
    anyhow::ensure!(!chunks.is_empty(), "no text to index in the given sources");

    let embedder = build_embedder(settings)?;
    let fingerprint = ContentFingerprint::of(&texts, &config, embedder.model_id());
    let store = IndexStore::new(&settings.index_dir);
    let index = store
        .build_or_load(fingerprint.clone(), chunks, Arc::clone(&embedder))
        .await?;

    let hits = match query {
        Some(text) => {
            index
                .query(text, settings.analysis.retrieval.top_k, embedder.as_ref())
                .await?
        }
        None => Vec::new(),
    };
    let output = IndexOutput {
        path: store.index_path(&fingerprint),
        fingerprint,
        chunks: index.len(),
        model: index.model_id().to_string(),
        hits,
    };
    if json {
        return print_json(&output);
    }
    println!(
        "Index {} ({} chunks, {}) at {}",
        output.fingerprint.short(),
        output.chunks,
        output.model,
        output.path.display()
    );
    for (rank, hit) in output.hits.iter().enumerate() {
        println!(
            "{}. {} #{} (score: {:.3})",
            rank + 1,
            hit.chunk.source_label,
            hit.chunk.sequence_index,
            hit.score
        );
    }
    Ok(())
}

async fn run_analyze(
    settings: &Settings,
    query: &str,
    sources: &[String],
    rules: Option<&Path>,
    templates: Option<&Path>,
    json: bool,
) -> Result<()> {
    let analyzer = build_analyzer(settings, rules, templates)?;
    let report = analyzer.analyze(sources, query).await;
    if json {
        print_json(&report)
    } else {
        print!("{}", report::render_analysis(&report));
        Ok(())
    }
}
