//! HTTP implementations of the pipeline collaborators. No retries: a failed request is
//! reported once and the pipeline records it.

use anyhow::{Context as AnyhowContext, Result};
use async_trait::async_trait;
use marketlens_analysis::{DocumentFetcher, FetchError, GenerationError, GenerationService};
use marketlens_extractor::RawDocument;
use marketlens_vector_store::{EmbeddingProvider, VectorStoreError};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) marketlens";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const MODEL_TIMEOUT: Duration = Duration::from_secs(60);

/// Fetches `http(s)://` sources over the network and reads anything else as a local file.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, source: &str) -> Result<RawDocument, FetchError> {
        if !is_url(source) {
            let body = tokio::fs::read_to_string(source).await?;
            return Ok(RawDocument::new(source, body));
        }

        let transport = |err: reqwest::Error| FetchError::Transport {
            source_id: source.to_string(),
            message: err.to_string(),
        };
        let resp = self
            .client
            .get(source)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await
            .map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                source_id: source.to_string(),
                status: status.as_u16(),
            });
        }
        let body = resp.text().await.map_err(transport)?;
        log::debug!("fetched {} bytes from {source}", body.len());
        Ok(RawDocument::new(source, body))
    }
}

fn bearer_headers(api_key: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let auth = format!("Bearer {}", api_key.trim());
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&auth).context("invalid OpenAI API key")?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

fn model_client(api_key: &str) -> Result<Client> {
    anyhow::ensure!(!api_key.trim().is_empty(), "missing OpenAI API key");
    Client::builder()
        .timeout(MODEL_TIMEOUT)
        .default_headers(bearer_headers(api_key)?)
        .build()
        .context("failed to build OpenAI HTTP client")
}

/// Chat completions against an OpenAI-compatible endpoint.
pub struct OpenAiChatClient {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl OpenAiChatClient {
    pub fn new(api_key: &str, base_url: &str, model: &str, temperature: f32) -> Result<Self> {
        anyhow::ensure!(!model.trim().is_empty(), "missing OpenAI model name");
        Ok(Self {
            client: model_client(api_key)?,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.to_string(),
            temperature,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl GenerationService for OpenAiChatClient {
    async fn generate(
        &self,
        system_prompt: &str,
        user_content: &str,
    ) -> Result<String, GenerationError> {
        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
        };
        let request = |err: reqwest::Error| GenerationError::Request(err.to_string());
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(request)?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(GenerationError::Request(format!("{status}: {text}")));
        }
        let parsed: ChatResponse = resp.json().await.map_err(request)?;
        parsed
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)
    }
}

/// Stands in when no API key is configured; every call fails with a clear message.
pub struct UnconfiguredGenerator;

#[async_trait]
impl GenerationService for UnconfiguredGenerator {
    async fn generate(&self, _: &str, _: &str) -> Result<String, GenerationError> {
        Err(GenerationError::NotConfigured(
            "set OPENAI_API_KEY to enable generation".to_string(),
        ))
    }
}

/// Embeddings against an OpenAI-compatible endpoint.
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimension: usize,
}

impl OpenAiEmbedder {
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Result<Self> {
        anyhow::ensure!(!model.trim().is_empty(), "missing OpenAI embedding model name");
        Ok(Self {
            client: model_client(api_key)?,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.to_string(),
            dimension: model_dimension(model),
        })
    }
}

/// Output width of the known OpenAI embedding models.
#[must_use]
pub fn model_dimension(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => 1536,
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingEntry>,
}

#[derive(Deserialize)]
struct EmbeddingEntry {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(
        &self,
        texts: &[String],
    ) -> marketlens_vector_store::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let embedding = |err: reqwest::Error| VectorStoreError::embedding(err.to_string());
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(embedding)?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(VectorStoreError::embedding(format!(
                "embeddings request failed ({status}): {text}"
            )));
        }
        let mut parsed: EmbeddingResponse = resp.json().await.map_err(embedding)?;
        parsed.data.sort_by_key(|entry| entry.index);
        Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
    }
}
