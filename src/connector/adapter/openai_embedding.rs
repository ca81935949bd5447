use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::openai_chat_client::DEFAULT_BASE_URL;
use crate::application::EmbeddingService;
use crate::domain::{DocumentChunk, DomainError, Embedding, EmbeddingConfig};

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
const EMBEDDINGS_PATH: &str = "/v1/embeddings";
const ADA_DIMENSIONS: usize = 1536;
const ADA_MAX_TOKENS: usize = 8191;
/// Inputs sent per request.
const BATCH_SIZE: usize = 64;

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct ApiResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Embeddings from an OpenAI-compatible `/v1/embeddings` endpoint.
pub struct OpenAiEmbedding {
    client: reqwest::Client,
    api_key: String,
    url: String,
    config: EmbeddingConfig,
}

impl OpenAiEmbedding {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let base: String = base_url.into();
        let url = format!("{}{}", base.trim_end_matches('/'), EMBEDDINGS_PATH);
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            url,
            config: EmbeddingConfig::new(model.into(), ADA_DIMENSIONS, ADA_MAX_TOKENS),
        }
    }

    /// Reads `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `OPENAI_EMBEDDING_MODEL`.
    /// Returns `None` without an API key.
    pub fn from_env() -> Option<Self> {
        let key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty())?;
        let base =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("OPENAI_EMBEDDING_MODEL")
            .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string());
        Some(Self::new(key, model, base))
    }

    async fn embed_texts(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, DomainError> {
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(BATCH_SIZE) {
            let request = ApiRequest {
                model: self.config.model_name(),
                input: batch,
            };

            let response = self
                .client
                .post(&self.url)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| DomainError::embedding(format!("request failed: {e}")))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!("Embedding API returned {status}: {body}");
                return Err(DomainError::embedding(format!("API returned {status}")));
            }

            let mut api_response: ApiResponse = response
                .json()
                .await
                .map_err(|e| DomainError::embedding(format!("failed to parse response: {e}")))?;

            if api_response.data.len() != batch.len() {
                return Err(DomainError::embedding(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    api_response.data.len()
                )));
            }
            api_response.data.sort_by_key(|d| d.index);
            vectors.extend(api_response.data.into_iter().map(|d| d.embedding));
        }

        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingService for OpenAiEmbedding {
    async fn embed_chunks(&self, chunks: &[DocumentChunk]) -> Result<Vec<Embedding>, DomainError> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content()).collect();
        let vectors = self.embed_texts(&texts).await?;
        debug!("Embedded {} chunks with {}", chunks.len(), self.config.model_name());

        Ok(chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| {
                Embedding::new(
                    chunk.id().to_string(),
                    vector,
                    self.config.model_name().to_string(),
                )
            })
            .collect())
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError> {
        self.embed_texts(&[query])
            .await?
            .pop()
            .ok_or_else(|| DomainError::embedding("no embedding returned for query"))
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}
