use async_trait::async_trait;

use crate::domain::{DocumentChunk, DomainError, Embedding, EmbeddingConfig};

/// Generates vector embeddings from document chunks and queries.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed_chunks(&self, chunks: &[DocumentChunk]) -> Result<Vec<Embedding>, DomainError>;

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError>;

    fn config(&self) -> &EmbeddingConfig;
}
