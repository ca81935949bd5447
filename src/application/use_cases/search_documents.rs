use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::application::{EmbeddingService, VectorRepository};
use crate::domain::{DocumentChunk, DomainError, SearchQuery, SearchResult};

pub const DEFAULT_TOP_K: usize = 5;

/// Semantic retrieval over the stored chunks.
pub struct SearchDocumentsUseCase {
    vector_repo: Arc<dyn VectorRepository>,
    embedding_service: Arc<dyn EmbeddingService>,
}

impl SearchDocumentsUseCase {
    pub fn new(
        vector_repo: Arc<dyn VectorRepository>,
        embedding_service: Arc<dyn EmbeddingService>,
    ) -> Self {
        Self {
            vector_repo,
            embedding_service,
        }
    }

    pub async fn execute(&self, query: SearchQuery) -> Result<Vec<SearchResult>, DomainError> {
        if query.query().trim().is_empty() {
            return Err(DomainError::invalid_input("Query must not be empty"));
        }

        debug!("Searching with {}", query.summary());
        let start_time = Instant::now();

        let query_embedding = self.embedding_service.embed_query(query.query()).await?;
        let results = self.vector_repo.search(&query_embedding, &query).await?;

        info!(
            "Found {} results in {:.2}s",
            results.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(results)
    }

    /// The `top_k` most similar chunks.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<DocumentChunk>, DomainError> {
        Ok(self
            .retrieve_with_scores(query, top_k)
            .await?
            .into_iter()
            .map(SearchResult::into_chunk)
            .collect())
    }

    pub async fn retrieve_with_scores(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        self.execute(SearchQuery::new(query).with_limit(top_k)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{InMemoryVectorRepository, MockEmbedding};
    use crate::domain::Embedding;

    // Chunks embedded with their own content, so a query equal to a chunk's
    // content finds that chunk with similarity 1.
    async fn seeded() -> SearchDocumentsUseCase {
        let embedding = Arc::new(MockEmbedding::with_dimensions(64));
        let repo = Arc::new(InMemoryVectorRepository::new());

        let chunks: Vec<DocumentChunk> = ["alpha report", "beta summary", "gamma notes"]
            .iter()
            .enumerate()
            .map(|(i, text)| {
                DocumentChunk::new("doc.pdf".to_string(), Some(1), i as u32, text.to_string())
            })
            .collect();
        let mut embeddings = Vec::new();
        for chunk in &chunks {
            let vector = embedding.embed_query(chunk.content()).await.unwrap();
            embeddings.push(Embedding::new(
                chunk.id().to_string(),
                vector,
                "mock".to_string(),
            ));
        }
        repo.save_batch(&chunks, &embeddings).await.unwrap();

        SearchDocumentsUseCase::new(repo, embedding)
    }

    #[tokio::test]
    async fn test_retrieve_returns_closest_first() {
        let search = seeded().await;

        let chunks = search.retrieve("beta summary", 2).await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content(), "beta summary");

        let scored = search.retrieve_with_scores("gamma notes", 3).await.unwrap();
        assert_eq!(scored.len(), 3);
        assert!((scored[0].score() - 1.0).abs() < 1e-4);
        assert!(scored[0].score() >= scored[1].score());
        assert!(scored[1].score() >= scored[2].score());
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let search = seeded().await;
        let err = search.retrieve("  ", DEFAULT_TOP_K).await.unwrap_err();
        assert!(err.is_invalid_input());
    }
}
