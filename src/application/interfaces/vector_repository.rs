use async_trait::async_trait;

use crate::domain::{
    ChunkOwner, DocumentChunk, DomainError, Embedding, SearchQuery, SearchResult,
};

/// Vector storage and similarity search operations.
#[async_trait]
pub trait VectorRepository: Send + Sync {
    /// Upserts chunks with their embeddings. Both slices must line up.
    async fn save_batch(
        &self,
        chunks: &[DocumentChunk],
        embeddings: &[Embedding],
    ) -> Result<(), DomainError>;

    /// Removes every chunk of `owners` and stores the new batch in one unit.
    /// On error the previously stored chunks are left in place. Returns the
    /// number of chunks removed.
    async fn replace(
        &self,
        owners: &[ChunkOwner],
        chunks: &[DocumentChunk],
        embeddings: &[Embedding],
    ) -> Result<u64, DomainError>;

    /// Deletes chunks ingested from a path under this name. Chunks of uploaded
    /// files (those with a file id) are never touched. Returns the number of
    /// chunks deleted.
    async fn delete_by_file_name(&self, file_name: &str) -> Result<u64, DomainError>;

    async fn delete_by_file_id(&self, file_id: u64) -> Result<u64, DomainError>;

    /// Results are ordered by descending cosine similarity.
    async fn search(
        &self,
        query_embedding: &[f32],
        query: &SearchQuery,
    ) -> Result<Vec<SearchResult>, DomainError>;

    async fn count(&self) -> Result<u64, DomainError>;
}
