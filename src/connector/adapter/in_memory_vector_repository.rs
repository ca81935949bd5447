use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::VectorRepository;
use crate::domain::{
    ChunkOwner, DocumentChunk, DomainError, Embedding, SearchQuery, SearchResult,
};

pub struct InMemoryVectorRepository {
    chunks: Arc<Mutex<HashMap<String, DocumentChunk>>>,
    embeddings: Arc<Mutex<HashMap<String, Embedding>>>,
}

impl InMemoryVectorRepository {
    pub fn new() -> Self {
        Self {
            chunks: Arc::new(Mutex::new(HashMap::new())),
            embeddings: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn delete_matching<F>(&self, predicate: F) -> u64
    where
        F: Fn(&DocumentChunk) -> bool,
    {
        let mut chunk_store = self.chunks.lock().await;
        let mut embedding_store = self.embeddings.lock().await;
        remove_matching(&mut chunk_store, &mut embedding_store, predicate)
    }
}

fn check_batch(chunks: &[DocumentChunk], embeddings: &[Embedding]) -> Result<(), DomainError> {
    if chunks.len() != embeddings.len() {
        return Err(DomainError::invalid_input(
            "Chunk and embedding count mismatch".to_string(),
        ));
    }
    Ok(())
}

fn remove_matching<F>(
    chunk_store: &mut HashMap<String, DocumentChunk>,
    embedding_store: &mut HashMap<String, Embedding>,
    predicate: F,
) -> u64
where
    F: Fn(&DocumentChunk) -> bool,
{
    let ids: Vec<String> = chunk_store
        .values()
        .filter(|chunk| predicate(chunk))
        .map(|chunk| chunk.id().to_string())
        .collect();

    for id in &ids {
        chunk_store.remove(id);
        embedding_store.remove(id);
    }
    ids.len() as u64
}

fn insert_batch(
    chunk_store: &mut HashMap<String, DocumentChunk>,
    embedding_store: &mut HashMap<String, Embedding>,
    chunks: &[DocumentChunk],
    embeddings: &[Embedding],
) {
    for chunk in chunks {
        chunk_store.insert(chunk.id().to_string(), chunk.clone());
    }
    for embedding in embeddings {
        embedding_store.insert(embedding.chunk_id().to_string(), embedding.clone());
    }
}

impl Default for InMemoryVectorRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorRepository for InMemoryVectorRepository {
    async fn save_batch(
        &self,
        chunks: &[DocumentChunk],
        embeddings: &[Embedding],
    ) -> Result<(), DomainError> {
        check_batch(chunks, embeddings)?;

        let mut chunk_store = self.chunks.lock().await;
        let mut embedding_store = self.embeddings.lock().await;
        insert_batch(&mut chunk_store, &mut embedding_store, chunks, embeddings);

        debug!(
            "Saved {} chunks and {} embeddings to memory",
            chunks.len(),
            embeddings.len()
        );
        Ok(())
    }

    async fn replace(
        &self,
        owners: &[ChunkOwner],
        chunks: &[DocumentChunk],
        embeddings: &[Embedding],
    ) -> Result<u64, DomainError> {
        check_batch(chunks, embeddings)?;

        let mut chunk_store = self.chunks.lock().await;
        let mut embedding_store = self.embeddings.lock().await;
        let removed = remove_matching(&mut chunk_store, &mut embedding_store, |chunk| {
            owners.iter().any(|owner| owner.owns(chunk))
        });
        insert_batch(&mut chunk_store, &mut embedding_store, chunks, embeddings);

        debug!("Replaced {} chunks with {} in memory", removed, chunks.len());
        Ok(removed)
    }

    async fn delete_by_file_name(&self, file_name: &str) -> Result<u64, DomainError> {
        let owner = ChunkOwner::Path(file_name.to_string());
        Ok(self.delete_matching(|chunk| owner.owns(chunk)).await)
    }

    async fn delete_by_file_id(&self, file_id: u64) -> Result<u64, DomainError> {
        Ok(self
            .delete_matching(|chunk| chunk.file_id() == Some(file_id))
            .await)
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        query: &SearchQuery,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let mut scored: Vec<(String, f32)> = {
            let embeddings = self.embeddings.lock().await;
            embeddings
                .values()
                .filter(|embedding| embedding.dimensions() == query_embedding.len())
                .map(|embedding| {
                    let score = cosine_similarity(query_embedding, embedding.vector());
                    (embedding.chunk_id().to_string(), score)
                })
                .collect()
        };

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        let chunk_store = self.chunks.lock().await;
        let mut results = Vec::new();

        for (chunk_id, score) in scored {
            if results.len() >= query.limit() {
                break;
            }

            if let Some(min_score) = query.min_score() {
                if score < min_score {
                    continue;
                }
            }

            let chunk = match chunk_store.get(&chunk_id) {
                Some(chunk) => chunk,
                None => continue,
            };

            if !query.accepts(chunk) {
                continue;
            }

            results.push(SearchResult::new(chunk.clone(), score));
        }

        Ok(results)
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let chunks = self.chunks.lock().await;
        Ok(chunks.len() as u64)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
