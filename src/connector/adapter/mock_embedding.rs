use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::application::EmbeddingService;
use crate::domain::{DocumentChunk, DomainError, Embedding, EmbeddingConfig};

const MOCK_MODEL: &str = "mock-embedding";
const MOCK_DIMENSIONS: usize = 384;

/// Offline embeddings: a seeded random unit vector per distinct text.
///
/// The seed is a SHA-256 of the text, so vectors stay identical across runs
/// and builds and can be persisted next to real ones of another model.
pub struct MockEmbedding {
    config: EmbeddingConfig,
}

impl MockEmbedding {
    pub fn new() -> Self {
        Self::with_dimensions(MOCK_DIMENSIONS)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            config: EmbeddingConfig::new(MOCK_MODEL.to_string(), dimensions, 512),
        }
    }
}

fn seeded_unit_vector(text: &str, dimensions: usize) -> Vec<f32> {
    let digest = Sha256::digest(text.as_bytes());
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest);

    let mut rng = StdRng::from_seed(seed);
    let mut vector: Vec<f32> = (0..dimensions).map(|_| rng.gen_range(-1.0..1.0)).collect();

    let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        vector.iter_mut().for_each(|x| *x /= magnitude);
    }
    vector
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingService for MockEmbedding {
    async fn embed_chunks(&self, chunks: &[DocumentChunk]) -> Result<Vec<Embedding>, DomainError> {
        let results: Vec<Embedding> = chunks
            .iter()
            .map(|chunk| {
                Embedding::new(
                    chunk.id().to_string(),
                    seeded_unit_vector(chunk.content(), self.config.dimensions()),
                    self.config.model_name().to_string(),
                )
            })
            .collect();

        debug!("Generated {} mock embeddings", results.len());

        Ok(results)
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError> {
        Ok(seeded_unit_vector(query, self.config.dimensions()))
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}
