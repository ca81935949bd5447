use serde::{Deserialize, Serialize};

/// Represents a vector embedding for a document chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    chunk_id: String,
    vector: Vec<f32>,
    model: String,
}

impl Embedding {
    pub fn new(chunk_id: String, vector: Vec<f32>, model: String) -> Self {
        Self {
            chunk_id,
            vector,
            model,
        }
    }

    pub fn chunk_id(&self) -> &str {
        &self.chunk_id
    }

    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }
}

/// Configuration for the embedding model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    model_name: String,
    dimensions: usize,
    max_sequence_length: usize,
}

impl EmbeddingConfig {
    pub fn new(model_name: String, dimensions: usize, max_sequence_length: usize) -> Self {
        Self {
            model_name,
            dimensions,
            max_sequence_length,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn max_sequence_length(&self) -> usize {
        self.max_sequence_length
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_name: "mock-embedding".to_string(),
            dimensions: 384,
            max_sequence_length: 512,
        }
    }
}
