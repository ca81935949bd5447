use async_trait::async_trait;

use crate::domain::{DomainError, FileType};

/// Turns the raw bytes of an uploaded file into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, file_type: FileType, bytes: &[u8]) -> Result<String, DomainError>;
}
