use async_trait::async_trait;

use crate::domain::{DomainError, FileRecord};

/// Registry of uploaded files.
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Allocates the next file id. Ids increase monotonically and are never
    /// handed out twice, even after deletes.
    async fn next_id(&self) -> Result<u64, DomainError>;

    /// Inserts or replaces the record with the same id.
    async fn save(&self, record: &FileRecord) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: u64) -> Result<Option<FileRecord>, DomainError>;

    /// All records ordered by id.
    async fn list(&self) -> Result<Vec<FileRecord>, DomainError>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: u64) -> Result<bool, DomainError>;
}
