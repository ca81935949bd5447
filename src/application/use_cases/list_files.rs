use std::sync::Arc;

use crate::application::FileRepository;
use crate::domain::{DomainError, FileRecord};

pub struct ListFilesUseCase {
    file_repo: Arc<dyn FileRepository>,
}

impl ListFilesUseCase {
    pub fn new(file_repo: Arc<dyn FileRepository>) -> Self {
        Self { file_repo }
    }

    pub async fn execute(&self) -> Result<Vec<FileRecord>, DomainError> {
        self.file_repo.list().await
    }

    pub async fn get(&self, id: u64) -> Result<FileRecord, DomainError> {
        self.file_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| file_not_found(id))
    }
}

pub(crate) fn file_not_found(id: u64) -> DomainError {
    DomainError::not_found(format!("File with ID {} not found", id))
}
