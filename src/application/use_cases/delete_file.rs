use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::list_files::file_not_found;
use crate::application::{FileRepository, VectorRepository};
use crate::domain::{format_file_size, DomainError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteDetails {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_freed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteReport {
    pub message: String,
    pub details: DeleteDetails,
}

/// Removes an uploaded file from disk, from the registry and from the vector store.
pub struct DeleteFileUseCase {
    file_repo: Arc<dyn FileRepository>,
    vector_repo: Arc<dyn VectorRepository>,
}

impl DeleteFileUseCase {
    pub fn new(file_repo: Arc<dyn FileRepository>, vector_repo: Arc<dyn VectorRepository>) -> Self {
        Self {
            file_repo,
            vector_repo,
        }
    }

    pub async fn execute(&self, id: u64) -> Result<DeleteReport, DomainError> {
        let record = self
            .file_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| file_not_found(id))?;

        let path = Path::new(record.file_path());
        let physical = !record.file_path().is_empty() && tokio::fs::try_exists(path).await?;

        let details = if physical {
            let size = tokio::fs::metadata(path).await?.len();
            tokio::fs::remove_file(path).await.map_err(|e| {
                error!("Error deleting file {}: {}", path.display(), e);
                DomainError::internal(format!("Error deleting physical file: {}", e))
            })?;
            info!("Physical file deleted: {}", path.display());

            DeleteDetails {
                filename: record.filename().to_string(),
                size_freed: Some(format_file_size(size)),
                note: None,
            }
        } else {
            warn!(
                "No physical file found for ID {}, removed from database only",
                id
            );
            DeleteDetails {
                filename: record.filename().to_string(),
                size_freed: None,
                note: Some("No physical file was found".to_string()),
            }
        };

        let removed_chunks = self.vector_repo.delete_by_file_id(id).await?;
        if removed_chunks > 0 {
            info!("Removed {} chunks for file {}", removed_chunks, id);
        }
        self.file_repo.delete(id).await?;

        let message = if physical {
            format!("File {} deleted successfully", id)
        } else {
            format!("File {} record deleted successfully", id)
        };

        Ok(DeleteReport { message, details })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::UploadFileUseCase;
    use crate::connector::{InMemoryFileRepository, InMemoryVectorRepository};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        upload: UploadFileUseCase,
        delete: DeleteFileUseCase,
        file_repo: Arc<InMemoryFileRepository>,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let file_repo = Arc::new(InMemoryFileRepository::new());
        let vector_repo = Arc::new(InMemoryVectorRepository::new());
        Fixture {
            upload: UploadFileUseCase::new(file_repo.clone(), dir.path()),
            delete: DeleteFileUseCase::new(file_repo.clone(), vector_repo),
            file_repo,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn test_delete_removes_physical_file() {
        let f = fixture();
        let record = f
            .upload
            .execute("data.csv", "text/csv", b"a,b\n1,2\n")
            .await
            .unwrap();

        let report = f.delete.execute(record.id()).await.unwrap();

        assert_eq!(report.message, "File 1 deleted successfully");
        assert_eq!(report.details.filename, "data.csv");
        assert_eq!(report.details.size_freed.as_deref(), Some("8 B"));
        assert!(!Path::new(record.file_path()).exists());
        assert!(f.file_repo.find_by_id(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_without_physical_file() {
        let f = fixture();
        let record = f
            .upload
            .execute("data.csv", "text/csv", b"a,b\n")
            .await
            .unwrap();
        std::fs::remove_file(record.file_path()).unwrap();

        let report = f.delete.execute(record.id()).await.unwrap();

        assert_eq!(report.message, "File 1 record deleted successfully");
        assert_eq!(
            report.details.note.as_deref(),
            Some("No physical file was found")
        );
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["details"].get("size_freed").is_none());
    }

    #[tokio::test]
    async fn test_delete_unknown_id() {
        let f = fixture();
        let err = f.delete.execute(42).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.detail(), "File with ID 42 not found");
    }
}
