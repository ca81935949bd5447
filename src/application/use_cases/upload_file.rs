use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

use crate::application::FileRepository;
use crate::domain::{DomainError, FileRecord, FileType};

/// Validates an upload, stores it under the upload directory and registers it.
pub struct UploadFileUseCase {
    file_repo: Arc<dyn FileRepository>,
    upload_dir: PathBuf,
}

impl UploadFileUseCase {
    pub fn new(file_repo: Arc<dyn FileRepository>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            file_repo,
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub async fn execute(
        &self,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<FileRecord, DomainError> {
        let result = self.store(filename, content_type, bytes).await;
        if let Err(ref e) = result {
            error!("Upload failed: {}", e);
        }
        result
    }

    async fn store(
        &self,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<FileRecord, DomainError> {
        let filename = sanitize_filename(filename)?;
        let file_type = FileType::validate(&filename, content_type)?;

        let size = bytes.len() as u64;
        file_type.validate_size(size)?;

        tokio::fs::create_dir_all(&self.upload_dir).await?;

        let id = self.file_repo.next_id().await?;
        let file_path = self.write_new_file(id, &filename, bytes).await?;

        let record = FileRecord::new(
            id,
            filename,
            file_type,
            content_type.to_string(),
            size,
            file_path.to_string_lossy().to_string(),
        );
        self.file_repo.save(&record).await?;

        info!("File uploaded successfully: {}", file_path.display());
        Ok(record)
    }

    /// Writes `{timestamp}_{filename}`, or `{timestamp}_{id}_{filename}` when
    /// that name is already taken. Existing files are never overwritten.
    async fn write_new_file(
        &self,
        id: u64,
        filename: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, DomainError> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let candidates = [
            self.upload_dir.join(format!("{}_{}", timestamp, filename)),
            self.upload_dir.join(format!("{}_{}_{}", timestamp, id, filename)),
        ];

        for path in candidates {
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(mut file) => {
                    file.write_all(bytes).await?;
                    file.flush().await?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("{} already exists", path.display());
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(DomainError::internal(format!(
            "Could not find a free file name for {}",
            filename
        )))
    }
}

/// Drops any directory components a client sent along with the name.
fn sanitize_filename(filename: &str) -> Result<String, DomainError> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        return Err(DomainError::invalid_input("No file provided"));
    }
    Ok(name.to_string())
}
