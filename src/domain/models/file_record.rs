use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FileType;
use crate::domain::format_file_size;

/// Lifecycle of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    #[default]
    Uploaded,
    Processing,
    Processed,
    Failed,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Uploaded => "uploaded",
            FileStatus::Processing => "processing",
            FileStatus::Processed => "processed",
            FileStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "processing" => FileStatus::Processing,
            "processed" => FileStatus::Processed,
            "failed" => FileStatus::Failed,
            _ => FileStatus::Uploaded,
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A file registered through the upload endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    id: u64,
    filename: String,
    file_type: FileType,
    content_type: String,
    size: u64,
    upload_time: DateTime<Utc>,
    status: FileStatus,
    file_path: String,
    error_message: Option<String>,
    chunk_count: u64,
}

impl FileRecord {
    pub fn new(
        id: u64,
        filename: String,
        file_type: FileType,
        content_type: String,
        size: u64,
        file_path: String,
    ) -> Self {
        Self {
            id,
            filename,
            file_type,
            content_type,
            size,
            upload_time: Utc::now(),
            status: FileStatus::Uploaded,
            file_path,
            error_message: None,
            chunk_count: 0,
        }
    }

    /// Reconstitutes from persisted data (used by adapters).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: u64,
        filename: String,
        file_type: FileType,
        content_type: String,
        size: u64,
        upload_time: DateTime<Utc>,
        status: FileStatus,
        file_path: String,
        error_message: Option<String>,
        chunk_count: u64,
    ) -> Self {
        Self {
            id,
            filename,
            file_type,
            content_type,
            size,
            upload_time,
            status,
            file_path,
            error_message,
            chunk_count,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn size_formatted(&self) -> String {
        format_file_size(self.size)
    }

    pub fn upload_time(&self) -> DateTime<Utc> {
        self.upload_time
    }

    pub fn status(&self) -> FileStatus {
        self.status
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn chunk_count(&self) -> u64 {
        self.chunk_count
    }

    pub fn mark_processing(&mut self) {
        self.status = FileStatus::Processing;
        self.error_message = None;
    }

    pub fn mark_processed(&mut self, chunk_count: u64) {
        self.status = FileStatus::Processed;
        self.chunk_count = chunk_count;
        self.error_message = None;
    }

    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.status = FileStatus::Failed;
        self.error_message = Some(message.into());
    }

    pub fn to_response(&self) -> FileResponse {
        FileResponse::from(self)
    }
}

/// Wire representation of a [`FileRecord`]. The on-disk path stays server side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResponse {
    pub id: u64,
    pub filename: String,
    pub file_type: String,
    pub content_type: String,
    pub size: u64,
    pub size_formatted: String,
    pub upload_time: DateTime<Utc>,
    pub status: FileStatus,
    pub error_message: Option<String>,
    pub chunk_count: u64,
}

impl From<&FileRecord> for FileResponse {
    fn from(record: &FileRecord) -> Self {
        Self {
            id: record.id,
            filename: record.filename.clone(),
            file_type: record.file_type.as_str().to_string(),
            content_type: record.content_type.clone(),
            size: record.size,
            size_formatted: record.size_formatted(),
            upload_time: record.upload_time,
            status: record.status,
            error_message: record.error_message.clone(),
            chunk_count: record.chunk_count,
        }
    }
}
