use serde::{Deserialize, Serialize};

use crate::domain::{format_file_size, DomainError};

const MB: u64 = 1024 * 1024;

/// Document formats accepted for upload and ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Csv,
    Xlsx,
}

impl FileType {
    pub const ALL: [FileType; 3] = [FileType::Pdf, FileType::Csv, FileType::Xlsx];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Csv => "csv",
            FileType::Xlsx => "xlsx",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(FileType::Pdf),
            "csv" => Some(FileType::Csv),
            "xlsx" => Some(FileType::Xlsx),
            _ => None,
        }
    }

    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Maps a MIME type to the extractor that understands it.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.content_types().contains(&content_type))
    }

    pub fn content_types(&self) -> &'static [&'static str] {
        match self {
            FileType::Pdf => &["application/pdf"],
            FileType::Csv => &["text/csv", "application/csv"],
            FileType::Xlsx => &[
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                "application/vnd.ms-excel",
            ],
        }
    }

    /// Canonical MIME type, used when ingesting files from disk.
    pub fn default_content_type(&self) -> &'static str {
        self.content_types()[0]
    }

    pub fn max_size(&self) -> u64 {
        match self {
            FileType::Pdf => 20 * MB,
            FileType::Csv => 10 * MB,
            FileType::Xlsx => 15 * MB,
        }
    }

    pub fn allowed_list() -> String {
        let names: Vec<String> = Self::ALL
            .iter()
            .map(|t| format!("'{}'", t.as_str()))
            .collect();
        format!("[{}]", names.join(", "))
    }

    /// Checks the extension of `filename` against the allow-list and the
    /// declared MIME type against that extension.
    pub fn validate(filename: &str, content_type: &str) -> Result<Self, DomainError> {
        let ext = match filename.rsplit_once('.') {
            Some((_, ext)) => ext.to_lowercase(),
            None => return Err(DomainError::invalid_input("File must have an extension")),
        };

        let file_type = Self::from_extension(&ext).ok_or_else(|| {
            DomainError::invalid_input(format!(
                "File type '.{}' not allowed. Allowed types: {}",
                ext,
                Self::allowed_list()
            ))
        })?;

        if !file_type.content_types().contains(&content_type) {
            return Err(DomainError::invalid_input(format!(
                "Invalid content type '{}' for file type '{}'",
                content_type, ext
            )));
        }

        Ok(file_type)
    }

    pub fn validate_size(&self, size: u64) -> Result<(), DomainError> {
        let max = self.max_size();
        if size > max {
            return Err(DomainError::invalid_input(format!(
                "File size ({}) exceeds maximum allowed size ({}) for {} files",
                format_file_size(size),
                format_file_size(max),
                self.as_str()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
