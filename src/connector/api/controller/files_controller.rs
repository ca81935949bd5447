use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::domain::{FileRecord, FileType};

use super::super::Container;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

pub struct FilesController<'a> {
    container: &'a Container,
}

impl<'a> FilesController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn list(&self) -> Result<String> {
        let files = self.container.list_use_case().execute().await?;
        Ok(format_file_list(&files))
    }

    pub async fn show(&self, id: u64) -> Result<String> {
        let record = self.container.list_use_case().get(id).await?;
        Ok(serde_json::to_string_pretty(&record.to_response())?)
    }

    /// Registers a local file through the same validation as an HTTP upload.
    pub async fn upload(&self, path: PathBuf, content_type: Option<String>) -> Result<String> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let content_type = content_type.unwrap_or_else(|| {
            FileType::from_path(&path)
                .map(|t| t.default_content_type())
                .unwrap_or(FALLBACK_CONTENT_TYPE)
                .to_string()
        });

        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let record = self
            .container
            .upload_use_case()
            .execute(&filename, &content_type, &bytes)
            .await?;

        Ok(format!(
            "Uploaded {} as file {} ({})",
            record.filename(),
            record.id(),
            record.size_formatted()
        ))
    }

    pub async fn process(&self, id: u64) -> Result<String> {
        let record = self.container.ingest_use_case().ingest_file(id).await?;
        Ok(format!(
            "Processed file {} ({}) into {} chunks",
            record.id(),
            record.filename(),
            record.chunk_count()
        ))
    }

    pub async fn delete(&self, id: u64) -> Result<String> {
        let report = self.container.delete_use_case().execute(id).await?;

        let mut output = report.message;
        if let Some(size) = report.details.size_freed {
            output.push_str(&format!(" ({} freed)", size));
        }
        if let Some(note) = report.details.note {
            output.push_str(&format!("\nNote: {}", note));
        }
        Ok(output)
    }
}

fn format_file_list(files: &[FileRecord]) -> String {
    if files.is_empty() {
        return "No files uploaded.".to_string();
    }

    let mut output = format!("Uploaded files ({}):\n\n", files.len());
    for file in files {
        output.push_str(&format!(
            "  [{}] {} ({}, {}) {} chunks, {}\n",
            file.id(),
            file.filename(),
            file.file_type(),
            file.size_formatted(),
            file.chunk_count(),
            file.status()
        ));
        if let Some(message) = file.error_message() {
            output.push_str(&format!("      error: {}\n", message));
        }
    }
    output
}
