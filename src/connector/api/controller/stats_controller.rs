use anyhow::Result;

use crate::domain::FileStatus;

use super::super::Container;

pub struct StatsController<'a> {
    container: &'a Container,
}

impl<'a> StatsController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn stats(&self) -> Result<String> {
        let files = self.container.list_use_case().execute().await?;
        let chunks = self.container.vector_repo().count().await?;

        let processed = files
            .iter()
            .filter(|f| f.status() == FileStatus::Processed)
            .count();
        let failed = files
            .iter()
            .filter(|f| f.status() == FileStatus::Failed)
            .count();

        Ok(format!(
            "RagOps Statistics\n=================\nFiles:        {} ({} processed, {} failed)\nTotal Chunks: {}\nCollection:   {}\nEmbeddings:   {}\nVector Store: {}\nUploads:      {}",
            files.len(),
            processed,
            failed,
            chunks,
            self.container.collection(),
            self.container.embedding_model(),
            self.container.storage(),
            self.container.upload_dir()
        ))
    }
}
