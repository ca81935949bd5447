use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::list_files::file_not_found;
use crate::application::{EmbeddingService, FileRepository, TextExtractor, VectorRepository};
use crate::domain::{
    ChunkOwner, Document, DomainError, FileRecord, FileType, RecursiveCharacterTextSplitter,
};

/// Outcome of ingesting files from disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub files: u64,
    pub documents: u64,
    pub chunks: u64,
    pub skipped: u64,
}

/// Extracts, splits, embeds and stores documents.
pub struct IngestDocumentsUseCase {
    file_repo: Arc<dyn FileRepository>,
    vector_repo: Arc<dyn VectorRepository>,
    embedding_service: Arc<dyn EmbeddingService>,
    extractor: Arc<dyn TextExtractor>,
    splitter: RecursiveCharacterTextSplitter,
}

impl IngestDocumentsUseCase {
    pub fn new(
        file_repo: Arc<dyn FileRepository>,
        vector_repo: Arc<dyn VectorRepository>,
        embedding_service: Arc<dyn EmbeddingService>,
        extractor: Arc<dyn TextExtractor>,
        splitter: RecursiveCharacterTextSplitter,
    ) -> Self {
        Self {
            file_repo,
            vector_repo,
            embedding_service,
            extractor,
            splitter,
        }
    }

    /// Ingests a previously uploaded file and records the outcome on it.
    pub async fn ingest_file(&self, id: u64) -> Result<FileRecord, DomainError> {
        let mut record = self
            .file_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| file_not_found(id))?;

        record.mark_processing();
        self.file_repo.save(&record).await?;

        match self.process_record(&record).await {
            Ok(chunks) => {
                record.mark_processed(chunks);
                self.file_repo.save(&record).await?;
                info!("Processed file {} into {} chunks", id, chunks);
                Ok(record)
            }
            Err(e) => {
                warn!("Processing file {} failed: {}", id, e);
                record.mark_failed(e.detail());
                self.file_repo.save(&record).await?;
                Err(e)
            }
        }
    }

    async fn process_record(&self, record: &FileRecord) -> Result<u64, DomainError> {
        let file_type = FileType::from_content_type(record.content_type()).ok_or_else(|| {
            DomainError::extraction(format!(
                "Unsupported content type '{}'",
                record.content_type()
            ))
        })?;

        let bytes = tokio::fs::read(record.file_path()).await?;
        let text = self.extractor.extract(file_type, &bytes).await?;

        let document = Document::new(text, record.filename()).with_file_id(record.id());
        let chunks = self.ingest_documents(&[document]).await?;
        if chunks == 0 {
            return Err(DomainError::extraction(format!(
                "No text could be extracted from {}",
                record.filename()
            )));
        }
        Ok(chunks)
    }

    /// Walks files and directories, extracting every supported file concurrently.
    pub async fn ingest_paths(
        &self,
        paths: &[PathBuf],
        show_progress: bool,
    ) -> Result<IngestReport, DomainError> {
        let start_time = Instant::now();
        let files = collect_files(paths)?;
        info!("Found {} files to ingest", files.len());

        let progress_bar = if show_progress {
            let bar = ProgressBar::new(files.len() as u64);
            if let Ok(style) = ProgressStyle::default_bar().template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            ) {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar
        } else {
            ProgressBar::hidden()
        };

        let documents: Vec<Document> = join_all(
            files
                .iter()
                .map(|path| self.extract_path(path, &progress_bar)),
        )
        .await
        .into_iter()
        .flatten()
        .collect();

        progress_bar.finish_with_message("extracted");

        let report_files = files.len() as u64;
        let report_documents = documents.len() as u64;
        let chunks = self.ingest_documents(&documents).await?;

        let duration = start_time.elapsed();
        info!(
            "Ingestion complete: {} documents, {} chunks in {:.2}s",
            report_documents,
            chunks,
            duration.as_secs_f64()
        );

        Ok(IngestReport {
            files: report_files,
            documents: report_documents,
            chunks,
            skipped: report_files - report_documents,
        })
    }

    async fn extract_path(&self, path: &Path, progress_bar: &ProgressBar) -> Option<Document> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        progress_bar.set_message(name.clone());

        let document = self.read_document(path, name).await;
        progress_bar.inc(1);
        document
    }

    async fn read_document(&self, path: &Path, name: String) -> Option<Document> {
        let file_type = FileType::from_path(path)?;
        let bytes = match tokio::fs::read(path).await {
            Ok(b) => b,
            Err(e) => {
                warn!("Failed to read file {}: {}", path.display(), e);
                return None;
            }
        };

        match self.extractor.extract(file_type, &bytes).await {
            Ok(text) => Some(Document::new(text, name)),
            Err(e) => {
                warn!("Failed to extract text from {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Splits, embeds and stores documents, replacing whatever was stored for
    /// the same files before. Returns the number of chunks stored.
    pub async fn ingest_documents(&self, documents: &[Document]) -> Result<u64, DomainError> {
        let chunks = self.splitter.split_documents(documents);
        debug!(
            "Split {} documents into {} chunks",
            documents.len(),
            chunks.len()
        );

        // A failed embedding leaves the stored chunks untouched.
        let embeddings = if chunks.is_empty() {
            Vec::new()
        } else {
            self.embedding_service.embed_chunks(&chunks).await?
        };

        let owners: Vec<ChunkOwner> = documents.iter().map(Document::owner).collect();
        let removed = self
            .vector_repo
            .replace(&owners, &chunks, &embeddings)
            .await?;
        debug!("Replaced {} stored chunks", removed);

        Ok(chunks.len() as u64)
    }
}

fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, DomainError> {
    let mut files = Vec::new();
    for path in paths {
        if !path.exists() {
            return Err(DomainError::invalid_input(format!(
                "Path does not exist: {}",
                path.display()
            )));
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Error walking directory: {}", e);
                    continue;
                }
            };
            if entry.file_type().is_file() && FileType::from_path(entry.path()).is_some() {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{UploadFileUseCase, VectorRepository};
    use crate::connector::{
        FileTextExtractor, InMemoryFileRepository, InMemoryVectorRepository, MockEmbedding,
    };
    use crate::domain::{DocumentChunk, Embedding, EmbeddingConfig, FileStatus, SearchQuery};
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct UnreachableEmbedding {
        config: EmbeddingConfig,
    }

    #[async_trait]
    impl EmbeddingService for UnreachableEmbedding {
        async fn embed_chunks(
            &self,
            _chunks: &[DocumentChunk],
        ) -> Result<Vec<Embedding>, DomainError> {
            Err(DomainError::embedding("connection refused"))
        }

        async fn embed_query(&self, _query: &str) -> Result<Vec<f32>, DomainError> {
            Err(DomainError::embedding("connection refused"))
        }

        fn config(&self) -> &EmbeddingConfig {
            &self.config
        }
    }

    struct Fixture {
        dir: TempDir,
        file_repo: Arc<InMemoryFileRepository>,
        vector_repo: Arc<InMemoryVectorRepository>,
        ingest: IngestDocumentsUseCase,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let file_repo = Arc::new(InMemoryFileRepository::new());
        let vector_repo = Arc::new(InMemoryVectorRepository::new());
        let ingest = IngestDocumentsUseCase::new(
            file_repo.clone(),
            vector_repo.clone(),
            Arc::new(MockEmbedding::with_dimensions(32)),
            Arc::new(FileTextExtractor::new()),
            RecursiveCharacterTextSplitter::new(40, 10).unwrap(),
        );
        Fixture {
            dir,
            file_repo,
            vector_repo,
            ingest,
        }
    }

    #[tokio::test]
    async fn test_ingest_uploaded_csv() {
        let f = fixture();
        let upload = UploadFileUseCase::new(f.file_repo.clone(), f.dir.path());
        let record = upload
            .execute(
                "sales.csv",
                "text/csv",
                b"region,amount\nnorth,10\nsouth,20\neast,30\nwest,40\n",
            )
            .await
            .unwrap();

        let processed = f.ingest.ingest_file(record.id()).await.unwrap();

        assert_eq!(processed.status(), FileStatus::Processed);
        assert!(processed.chunk_count() > 0);
        assert_eq!(f.vector_repo.count().await.unwrap(), processed.chunk_count());

        // Re-ingesting replaces the previous chunks.
        f.ingest.ingest_file(record.id()).await.unwrap();
        assert_eq!(f.vector_repo.count().await.unwrap(), processed.chunk_count());
    }

    #[tokio::test]
    async fn test_failed_extraction_marks_record() {
        let f = fixture();
        let upload = UploadFileUseCase::new(f.file_repo.clone(), f.dir.path());
        let record = upload
            .execute("broken.pdf", "application/pdf", b"not really a pdf")
            .await
            .unwrap();

        let err = f.ingest.ingest_file(record.id()).await.unwrap_err();
        assert!(matches!(err, DomainError::ExtractionError(_)));

        let stored = f.file_repo.find_by_id(record.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), FileStatus::Failed);
        assert!(stored.error_message().is_some());
    }

    #[tokio::test]
    async fn test_ingest_paths_skips_unsupported_and_broken_files() {
        let f = fixture();
        let docs = f.dir.path().join("docs");
        std::fs::create_dir_all(docs.join("nested")).unwrap();
        std::fs::write(docs.join("a.csv"), "name,score\nada,3\n").unwrap();
        std::fs::write(docs.join("nested").join("b.csv"), "k,v\nx,1\n").unwrap();
        std::fs::write(docs.join("broken.pdf"), "garbage").unwrap();
        std::fs::write(docs.join("readme.txt"), "ignored").unwrap();

        let report = f.ingest.ingest_paths(&[docs], false).await.unwrap();

        assert_eq!(report.files, 3);
        assert_eq!(report.documents, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(f.vector_repo.count().await.unwrap(), report.chunks);

        let results = f
            .vector_repo
            .search(
                &MockEmbedding::with_dimensions(32).embed_query("x").await.unwrap(),
                &SearchQuery::new("x").with_file_names(vec!["b.csv".to_string()]),
            )
            .await
            .unwrap();
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.chunk().file_name() == "b.csv"));
    }

    #[tokio::test]
    async fn test_ingest_paths_rejects_missing_path() {
        let f = fixture();
        let err = f
            .ingest
            .ingest_paths(&[f.dir.path().join("missing")], false)
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[tokio::test]
    async fn test_failed_reingest_keeps_previous_chunks() {
        let f = fixture();
        let upload = UploadFileUseCase::new(f.file_repo.clone(), f.dir.path());
        let record = upload
            .execute("sales.csv", "text/csv", b"region,amount\nnorth,10\n")
            .await
            .unwrap();
        let processed = f.ingest.ingest_file(record.id()).await.unwrap();
        let before = f.vector_repo.count().await.unwrap();
        assert_eq!(before, processed.chunk_count());

        let offline = IngestDocumentsUseCase::new(
            f.file_repo.clone(),
            f.vector_repo.clone(),
            Arc::new(UnreachableEmbedding {
                config: EmbeddingConfig::new("offline".to_string(), 32, 512),
            }),
            Arc::new(FileTextExtractor::new()),
            RecursiveCharacterTextSplitter::new(40, 10).unwrap(),
        );
        let err = offline.ingest_file(record.id()).await.unwrap_err();
        assert!(matches!(err, DomainError::EmbeddingError(_)));

        assert_eq!(f.vector_repo.count().await.unwrap(), before);
        let stored = f.file_repo.find_by_id(record.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), FileStatus::Failed);
    }

    #[tokio::test]
    async fn test_path_ingest_leaves_upload_of_same_name() {
        let f = fixture();
        let upload = UploadFileUseCase::new(f.file_repo.clone(), f.dir.path().join("uploads"));
        let record = upload
            .execute("report.csv", "text/csv", b"quarter,revenue\nq1,100\n")
            .await
            .unwrap();
        let processed = f.ingest.ingest_file(record.id()).await.unwrap();
        let uploaded_chunks = processed.chunk_count();

        let local = f.dir.path().join("local");
        std::fs::create_dir_all(&local).unwrap();
        std::fs::write(local.join("report.csv"), "quarter,revenue\nq1,100\n").unwrap();

        let report = f.ingest.ingest_paths(&[local.clone()], false).await.unwrap();
        assert_eq!(report.documents, 1);
        assert_eq!(
            f.vector_repo.count().await.unwrap(),
            uploaded_chunks + report.chunks
        );

        // Re-ingesting the path replaces only its own chunks.
        f.ingest.ingest_paths(&[local], false).await.unwrap();
        assert_eq!(
            f.vector_repo.count().await.unwrap(),
            uploaded_chunks + report.chunks
        );

        let query = MockEmbedding::with_dimensions(32).embed_query("q1").await.unwrap();
        let only_upload = SearchQuery::new("q1")
            .with_limit(50)
            .with_file_ids(vec![record.id()]);
        let uploaded_hits = f.vector_repo.search(&query, &only_upload).await.unwrap();
        assert_eq!(uploaded_hits.len() as u64, uploaded_chunks);
    }

    #[tokio::test]
    async fn test_ingest_documents_without_text() {
        let f = fixture();
        let chunks = f
            .ingest
            .ingest_documents(&[Document::new("   ", "empty.pdf")])
            .await
            .unwrap();
        assert_eq!(chunks, 0);
    }
}
