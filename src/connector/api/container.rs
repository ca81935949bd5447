use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use crate::application::{
    AnswerQuestionUseCase, ChatClient, ChatSessionStore, DeleteFileUseCase, EmbeddingService,
    FileRepository, IngestDocumentsUseCase, ListFilesUseCase, SearchDocumentsUseCase,
    TextExtractor, UploadFileUseCase, VectorRepository,
};
use crate::connector::adapter::{
    DuckdbFileRepository, DuckdbVectorRepository, FileTextExtractor, InMemoryFileRepository,
    InMemoryVectorRepository, MockEmbedding, OpenAiChatClient, OpenAiEmbedding,
    DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_COLLECTION, DEFAULT_EMBEDDING_MODEL,
};
use crate::domain::{RecursiveCharacterTextSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

pub const VECTOR_DB_FILE: &str = "vectors.duckdb";

#[derive(Debug, Clone)]
pub struct ContainerConfig {
    pub vectorstore_path: String,
    pub upload_dir: String,
    pub collection: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub mock_embeddings: bool,
    /// Keep vectors and the file registry in memory instead of DuckDB.
    pub memory_storage: bool,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            vectorstore_path: "./data/vectorstore".to_string(),
            upload_dir: "./data/uploads".to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            mock_embeddings: false,
            memory_storage: false,
            openai_api_key: None,
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }
}

/// Where vectors and the file registry actually live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Duckdb(PathBuf),
    InMemory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Duckdb(path) => write!(f, "{}", path.display()),
            StorageBackend::InMemory => write!(f, "in-memory"),
        }
    }
}

pub struct Container {
    embedding_service: Arc<dyn EmbeddingService>,
    vector_repo: Arc<dyn VectorRepository>,
    file_repo: Arc<dyn FileRepository>,
    extractor: Arc<dyn TextExtractor>,
    splitter: RecursiveCharacterTextSplitter,
    search_use_case: Arc<SearchDocumentsUseCase>,
    chat_sessions: Option<Arc<ChatSessionStore>>,
    answer_use_case: Option<Arc<AnswerQuestionUseCase>>,
    storage: StorageBackend,
    config: ContainerConfig,
}

impl Container {
    pub async fn new(config: ContainerConfig) -> Result<Self> {
        let splitter = RecursiveCharacterTextSplitter::new(config.chunk_size, config.chunk_overlap)?;
        let api_key = config.openai_api_key.clone().filter(|k| !k.is_empty());

        let embedding_service: Arc<dyn EmbeddingService> = match (&api_key, config.mock_embeddings) {
            (_, true) => {
                debug!("Using mock embedding service");
                Arc::new(MockEmbedding::new())
            }
            (Some(key), false) => {
                debug!("Using OpenAI embeddings ({})", config.embedding_model);
                Arc::new(OpenAiEmbedding::new(
                    key.clone(),
                    config.embedding_model.clone(),
                    config.openai_base_url.clone(),
                ))
            }
            (None, false) => {
                warn!("OPENAI_API_KEY is not set. Falling back to mock embeddings.");
                Arc::new(MockEmbedding::new())
            }
        };

        let chat_client: Option<Arc<dyn ChatClient>> = match &api_key {
            Some(key) => Some(Arc::new(OpenAiChatClient::new(
                key.clone(),
                config.chat_model.clone(),
                config.openai_base_url.clone(),
            ))),
            None => {
                warn!("OPENAI_API_KEY is not set. Question answering is disabled.");
                None
            }
        };

        let (vector_repo, file_repo, storage): (
            Arc<dyn VectorRepository>,
            Arc<dyn FileRepository>,
            StorageBackend,
        ) = if config.memory_storage {
            debug!("Using in-memory storage");
            in_memory_storage()
        } else {
            let db_path = PathBuf::from(&config.vectorstore_path).join(VECTOR_DB_FILE);
            match DuckdbVectorRepository::new_with_collection(&db_path, &config.collection) {
                Ok(duckdb) => {
                    debug!(
                        "Using DuckDB vector storage at {:?} collection {}",
                        db_path, config.collection
                    );
                    // DuckDB allows a single write connection per file.
                    let shared_conn = duckdb.shared_connection();
                    let file_repo = DuckdbFileRepository::with_connection(shared_conn).await?;
                    (
                        Arc::new(duckdb),
                        Arc::new(file_repo),
                        StorageBackend::Duckdb(db_path),
                    )
                }
                Err(e) => {
                    warn!(
                        "Failed to initialize DuckDB ({}): {}. Falling back to in-memory storage.",
                        db_path.display(),
                        e
                    );
                    in_memory_storage()
                }
            }
        };

        let search_use_case = Arc::new(SearchDocumentsUseCase::new(
            vector_repo.clone(),
            embedding_service.clone(),
        ));

        let mut container = Self {
            embedding_service,
            vector_repo,
            file_repo,
            extractor: Arc::new(FileTextExtractor::new()),
            splitter,
            search_use_case,
            chat_sessions: None,
            answer_use_case: None,
            storage,
            config,
        };
        if let Some(client) = chat_client {
            container = container.with_chat_client(client);
        }
        Ok(container)
    }

    /// Replaces the LLM client, starting with fresh chat sessions.
    pub fn with_chat_client(mut self, client: Arc<dyn ChatClient>) -> Self {
        let answer = Arc::new(AnswerQuestionUseCase::new(
            self.search_use_case.clone(),
            client,
        ));
        self.chat_sessions = Some(Arc::new(ChatSessionStore::new(answer.clone())));
        self.answer_use_case = Some(answer);
        self
    }

    pub fn upload_use_case(&self) -> UploadFileUseCase {
        UploadFileUseCase::new(self.file_repo.clone(), &self.config.upload_dir)
    }

    pub fn list_use_case(&self) -> ListFilesUseCase {
        ListFilesUseCase::new(self.file_repo.clone())
    }

    pub fn delete_use_case(&self) -> DeleteFileUseCase {
        DeleteFileUseCase::new(self.file_repo.clone(), self.vector_repo.clone())
    }

    pub fn ingest_use_case(&self) -> IngestDocumentsUseCase {
        IngestDocumentsUseCase::new(
            self.file_repo.clone(),
            self.vector_repo.clone(),
            self.embedding_service.clone(),
            self.extractor.clone(),
            self.splitter.clone(),
        )
    }

    pub fn search_use_case(&self) -> Arc<SearchDocumentsUseCase> {
        self.search_use_case.clone()
    }

    /// `None` when no LLM is configured.
    pub fn answer_use_case(&self) -> Option<Arc<AnswerQuestionUseCase>> {
        self.answer_use_case.clone()
    }

    pub fn chat_sessions(&self) -> Option<Arc<ChatSessionStore>> {
        self.chat_sessions.clone()
    }

    pub fn vector_repo(&self) -> Arc<dyn VectorRepository> {
        self.vector_repo.clone()
    }

    pub fn embedding_model(&self) -> &str {
        self.embedding_service.config().model_name()
    }

    pub fn vectorstore_path(&self) -> &str {
        &self.config.vectorstore_path
    }

    pub fn upload_dir(&self) -> &str {
        &self.config.upload_dir
    }

    pub fn collection(&self) -> &str {
        &self.config.collection
    }

    /// The storage in use, which is in-memory when DuckDB could not be opened.
    pub fn storage(&self) -> &StorageBackend {
        &self.storage
    }
}

fn in_memory_storage() -> (
    Arc<dyn VectorRepository>,
    Arc<dyn FileRepository>,
    StorageBackend,
) {
    (
        Arc::new(InMemoryVectorRepository::new()),
        Arc::new(InMemoryFileRepository::new()),
        StorageBackend::InMemory,
    )
}
