pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use application::{
    AnswerQuestionUseCase, ChatClient, ChatSessionStore, DeleteFileUseCase, EmbeddingService,
    FileRepository, IngestDocumentsUseCase, ListFilesUseCase, SearchDocumentsUseCase,
    TextExtractor, UploadFileUseCase, VectorRepository,
};

pub use cli::{Commands, FilesCommand};

pub use connector::{
    Container, ContainerConfig, DuckdbFileRepository, DuckdbVectorRepository, FileTextExtractor,
    InMemoryFileRepository, InMemoryVectorRepository, MockEmbedding, OpenAiChatClient,
    OpenAiEmbedding, Router, StorageBackend,
};

pub use domain::{
    ChatHistory, ChatTurn, ChunkOwner, Document, DocumentChunk, DomainError, Embedding, EmbeddingConfig,
    FileRecord, FileResponse, FileStatus, FileType, RecursiveCharacterTextSplitter, SearchQuery,
    SearchResult,
};
