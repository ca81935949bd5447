use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Where a document came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<u64>,
}

/// Text extracted from a single file, before splitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    page_content: String,
    metadata: DocumentMetadata,
}

impl Document {
    pub fn new(page_content: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: DocumentMetadata {
                file_name: file_name.into(),
                file_id: None,
            },
        }
    }

    pub fn with_file_id(mut self, file_id: u64) -> Self {
        self.metadata.file_id = Some(file_id);
        self
    }

    pub fn page_content(&self) -> &str {
        &self.page_content
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub fn file_name(&self) -> &str {
        &self.metadata.file_name
    }

    pub fn file_id(&self) -> Option<u64> {
        self.metadata.file_id
    }

    pub fn owner(&self) -> ChunkOwner {
        match self.metadata.file_id {
            Some(id) => ChunkOwner::File(id),
            None => ChunkOwner::Path(self.metadata.file_name.clone()),
        }
    }
}

/// The source a stored chunk belongs to.
///
/// Uploaded files are matched by id only. Chunks ingested from a path carry no
/// id and are matched by file name, so they never touch an upload of the same
/// name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOwner {
    File(u64),
    Path(String),
}

impl ChunkOwner {
    pub fn owns(&self, chunk: &DocumentChunk) -> bool {
        match self {
            ChunkOwner::File(id) => chunk.file_id() == Some(*id),
            ChunkOwner::Path(name) => chunk.file_id().is_none() && chunk.file_name() == name,
        }
    }
}

/// A piece of a [`Document`] small enough to embed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    id: String,
    file_name: String,
    file_id: Option<u64>,
    chunk_index: u32,
    content: String,
}

impl DocumentChunk {
    pub fn new(
        file_name: String,
        file_id: Option<u64>,
        chunk_index: u32,
        content: String,
    ) -> Self {
        let id = chunk_id(&file_name, file_id, chunk_index, &content);
        Self {
            id,
            file_name,
            file_id,
            chunk_index,
            content,
        }
    }

    /// Reconstitutes from persisted data (used by adapters).
    pub fn reconstitute(
        id: String,
        file_name: String,
        file_id: Option<u64>,
        chunk_index: u32,
        content: String,
    ) -> Self {
        Self {
            id,
            file_name,
            file_id,
            chunk_index,
            content,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn file_id(&self) -> Option<u64> {
        self.file_id
    }

    pub fn chunk_index(&self) -> u32 {
        self.chunk_index
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn location(&self) -> String {
        format!("{}#{}", self.file_name, self.chunk_index)
    }
}

/// Stable id so that re-ingesting an unchanged file overwrites its chunks.
pub fn chunk_id(file_name: &str, file_id: Option<u64>, chunk_index: u32, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file_name.as_bytes());
    hasher.update([0u8]);
    match file_id {
        Some(id) => {
            hasher.update([1u8]);
            hasher.update(id.to_le_bytes());
        }
        None => hasher.update([0u8]),
    }
    hasher.update(chunk_index.to_le_bytes());
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
