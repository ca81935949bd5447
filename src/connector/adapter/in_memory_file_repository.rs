use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::FileRepository;
use crate::domain::{DomainError, FileRecord};

pub struct InMemoryFileRepository {
    files: Arc<Mutex<BTreeMap<u64, FileRecord>>>,
    last_id: AtomicU64,
}

impl InMemoryFileRepository {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(BTreeMap::new())),
            last_id: AtomicU64::new(0),
        }
    }
}

impl Default for InMemoryFileRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileRepository for InMemoryFileRepository {
    async fn next_id(&self) -> Result<u64, DomainError> {
        Ok(self.last_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn save(&self, record: &FileRecord) -> Result<(), DomainError> {
        self.files.lock().await.insert(record.id(), record.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<FileRecord>, DomainError> {
        Ok(self.files.lock().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<FileRecord>, DomainError> {
        Ok(self.files.lock().await.values().cloned().collect())
    }

    async fn delete(&self, id: u64) -> Result<bool, DomainError> {
        Ok(self.files.lock().await.remove(&id).is_some())
    }
}
