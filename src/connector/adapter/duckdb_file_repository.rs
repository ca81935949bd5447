use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use duckdb::{params, Connection, Row};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::FileRepository;
use crate::domain::{DomainError, FileRecord, FileStatus, FileType};

const SELECT_COLUMNS: &str = "id, filename, file_type, content_type, size, upload_time, status, \
     file_path, error_message, chunk_count";

/// Persistent file registry. Ids come from the `file_ids` sequence.
pub struct DuckdbFileRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DuckdbFileRepository {
    pub fn new(db_path: &Path) -> Result<Self, DomainError> {
        let conn = Connection::open(db_path)
            .map_err(|e| DomainError::storage(format!("Failed to open DuckDB database: {}", e)))?;
        Self::initialize_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create a new adapter using an existing shared connection.
    pub async fn with_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, DomainError> {
        let conn_guard = conn.lock().await;
        Self::initialize_schema(&conn_guard)?;
        drop(conn_guard);

        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self, DomainError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            DomainError::storage(format!("Failed to open DuckDB in-memory DB: {}", e))
        })?;
        Self::initialize_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), DomainError> {
        conn.execute_batch(
            r#"
            CREATE SEQUENCE IF NOT EXISTS file_ids START 1;

            CREATE TABLE IF NOT EXISTS files (
                id BIGINT PRIMARY KEY,
                filename TEXT NOT NULL,
                file_type TEXT NOT NULL,
                content_type TEXT NOT NULL,
                size BIGINT NOT NULL,
                upload_time TEXT NOT NULL,
                status TEXT NOT NULL,
                file_path TEXT NOT NULL,
                error_message TEXT,
                chunk_count BIGINT DEFAULT 0
            );
            "#,
        )
        .map_err(|e| DomainError::storage(format!("Failed to initialize files schema: {}", e)))?;

        debug!("DuckDB files table initialized");
        Ok(())
    }

    fn read_record(row: &Row<'_>) -> Result<FileRecord, duckdb::Error> {
        let file_type: String = row.get(2)?;
        let upload_time: String = row.get(5)?;
        let status: String = row.get(6)?;

        let upload_time = DateTime::parse_from_rfc3339(&upload_time)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| duckdb::Error::FromSqlConversionFailure(5, duckdb::types::Type::Text, Box::new(e)))?;
        let file_type = FileType::from_extension(&file_type).ok_or_else(|| {
            duckdb::Error::FromSqlConversionFailure(
                2,
                duckdb::types::Type::Text,
                format!("unknown file type '{}'", file_type).into(),
            )
        })?;

        Ok(FileRecord::reconstitute(
            row.get::<_, i64>(0)? as u64,
            row.get(1)?,
            file_type,
            row.get(3)?,
            row.get::<_, i64>(4)? as u64,
            upload_time,
            FileStatus::parse(&status),
            row.get(7)?,
            row.get(8)?,
            row.get::<_, Option<i64>>(9)?.unwrap_or(0) as u64,
        ))
    }
}

#[async_trait]
impl FileRepository for DuckdbFileRepository {
    async fn next_id(&self) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let id: i64 = conn
            .query_row("SELECT nextval('file_ids')", [], |row| row.get(0))
            .map_err(|e| DomainError::storage(format!("Failed to allocate file id: {}", e)))?;
        Ok(id as u64)
    }

    async fn save(&self, record: &FileRecord) -> Result<(), DomainError> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO files
                (id, filename, file_type, content_type, size, upload_time, status, file_path, error_message, chunk_count)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                record.id() as i64,
                record.filename(),
                record.file_type().as_str(),
                record.content_type(),
                record.size() as i64,
                record.upload_time().to_rfc3339(),
                record.status().as_str(),
                record.file_path(),
                record.error_message(),
                record.chunk_count() as i64,
            ],
        )
        .map_err(|e| DomainError::storage(format!("Failed to save file {}: {}", record.id(), e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<FileRecord>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM files WHERE id = ?", SELECT_COLUMNS))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        match stmt.query_row(params![id as i64], Self::read_record) {
            Ok(record) => Ok(Some(record)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DomainError::storage(format!(
                "Failed to load file {}: {}",
                id, e
            ))),
        }
    }

    async fn list(&self) -> Result<Vec<FileRecord>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM files ORDER BY id", SELECT_COLUMNS))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        let rows = stmt
            .query_map([], Self::read_record)
            .map_err(|e| DomainError::storage(format!("Failed to list files: {}", e)))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::storage(format!("Failed to read file row: {}", e)))
    }

    async fn delete(&self, id: u64) -> Result<bool, DomainError> {
        let conn = self.conn.lock().await;
        let deleted = conn
            .execute("DELETE FROM files WHERE id = ?", params![id as i64])
            .map_err(|e| DomainError::storage(format!("Failed to delete file {}: {}", id, e)))?;
        Ok(deleted > 0)
    }
}
