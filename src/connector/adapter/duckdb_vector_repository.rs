use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use duckdb::types::Value;
use duckdb::{params, Connection, Row};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::VectorRepository;
use crate::domain::{
    ChunkOwner, DocumentChunk, DomainError, Embedding, SearchQuery, SearchResult,
};

pub const DEFAULT_COLLECTION: &str = "documents";

/// Chunk and embedding storage in a DuckDB file, one schema per collection.
///
/// Vectors are stored as variable-length `FLOAT[]` lists and ranked with the
/// built-in `list_cosine_similarity`, so no extension has to be installed.
pub struct DuckdbVectorRepository {
    conn: Arc<Mutex<Connection>>,
    collection: String,
}

impl DuckdbVectorRepository {
    pub fn new(path: &Path) -> Result<Self, DomainError> {
        Self::new_with_collection(path, DEFAULT_COLLECTION)
    }

    pub fn new_with_collection(path: &Path, collection: &str) -> Result<Self, DomainError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)
            .map_err(|e| DomainError::storage(format!("Failed to open DuckDB database: {}", e)))?;
        Self::with_connection(Arc::new(Mutex::new(conn)), collection)
    }

    pub fn in_memory() -> Result<Self, DomainError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            DomainError::storage(format!("Failed to open DuckDB in-memory DB: {}", e))
        })?;
        Self::with_connection(Arc::new(Mutex::new(conn)), DEFAULT_COLLECTION)
    }

    fn with_connection(conn: Arc<Mutex<Connection>>, collection: &str) -> Result<Self, DomainError> {
        let collection = collection_schema(collection)?;
        {
            let guard = conn.try_lock().map_err(|_| {
                DomainError::storage("DuckDB connection is busy during initialization")
            })?;
            Self::initialize(&guard, &collection)?;
        }
        Ok(Self { conn, collection })
    }

    /// Returns a clone of the shared connection Arc.
    /// DuckDB only allows one write connection per file, so the file registry
    /// reuses this one.
    pub fn shared_connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn initialize(conn: &Connection, schema: &str) -> Result<(), DomainError> {
        debug!("Initializing DuckDB vector store in schema: {}", schema);

        let ddl = format!(
            "\
            CREATE SCHEMA IF NOT EXISTS \"{schema}\";

            CREATE TABLE IF NOT EXISTS \"{schema}\".chunks (
                id TEXT PRIMARY KEY,
                file_name TEXT NOT NULL,
                file_id BIGINT,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS \"{schema}\".embeddings (
                chunk_id TEXT PRIMARY KEY,
                vector FLOAT[] NOT NULL,
                model TEXT NOT NULL
            );
            ",
            schema = schema
        );

        conn.execute_batch(&ddl).map_err(|e| {
            DomainError::storage(format!("Failed to initialize DuckDB tables: {}", e))
        })?;
        Ok(())
    }

    fn vector_to_list_literal(vector: &[f32]) -> Result<String, DomainError> {
        if vector.is_empty() {
            return Err(DomainError::invalid_input("Embedding vector is empty"));
        }
        let mut s = String::with_capacity(vector.len() * 8 + 12);
        s.push('[');
        for (i, v) in vector.iter().enumerate() {
            if !v.is_finite() {
                return Err(DomainError::invalid_input(
                    "Embedding vector contains a non-finite value",
                ));
            }
            if i > 0 {
                s.push_str(", ");
            }
            s.push_str(&v.to_string());
        }
        s.push_str("]::FLOAT[]");
        Ok(s)
    }

    fn read_chunk(row: &Row<'_>) -> Result<DocumentChunk, duckdb::Error> {
        Ok(DocumentChunk::reconstitute(
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<i64>>(2)?.map(|id| id as u64),
            row.get::<_, i64>(3)? as u32,
            row.get::<_, String>(4)?,
        ))
    }

    async fn delete_where(&self, clause: &str, value: Value) -> Result<u64, DomainError> {
        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;
        let deleted = Self::delete_rows(&tx, &self.collection, clause, value)?;
        tx.commit()
            .map_err(|e| DomainError::storage(format!("Failed to commit: {}", e)))?;
        Ok(deleted)
    }

    /// Deletes matching chunks and their embeddings. Runs inside the caller's
    /// transaction.
    fn delete_rows(
        conn: &Connection,
        schema: &str,
        clause: &str,
        value: Value,
    ) -> Result<u64, DomainError> {
        conn.execute(
            &format!(
                "DELETE FROM \"{0}\".embeddings WHERE chunk_id IN (SELECT id FROM \"{0}\".chunks WHERE {1})",
                schema, clause
            ),
            params![value.clone()],
        )
        .map_err(|e| DomainError::storage(format!("Failed to delete embeddings: {}", e)))?;

        let deleted = conn
            .execute(
                &format!("DELETE FROM \"{}\".chunks WHERE {}", schema, clause),
                params![value],
            )
            .map_err(|e| DomainError::storage(format!("Failed to delete chunks: {}", e)))?;
        Ok(deleted as u64)
    }

    /// Upserts chunks and embeddings. Runs inside the caller's transaction.
    fn insert_rows(
        conn: &Connection,
        schema: &str,
        chunks: &[DocumentChunk],
        embeddings: &[Embedding],
    ) -> Result<(), DomainError> {
        {
            let mut stmt = conn
                .prepare(&format!(
                    "INSERT OR REPLACE INTO \"{}\".chunks \
                    (id, file_name, file_id, chunk_index, content) \
                    VALUES (?, ?, ?, ?, ?)",
                    schema
                ))
                .map_err(|e| {
                    DomainError::storage(format!("Failed to prepare chunk insert: {}", e))
                })?;

            for chunk in chunks {
                stmt.execute(params![
                    chunk.id(),
                    chunk.file_name(),
                    chunk.file_id().map(|id| id as i64),
                    chunk.chunk_index() as i64,
                    chunk.content(),
                ])
                .map_err(|e| {
                    DomainError::storage(format!("Failed to insert chunk {}: {}", chunk.id(), e))
                })?;
            }
        }

        for embedding in embeddings {
            // List values are inlined; the literal is built from floats only.
            let list_lit = Self::vector_to_list_literal(embedding.vector())?;
            let sql = format!(
                "INSERT OR REPLACE INTO \"{}\".embeddings (chunk_id, vector, model) \
                VALUES (?, {}, ?)",
                schema, list_lit
            );
            conn.execute(&sql, params![embedding.chunk_id(), embedding.model()])
                .map_err(|e| {
                    DomainError::storage(format!(
                        "Failed to insert embedding for chunk {}: {}",
                        embedding.chunk_id(),
                        e
                    ))
                })?;
        }
        Ok(())
    }
}

fn owner_clause(owner: &ChunkOwner) -> (&'static str, Value) {
    match owner {
        ChunkOwner::File(id) => ("file_id = ?", Value::BigInt(*id as i64)),
        ChunkOwner::Path(name) => (
            "file_id IS NULL AND file_name = ?",
            Value::Text(name.clone()),
        ),
    }
}

fn check_batch(chunks: &[DocumentChunk], embeddings: &[Embedding]) -> Result<(), DomainError> {
    if chunks.len() != embeddings.len() {
        return Err(DomainError::invalid_input(
            "Chunk and embedding count mismatch".to_string(),
        ));
    }
    Ok(())
}

/// Collection names become schema names; keep them to identifier characters.
fn collection_schema(collection: &str) -> Result<String, DomainError> {
    let collection = collection.trim();
    if collection.is_empty() {
        return Ok(DEFAULT_COLLECTION.to_string());
    }
    if !collection
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(DomainError::invalid_input(format!(
            "Invalid collection name '{}'",
            collection
        )));
    }
    Ok(collection.to_string())
}

fn quote_list<T: ToString>(values: &[T], quote: bool) -> String {
    values
        .iter()
        .map(|v| {
            let v = v.to_string();
            if quote {
                format!("'{}'", v.replace('\'', "''"))
            } else {
                v
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl VectorRepository for DuckdbVectorRepository {
    async fn save_batch(
        &self,
        chunks: &[DocumentChunk],
        embeddings: &[Embedding],
    ) -> Result<(), DomainError> {
        check_batch(chunks, embeddings)?;
        if chunks.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;
        Self::insert_rows(&tx, &self.collection, chunks, embeddings)?;
        tx.commit()
            .map_err(|e| DomainError::storage(format!("Failed to commit: {}", e)))?;

        debug!(
            "Saved {} chunks and {} embeddings to DuckDB",
            chunks.len(),
            embeddings.len()
        );
        Ok(())
    }

    async fn replace(
        &self,
        owners: &[ChunkOwner],
        chunks: &[DocumentChunk],
        embeddings: &[Embedding],
    ) -> Result<u64, DomainError> {
        check_batch(chunks, embeddings)?;

        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        let mut removed = 0;
        for owner in owners {
            let (clause, value) = owner_clause(owner);
            removed += Self::delete_rows(&tx, &self.collection, clause, value)?;
        }
        Self::insert_rows(&tx, &self.collection, chunks, embeddings)?;

        tx.commit()
            .map_err(|e| DomainError::storage(format!("Failed to commit: {}", e)))?;

        debug!("Replaced {} chunks with {} in DuckDB", removed, chunks.len());
        Ok(removed)
    }

    async fn delete_by_file_name(&self, file_name: &str) -> Result<u64, DomainError> {
        let (clause, value) = owner_clause(&ChunkOwner::Path(file_name.to_string()));
        self.delete_where(clause, value).await
    }

    async fn delete_by_file_id(&self, file_id: u64) -> Result<u64, DomainError> {
        let (clause, value) = owner_clause(&ChunkOwner::File(file_id));
        self.delete_where(clause, value).await
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        query: &SearchQuery,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let list_lit = Self::vector_to_list_literal(query_embedding)?;

        let mut where_clauses = vec![format!("len(e.vector) = {}", query_embedding.len())];
        if let Some(names) = query.file_names() {
            if names.is_empty() {
                return Ok(Vec::new());
            }
            where_clauses.push(format!("c.file_name IN ({})", quote_list(names, true)));
        }
        if let Some(ids) = query.file_ids() {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            where_clauses.push(format!("c.file_id IN ({})", quote_list(ids, false)));
        }

        let sql = format!(
            "SELECT * FROM ( \
                SELECT c.id, c.file_name, c.file_id, c.chunk_index, c.content, \
                    CAST(list_cosine_similarity(e.vector, {list_lit}) AS DOUBLE) AS score \
                FROM \"{schema}\".embeddings e \
                JOIN \"{schema}\".chunks c ON c.id = e.chunk_id \
                WHERE {filters} \
            ) WHERE score >= ? \
            ORDER BY score DESC, id \
            LIMIT ?",
            list_lit = list_lit,
            schema = self.collection,
            filters = where_clauses.join(" AND "),
        );

        let min_score = query.min_score().map(f64::from).unwrap_or(-1.0);

        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::storage(format!("Failed to prepare search: {}", e)))?;
        let mut rows = stmt
            .query(params![min_score, query.limit() as i64])
            .map_err(|e| DomainError::storage(format!("Failed to run search: {}", e)))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?
        {
            let chunk = Self::read_chunk(row)
                .map_err(|e| DomainError::storage(format!("Failed to read chunk: {}", e)))?;
            let score: f64 = row
                .get(5)
                .map_err(|e| DomainError::storage(format!("Failed to read score: {}", e)))?;
            results.push(SearchResult::new(chunk, score as f32));
        }
        Ok(results)
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM \"{}\".chunks", self.collection),
                [],
                |row| row.get(0),
            )
            .map_err(|e| DomainError::storage(format!("Failed to count chunks: {}", e)))?;
        Ok(count as u64)
    }
}
