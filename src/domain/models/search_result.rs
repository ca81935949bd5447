use serde::{Deserialize, Serialize};

use super::DocumentChunk;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    chunk: DocumentChunk,
    score: f32,
}

impl SearchResult {
    pub fn new(chunk: DocumentChunk, score: f32) -> Self {
        Self { chunk, score }
    }

    pub fn chunk(&self) -> &DocumentChunk {
        &self.chunk
    }

    pub fn into_chunk(self) -> DocumentChunk {
        self.chunk
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn is_relevant(&self, threshold: f32) -> bool {
        self.score >= threshold
    }

    pub fn display_line(&self) -> String {
        format!("{} (score: {:.3})", self.chunk.location(), self.score)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    query: String,
    limit: usize,
    min_score: Option<f32>,
    file_names: Option<Vec<String>>,
    file_ids: Option<Vec<u64>>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: 5,
            min_score: None,
            file_names: None,
            file_ids: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        // Ensure at least 1 result is requested
        self.limit = limit.max(1);
        self
    }

    pub fn with_min_score(mut self, score: f32) -> Self {
        self.min_score = Some(score);
        self
    }

    pub fn with_file_names(mut self, names: Vec<String>) -> Self {
        self.file_names = Some(names);
        self
    }

    pub fn with_file_ids(mut self, ids: Vec<u64>) -> Self {
        self.file_ids = Some(ids);
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn min_score(&self) -> Option<f32> {
        self.min_score
    }

    pub fn file_names(&self) -> Option<&[String]> {
        self.file_names.as_deref()
    }

    pub fn file_ids(&self) -> Option<&[u64]> {
        self.file_ids.as_deref()
    }

    pub fn has_filters(&self) -> bool {
        self.file_names.is_some() || self.file_ids.is_some()
    }

    /// Whether a chunk passes the file filters of this query.
    pub fn accepts(&self, chunk: &DocumentChunk) -> bool {
        if let Some(names) = self.file_names() {
            if !names.iter().any(|n| n == chunk.file_name()) {
                return false;
            }
        }
        if let Some(ids) = self.file_ids() {
            match chunk.file_id() {
                Some(id) if ids.contains(&id) => {}
                _ => return false,
            }
        }
        true
    }

    pub fn summary(&self) -> String {
        let mut parts = vec![format!("query=\"{}\"", self.query)];
        parts.push(format!("limit={}", self.limit));

        if let Some(score) = self.min_score {
            parts.push(format!("min_score={:.2}", score));
        }
        if let Some(ref names) = self.file_names {
            parts.push(format!("files={:?}", names));
        }
        if let Some(ref ids) = self.file_ids {
            parts.push(format!("file_ids={:?}", ids));
        }

        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chunk() -> DocumentChunk {
        DocumentChunk::new("notes.pdf".to_string(), Some(2), 0, "hello".to_string())
    }

    #[test]
    fn test_search_result_creation() {
        let result = SearchResult::new(sample_chunk(), 0.95);

        assert_eq!(result.score(), 0.95);
        assert!(result.is_relevant(0.5));
        assert!(!result.is_relevant(0.99));
        assert_eq!(result.display_line(), "notes.pdf#0 (score: 0.950)");
    }

    #[test]
    fn test_search_query_builder() {
        let query = SearchQuery::new("revenue in 2023")
            .with_limit(0)
            .with_min_score(0.7)
            .with_file_names(vec!["notes.pdf".to_string()]);

        assert_eq!(query.query(), "revenue in 2023");
        assert_eq!(query.limit(), 1);
        assert_eq!(query.min_score(), Some(0.7));
        assert!(query.has_filters());
        assert!(query.summary().contains("files=[\"notes.pdf\"]"));
    }

    #[test]
    fn test_query_filters() {
        let chunk = sample_chunk();

        assert!(SearchQuery::new("x").accepts(&chunk));
        assert!(SearchQuery::new("x").with_file_ids(vec![2]).accepts(&chunk));
        assert!(!SearchQuery::new("x").with_file_ids(vec![3]).accepts(&chunk));
        assert!(!SearchQuery::new("x")
            .with_file_names(vec!["other.csv".to_string()])
            .accepts(&chunk));
    }
}
