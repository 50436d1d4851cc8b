use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info};

use crate::domain::{ports::VectorStore, DocumentChunk, DomainError, Embedding, SearchResult};

pub const INDEX_FILE: &str = "index.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    chunk: DocumentChunk,
    vector: Embedding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexData {
    embedding_model: String,
    dimension: usize,
    entries: Vec<IndexEntry>,
}

/// Exact cosine-similarity index persisted as a single JSON file inside a directory.
///
/// Built by the ingestion run and loaded read-only by the agent; entries are only
/// ever appended.
pub struct FlatVectorIndex {
    data: RwLock<IndexData>,
}

impl FlatVectorIndex {
    pub fn new(embedding_model: impl Into<String>, dimension: usize) -> Self {
        Self {
            data: RwLock::new(IndexData {
                embedding_model: embedding_model.into(),
                dimension,
                entries: Vec::new(),
            }),
        }
    }

    /// Loads an index written by [`FlatVectorIndex::save`].
    ///
    /// Fails if it was built with a different embedding model or dimension.
    pub fn load(dir: &Path, embedding_model: &str, dimension: usize) -> Result<Self, DomainError> {
        let path = dir.join(INDEX_FILE);
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            DomainError::not_found(format!("vector index {}: {e}", path.display()))
        })?;
        let data: IndexData = serde_json::from_str(&raw)?;

        if data.embedding_model != embedding_model || data.dimension != dimension {
            return Err(DomainError::config(format!(
                "index {} was built with {} ({} dims), configured model is {} ({} dims); re-run ingestion",
                path.display(),
                data.embedding_model,
                data.dimension,
                embedding_model,
                dimension
            )));
        }

        info!(path = %path.display(), entries = data.entries.len(), "vector index loaded");
        Ok(Self {
            data: RwLock::new(data),
        })
    }

    /// Writes the index to `dir`, replacing any previous index there.
    pub fn save(&self, dir: &Path) -> Result<(), DomainError> {
        std::fs::create_dir_all(dir)?;
        let data = self
            .data
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let path = dir.join(INDEX_FILE);
        let tmp = dir.join(format!("{INDEX_FILE}.tmp"));
        std::fs::write(&tmp, serde_json::to_vec(&*data)?)?;
        std::fs::rename(&tmp, &path)?;

        info!(path = %path.display(), entries = data.entries.len(), "vector index saved");
        Ok(())
    }

    pub fn dimension(&self) -> Result<usize, DomainError> {
        self.data
            .read()
            .map(|d| d.dimension)
            .map_err(|e| DomainError::internal(e.to_string()))
    }
}

#[async_trait]
impl VectorStore for FlatVectorIndex {
    async fn add(&self, chunk: &DocumentChunk, embedding: &Embedding) -> Result<(), DomainError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        if embedding.dimension() != data.dimension {
            return Err(DomainError::config(format!(
                "embedding has {} dimensions, index expects {}",
                embedding.dimension(),
                data.dimension
            )));
        }

        data.entries.push(IndexEntry {
            chunk: chunk.clone(),
            vector: embedding.clone(),
        });
        Ok(())
    }

    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let data = self
            .data
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        if query.dimension() != data.dimension {
            return Err(DomainError::config(format!(
                "query embedding has {} dimensions, index expects {}",
                query.dimension(),
                data.dimension
            )));
        }

        let mut results: Vec<SearchResult> = data
            .entries
            .iter()
            .map(|entry| SearchResult {
                chunk: entry.chunk.clone(),
                score: query.cosine_similarity(&entry.vector),
            })
            .collect();

        // Stable sort: equal scores keep insertion order.
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);

        debug!(candidates = data.entries.len(), returned = results.len(), "index searched");
        Ok(results)
    }

    async fn len(&self) -> Result<usize, DomainError> {
        self.data
            .read()
            .map(|d| d.entries.len())
            .map_err(|e| DomainError::internal(e.to_string()))
    }

    fn persist(&self, dir: &Path) -> Result<(), DomainError> {
        self.save(dir)
    }
}
