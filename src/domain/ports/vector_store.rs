use crate::domain::{errors::DomainError, DocumentChunk, Embedding, SearchResult};
use async_trait::async_trait;
use std::path::Path;

/// Append-only similarity index over document chunks.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn add(&self, chunk: &DocumentChunk, embedding: &Embedding) -> Result<(), DomainError>;

    /// Returns at most `top_k` results ordered by non-increasing score.
    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError>;

    async fn len(&self) -> Result<usize, DomainError>;

    /// Writes the store under `dir`, replacing whatever was there.
    fn persist(&self, dir: &Path) -> Result<(), DomainError>;
}
