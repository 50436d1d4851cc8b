use crate::domain::{errors::DomainError, Embedding};
use async_trait::async_trait;

#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError>;

    /// Embeds every text or fails as a whole; no partial results are returned.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError>;

    /// Model identifier, recorded in persisted indexes.
    fn model(&self) -> &str;

    fn dimension(&self) -> usize;
}
