use crate::domain::errors::DomainError;
use async_trait::async_trait;

#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<String, DomainError>;
}
