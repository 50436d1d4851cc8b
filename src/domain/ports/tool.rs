use crate::domain::{errors::DomainError, ToolDescriptor};
use async_trait::async_trait;

/// A capability exposed to the routing agent: text in, text out.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    fn descriptor(&self) -> ToolDescriptor;

    async fn invoke(&self, input: &str) -> Result<String, DomainError>;
}
