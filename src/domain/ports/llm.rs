use crate::domain::errors::DomainError;
use crate::domain::{ModelReply, ToolDescriptor};
use async_trait::async_trait;

/// A hosted text-generation model.
#[async_trait]
pub trait LlmService: Send + Sync {
    async fn complete_with_system(&self, system: &str, prompt: &str)
        -> Result<String, DomainError>;

    /// Offers `tools` to the model with their argument schemas. The model either
    /// calls one of them or answers in text.
    async fn complete_with_tools(
        &self,
        system: &str,
        prompt: &str,
        tools: &[ToolDescriptor],
    ) -> Result<ModelReply, DomainError>;

    fn model(&self) -> &str;
}
