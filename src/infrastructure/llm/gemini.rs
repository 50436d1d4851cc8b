use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::{AssistantContent, CompletionModel, Prompt, ToolDefinition};
use rig::providers::gemini;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::domain::{ports::LlmService, DomainError, ModelReply, ToolDescriptor};
use crate::infrastructure::config::LlmConfig;

/// Gemini chat model.
pub struct GeminiLlm {
    client: gemini::Client,
    model: String,
    temperature: f64,
    timeout: Duration,
}

impl GeminiLlm {
    pub fn from_config(config: &LlmConfig, api_key: &str) -> Result<Self, DomainError> {
        let client: gemini::Client = gemini::Client::new(api_key)
            .map_err(|e| DomainError::config(format!("Gemini client: {e}")))?;

        Ok(Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout_seconds),
        })
    }
}

fn tool_definition(descriptor: &ToolDescriptor) -> ToolDefinition {
    ToolDefinition {
        name: descriptor.name.clone(),
        description: descriptor.description.clone(),
        parameters: descriptor.parameters.clone(),
    }
}

#[async_trait]
impl LlmService for GeminiLlm {
    #[instrument(skip(self, system, prompt), fields(model = %self.model))]
    async fn complete_with_system(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<String, DomainError> {
        let agent = self
            .client
            .agent(&self.model)
            .preamble(system)
            .temperature(self.temperature)
            .build();

        tokio::time::timeout(self.timeout, agent.prompt(prompt))
            .await
            .map_err(|_| DomainError::timeout("Model call timed out"))?
            .map_err(|e| DomainError::external(e.to_string()))
    }

    #[instrument(skip(self, system, prompt, tools), fields(model = %self.model, tools = tools.len()))]
    async fn complete_with_tools(
        &self,
        system: &str,
        prompt: &str,
        tools: &[ToolDescriptor],
    ) -> Result<ModelReply, DomainError> {
        let request = self
            .client
            .completion_model(&self.model)
            .completion_request(prompt)
            .preamble(system.to_string())
            .temperature(self.temperature)
            .tools(tools.iter().map(tool_definition).collect());

        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| DomainError::timeout("Model call timed out"))?
            .map_err(|e| DomainError::external(e.to_string()))?;

        let mut texts = Vec::new();
        for content in response.choice.iter() {
            match content {
                AssistantContent::ToolCall(call) => {
                    debug!(tool = %call.function.name, "model requested a tool");
                    return Ok(ModelReply::ToolCall {
                        name: call.function.name.clone(),
                        arguments: call.function.arguments.clone(),
                    });
                }
                AssistantContent::Text(text) => texts.push(text.text.clone()),
                _ => {}
            }
        }

        Ok(ModelReply::Text(texts.join("\n")))
    }

    fn model(&self) -> &str {
        &self.model
    }
}
