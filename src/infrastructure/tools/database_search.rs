use async_trait::async_trait;
use rig::completion::ToolDefinition;
use rig::tool::Tool;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::application::SqlAgent;
use crate::domain::{ports::ToolAdapter, DomainError, ToolDescriptor, ToolKind};
use crate::infrastructure::config::ToolConfig;

#[derive(Debug, Deserialize, Serialize)]
pub struct QuestionArgs {
    pub question: String,
}

/// Hands a full natural-language question to the SQL sub-agent and returns its answer as-is.
pub struct DatabaseSearchTool {
    agent: Arc<SqlAgent>,
    config: ToolConfig,
}

impl DatabaseSearchTool {
    pub fn new(agent: Arc<SqlAgent>, config: ToolConfig) -> Self {
        Self { agent, config }
    }

    pub async fn ask(&self, question: &str) -> Result<String, DomainError> {
        self.agent.ask(question).await
    }

    fn tool_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.config.name.clone(),
            description: self.config.description.clone(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "question": {
                        "type": "string",
                        "description": "The full question about employees or projects, in plain language"
                    }
                },
                "required": ["question"]
            }),
        }
    }
}

impl Tool for DatabaseSearchTool {
    const NAME: &'static str = "database_search";

    type Error = DomainError;
    type Args = QuestionArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        self.tool_definition()
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let answer = self.ask(&args.question).await?;
        Ok(if answer.trim().is_empty() {
            self.config.no_results_message.clone()
        } else {
            answer
        })
    }
}

#[async_trait]
impl ToolAdapter for DatabaseSearchTool {
    fn descriptor(&self) -> ToolDescriptor {
        let definition = self.tool_definition();
        ToolDescriptor {
            kind: ToolKind::DatabaseSearch,
            name: definition.name,
            description: definition.description,
            parameters: definition.parameters,
        }
    }

    async fn invoke(&self, input: &str) -> Result<String, DomainError> {
        <Self as Tool>::call(
            self,
            QuestionArgs {
                question: input.to_string(),
            },
        )
        .await
    }
}
