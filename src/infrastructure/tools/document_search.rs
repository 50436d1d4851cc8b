use async_trait::async_trait;
use rig::completion::ToolDefinition;
use rig::tool::Tool;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

use crate::application::RagService;
use crate::domain::{ports::ToolAdapter, DomainError, ToolDescriptor, ToolKind};
use crate::infrastructure::config::ToolConfig;

#[derive(Debug, Deserialize, Serialize)]
pub struct SearchArgs {
    pub query: String,
}

/// Similarity search over the ingested document index.
pub struct DocumentSearchTool {
    rag: Arc<RagService>,
    top_k: usize,
    config: ToolConfig,
}

impl DocumentSearchTool {
    pub fn new(rag: Arc<RagService>, top_k: usize, config: ToolConfig) -> Self {
        Self {
            rag,
            top_k: top_k.max(1),
            config,
        }
    }

    /// Chunk texts for `query`, best match first, at most `top_k` of them.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<String>, DomainError> {
        let results = self.rag.retrieve_top_k(query, self.top_k).await?;
        Ok(results.into_iter().map(|r| r.chunk.text).collect())
    }

    fn tool_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.config.name.clone(),
            description: self.config.description.clone(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to look for in the company documents"
                    }
                },
                "required": ["query"]
            }),
        }
    }
}

impl Tool for DocumentSearchTool {
    const NAME: &'static str = "document_search";

    type Error = DomainError;
    type Args = SearchArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        self.tool_definition()
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let output = self
            .search(&args.query)
            .await?
            .iter()
            .enumerate()
            .map(|(i, text)| format!("[{}] {}", i + 1, text))
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(if output.is_empty() {
            self.config.no_results_message.clone()
        } else {
            output
        })
    }
}

#[async_trait]
impl ToolAdapter for DocumentSearchTool {
    fn descriptor(&self) -> ToolDescriptor {
        let definition = self.tool_definition();
        ToolDescriptor {
            kind: ToolKind::DocumentSearch,
            name: definition.name,
            description: definition.description,
            parameters: definition.parameters,
        }
    }

    async fn invoke(&self, input: &str) -> Result<String, DomainError> {
        <Self as Tool>::call(
            self,
            SearchArgs {
                query: input.to_string(),
            },
        )
        .await
    }
}
