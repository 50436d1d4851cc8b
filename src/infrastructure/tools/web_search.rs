use async_trait::async_trait;
use rig::completion::ToolDefinition;
use rig::tool::Tool;
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

use crate::domain::{
    ports::{ToolAdapter, WebSearchProvider},
    DomainError, ToolDescriptor, ToolKind,
};
use crate::infrastructure::config::ToolConfig;
use super::SearchArgs;

pub struct WebSearchTool {
    provider: Arc<dyn WebSearchProvider>,
    config: ToolConfig,
}

impl WebSearchTool {
    pub fn new(provider: Arc<dyn WebSearchProvider>, config: ToolConfig) -> Self {
        Self { provider, config }
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
                        "description": "A web search query"
                    }
                },
                "required": ["query"]
            }),
        }
    }
}

impl Tool for WebSearchTool {
    const NAME: &'static str = "web_search";

    type Error = DomainError;
    type Args = SearchArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        self.tool_definition()
    }

    #[instrument(skip(self))]
    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        self.provider.search(&args.query).await
    }
}

#[async_trait]
impl ToolAdapter for WebSearchTool {
    fn descriptor(&self) -> ToolDescriptor {
        let definition = self.tool_definition();
        ToolDescriptor {
            kind: ToolKind::WebSearch,
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
