//! In-process fakes shared by unit tests. Nothing here touches the network.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::ports::{EmbeddingService, LlmService, ToolAdapter, WebSearchProvider};
use crate::domain::{DomainError, Embedding, ModelReply, ToolDescriptor, ToolKind};

/// Bag-of-words embedding over a fixed vocabulary.
pub struct KeywordEmbedding;

impl KeywordEmbedding {
    pub const VOCABULARY: [&'static str; 12] = [
        "vacation", "leave", "policy", "project", "alpha", "brief", "security", "badge",
        "remote", "work", "handbook", "dashboard",
    ];
    pub const DIMENSION: usize = Self::VOCABULARY.len();

    pub fn vector(text: &str) -> Embedding {
        let mut v = vec![0.0; Self::DIMENSION];
        for word in text.split(|c: char| !c.is_alphanumeric()) {
            let word = word.to_lowercase();
            if let Some(i) = Self::VOCABULARY.iter().position(|w| *w == word) {
                v[i] += 1.0;
            }
        }
        Embedding::new(v)
    }
}

#[async_trait]
impl EmbeddingService for KeywordEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn model(&self) -> &str {
        "keyword"
    }

    fn dimension(&self) -> usize {
        Self::DIMENSION
    }
}

pub struct FailingEmbedding;

#[async_trait]
impl EmbeddingService for FailingEmbedding {
    async fn embed(&self, _text: &str) -> Result<Embedding, DomainError> {
        Err(DomainError::external("embedding service unavailable"))
    }

    async fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        Err(DomainError::external("embedding service unavailable"))
    }

    fn model(&self) -> &str {
        "keyword"
    }

    fn dimension(&self) -> usize {
        KeywordEmbedding::DIMENSION
    }
}

/// Replays canned replies in order and records every prompt it was given.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<ModelReply>>,
    prompts: Mutex<Vec<(String, String)>>,
    offered: Mutex<Vec<Vec<String>>>,
}

impl ScriptedLlm {
    pub fn new<I, R>(replies: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ModelReply>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// A structured tool call as a tool-calling model would return it.
    pub fn tool_call(name: &str, arguments: serde_json::Value) -> ModelReply {
        ModelReply::ToolCall {
            name: name.to_string(),
            arguments,
        }
    }

    /// `(system, prompt)` pairs in call order.
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }

    /// Tool names offered on each tool-calling request.
    pub fn offered(&self) -> Vec<Vec<String>> {
        self.offered.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn next_reply(&self, system: &str, prompt: &str) -> Result<ModelReply, DomainError> {
        self.prompts
            .lock()
            .unwrap()
            .push((system.to_string(), prompt.to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| DomainError::external("script exhausted"))
    }
}

#[async_trait]
impl LlmService for ScriptedLlm {
    async fn complete_with_system(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<String, DomainError> {
        match self.next_reply(system, prompt)? {
            ModelReply::Text(text) => Ok(text),
            ModelReply::ToolCall { name, .. } => Err(DomainError::internal(format!(
                "scripted tool call to `{name}` on a text-only request"
            ))),
        }
    }

    async fn complete_with_tools(
        &self,
        system: &str,
        prompt: &str,
        tools: &[ToolDescriptor],
    ) -> Result<ModelReply, DomainError> {
        self.offered
            .lock()
            .unwrap()
            .push(tools.iter().map(|t| t.name.clone()).collect());
        self.next_reply(system, prompt)
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// A tool that returns a fixed output or fails, counting its invocations.
pub struct StaticTool {
    descriptor: ToolDescriptor,
    output: Result<String, String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    inputs: Mutex<Vec<String>>,
}

impl StaticTool {
    pub fn ok(kind: ToolKind, name: &str, output: &str) -> Self {
        Self::build(kind, name, Ok(output.to_string()))
    }

    pub fn failing(kind: ToolKind, name: &str, message: &str) -> Self {
        Self::build(kind, name, Err(message.to_string()))
    }

    fn build(kind: ToolKind, name: &str, output: Result<String, String>) -> Self {
        Self {
            descriptor: ToolDescriptor {
                kind,
                name: name.to_string(),
                description: format!("{name} test tool"),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": { "query": { "type": "string" } },
                    "required": ["query"]
                }),
            },
            output,
            delay: None,
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// Sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolAdapter for StaticTool {
    fn descriptor(&self) -> ToolDescriptor {
        self.descriptor.clone()
    }

    async fn invoke(&self, input: &str) -> Result<String, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(input.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.output.clone().map_err(DomainError::external)
    }
}

pub struct StaticSearch(pub Result<String, String>);

#[async_trait]
impl WebSearchProvider for StaticSearch {
    async fn search(&self, _query: &str) -> Result<String, DomainError> {
        self.0.clone().map_err(DomainError::external)
    }
}
