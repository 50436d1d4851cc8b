use async_trait::async_trait;
use rig::client::EmbeddingsClient;
use rig::embeddings::EmbeddingsBuilder;
use rig::providers::gemini;
use std::collections::HashMap;
use tracing::instrument;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};
use crate::infrastructure::config::EmbeddingConfig;

/// Gemini text embeddings. Batching is left to the rig embeddings builder.
pub struct TextEmbedding {
    client: gemini::Client,
    model: String,
    dimension: usize,
}

impl TextEmbedding {
    pub fn from_config(config: &EmbeddingConfig, api_key: &str) -> Result<Self, DomainError> {
        let client: gemini::Client = gemini::Client::new(api_key)
            .map_err(|e| DomainError::config(format!("Gemini client: {e}")))?;

        Ok(Self {
            client,
            model: config.model.clone(),
            dimension: config.dimension,
        })
    }

    fn check_dimension(&self, embedding: Embedding) -> Result<Embedding, DomainError> {
        if embedding.dimension() != self.dimension {
            return Err(DomainError::config(format!(
                "embedding model {} returned {} dimensions, expected {}",
                self.model,
                embedding.dimension(),
                self.dimension
            )));
        }
        Ok(embedding)
    }
}

#[async_trait]
impl EmbeddingService for TextEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::internal("No embedding returned"))
    }

    #[instrument(skip(self, texts), fields(model = %self.model, count = texts.len()))]
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.client.embedding_model(&self.model);

        let mut builder = EmbeddingsBuilder::new(model);
        for text in texts {
            builder = builder
                .document(text.to_string())
                .map_err(|e| DomainError::external(e.to_string()))?;
        }

        let embeddings = builder
            .build()
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        // The builder may return documents out of order.
        let by_text: HashMap<String, Embedding> = embeddings
            .into_iter()
            .map(|(doc, emb)| (doc, Embedding::from(emb.first().vec)))
            .collect();

        texts
            .iter()
            .map(|text| {
                by_text
                    .get(*text)
                    .cloned()
                    .ok_or_else(|| DomainError::external("Embedding missing from response"))
                    .and_then(|e| self.check_dimension(e))
            })
            .collect()
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
