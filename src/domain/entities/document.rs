use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// A plain-text source file loaded for ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub source_id: String,
    pub content: String,
}

impl Document {
    pub fn new(source_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_id: source_id.into(),
            content: content.into(),
        }
    }

    pub fn from_path(path: &Path, content: impl Into<String>) -> Self {
        Self::new(path.to_string_lossy(), content)
    }
}

/// A bounded slice of a document. Never mutated after ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: Uuid,
    pub document_id: Uuid,
    pub source_id: String,
    pub text: String,
    pub position: usize,
}

impl DocumentChunk {
    pub fn new(document: &Document, text: impl Into<String>, position: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id: document.id,
            source_id: document.source_id.clone(),
            text: text.into(),
            position,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: DocumentChunk,
    pub score: f32,
}
