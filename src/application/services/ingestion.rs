use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::application::RagService;
use crate::domain::{
    ports::{EmbeddingService, VectorStore},
    Document, DocumentChunk, DomainError, TextSplitter,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
    pub index_path: PathBuf,
}

/// Turns a directory of text files into a persisted similarity index.
///
/// Any failure aborts the run before the index is written; there is no partial save.
pub struct IngestionService {
    embedding: Arc<dyn EmbeddingService>,
    splitter: TextSplitter,
    extension: String,
}

impl IngestionService {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        splitter: TextSplitter,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            embedding,
            splitter,
            extension: extension.into().trim_start_matches('.').to_string(),
        }
    }

    /// Reads every matching file directly inside `dir`, in file-name order.
    #[instrument(skip(self))]
    pub async fn load_documents(&self, dir: &Path) -> Result<Vec<Document>, DomainError> {
        let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
            DomainError::not_found(format!("document directory {}: {e}", dir.display()))
        })?;

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            // Follows symlinks; a dangling link is skipped.
            let is_file = tokio::fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if is_file && self.matches_extension(&path) {
                paths.push(path);
            } else {
                debug!(path = %path.display(), "skipped");
            }
        }
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
                DomainError::internal(format!("reading {}: {e}", path.display()))
            })?;
            documents.push(Document::from_path(&path, content));
        }

        info!(count = documents.len(), "documents loaded");
        Ok(documents)
    }

    pub fn split(&self, documents: &[Document]) -> Vec<DocumentChunk> {
        documents
            .iter()
            .flat_map(|doc| self.splitter.split_document(doc))
            .collect()
    }

    /// Loads, splits and embeds `dir` into `store`, then persists the store at `index_path`.
    #[instrument(skip(self, store))]
    pub async fn ingest(
        &self,
        dir: &Path,
        store: Arc<dyn VectorStore>,
        index_path: &Path,
    ) -> Result<IngestReport, DomainError> {
        let documents = self.load_documents(dir).await?;
        let chunks = self.split(&documents);
        info!(
            documents = documents.len(),
            chunks = chunks.len(),
            "documents split"
        );

        let rag = RagService::new(self.embedding.clone(), store.clone());
        rag.index_chunks(&chunks).await?;
        store.persist(index_path)?;

        Ok(IngestReport {
            documents: documents.len(),
            chunks: chunks.len(),
            index_path: index_path.to_path_buf(),
        })
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }
}
