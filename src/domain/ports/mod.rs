mod embedding;
mod llm;
mod search;
mod sql;
mod tool;
mod vector_store;

pub use embedding::EmbeddingService;
pub use llm::LlmService;
pub use search::WebSearchProvider;
pub use sql::{QueryMode, QueryResult, SqlDatabase};
pub use tool::ToolAdapter;
pub use vector_store::VectorStore;
