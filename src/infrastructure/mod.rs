pub mod config;
pub mod database;
pub mod embedding;
pub mod llm;
pub mod search;
pub mod tools;
pub mod vector_store;

pub use config::{AppConfig, Config, PromptsConfig, Secrets};
pub use database::SqliteDatabase;
pub use embedding::TextEmbedding;
pub use llm::GeminiLlm;
pub use search::SerpApiClient;
pub use tools::{DatabaseSearchTool, DocumentSearchTool, WebSearchTool};
pub use vector_store::FlatVectorIndex;
