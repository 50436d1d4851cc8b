mod ingestion;
mod rag;
mod registry;
mod router;
mod sql_agent;

pub use ingestion::{IngestReport, IngestionService};
pub use rag::RagService;
pub use registry::ToolRegistry;
pub use router::{ToolRouter, ITERATION_LIMIT_ANSWER};
pub use sql_agent::SqlAgent;
