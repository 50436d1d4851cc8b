//! Application layer - Use cases and orchestration.
//!
//! Services here depend on domain ports (traits) rather than concrete
//! implementations, so every one of them runs against in-process fakes in tests.

pub mod services;

pub use services::{
    IngestReport, IngestionService, RagService, SqlAgent, ToolRegistry, ToolRouter,
    ITERATION_LIMIT_ANSWER,
};
