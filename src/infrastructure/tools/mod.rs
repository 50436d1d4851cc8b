mod database_search;
mod document_search;
mod web_search;

pub use database_search::{DatabaseSearchTool, QuestionArgs};
pub use document_search::{DocumentSearchTool, SearchArgs};
pub use web_search::WebSearchTool;
