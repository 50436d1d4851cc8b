mod conversation;
mod document;
mod embedding;
mod records;
mod tool;

pub use conversation::{ScratchpadEntry, Turn};
pub use document::{Document, DocumentChunk, SearchResult};
pub use embedding::Embedding;
pub use records::{Employee, Project};
pub use tool::{AgentDecision, ModelReply, ToolDescriptor, ToolKind};
