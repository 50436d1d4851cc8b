use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One tool round-trip recorded during a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScratchpadEntry {
    pub tool_name: String,
    pub tool_input: String,
    pub tool_output: String,
}

/// A single user utterance and everything the agent did to answer it.
///
/// Turns are not persisted; the agent keeps no memory between them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub id: Uuid,
    pub user_input: String,
    pub scratchpad: Vec<ScratchpadEntry>,
    pub final_output: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(user_input: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_input: user_input.into(),
            scratchpad: Vec::new(),
            final_output: None,
            started_at: Utc::now(),
        }
    }

    pub fn record(
        &mut self,
        tool_name: impl Into<String>,
        tool_input: impl Into<String>,
        tool_output: impl Into<String>,
    ) {
        self.scratchpad.push(ScratchpadEntry {
            tool_name: tool_name.into(),
            tool_input: tool_input.into(),
            tool_output: tool_output.into(),
        });
    }

    pub fn finish(&mut self, output: impl Into<String>) {
        self.final_output = Some(output.into());
    }

    pub fn tool_calls(&self) -> usize {
        self.scratchpad.len()
    }
}
