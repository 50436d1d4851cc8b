use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The closed set of capabilities the routing agent can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    DocumentSearch,
    DatabaseSearch,
    WebSearch,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [
        ToolKind::DocumentSearch,
        ToolKind::DatabaseSearch,
        ToolKind::WebSearch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentSearch => "document_search",
            Self::DatabaseSearch => "database_search",
            Self::WebSearch => "web_search",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the model sees of a tool: a unique name, a steering description and the
/// JSON schema of its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub kind: ToolKind,
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// What a model returned when it was offered tools.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    Text(String),
    ToolCall { name: String, arguments: Value },
}

impl From<&str> for ModelReply {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ModelReply {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// The model's reply at a decision point.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentDecision {
    Final(String),
    ToolCall { tool: String, input: String },
    Malformed(String),
}

impl AgentDecision {
    /// Interprets a reply from a tool-calling model. Structured calls map directly;
    /// text goes through [`AgentDecision::parse`].
    pub fn from_reply(reply: ModelReply) -> Self {
        match reply {
            ModelReply::ToolCall { name, arguments } => {
                let tool = name.trim();
                if tool.is_empty() {
                    return Self::Malformed("tool call without a tool name".to_string());
                }
                Self::ToolCall {
                    tool: tool.to_string(),
                    input: input_text(&arguments),
                }
            }
            ModelReply::Text(text) => Self::parse(&text),
        }
    }

    /// Interprets a model reply.
    ///
    /// Expected shapes are `{"action":"tool_call","tool":..,"input":..}` and
    /// `{"action":"final","answer":..}`, optionally wrapped in a code fence. Prose
    /// without any JSON object is accepted as a final answer.
    pub fn parse(reply: &str) -> Self {
        let text = strip_code_fence(reply.trim());
        if text.is_empty() {
            return Self::Malformed("empty reply".to_string());
        }

        let looks_structured = text.starts_with('{') || text.contains("\"action\"");

        match extract_json(text) {
            Some(Ok(value)) => match decision_from_value(&value) {
                Ok(decision) => decision,
                Err(reason) if looks_structured => Self::Malformed(reason),
                Err(_) => Self::Final(text.to_string()),
            },
            Some(Err(e)) if looks_structured => Self::Malformed(format!("invalid JSON: {e}")),
            None if looks_structured => Self::Malformed("unterminated JSON object".to_string()),
            _ => Self::Final(text.to_string()),
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn extract_json(text: &str) -> Option<Result<Value, serde_json::Error>> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Some(Ok(value));
    }

    let mut first_error = None;
    for candidate in balanced_objects(text) {
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) if value.get("action").is_some() || value.get("type").is_some() => {
                return Some(Ok(value));
            }
            Ok(_) => {}
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    first_error.map(Err)
}

/// Every `{ .. }` span with balanced braces, by start position. Braces inside
/// string literals do not count.
fn balanced_objects(text: &str) -> impl Iterator<Item = &str> + '_ {
    text.char_indices()
        .filter(|(_, c)| *c == '{')
        .filter_map(move |(start, _)| {
            let rest = &text[start..];
            matching_brace(rest).map(|end| &rest[..=end])
        })
}

fn matching_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn decision_from_value(value: &Value) -> Result<AgentDecision, String> {
    let object = value
        .as_object()
        .ok_or_else(|| "expected a JSON object".to_string())?;

    let action = object
        .get("action")
        .or_else(|| object.get("type"))
        .and_then(Value::as_str)
        .ok_or_else(|| "missing \"action\" field".to_string())?;

    match action {
        "tool_call" | "tool" => {
            let tool = object
                .get("tool")
                .or_else(|| object.get("tool_name"))
                .or_else(|| object.get("name"))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| "tool call without a tool name".to_string())?;
            let input = object
                .get("input")
                .or_else(|| object.get("tool_input"))
                .or_else(|| object.get("args"))
                .map(input_text)
                .ok_or_else(|| format!("tool call to `{tool}` without an input"))?;

            Ok(AgentDecision::ToolCall {
                tool: tool.to_string(),
                input,
            })
        }
        "final" | "final_answer" => object
            .get("answer")
            .or_else(|| object.get("output"))
            .or_else(|| object.get("content"))
            .and_then(Value::as_str)
            .map(|answer| AgentDecision::Final(answer.trim().to_string()))
            .ok_or_else(|| "final answer without an \"answer\" field".to_string()),
        other => Err(format!("unknown action `{other}`")),
    }
}

fn input_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => ["query", "input", "question"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tool_call() {
        let decision = AgentDecision::parse(
            r#"{"action":"tool_call","tool":"Web_Search","input":"weather in Paris"}"#,
        );
        assert_eq!(
            decision,
            AgentDecision::ToolCall {
                tool: "Web_Search".into(),
                input: "weather in Paris".into()
            }
        );
    }

    #[test]
    fn test_parse_fenced_final_answer() {
        let decision =
            AgentDecision::parse("```json\n{\"action\": \"final\", \"answer\": \"Bob leads it.\"}\n```");
        assert_eq!(decision, AgentDecision::Final("Bob leads it.".into()));
    }

    #[test]
    fn test_parse_object_input_uses_query_field() {
        let decision = AgentDecision::parse(
            r#"Sure. {"action":"tool_call","tool":"docs","input":{"query":"leave policy"}}"#,
        );
        assert_eq!(
            decision,
            AgentDecision::ToolCall {
                tool: "docs".into(),
                input: "leave policy".into()
            }
        );
    }

    #[test]
    fn test_plain_prose_is_final() {
        let decision = AgentDecision::parse("Alice joined in 2022.");
        assert_eq!(decision, AgentDecision::Final("Alice joined in 2022.".into()));
    }

    #[test]
    fn test_broken_json_is_malformed() {
        assert!(matches!(
            AgentDecision::parse(r#"{"action":"tool_call","tool":"#),
            AgentDecision::Malformed(_)
        ));
    }

    #[test]
    fn test_tool_call_without_input_is_malformed() {
        assert!(matches!(
            AgentDecision::parse(r#"{"action":"tool_call","tool":"Web_Search"}"#),
            AgentDecision::Malformed(_)
        ));
    }

    #[test]
    fn test_empty_reply_is_malformed() {
        assert!(matches!(AgentDecision::parse("   "), AgentDecision::Malformed(_)));
    }

    #[test]
    fn test_braced_prose_before_tool_call_is_skipped() {
        let decision = AgentDecision::parse(
            r#"I might need {maybe} a lookup. {"action":"tool_call","tool":"Web_Search","input":"weather in Paris"} Done."#,
        );
        assert_eq!(
            decision,
            AgentDecision::ToolCall {
                tool: "Web_Search".into(),
                input: "weather in Paris".into()
            }
        );
    }

    #[test]
    fn test_braces_inside_strings_do_not_close_the_object() {
        let decision = AgentDecision::parse(
            r#"Answer: {"action":"final","answer":"Use {curly} braces \"}\" carefully."}"#,
        );
        assert_eq!(
            decision,
            AgentDecision::Final(r#"Use {curly} braces "}" carefully."#.into())
        );
    }

    #[test]
    fn test_structured_tool_call_maps_arguments() {
        let decision = AgentDecision::from_reply(ModelReply::ToolCall {
            name: "Employee_and_Project_Database_Search".into(),
            arguments: serde_json::json!({"question": "Who leads AI Agent Alpha?"}),
        });
        assert_eq!(
            decision,
            AgentDecision::ToolCall {
                tool: "Employee_and_Project_Database_Search".into(),
                input: "Who leads AI Agent Alpha?".into()
            }
        );
    }

    #[test]
    fn test_structured_tool_call_without_name_is_malformed() {
        let decision = AgentDecision::from_reply(ModelReply::ToolCall {
            name: " ".into(),
            arguments: serde_json::json!({"query": "x"}),
        });
        assert!(matches!(decision, AgentDecision::Malformed(_)));
    }

    #[test]
    fn test_text_reply_falls_back_to_parse() {
        assert_eq!(
            AgentDecision::from_reply("Alice joined in 2022.".into()),
            AgentDecision::Final("Alice joined in 2022.".into())
        );
    }

    #[test]
    fn test_prose_with_braces_is_final() {
        let decision = AgentDecision::parse("The statuses are {Planning, Completed}.");
        assert!(matches!(decision, AgentDecision::Final(_)));
    }
}
