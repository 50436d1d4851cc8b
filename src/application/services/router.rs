//! Per-turn tool-routing loop.
//!
//! Each request carries the question, the scratchpad and the tool definitions, and
//! the model either answers or calls one tool. Tool output goes back into the
//! scratchpad and the model decides again. Which tool to use is entirely the model's choice; this
//! module only enforces the protocol, the iteration cap and the turn deadline.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::application::ToolRegistry;
use crate::domain::{ports::LlmService, AgentDecision, DomainError, Turn};
use crate::infrastructure::config::AgentConfig;

pub const ITERATION_LIMIT_ANSWER: &str = "Agent stopped due to iteration limit or time limit.";

enum Step {
    AwaitingDecision,
    ToolInvocation { tool: String, input: String },
    Answering(String),
}

pub struct ToolRouter {
    llm: Arc<dyn LlmService>,
    tools: ToolRegistry,
    system_prompt: String,
    max_iterations: usize,
    parse_retries: usize,
    timeout: Duration,
}

impl ToolRouter {
    pub fn new(
        llm: Arc<dyn LlmService>,
        tools: ToolRegistry,
        system_prompt: &str,
        config: &AgentConfig,
    ) -> Self {
        Self {
            llm,
            tools,
            system_prompt: system_prompt.to_string(),
            max_iterations: config.max_iterations.max(1),
            parse_retries: config.parse_retries,
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Runs one turn to completion or until the deadline passes.
    pub async fn run(&self, input: &str) -> Result<Turn, DomainError> {
        tokio::time::timeout(self.timeout, self.run_turn(input))
            .await
            .map_err(|_| {
                DomainError::timeout(format!("turn exceeded {}s", self.timeout.as_secs()))
            })?
    }

    #[instrument(skip(self), fields(turn_id = tracing::field::Empty))]
    async fn run_turn(&self, input: &str) -> Result<Turn, DomainError> {
        let mut turn = Turn::new(input);
        tracing::Span::current().record("turn_id", tracing::field::display(turn.id));

        let mut step = Step::AwaitingDecision;
        let mut decisions = 0;
        let mut retries_left = self.parse_retries;
        let mut correction: Option<String> = None;

        loop {
            step = match step {
                Step::AwaitingDecision if decisions >= self.max_iterations => {
                    warn!(decisions, "iteration limit reached");
                    Step::Answering(ITERATION_LIMIT_ANSWER.to_string())
                }
                Step::AwaitingDecision => {
                    decisions += 1;
                    let prompt = render_turn_prompt(&turn, correction.take().as_deref());
                    let reply = self
                        .llm
                        .complete_with_tools(
                            &self.system_prompt,
                            &prompt,
                            self.tools.descriptors(),
                        )
                        .await?;

                    match AgentDecision::from_reply(reply) {
                        AgentDecision::Final(answer) => Step::Answering(answer),
                        AgentDecision::ToolCall { tool, input } => {
                            Step::ToolInvocation { tool, input }
                        }
                        AgentDecision::Malformed(reason) if retries_left > 0 => {
                            warn!(reason = %reason, "unparseable model reply, re-prompting");
                            retries_left -= 1;
                            correction = Some(reason);
                            Step::AwaitingDecision
                        }
                        AgentDecision::Malformed(reason) => {
                            return Err(DomainError::parse(reason));
                        }
                    }
                }
                Step::ToolInvocation { tool, input } => {
                    let output = if self.tools.resolve(&tool).is_some() {
                        info!(tool = %tool, iteration = decisions, "invoking tool");
                        self.tools.dispatch(&tool, &input).await?
                    } else {
                        warn!(tool = %tool, "model named an unknown tool");
                        format!(
                            "`{tool}` is not a valid tool, try one of [{}].",
                            self.tools.names().join(", ")
                        )
                    };
                    turn.record(tool, input, output);
                    Step::AwaitingDecision
                }
                Step::Answering(answer) => {
                    info!(tool_calls = turn.tool_calls(), "turn answered");
                    turn.finish(answer);
                    return Ok(turn);
                }
            };
        }
    }
}

fn render_turn_prompt(turn: &Turn, correction: Option<&str>) -> String {
    let mut prompt = format!("Question: {}\n", turn.user_input);

    if !turn.scratchpad.is_empty() {
        prompt.push_str("\nTool results so far:\n");
        for entry in &turn.scratchpad {
            prompt.push_str(&format!(
                "Tool: {}\nInput: {}\nResult: {}\n\n",
                entry.tool_name, entry.tool_input, entry.tool_output
            ));
        }
    }

    if let Some(reason) = correction {
        prompt.push_str(&format!(
            "\nYour previous reply could not be used ({reason}). \
             Call one of the tools or answer in plain text.\n"
        ));
    }

    prompt.push_str("\nNext step:");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ports::ToolAdapter, ToolKind};
    use crate::testing::{ScriptedLlm, StaticTool};
    use serde_json::json;

    const DOCS: &str = "Document_and_Policy_Search";
    const DB: &str = "Employee_and_Project_Database_Search";

    struct Fixture {
        docs: Arc<StaticTool>,
        db: Arc<StaticTool>,
        web: Arc<StaticTool>,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_docs(StaticTool::ok(
                ToolKind::DocumentSearch,
                DOCS,
                "Remote work is allowed two days a week.",
            ))
        }

        fn with_docs(docs: StaticTool) -> Self {
            Self {
                docs: Arc::new(docs),
                db: Arc::new(StaticTool::ok(
                    ToolKind::DatabaseSearch,
                    DB,
                    "Bob leads AI Agent Alpha.",
                )),
                web: Arc::new(StaticTool::failing(
                    ToolKind::WebSearch,
                    "Web_Search",
                    "search API unreachable",
                )),
            }
        }

        fn router_with(&self, llm: Arc<ScriptedLlm>, config: &AgentConfig) -> ToolRouter {
            let tools: Vec<Arc<dyn ToolAdapter>> =
                vec![self.docs.clone(), self.db.clone(), self.web.clone()];
            ToolRouter::new(
                llm,
                ToolRegistry::new(tools).unwrap(),
                "You are a helpful assistant.",
                config,
            )
        }

        fn router(&self, llm: Arc<ScriptedLlm>) -> ToolRouter {
            self.router_with(llm, &AgentConfig::default())
        }
    }

    #[tokio::test]
    async fn test_direct_answer_invokes_no_tool() {
        let fx = Fixture::new();
        let llm = Arc::new(ScriptedLlm::new(["Hello!"]));

        let turn = fx.router(llm.clone()).run("hi").await.unwrap();

        assert_eq!(turn.final_output.as_deref(), Some("Hello!"));
        assert!(turn.scratchpad.is_empty());
        assert_eq!(fx.docs.calls() + fx.db.calls() + fx.web.calls(), 0);
    }

    #[tokio::test]
    async fn test_tool_output_feeds_next_decision() {
        let fx = Fixture::new();
        let llm = Arc::new(ScriptedLlm::new([
            ScriptedLlm::tool_call(DB, json!({"question": "Who leads AI Agent Alpha?"})),
            ScriptedLlm::tool_call(DOCS, json!({"query": "remote work"})),
            "Bob, and remote work is allowed.".into(),
        ]));

        let turn = fx
            .router(llm.clone())
            .run("Who leads Alpha and what is the remote policy?")
            .await
            .unwrap();

        assert_eq!(turn.scratchpad.len(), 2);
        assert_eq!(turn.scratchpad[0].tool_name, DB);
        assert_eq!(turn.scratchpad[0].tool_output, "Bob leads AI Agent Alpha.");
        assert_eq!(fx.db.inputs(), vec!["Who leads AI Agent Alpha?".to_string()]);
        assert_eq!(fx.docs.inputs(), vec!["remote work".to_string()]);

        let prompts = llm.prompts();
        assert!(prompts[2].1.contains("Bob leads AI Agent Alpha."));
        assert!(prompts[2].1.contains("Remote work is allowed"));
        assert_eq!(prompts[0].0, "You are a helpful assistant.");
    }

    #[tokio::test]
    async fn test_every_request_offers_all_tools() {
        let fx = Fixture::new();
        let llm = Arc::new(ScriptedLlm::new([
            ScriptedLlm::tool_call(DOCS, json!({"query": "remote work"})),
            "Two days a week.".into(),
        ]));

        fx.router(llm.clone()).run("remote policy?").await.unwrap();

        let offered = llm.offered();
        assert_eq!(offered.len(), 2);
        for names in offered {
            assert_eq!(names, vec![DOCS, DB, "Web_Search"]);
        }
    }

    #[tokio::test]
    async fn test_json_text_reply_is_still_routed() {
        let fx = Fixture::new();
        let llm = Arc::new(ScriptedLlm::new([
            r#"{"action":"tool_call","tool":"Employee_and_Project_Database_Search","input":"Who is Bob?"}"#,
            "Bob is a manager.",
        ]));

        let turn = fx.router(llm).run("Who is Bob?").await.unwrap();

        assert_eq!(fx.db.inputs(), vec!["Who is Bob?".to_string()]);
        assert_eq!(turn.final_output.as_deref(), Some("Bob is a manager."));
    }

    #[tokio::test]
    async fn test_tool_failure_fails_the_turn() {
        let fx = Fixture::new();
        let llm = Arc::new(ScriptedLlm::new([ScriptedLlm::tool_call(
            "Web_Search",
            json!({"query": "weather"}),
        )]));

        let err = fx.router(llm).run("What's the weather?").await.unwrap_err();
        assert!(err.to_string().contains("search API unreachable"));
    }

    #[tokio::test]
    async fn test_malformed_reply_is_reprompted_once() {
        let fx = Fixture::new();
        let llm = Arc::new(ScriptedLlm::new([
            ScriptedLlm::tool_call("", json!({"query": "x"})),
            "Recovered.".into(),
        ]));

        let turn = fx.router(llm.clone()).run("question").await.unwrap();

        assert_eq!(turn.final_output.as_deref(), Some("Recovered."));
        assert!(llm.prompts()[1].1.contains("could not be used"));
    }

    #[tokio::test]
    async fn test_second_malformed_reply_fails_the_turn() {
        let fx = Fixture::new();
        let llm = Arc::new(ScriptedLlm::new([
            r#"{"action":"tool_call""#,
            r#"{"action":"dance"}"#,
        ]));

        let err = fx.router(llm).run("question").await.unwrap_err();
        assert!(matches!(err, DomainError::Parse(_)));
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_an_observation() {
        let fx = Fixture::new();
        let llm = Arc::new(ScriptedLlm::new([
            ScriptedLlm::tool_call("Calculator", json!({"query": "2+2"})),
            "I cannot calculate.".into(),
        ]));

        let turn = fx.router(llm).run("2+2?").await.unwrap();

        assert!(turn.scratchpad[0].tool_output.contains("is not a valid tool"));
        assert_eq!(fx.docs.calls() + fx.db.calls() + fx.web.calls(), 0);
    }

    #[tokio::test]
    async fn test_iteration_limit_stops_the_turn() {
        let fx = Fixture::new();
        let call = ScriptedLlm::tool_call(DOCS, json!({"query": "x"}));
        let llm = Arc::new(ScriptedLlm::new(vec![call; 4]));
        let config = AgentConfig {
            max_iterations: 3,
            ..AgentConfig::default()
        };

        let turn = fx
            .router_with(llm.clone(), &config)
            .run("loop forever")
            .await
            .unwrap();

        assert_eq!(turn.final_output.as_deref(), Some(ITERATION_LIMIT_ANSWER));
        assert_eq!(fx.docs.calls(), 3);
        assert_eq!(llm.calls(), 3);
    }

    #[tokio::test]
    async fn test_slow_tool_times_out_the_turn() {
        let fx = Fixture::with_docs(
            StaticTool::ok(ToolKind::DocumentSearch, DOCS, "late").with_delay(Duration::from_secs(5)),
        );
        let llm = Arc::new(ScriptedLlm::new([
            ScriptedLlm::tool_call(DOCS, json!({"query": "handbook"})),
            "never reached".into(),
        ]));

        let err = fx
            .router(llm.clone())
            .with_timeout(Duration::from_millis(50))
            .run("what does the handbook say?")
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Timeout(_)));
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_model_error_fails_the_turn() {
        let fx = Fixture::new();
        let llm = Arc::new(ScriptedLlm::new(Vec::<String>::new()));

        let err = fx.router(llm).run("anything").await.unwrap_err();
        assert!(matches!(err, DomainError::ExternalService(_)));
    }
}
