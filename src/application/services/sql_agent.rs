use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::domain::{
    ports::{LlmService, QueryMode, QueryResult, SqlDatabase},
    DomainError,
};
use crate::infrastructure::config::{DatabaseConfig, SqlPrompts};

/// Answers natural-language questions by having the model write SQL, running it,
/// and having the model phrase the result.
pub struct SqlAgent {
    llm: Arc<dyn LlmService>,
    db: Arc<dyn SqlDatabase>,
    prompts: SqlPrompts,
    mode: QueryMode,
    max_attempts: usize,
    top_k: usize,
}

impl SqlAgent {
    pub fn new(
        llm: Arc<dyn LlmService>,
        db: Arc<dyn SqlDatabase>,
        prompts: SqlPrompts,
        config: &DatabaseConfig,
    ) -> Self {
        Self {
            llm,
            db,
            prompts,
            mode: if config.read_only {
                QueryMode::ReadOnly
            } else {
                QueryMode::ReadWrite
            },
            max_attempts: config.max_attempts.max(1),
            top_k: config.top_k,
        }
    }

    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    #[instrument(skip(self))]
    pub async fn ask(&self, question: &str) -> Result<String, DomainError> {
        let table_info = self.db.table_info().await?;
        let system = self
            .prompts
            .query
            .replace("{dialect}", self.db.dialect())
            .replace("{top_k}", &self.top_k.to_string())
            .replace("{table_info}", &table_info);

        let mut feedback: Vec<String> = Vec::new();
        for attempt in 1..=self.max_attempts {
            let reply = self
                .llm
                .complete_with_system(&system, &query_prompt(question, &feedback))
                .await?;

            let Some(sql) = extract_sql(&reply) else {
                warn!(attempt, "model reply contained no SQL");
                feedback.push("The previous reply did not contain a SQL query.".to_string());
                continue;
            };

            match self.db.run(&sql, self.mode).await {
                Ok(result) => {
                    info!(attempt, rows = result.rows.len(), "query succeeded");
                    return self.answer(question, &sql, &result).await;
                }
                Err(e @ (DomainError::ExternalService(_) | DomainError::Validation(_))) => {
                    warn!(attempt, error = %e, "query rejected");
                    feedback.push(format!("Query:\n{sql}\nFailed with: {e}"));
                }
                Err(e) => return Err(e),
            }
        }

        Err(DomainError::external(format!(
            "could not produce a working SQL query in {} attempt(s): {}",
            self.max_attempts,
            feedback.last().map(String::as_str).unwrap_or("no details")
        )))
    }

    async fn answer(
        &self,
        question: &str,
        sql: &str,
        result: &QueryResult,
    ) -> Result<String, DomainError> {
        let prompt = format!(
            "Question: {question}\n\nSQL query:\n{sql}\n\nResult:\n{}\n\nAnswer:",
            result.render()
        );
        let answer = self
            .llm
            .complete_with_system(&self.prompts.answer, &prompt)
            .await?;
        Ok(answer.trim().to_string())
    }
}

fn query_prompt(question: &str, feedback: &[String]) -> String {
    if feedback.is_empty() {
        return format!("Question: {question}");
    }

    format!(
        "Question: {question}\n\nEarlier attempts failed:\n{}\n\nWrite a corrected query.",
        feedback.join("\n\n")
    )
}

/// Pulls the SQL statement out of a model reply, tolerating code fences and a
/// `SQLQuery:` label.
fn extract_sql(reply: &str) -> Option<String> {
    let mut text = reply.trim();

    if let Some(start) = text.find("```") {
        let after = &text[start + 3..];
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after[body_start..];
        text = body.find("```").map(|end| &body[..end]).unwrap_or(body);
    }

    let text = text.trim();
    let text = text
        .strip_prefix("SQLQuery:")
        .or_else(|| text.strip_prefix("SQL:"))
        .unwrap_or(text)
        .trim();

    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{database, SqliteDatabase};
    use crate::testing::ScriptedLlm;

    fn seeded_db() -> (tempfile::TempDir, Arc<SqliteDatabase>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("company_data.db");
        database::bootstrap(&path).unwrap();
        (dir, Arc::new(SqliteDatabase::open(&path, 50).unwrap()))
    }

    fn agent(llm: Arc<ScriptedLlm>, db: Arc<SqliteDatabase>, read_only: bool) -> SqlAgent {
        let config = DatabaseConfig {
            read_only,
            ..DatabaseConfig::default()
        };
        SqlAgent::new(llm, db, SqlPrompts::default(), &config)
    }

    #[tokio::test]
    async fn test_answers_from_query_result() {
        let (_dir, db) = seeded_db();
        let llm = Arc::new(ScriptedLlm::new([
            "```sql\nSELECT e.name FROM projects p JOIN employees e ON p.lead_id = e.id WHERE p.project_id = 101\n```",
            "Bob leads AI Agent Alpha.",
        ]));

        let answer = agent(llm.clone(), db, true)
            .ask("Who leads AI Agent Alpha?")
            .await
            .unwrap();

        assert_eq!(answer, "Bob leads AI Agent Alpha.");
        let prompts = llm.prompts();
        assert!(prompts[0].0.contains("sqlite"));
        assert!(prompts[0].0.contains("lead_id"));
        assert!(prompts[1].1.contains("Bob"));
    }

    #[tokio::test]
    async fn test_sql_error_is_fed_back_and_retried() {
        let (_dir, db) = seeded_db();
        let llm = Arc::new(ScriptedLlm::new([
            "SELECT lead FROM projects",
            "SELECT COUNT(*) FROM projects",
            "There are 3 projects.",
        ]));

        let answer = agent(llm.clone(), db, true)
            .ask("How many projects are there?")
            .await
            .unwrap();

        assert_eq!(answer, "There are 3 projects.");
        assert!(llm.prompts()[1].1.contains("Failed with"));
    }

    #[tokio::test]
    async fn test_read_only_rejects_writes_until_attempts_run_out() {
        let (_dir, db) = seeded_db();
        let llm = Arc::new(ScriptedLlm::new([
            "DELETE FROM employees",
            "DROP TABLE projects",
            "UPDATE employees SET role = 'x'",
        ]));

        let err = agent(llm, db.clone(), true)
            .ask("Remove everyone")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ExternalService(_)));

        let count = db
            .run("SELECT COUNT(*) FROM employees", QueryMode::ReadOnly)
            .await
            .unwrap();
        assert_eq!(count.rows[0][0], "3");
    }

    #[tokio::test]
    async fn test_read_write_mode_passes_statements_through() {
        let (_dir, db) = seeded_db();
        let llm = Arc::new(ScriptedLlm::new([
            "UPDATE projects SET status = 'Completed' WHERE project_id = 103",
            "Project 103 is now completed.",
        ]));

        agent(llm, db.clone(), false)
            .ask("Mark project 103 as completed")
            .await
            .unwrap();

        let status = db
            .run(
                "SELECT status FROM projects WHERE project_id = 103",
                QueryMode::ReadOnly,
            )
            .await
            .unwrap();
        assert_eq!(status.rows[0][0], "Completed");
    }

    #[tokio::test]
    async fn test_default_config_passes_writes_through() {
        let (_dir, db) = seeded_db();
        let llm = Arc::new(ScriptedLlm::new([
            "DELETE FROM projects WHERE project_id = 103",
            "Project 103 was removed.",
        ]));
        let sql_agent = SqlAgent::new(llm, db.clone(), SqlPrompts::default(), &DatabaseConfig::default());
        assert_eq!(sql_agent.mode(), QueryMode::ReadWrite);

        sql_agent.ask("Remove project 103").await.unwrap();

        let count = db
            .run("SELECT COUNT(*) FROM projects", QueryMode::ReadOnly)
            .await
            .unwrap();
        assert_eq!(count.rows[0][0], "2");
    }

    #[test]
    fn test_extract_sql_variants() {
        assert_eq!(
            extract_sql("SQLQuery: SELECT 1").as_deref(),
            Some("SELECT 1")
        );
        assert_eq!(
            extract_sql("Here you go:\n```sql\nSELECT 2;\n```").as_deref(),
            Some("SELECT 2;")
        );
        assert_eq!(extract_sql("   "), None);
    }
}
