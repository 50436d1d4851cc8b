use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::DomainError;

pub const CONFIG_DIR_ENV: &str = "AGENT_CONFIG_DIR";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const SERPAPI_API_KEY_ENV: &str = "SERPAPI_API_KEY";

/// Settings plus prompt text, loaded once at startup and passed down explicitly.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptsConfig,
}

impl AppConfig {
    /// Loads `config.yaml` and `prompts.yaml` from `$AGENT_CONFIG_DIR` (default `config/`).
    pub fn load() -> Result<Self, DomainError> {
        let dir = std::env::var(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));
        Self::load_from(&dir)
    }

    /// Missing files fall back to defaults; present files may set any subset of keys.
    pub fn load_from(dir: &Path) -> Result<Self, DomainError> {
        let config: Config = read_yaml(&dir.join("config.yaml"))?.unwrap_or_default();
        let prompts: PromptsConfig = read_yaml(&dir.join("prompts.yaml"))?.unwrap_or_default();

        let app = Self { config, prompts };
        app.validate()?;
        Ok(app)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let rag = &self.config.rag;
        if rag.chunk_size == 0 || rag.chunk_overlap >= rag.chunk_size {
            return Err(DomainError::config(format!(
                "rag.chunk_overlap ({}) must be smaller than rag.chunk_size ({})",
                rag.chunk_overlap, rag.chunk_size
            )));
        }
        if rag.top_k == 0 {
            return Err(DomainError::config("rag.top_k must be at least 1"));
        }
        if self.config.agent.max_iterations == 0 {
            return Err(DomainError::config("agent.max_iterations must be at least 1"));
        }
        if self.config.database.max_attempts == 0 {
            return Err(DomainError::config("database.max_attempts must be at least 1"));
        }
        for (key, seconds) in [
            ("agent.timeout_seconds", self.config.agent.timeout_seconds),
            ("llm.timeout_seconds", self.config.llm.timeout_seconds),
            ("web_search.timeout_seconds", self.config.web_search.timeout_seconds),
        ] {
            if seconds == 0 {
                return Err(DomainError::config(format!("{key} must be at least 1")));
            }
        }

        let tools = &self.config.tools;
        let names = [
            &tools.document_search.name,
            &tools.database_search.name,
            &tools.web_search.name,
        ];
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err(DomainError::config("tool names must not be empty"));
        }
        if names[0] == names[1] || names[0] == names[2] || names[1] == names[2] {
            return Err(DomainError::config("tool names must be unique"));
        }

        Ok(())
    }
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, DomainError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(DomainError::config(format!("{}: {e}", path.display())));
        }
    };

    serde_yaml::from_str(&raw)
        .map(Some)
        .map_err(|e| DomainError::config(format!("{}: {e}", path.display())))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub rag: RagConfig,
    pub database: DatabaseConfig,
    pub web_search: WebSearchConfig,
    pub agent: AgentConfig,
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f64,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.7,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "embedding-001".to_string(),
            dimension: 768,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub docs_dir: PathBuf,
    /// Only files with this extension are ingested.
    pub extension: String,
    pub index_path: PathBuf,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 2,
            chunk_size: 500,
            chunk_overlap: 50,
            docs_dir: PathBuf::from("docs"),
            extension: "txt".to_string(),
            index_path: PathBuf::from("faiss_index"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    /// Rejects statements SQLite does not classify as read-only. Off by default.
    pub read_only: bool,
    pub max_attempts: usize,
    /// Upper bound on rows fed back to the model from a single query.
    pub max_rows: usize,
    /// Row limit the model is asked to apply when the question does not name one.
    pub top_k: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("company_data.db"),
            read_only: false,
            max_attempts: 3,
            max_rows: 50,
            top_k: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebSearchConfig {
    pub endpoint: String,
    pub engine: String,
    pub country: String,
    pub language: String,
    pub google_domain: String,
    pub timeout_seconds: u64,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://serpapi.com/search".to_string(),
            engine: "google".to_string(),
            country: "us".to_string(),
            language: "en".to_string(),
            google_domain: "google.com".to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub max_iterations: usize,
    pub timeout_seconds: u64,
    /// Corrective re-prompts allowed per turn after an unparseable reply.
    pub parse_retries: usize,
    pub verbose: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            timeout_seconds: 180,
            parse_retries: 1,
            verbose: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolConfig {
    pub name: String,
    pub description: String,
    #[serde(default = "default_no_results")]
    pub no_results_message: String,
}

fn default_no_results() -> String {
    "No results found.".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub document_search: ToolConfig,
    pub database_search: ToolConfig,
    pub web_search: ToolConfig,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            document_search: ToolConfig {
                name: "Document_and_Policy_Search".to_string(),
                description: "Use this tool to search for information in company documents, \
                              project briefs, and internal policies."
                    .to_string(),
                no_results_message: "No relevant documents found.".to_string(),
            },
            database_search: ToolConfig {
                name: "Employee_and_Project_Database_Search".to_string(),
                description: "Use this tool to find information about employees, projects, \
                              project status, and project leads. Input to this tool should be \
                              a full question."
                    .to_string(),
                no_results_message: "The database returned no answer.".to_string(),
            },
            web_search: ToolConfig {
                name: "Web_Search".to_string(),
                description: "Use this tool to find up-to-date information on the web, such as \
                              current events, weather, or information not found in internal \
                              documents."
                    .to_string(),
                no_results_message: "No good search result found".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub agent: AgentPrompts,
    pub sql: SqlPrompts,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    pub system: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            system: "You are a helpful assistant. You must use the tools provided to answer \
                     the user's questions."
                .to_string(),
        }
    }
}

/// `query` may use `{dialect}`, `{top_k}` and `{table_info}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SqlPrompts {
    pub query: String,
    pub answer: String,
}

impl Default for SqlPrompts {
    fn default() -> Self {
        Self {
            query: "You are an agent designed to interact with a SQL database.\n\
                    Given an input question, write one syntactically correct {dialect} query \
                    that answers it. Unless the question asks for a specific number of results, \
                    limit the query to at most {top_k} rows. Only select the columns relevant to \
                    the question. Do not modify the database (no INSERT, UPDATE, DELETE, DROP).\n\
                    Reply with the SQL statement only.\n\n\
                    Tables:\n{table_info}"
                .to_string(),
            answer: "You answer questions about a company database. Use only the query result \
                     you are given. If the result is empty, say that no matching records exist."
                .to_string(),
        }
    }
}

/// API keys read once at startup.
#[derive(Clone)]
pub struct Secrets {
    pub gemini_api_key: String,
    pub serpapi_api_key: String,
}

impl Secrets {
    pub fn from_env() -> Result<Self, DomainError> {
        Ok(Self {
            gemini_api_key: required_env(GEMINI_API_KEY_ENV)?,
            serpapi_api_key: required_env(SERPAPI_API_KEY_ENV)?,
        })
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("gemini_api_key", &"<redacted>")
            .field("serpapi_api_key", &"<redacted>")
            .finish()
    }
}

pub fn required_env(name: &str) -> Result<String, DomainError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| DomainError::config(format!("{name} is not set")))
}
