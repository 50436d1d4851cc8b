use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use company_agent::application::{RagService, SqlAgent, ToolRegistry, ToolRouter};
use company_agent::cli::{Interrupts, Repl};
use company_agent::domain::ports::{EmbeddingService, LlmService, ToolAdapter};
use company_agent::infrastructure::{
    AppConfig, DatabaseSearchTool, DocumentSearchTool, FlatVectorIndex, GeminiLlm, Secrets,
    SerpApiClient, SqliteDatabase, TextEmbedding, WebSearchTool,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agent=info,company_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let app = AppConfig::load()?;
    let secrets = Secrets::from_env()?;
    let config = &app.config;

    let llm = Arc::new(GeminiLlm::from_config(&config.llm, &secrets.gemini_api_key)?);
    info!(model = %llm.model(), "language model ready");
    let embedding = Arc::new(TextEmbedding::from_config(
        &config.embedding,
        &secrets.gemini_api_key,
    )?);

    let index = Arc::new(FlatVectorIndex::load(
        &config.rag.index_path,
        embedding.model(),
        embedding.dimension(),
    )?);
    let rag = Arc::new(RagService::new(embedding, index));

    let db = Arc::new(SqliteDatabase::open(
        &config.database.path,
        config.database.max_rows,
    )?);
    let sql_agent = Arc::new(SqlAgent::new(
        llm.clone(),
        db,
        app.prompts.sql.clone(),
        &config.database,
    ));
    info!(mode = ?sql_agent.mode(), "database tool ready");

    let search = Arc::new(SerpApiClient::new(
        secrets.serpapi_api_key.clone(),
        config.web_search.clone(),
    )?);

    let tools: Vec<Arc<dyn ToolAdapter>> = vec![
        Arc::new(DocumentSearchTool::new(
            rag,
            config.rag.top_k,
            config.tools.document_search.clone(),
        )),
        Arc::new(DatabaseSearchTool::new(
            sql_agent,
            config.tools.database_search.clone(),
        )),
        Arc::new(WebSearchTool::new(search, config.tools.web_search.clone())),
    ];

    let router = ToolRouter::new(
        llm,
        ToolRegistry::new(tools)?,
        &app.prompts.agent.system,
        &config.agent,
    );
    info!(tools = ?router.tools().names(), "agent ready");

    let mut stdout = tokio::io::stdout();
    let mut interrupts = Interrupts::from_ctrl_c();
    Repl::new(&router)
        .verbose(config.agent.verbose)
        .run(BufReader::new(tokio::io::stdin()), &mut stdout, &mut interrupts)
        .await?;

    // A stdin read left pending by an interrupt would hold up runtime shutdown.
    std::process::exit(0)
}
