use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use company_agent::application::IngestionService;
use company_agent::domain::{ports::EmbeddingService, TextSplitter};
use company_agent::infrastructure::config::{required_env, GEMINI_API_KEY_ENV};
use company_agent::infrastructure::{AppConfig, FlatVectorIndex, TextEmbedding};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ingest=info,company_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let app = AppConfig::load()?;
    let api_key = required_env(GEMINI_API_KEY_ENV)?;
    let rag = &app.config.rag;

    let embedding = Arc::new(TextEmbedding::from_config(&app.config.embedding, &api_key)?);
    let store = Arc::new(FlatVectorIndex::new(embedding.model(), embedding.dimension()));

    let splitter = TextSplitter::new(rag.chunk_size, rag.chunk_overlap)?;
    let service = IngestionService::new(embedding, splitter, rag.extension.clone());

    info!(docs_dir = %rag.docs_dir.display(), "ingesting documents");
    let report = service.ingest(&rag.docs_dir, store, &rag.index_path).await?;

    println!(
        "Indexed {} document(s) as {} chunk(s) into {}",
        report.documents,
        report.chunks,
        report.index_path.display()
    );
    Ok(())
}
