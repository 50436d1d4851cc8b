use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use company_agent::infrastructure::{database, AppConfig};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bootstrap=info,company_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let app = AppConfig::load()?;
    let path = &app.config.database.path;
    let report = database::bootstrap(path)?;

    println!(
        "Database {} created with {} employee(s) and {} project(s)",
        path.display(),
        report.employees,
        report.projects
    );
    Ok(())
}
