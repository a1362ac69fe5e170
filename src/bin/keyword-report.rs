use study_desk::config::Config;
use study_desk::db::StudyStorage;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let storage = StudyStorage::connect(&cfg.database_url).await?;
    let rows = storage.list_keywords().await?;
    print!("{}", study_desk::report::render(&rows));
    storage.pool().close().await;
    Ok(())
}
