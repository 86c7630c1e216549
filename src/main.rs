use anyhow::Result;
use gamestore_db::{demos, GameStoreDb};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // File-backed database at a well-known path in the host temp directory.
    let path = std::env::temp_dir().join("gamestore.sqlite");
    tracing::info!(path = %path.display(), "opening game store database");

    let db = GameStoreDb::open(&path)?;
    demos::run_all(&db)?;
    Ok(())
}
