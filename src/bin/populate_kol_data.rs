use anyhow::Result;
use kolboard::config::KolboardConfig;
use kolboard::repository::Repository;
use kolboard::repository::database::init_database;
use kolboard::repository::seed::seed_kol_accounts;
use tracing::info;

const DEFAULT_COUNT: usize = 500;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let count = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<usize>()
            .map_err(|e| anyhow::anyhow!("Invalid row count {:?}: {}", arg, e))?,
        None => DEFAULT_COUNT,
    };

    let config = KolboardConfig::load()?;
    let db_path = std::env::var("KOLBOARD_DB").unwrap_or(config.database_path);

    println!("Populating {} with {} KOL accounts...", db_path, count);
    let pool = init_database(&db_path).await?;
    let repository = Repository::new(pool);

    let inserted = seed_kol_accounts(&repository, count).await?;
    let total = repository.kols.count(&Default::default()).await?;
    info!(inserted, total, "Seeding finished");

    println!("✅ Inserted {} KOL accounts ({} total)", inserted, total);
    Ok(())
}
