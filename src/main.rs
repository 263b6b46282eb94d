use anyhow::Result;
use kolboard::config::KolboardConfig;
use kolboard::domain::kol::{KOL_COLUMNS, KolFilters, KolProfile};
use kolboard::repository::Repository;
use kolboard::repository::database::init_database;
use kolboard::repository::seed::seed_kol_accounts;
use kolboard::services::{KolPageSource, PageLoader, RowView, ToastReporter, VirtualTable};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEMO_ROWS: usize = 500;
const MAX_RETRIES: u32 = 3;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = KolboardConfig::load()?;
    if let Ok(path) = std::env::var("KOLBOARD_DB") {
        config.database_path = path;
    }

    let pool = init_database(&config.database_path).await?;
    let repository = Repository::new(pool);

    if repository.kols.count(&KolFilters::default()).await? == 0 {
        let seeded = seed_kol_accounts(&repository, DEMO_ROWS).await?;
        info!(rows = seeded, "Seeded empty database with sample KOLs");
    }

    // Optional platform filter: `kolboard TikTok`
    let filters = match std::env::args().nth(1) {
        Some(platform) => KolFilters::default().with_platform(platform),
        None => KolFilters::default(),
    };

    let toasts = Arc::new(ToastReporter::new());
    let source = KolPageSource::with_filters(repository.kols.clone(), filters);
    let loader = Arc::new(
        PageLoader::with_config(source, config.loader.clone())?.with_reporter(toasts.clone()),
    );
    let mut table = VirtualTable::new(loader.clone(), config.table.clone())?;

    table.mount().await;
    print_header();

    let mut retries = 0;
    let mut printed = 0;
    loop {
        for message in toasts.drain() {
            eprintln!("! {}", message);
        }

        if table.auto_load_paused() {
            if retries >= MAX_RETRIES {
                warn!(retries, "Giving up after repeated load failures");
                break;
            }
            retries += 1;
            table.retry().await;
            continue;
        }

        let start = table.visible_range().start;
        printed = print_rows(start, &table.visible_rows(), printed);

        let at_bottom = table.scroll_offset() >= table.max_scroll_offset();
        if at_bottom && !loader.has_more() {
            break;
        }

        let next = table.scroll_offset() + table.config().height;
        table.scroll_to(next).await;
    }

    println!("\nKOL Database ({} loaded)", loader.total_loaded());
    Ok(())
}

fn print_header() {
    println!(
        "{:<32} {:<10} {:>10} {:>10} {:>11} {:>9}",
        KOL_COLUMNS[0], KOL_COLUMNS[1], KOL_COLUMNS[2], KOL_COLUMNS[3], KOL_COLUMNS[4], KOL_COLUMNS[5]
    );
}

/// Prints the rows of the window not printed yet; returns the new high-water mark.
fn print_rows(start: usize, rows: &[RowView<KolProfile>], printed: usize) -> usize {
    let mut printed = printed;
    for (index, row) in (start..).zip(rows) {
        if index < printed {
            continue;
        }
        if let RowView::Item(kol) = row {
            let [name, category, followers, views, engagement, cpm] = kol.cells();
            println!(
                "{:<32} {:<10} {:>10} {:>10} {:>11} {:>9}",
                name, category, followers, views, engagement, cpm
            );
            printed = index + 1;
        }
    }
    printed
}
