// Test helpers for integration testing

use crate::config::LoaderConfig;
use crate::domain::kol::{KolFilters, KolProfile};
use crate::repository::Repository;
use crate::repository::database::init_test_database;
use crate::repository::seed::seed_kol_accounts;
use crate::services::{KolPageSource, LoaderError, PageLoader};
use anyhow::Result;
use std::sync::Arc;

pub struct TestContext {
    pub repository: Arc<Repository>,
}

impl TestContext {
    /// In-memory database holding `kol_count` sample KOL rows.
    pub async fn new_seeded(kol_count: usize) -> Result<Self> {
        let repository = Repository::new(init_test_database().await?);
        seed_kol_accounts(&repository, kol_count).await?;
        Ok(Self {
            repository: Arc::new(repository),
        })
    }

    pub fn kol_source(&self, filters: KolFilters) -> KolPageSource {
        KolPageSource::with_filters(self.repository.kols.clone(), filters)
    }

    pub fn kol_loader(&self, page_size: usize) -> Result<PageLoader<KolProfile>, LoaderError> {
        PageLoader::with_config(
            self.kol_source(KolFilters::default()),
            LoaderConfig::default().with_page_size(page_size),
        )
    }
}
