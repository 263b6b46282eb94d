use crate::domain::kol::{KolFilters, KolProfile};
use crate::domain::page::{PageRequest, PageResult};
use crate::repository::kol_repository::KolRepository;
use crate::services::error_handling::PerformanceMonitor;
use crate::services::page_source::PageSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::instrument;

const SLOW_PAGE_MS: u64 = 250;

/// Pages through `kol_accounts` with a fixed set of filters.
#[derive(Clone)]
pub struct KolPageSource {
    repository: KolRepository,
    filters: KolFilters,
}

impl KolPageSource {
    pub fn new(repository: KolRepository) -> Self {
        Self::with_filters(repository, KolFilters::default())
    }

    pub fn with_filters(repository: KolRepository, filters: KolFilters) -> Self {
        Self {
            repository,
            filters,
        }
    }

    pub fn filters(&self) -> &KolFilters {
        &self.filters
    }
}

#[async_trait]
impl PageSource<KolProfile> for KolPageSource {
    #[instrument(skip(self))]
    async fn fetch_page(&self, request: PageRequest) -> Result<PageResult<KolProfile>> {
        let _monitor = PerformanceMonitor::new("fetch_kol_page", SLOW_PAGE_MS);

        let items = self
            .repository
            .list_page(&self.filters, request.offset, request.limit)
            .await
            .context("Failed to fetch KOL page")?;
        let total = self
            .repository
            .count(&self.filters)
            .await
            .context("Failed to count KOL accounts")?;

        Ok(PageResult::from_total(items, request, total))
    }
}
