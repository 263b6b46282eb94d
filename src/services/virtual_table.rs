use crate::config::TableConfig;
use crate::services::error_handling::{LoaderError, LogHelper};
use crate::services::page_loader::{LoadOutcome, PageLoader};
use std::ops::Range;
use std::sync::Arc;
use tracing::debug;

/// One rendered row of the table window.
#[derive(Debug, Clone, PartialEq)]
pub enum RowView<T> {
    Item(T),
    /// Placeholder row shown after the last item while more pages exist
    Loading,
}

/// Fixed-row-height virtualized table fed by a [`PageLoader`].
///
/// Asks for the next page when the last rendered row comes within the
/// loader's `threshold` of the loaded end. Automatic loading stops after a
/// failure, or after `max_consecutive_empty_pages` empty pages that still
/// claim more, until [`retry`](Self::retry) is called.
pub struct VirtualTable<T>
where
    T: Send + 'static,
{
    loader: Arc<PageLoader<T>>,
    config: TableConfig,
    scroll_offset: f32,
    empty_streak: u32,
    needs_retry: bool,
}

impl<T> VirtualTable<T>
where
    T: Send + 'static,
{
    pub fn new(loader: Arc<PageLoader<T>>, config: TableConfig) -> Result<Self, LoaderError> {
        config.validate()?;
        Ok(Self {
            loader,
            config,
            scroll_offset: 0.0,
            empty_streak: 0,
            needs_retry: false,
        })
    }

    pub fn loader(&self) -> &Arc<PageLoader<T>> {
        &self.loader
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    pub fn needs_retry(&self) -> bool {
        self.needs_retry
    }

    pub fn empty_streak(&self) -> u32 {
        self.empty_streak
    }

    pub fn auto_load_paused(&self) -> bool {
        self.needs_retry || self.empty_streak >= self.config.max_consecutive_empty_pages
    }

    /// Loaded rows plus the loading row while more pages exist.
    pub fn item_count(&self) -> usize {
        let loaded = self.loader.total_loaded();
        if self.loader.has_more() { loaded + 1 } else { loaded }
    }

    pub fn is_item_loaded(&self, index: usize) -> bool {
        !self.loader.has_more() || index < self.loader.total_loaded()
    }

    pub fn content_height(&self) -> f32 {
        self.item_count() as f32 * self.config.row_height
    }

    pub fn max_scroll_offset(&self) -> f32 {
        (self.content_height() - self.config.height).max(0.0)
    }

    /// Row indices intersecting the viewport.
    pub fn visible_range(&self) -> Range<usize> {
        let count = self.item_count();
        let start = ((self.scroll_offset / self.config.row_height).floor() as usize).min(count);
        let end = (start + self.config.visible_rows()).min(count);
        start..end
    }

    /// Initial load when the table is first shown.
    pub async fn mount(&mut self) -> LoadOutcome {
        self.load_more_items().await
    }

    pub async fn scroll_to(&mut self, offset: f32) -> Option<LoadOutcome> {
        self.scroll_offset = offset.clamp(0.0, self.max_scroll_offset());
        let visible_stop = self.visible_range().end;
        self.on_items_rendered(visible_stop).await
    }

    /// Called after rendering rows up to `visible_stop` (exclusive). Loads
    /// the next page when that is within `threshold` rows of the loaded end.
    pub async fn on_items_rendered(&mut self, visible_stop: usize) -> Option<LoadOutcome> {
        if !self.loader.has_more() || self.loader.is_loading() || self.auto_load_paused() {
            return None;
        }

        let loaded = self.loader.total_loaded();
        let threshold = self.loader.threshold();
        if visible_stop.saturating_add(threshold) < loaded {
            return None;
        }

        debug!(visible_stop, loaded, threshold, "Rendered rows near the end, loading more");
        Some(self.load_more_items().await)
    }

    pub async fn load_more_items(&mut self) -> LoadOutcome {
        let offset = self.loader.total_loaded();
        let outcome = self.loader.load_more().await;

        match outcome {
            LoadOutcome::Loaded {
                appended: 0,
                has_more: true,
            } => {
                self.empty_streak += 1;
                LogHelper::log_empty_page_streak(
                    offset,
                    self.empty_streak,
                    self.config.max_consecutive_empty_pages,
                );
            }
            LoadOutcome::Loaded { .. } => self.empty_streak = 0,
            LoadOutcome::Failed => self.needs_retry = true,
            LoadOutcome::Skipped(_) | LoadOutcome::Stale => {}
        }

        outcome
    }

    /// The inline retry affordance: clears the failure and empty-page pause.
    pub async fn retry(&mut self) -> LoadOutcome {
        self.needs_retry = false;
        self.empty_streak = 0;
        self.load_more_items().await
    }

    pub fn reset(&mut self) {
        self.loader.reset();
        self.scroll_offset = 0.0;
        self.empty_streak = 0;
        self.needs_retry = false;
    }
}

impl<T> VirtualTable<T>
where
    T: Clone + Send + 'static,
{
    pub fn visible_rows(&self) -> Vec<RowView<T>> {
        let range = self.visible_range();
        self.loader.with_items(|items| {
            range
                .map(|index| match items.get(index) {
                    Some(item) => RowView::Item(item.clone()),
                    None => RowView::Loading,
                })
                .collect()
        })
    }
}
