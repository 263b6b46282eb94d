//! Incremental page loader.
//!
//! Accumulates pages from a [`PageSource`] into one ordered list for
//! list-rendering code. At most one fetch is in flight per loader: extra
//! `load_more` calls made while a fetch is pending are dropped, not queued.
//!
//! `reset` bumps a generation counter. A fetch that started under an older
//! generation is discarded when it settles, so a reset can never be undone
//! by a slow response arriving afterwards.

use crate::config::LoaderConfig;
use crate::domain::page::PageRequest;
use crate::services::error_handling::{ErrorReporter, LoaderError, TracingErrorReporter};
use crate::services::page_source::PageSource;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Why a `load_more` call returned without fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InFlight,
    Exhausted,
}

/// What a single `load_more` call did. Informational only; failures have
/// already been handed to the error reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { appended: usize, has_more: bool },
    Skipped(SkipReason),
    Failed,
    /// The loader was reset while the fetch was pending; its result was dropped.
    Stale,
}

impl LoadOutcome {
    pub fn fetched(&self) -> bool {
        !matches!(self, LoadOutcome::Skipped(_))
    }
}

/// Point-in-time copy of the loader's read state.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderSnapshot<T> {
    pub items: Vec<T>,
    pub is_loading: bool,
    pub has_more: bool,
    pub total_loaded: usize,
}

struct LoaderState<T> {
    items: Vec<T>,
    is_loading: bool,
    has_more: bool,
    generation: u64,
}

impl<T> LoaderState<T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            is_loading: false,
            has_more: true,
            generation: 0,
        }
    }
}

/// Clears the in-flight flag if a `load_more` future is dropped before
/// its fetch settles.
struct InFlight<'a, T> {
    state: &'a Mutex<LoaderState<T>>,
    generation: u64,
    settled: bool,
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.state.lock();
        if state.generation == self.generation {
            state.is_loading = false;
            debug!(generation = self.generation, "Page fetch abandoned before settling");
        }
    }
}

pub struct PageLoader<T>
where
    T: Send + 'static,
{
    source: Arc<dyn PageSource<T>>,
    reporter: Arc<dyn ErrorReporter>,
    config: LoaderConfig,
    state: Mutex<LoaderState<T>>,
}

impl<T> PageLoader<T>
where
    T: Send + 'static,
{
    /// Creates a loader with the default page size (50) and threshold (5).
    pub fn new(source: impl PageSource<T> + 'static) -> Self {
        Self::from_parts(Arc::new(source), LoaderConfig::default())
    }

    pub fn with_config(
        source: impl PageSource<T> + 'static,
        config: LoaderConfig,
    ) -> Result<Self, LoaderError> {
        config.validate()?;
        Ok(Self::from_parts(Arc::new(source), config))
    }

    fn from_parts(source: Arc<dyn PageSource<T>>, config: LoaderConfig) -> Self {
        Self {
            source,
            reporter: Arc::new(TracingErrorReporter),
            config,
            state: Mutex::new(LoaderState::new()),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    /// Carried for consumers deciding when to call [`load_more`](Self::load_more).
    /// The loader itself never reads it.
    pub fn threshold(&self) -> usize {
        self.config.threshold
    }

    /// Fetches the next page and appends it.
    ///
    /// Returns immediately without touching the source when a fetch is
    /// already in flight or the source reported no more pages. A source
    /// error is reported and swallowed: items and `has_more` are left as
    /// they were and a later call retries the same offset.
    pub async fn load_more(&self) -> LoadOutcome {
        let (request, generation) = {
            let mut state = self.state.lock();
            if state.is_loading {
                debug!(offset = state.items.len(), "Fetch already in flight, skipping");
                return LoadOutcome::Skipped(SkipReason::InFlight);
            }
            if !state.has_more {
                debug!(offset = state.items.len(), "No more pages, skipping");
                return LoadOutcome::Skipped(SkipReason::Exhausted);
            }
            state.is_loading = true;
            (
                PageRequest::new(state.items.len(), self.config.page_size),
                state.generation,
            )
        };

        let mut in_flight = InFlight {
            state: &self.state,
            generation,
            settled: false,
        };

        let result = self.source.fetch_page(request).await;
        in_flight.settled = true;

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(
                offset = request.offset,
                started = generation,
                current = state.generation,
                "Discarding page fetched before reset"
            );
            return LoadOutcome::Stale;
        }
        state.is_loading = false;

        match result {
            Ok(page) => {
                let appended = page.items.len();
                state.items.extend(page.items);
                state.has_more = page.has_more;
                debug!(
                    offset = request.offset,
                    appended = appended,
                    total_loaded = state.items.len(),
                    has_more = page.has_more,
                    "Page loaded"
                );
                LoadOutcome::Loaded {
                    appended,
                    has_more: page.has_more,
                }
            }
            Err(source) => {
                drop(state);
                self.reporter.report(&LoaderError::Source {
                    offset: request.offset,
                    limit: request.limit,
                    source,
                });
                LoadOutcome::Failed
            }
        }
    }

    /// Empties the list and re-arms loading. Does not cancel a pending
    /// fetch; its result is discarded when it arrives.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.items.clear();
        state.has_more = true;
        state.is_loading = false;
        state.generation += 1;
        debug!(generation = state.generation, "Loader reset");
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().is_loading
    }

    pub fn has_more(&self) -> bool {
        self.state.lock().has_more
    }

    pub fn total_loaded(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_loaded() == 0
    }

    /// Number of resets so far.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Runs `f` against the loaded items without cloning them.
    pub fn with_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.state.lock().items)
    }
}

impl<T> PageLoader<T>
where
    T: Clone + Send + 'static,
{
    pub fn items(&self) -> Vec<T> {
        self.state.lock().items.clone()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.state.lock().items.get(index).cloned()
    }

    pub fn snapshot(&self) -> LoaderSnapshot<T> {
        let state = self.state.lock();
        LoaderSnapshot {
            items: state.items.clone(),
            is_loading: state.is_loading,
            has_more: state.has_more,
            total_loaded: state.items.len(),
        }
    }
}
