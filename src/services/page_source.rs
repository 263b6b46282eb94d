use crate::domain::page::{PageRequest, PageResult};
use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Retrieves one page of items - allows the loader to be driven by a
/// database, an HTTP API or a mock in tests
#[async_trait]
pub trait PageSource<T>: Send + Sync
where
    T: Send + 'static,
{
    async fn fetch_page(&self, request: PageRequest) -> Result<PageResult<T>>;
}

#[async_trait]
impl<T, S> PageSource<T> for Arc<S>
where
    T: Send + 'static,
    S: PageSource<T> + ?Sized,
{
    async fn fetch_page(&self, request: PageRequest) -> Result<PageResult<T>> {
        (**self).fetch_page(request).await
    }
}

/// Adapts an async closure `|request| async { ... }` into a page source.
pub struct FnPageSource<F> {
    fetch: F,
}

impl<F> FnPageSource<F> {
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }
}

#[async_trait]
impl<T, F, Fut> PageSource<T> for FnPageSource<F>
where
    T: Send + 'static,
    F: Fn(PageRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<PageResult<T>>> + Send,
{
    async fn fetch_page(&self, request: PageRequest) -> Result<PageResult<T>> {
        (self.fetch)(request).await
    }
}

/// Serves pages out of an in-memory vector.
#[derive(Debug, Clone)]
pub struct VecPageSource<T> {
    items: Arc<Vec<T>>,
}

impl<T> VecPageSource<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: Arc::new(items),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl<T> PageSource<T> for VecPageSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn fetch_page(&self, request: PageRequest) -> Result<PageResult<T>> {
        let total = self.items.len();
        let start = request.offset.min(total);
        let end = request.end().min(total);
        let page = self.items[start..end].to_vec();
        Ok(PageResult::from_total(page, request, total))
    }
}

pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use tokio::time::{Duration, sleep};

    #[derive(Debug, Clone)]
    enum MockOutcome<T> {
        Page(PageResult<T>),
        Failure(String),
    }

    #[derive(Debug, Clone)]
    struct MockResponse<T> {
        outcome: MockOutcome<T>,
        delay_ms: Option<u64>,
    }

    /// Scripted page source for tests. Responses are handed out in call
    /// order; once the script runs dry every call gets an empty final page.
    pub struct MockPageSource<T> {
        responses: Arc<Mutex<VecDeque<MockResponse<T>>>>,
        call_history: Arc<Mutex<Vec<PageRequest>>>,
        default_delay_ms: Arc<Mutex<u64>>,
    }

    impl<T> MockPageSource<T> {
        pub fn new() -> Self {
            Self {
                responses: Arc::new(Mutex::new(VecDeque::new())),
                call_history: Arc::new(Mutex::new(Vec::new())),
                default_delay_ms: Arc::new(Mutex::new(0)),
            }
        }

        pub fn set_default_delay(&self, delay_ms: u64) {
            *self.default_delay_ms.lock() = delay_ms;
        }

        pub fn add_page(&self, items: Vec<T>, has_more: bool) {
            self.push(MockOutcome::Page(PageResult::new(items, has_more)), None);
        }

        pub fn add_page_with_delay(&self, items: Vec<T>, has_more: bool, delay_ms: u64) {
            self.push(
                MockOutcome::Page(PageResult::new(items, has_more)),
                Some(delay_ms),
            );
        }

        pub fn add_failure(&self, message: &str) {
            self.push(MockOutcome::Failure(message.to_string()), None);
        }

        pub fn add_failure_with_delay(&self, message: &str, delay_ms: u64) {
            self.push(MockOutcome::Failure(message.to_string()), Some(delay_ms));
        }

        fn push(&self, outcome: MockOutcome<T>, delay_ms: Option<u64>) {
            self.responses
                .lock()
                .push_back(MockResponse { outcome, delay_ms });
        }

        pub fn calls(&self) -> Vec<PageRequest> {
            self.call_history.lock().clone()
        }

        pub fn call_count(&self) -> usize {
            self.call_history.lock().len()
        }

        pub fn assert_called_with(&self, offset: usize, limit: usize) -> bool {
            self.call_history
                .lock()
                .iter()
                .any(|call| call.offset == offset && call.limit == limit)
        }

        pub fn pending_responses(&self) -> usize {
            self.responses.lock().len()
        }
    }

    impl<T> Clone for MockPageSource<T> {
        fn clone(&self) -> Self {
            Self {
                responses: self.responses.clone(),
                call_history: self.call_history.clone(),
                default_delay_ms: self.default_delay_ms.clone(),
            }
        }
    }

    impl<T> Default for MockPageSource<T> {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl<T> PageSource<T> for MockPageSource<T>
    where
        T: Send + 'static,
    {
        async fn fetch_page(&self, request: PageRequest) -> Result<PageResult<T>> {
            self.call_history.lock().push(request);

            let response = self.responses.lock().pop_front();
            let delay = response
                .as_ref()
                .and_then(|r| r.delay_ms)
                .unwrap_or(*self.default_delay_ms.lock());
            if delay > 0 {
                sleep(Duration::from_millis(delay)).await;
            }

            match response.map(|r| r.outcome) {
                Some(MockOutcome::Page(page)) => Ok(page),
                Some(MockOutcome::Failure(message)) => Err(anyhow::anyhow!(message)),
                None => Ok(PageResult::last(Vec::new())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockPageSource;
    use super::*;

    #[tokio::test]
    async fn test_vec_source_pages() {
        let source = VecPageSource::new((1..=5).collect::<Vec<i32>>());

        let first = source.fetch_page(PageRequest::new(0, 2)).await.unwrap();
        assert_eq!(first.items, vec![1, 2]);
        assert!(first.has_more);

        let last = source.fetch_page(PageRequest::new(4, 2)).await.unwrap();
        assert_eq!(last.items, vec![5]);
        assert!(!last.has_more);
    }

    #[tokio::test]
    async fn test_vec_source_offset_past_end() {
        let source = VecPageSource::new(vec!["a", "b"]);
        let page = source.fetch_page(PageRequest::new(10, 5)).await.unwrap();
        assert!(page.is_empty());
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_fn_source() {
        let source = FnPageSource::new(|request: PageRequest| async move {
            let items: Vec<usize> = (request.offset..request.end()).collect();
            Ok::<_, anyhow::Error>(PageResult::new(items, request.offset < 10))
        });

        let page = source.fetch_page(PageRequest::new(3, 2)).await.unwrap();
        assert_eq!(page.items, vec![3, 4]);
        assert!(page.has_more);
    }

    #[tokio::test]
    async fn test_mock_source_script_and_history() {
        let source = MockPageSource::new();
        source.add_page(vec![1, 2], true);
        source.add_failure("Network error");

        let page = source.fetch_page(PageRequest::new(0, 2)).await.unwrap();
        assert_eq!(page.items, vec![1, 2]);

        let err = source.fetch_page(PageRequest::new(2, 2)).await.unwrap_err();
        assert_eq!(err.to_string(), "Network error");

        // Script exhausted
        let page = source.fetch_page(PageRequest::new(2, 2)).await.unwrap();
        assert!(page.is_empty());
        assert!(!page.has_more);

        assert_eq!(source.call_count(), 3);
        assert!(source.assert_called_with(2, 2));
        assert_eq!(source.pending_responses(), 0);
    }

    #[tokio::test]
    async fn test_mock_with_delay() {
        let source: MockPageSource<i32> = MockPageSource::new();
        source.add_page_with_delay(vec![7], false, 50);

        let start = std::time::Instant::now();
        let page = source.fetch_page(PageRequest::new(0, 1)).await.unwrap();
        assert!(start.elapsed().as_millis() >= 50);
        assert_eq!(page.items, vec![7]);
    }

    #[tokio::test]
    async fn test_arc_source_delegates() {
        let source = Arc::new(VecPageSource::new(vec![1, 2, 3]));
        let page = source.fetch_page(PageRequest::new(1, 1)).await.unwrap();
        assert_eq!(page.items, vec![2]);
    }
}
