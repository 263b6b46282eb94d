use crate::domain::page::{PageRequest, PageResult};
use crate::services::page_source::PageSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Body of a paginated list endpoint: `{ "data": [...], "pagination": { "total": n } }`.
#[derive(Debug, Deserialize)]
pub struct ApiPage<T> {
    pub data: Vec<T>,
    pub pagination: ApiPagination,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPagination {
    pub total: usize,
}

impl<T> ApiPage<T> {
    pub fn into_page_result(self, request: PageRequest) -> PageResult<T> {
        PageResult::from_total(self.data, request, self.pagination.total)
    }
}

/// Fetches pages from an HTTP list endpoint taking `offset` and `limit`
/// query parameters. The request timeout is the only timeout a load gets.
pub struct HttpPageSource<T> {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
    _item: PhantomData<fn() -> T>,
}

impl<T> HttpPageSource<T> {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
            _item: PhantomData,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl<T> PageSource<T> for HttpPageSource<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch_page(&self, request: PageRequest) -> Result<PageResult<T>> {
        debug!(endpoint = %self.endpoint, offset = request.offset, limit = request.limit, "Requesting page");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("offset", request.offset), ("limit", request.limit)])
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.endpoint))?
            .error_for_status()?;

        let page: ApiPage<T> = response
            .json()
            .await
            .context("Invalid page response body")?;
        Ok(page.into_page_result(request))
    }
}
