use serde::{Deserialize, Serialize};

/// One page request handed to a page source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
}

impl PageRequest {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Index one past the last item this request can cover.
    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.limit)
    }
}

/// One page of results returned by a page source.
///
/// `items` may be empty while `has_more` is still true; consumers that
/// auto-trigger loads are expected to cap how often they retry such pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

impl<T> PageResult<T> {
    pub fn new(items: Vec<T>, has_more: bool) -> Self {
        Self { items, has_more }
    }

    /// A page with more pages after it.
    pub fn more(items: Vec<T>) -> Self {
        Self::new(items, true)
    }

    /// The final page.
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, false)
    }

    /// Builds a page from a known total, the way offset/limit APIs report it.
    pub fn from_total(items: Vec<T>, request: PageRequest, total: usize) -> Self {
        Self::new(items, total > request.end())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_end() {
        assert_eq!(PageRequest::new(0, 50).end(), 50);
        assert_eq!(PageRequest::new(100, 25).end(), 125);
        assert_eq!(PageRequest::new(usize::MAX, 10).end(), usize::MAX);
    }

    #[test]
    fn test_has_more_from_total() {
        let request = PageRequest::new(0, 2);
        assert!(PageResult::from_total(vec![1, 2], request, 5).has_more);
        assert!(!PageResult::from_total(vec![1, 2], request, 2).has_more);

        let tail = PageRequest::new(4, 2);
        assert!(!PageResult::from_total(vec![5], tail, 5).has_more);
    }

    #[test]
    fn test_page_result_json_shape() {
        let page = PageResult::more(vec![1, 2]);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json, serde_json::json!({ "items": [1, 2], "hasMore": true }));
    }
}
