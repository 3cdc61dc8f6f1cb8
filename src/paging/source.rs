//! Page sources: the injected `fetch_page(skip, limit)` collaborator.

use std::path::Path;

use serde::de::DeserializeOwned;
use thiserror::Error;

use super::wire::decode_page;
use super::PagedFetchResult;
use crate::errors::{read_to_string, Error, Result};

/// Why a single page fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Request never produced a response (connect, timeout, TLS)
    #[error("transport failure: {0}")]
    Transport(String),

    /// Response status outside 2xx
    #[error("server returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Response body was not a page
    #[error("could not decode page: {0}")]
    Decode(String),
}

impl FetchError {
    /// Transport failures, 429 and 5xx responses may succeed on a second try.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(_) => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Decode(_) => false,
        }
    }
}

/// A counted, offset-paged remote collection.
pub trait PageSource<T> {
    /// Fetch up to `limit` items starting at offset `skip`.
    fn fetch_page(&mut self, skip: usize, limit: usize) -> std::result::Result<PagedFetchResult<T>, FetchError>;
}

impl<T, F> PageSource<T> for F
where
    F: FnMut(usize, usize) -> std::result::Result<PagedFetchResult<T>, FetchError>,
{
    fn fetch_page(&mut self, skip: usize, limit: usize) -> std::result::Result<PagedFetchResult<T>, FetchError> {
        self(skip, limit)
    }
}

/// Serves pages out of an in-memory list.
///
/// Honors its own `server_max` ceiling the way the upstream API does, so the
/// pager's clamping can be exercised without a network.
#[derive(Debug, Clone)]
pub struct VecPageSource<T> {
    items: Vec<T>,
    server_max: Option<usize>,
    counted: bool,
}

impl<T: Clone> VecPageSource<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            server_max: None,
            counted: true,
        }
    }

    /// Cap every page at `max` items regardless of the requested limit.
    pub fn with_server_max(mut self, max: usize) -> Self {
        self.server_max = Some(max);
        self
    }

    /// Omit `total` from every page, like a bare-array endpoint.
    pub fn uncounted(mut self) -> Self {
        self.counted = false;
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: DeserializeOwned + Clone> VecPageSource<T> {
    /// Load a whole collection from a JSON file holding either a bare array
    /// or an `{ "items": [...], "total": n }` envelope.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = read_to_string(path)?;
        let page = decode_page::<T>(&contents).map_err(|e| {
            Error::validation(e.to_string()).with_context(path.display().to_string())
        })?;
        let counted = page.total_count.is_some();
        Ok(Self {
            items: page.items,
            server_max: None,
            counted,
        })
    }
}

impl<T: Clone> PageSource<T> for VecPageSource<T> {
    fn fetch_page(&mut self, skip: usize, limit: usize) -> std::result::Result<PagedFetchResult<T>, FetchError> {
        let served_limit = self.server_max.map_or(limit, |max| limit.min(max));
        let start = skip.min(self.items.len());
        let end = start.saturating_add(served_limit).min(self.items.len());
        Ok(PagedFetchResult {
            items: self.items[start..end].to_vec(),
            total_count: self.counted.then_some(self.items.len()),
            page_size: served_limit,
            skip: Some(skip),
        })
    }
}
