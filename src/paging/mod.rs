//! Offset pagination assembly.
//!
//! The [`Pager`] drives a [`PageSource`] from offset 0 until the collection
//! is complete, deriving each `skip` from the number of items accumulated so
//! far. Pages are fetched strictly in sequence for that reason; parallel
//! fan-out would need index-based pagination, which is a different contract.
//!
//! Assembly stops when:
//!
//! - the accumulated count reaches the reported total,
//! - a page comes back empty (exhaustion, not an error),
//! - an uncounted page comes back short of the requested limit,
//! - a fetch fails (the partial collection is returned with a
//!   [`AssemblyError::Network`] marker),
//! - the source breaks the paging protocol ([`AssemblyError::Protocol`]),
//!   which includes serving the same uncounted page twice in a row, or
//! - the collection grows past the `max_items` ceiling.
//!
//! The pager owns no external resources. A caller that wants to cancel just
//! stops driving it and drops the partial result.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::RetryConfig;
use crate::errors::{Error as CrateError, Result};

pub mod http;
pub mod source;
pub mod wire;

pub use http::HttpPageSource;
pub use source::{FetchError, PageSource, VecPageSource};
pub use wire::decode_page;

/// Documented upstream ceiling on `limit`.
pub const DEFAULT_SERVER_MAX: usize = 1000;

/// Default ceiling on the size of one assembled collection.
pub const DEFAULT_MAX_ITEMS: usize = 1_000_000;

/// One page as returned by a source.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedFetchResult<T> {
    pub items: Vec<T>,
    /// Size of the whole collection, when the source reports it
    pub total_count: Option<usize>,
    /// Limit the page was served with
    pub page_size: usize,
    /// Offset the source says it served, when echoed back
    pub skip: Option<usize>,
}

/// A fully (or partially) assembled collection, owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssembledCollection<T> {
    pub items: Vec<T>,
    /// Reported total, or the number of items seen for uncounted sources
    pub total_count: usize,
}

impl<T> AssembledCollection<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Ways a source can break the paging contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    /// Two consecutive responses claim the same offset
    #[error("the same page (skip {0}) was served twice in a row")]
    RepeatedSkip(usize),

    /// Response claims an offset other than the one requested
    #[error("requested skip {requested} but the source served skip {served}")]
    SkipMismatch { requested: usize, served: usize },

    /// A page holds more items than the collection it belongs to
    #[error("page holds {returned} items but the reported total is {total}")]
    PageExceedsTotal { returned: usize, total: usize },

    /// An uncounted source without a skip echo served the previous page again
    #[error("skip {0} returned the same page as the previous request; the source ignores skip")]
    NoProgress(usize),

    /// The collection grew past the configured ceiling
    #[error("collection exceeded {max_items} items without reaching its end")]
    ItemLimitExceeded { max_items: usize },
}

/// Why assembly stopped before the collection was complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("page fetch at skip {skip} failed after {attempts} attempt(s): {source}")]
    Network {
        skip: usize,
        attempts: u32,
        #[source]
        source: FetchError,
    },

    #[error("paging protocol violation at skip {skip}: {violation}")]
    Protocol {
        skip: usize,
        violation: ProtocolViolation,
    },
}

/// Result of one assembly run: whatever was collected, plus an error marker
/// when the run was cut short.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly<T> {
    pub collection: AssembledCollection<T>,
    pub error: Option<AssemblyError>,
    /// Number of page fetches that returned a response
    pub pages_fetched: usize,
}

impl<T> Assembly<T> {
    /// True when the run ended without an error marker.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Strict view: the collection, or the error that interrupted it.
    pub fn into_result(self) -> Result<AssembledCollection<T>> {
        match self.error {
            None => Ok(self.collection),
            Some(err) => Err(CrateError::from(err)),
        }
    }
}

/// Paging settings.
///
/// ```toml
/// [paging]
/// page_size = 1000
/// server_max = 1000
/// max_items = 1000000
///
/// [paging.retry]
/// enabled = true
/// max_retries = 2
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagingConfig {
    /// Requested items per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Upstream ceiling on items per page
    #[serde(default = "default_server_max")]
    pub server_max: usize,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Assembly stops with an error once this many items are collected
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Retry policy for transient fetch failures
    #[serde(default = "RetryConfig::disabled")]
    pub retry: RetryConfig,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            server_max: default_server_max(),
            timeout_seconds: default_timeout_seconds(),
            max_items: default_max_items(),
            retry: RetryConfig::disabled(),
        }
    }
}

impl PagingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(CrateError::configuration("paging.page_size must be at least 1"));
        }
        if self.server_max == 0 {
            return Err(CrateError::configuration("paging.server_max must be at least 1"));
        }
        if self.max_items == 0 {
            return Err(CrateError::configuration("paging.max_items must be at least 1"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds)
    }
}

fn default_page_size() -> usize {
    DEFAULT_SERVER_MAX
}
fn default_server_max() -> usize {
    DEFAULT_SERVER_MAX
}
fn default_max_items() -> usize {
    DEFAULT_MAX_ITEMS
}
fn default_timeout_seconds() -> u64 {
    30
}

/// Sequential offset pager.
#[derive(Debug, Clone)]
pub struct Pager {
    page_size: usize,
    server_max: usize,
    max_items: usize,
    retry: RetryConfig,
}

impl Default for Pager {
    fn default() -> Self {
        Self::from_config(&PagingConfig::default())
    }
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            server_max: DEFAULT_SERVER_MAX,
            max_items: DEFAULT_MAX_ITEMS,
            retry: RetryConfig::disabled(),
        }
    }

    pub fn from_config(config: &PagingConfig) -> Self {
        Self {
            page_size: config.page_size,
            server_max: config.server_max,
            max_items: config.max_items,
            retry: config.retry.clone(),
        }
    }

    pub fn with_server_max(mut self, server_max: usize) -> Self {
        self.server_max = server_max;
        self
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Per-request limit: the requested page size clamped to the server ceiling.
    pub fn effective_limit(&self) -> usize {
        self.page_size.min(self.server_max).max(1)
    }

    /// Drive `source` until the collection is complete or assembly must stop.
    ///
    /// A source that reports neither a total nor the skip it served gives the
    /// pager nothing to check offsets against. For such pages, a page equal
    /// to the one before it ends assembly with
    /// [`ProtocolViolation::NoProgress`].
    pub fn assemble<T, S>(&self, source: &mut S) -> Assembly<T>
    where
        T: PartialEq,
        S: PageSource<T> + ?Sized,
    {
        let limit = self.effective_limit();
        let mut items: Vec<T> = Vec::new();
        let mut reported_total: Option<usize> = None;
        let mut last_served_skip: Option<usize> = None;
        let mut last_page_len = 0;
        let mut pages_fetched = 0;

        let error = loop {
            if reported_total.is_some_and(|total| items.len() >= total) {
                break None;
            }

            let skip = items.len();
            let page = match self.fetch_with_retry(source, skip, limit) {
                Ok(page) => page,
                Err(err) => {
                    warn!(skip, collected = items.len(), error = %err, "page fetch failed, returning partial collection");
                    break Some(err);
                }
            };
            pages_fetched += 1;

            if let Some(violation) = check_page(&page, skip, last_served_skip) {
                warn!(skip, %violation, "paging protocol violation");
                break Some(AssemblyError::Protocol { skip, violation });
            }
            last_served_skip = page.skip;
            if page.total_count.is_some() {
                reported_total = page.total_count;
            }

            let received = page.items.len();
            debug!(skip, limit, received, total = ?reported_total, "fetched page");
            if received == 0 {
                break None;
            }
            if page.skip.is_none()
                && reported_total.is_none()
                && received == last_page_len
                && items[items.len() - last_page_len..] == page.items[..]
            {
                let violation = ProtocolViolation::NoProgress(skip);
                warn!(skip, %violation, "paging protocol violation");
                break Some(AssemblyError::Protocol { skip, violation });
            }
            items.extend(page.items);
            last_page_len = received;

            if items.len() > self.max_items {
                let violation = ProtocolViolation::ItemLimitExceeded {
                    max_items: self.max_items,
                };
                warn!(collected = items.len(), %violation, "stopping assembly");
                break Some(AssemblyError::Protocol { skip, violation });
            }

            if reported_total.is_none() && received < limit {
                break None;
            }
        };

        let total_count = reported_total.unwrap_or(items.len());
        if error.is_none() {
            info!(items = items.len(), pages = pages_fetched, "assembled collection");
        }

        Assembly {
            collection: AssembledCollection { items, total_count },
            error,
            pages_fetched,
        }
    }

    fn fetch_with_retry<T, S>(
        &self,
        source: &mut S,
        skip: usize,
        limit: usize,
    ) -> std::result::Result<PagedFetchResult<T>, AssemblyError>
    where
        S: PageSource<T> + ?Sized,
    {
        let started = std::time::Instant::now();
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match source.fetch_page(skip, limit) {
                Ok(page) => return Ok(page),
                Err(err) if err.is_retryable() && self.retry.should_retry(attempt, started.elapsed()) => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    debug!(skip, attempt, ?delay, error = %err, "retrying page fetch");
                    std::thread::sleep(delay);
                }
                Err(err) => {
                    return Err(AssemblyError::Network {
                        skip,
                        attempts: attempt,
                        source: err,
                    })
                }
            }
        }
    }
}

/// Protocol checks on one page, given the offset requested and the offset
/// the previous page claimed.
fn check_page<T>(
    page: &PagedFetchResult<T>,
    requested: usize,
    last_served: Option<usize>,
) -> Option<ProtocolViolation> {
    if let Some(served) = page.skip {
        if last_served == Some(served) {
            return Some(ProtocolViolation::RepeatedSkip(served));
        }
        if served != requested {
            return Some(ProtocolViolation::SkipMismatch { requested, served });
        }
    }
    if let Some(total) = page.total_count {
        if page.items.len() > total {
            return Some(ProtocolViolation::PageExceedsTotal {
                returned: page.items.len(),
                total,
            });
        }
    }
    None
}
