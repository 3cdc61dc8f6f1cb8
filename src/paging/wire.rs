//! JSON page bodies.
//!
//! Upstream list endpoints answer with either a bare array or an envelope:
//!
//! ```json
//! { "items": [ ... ], "total": 2500, "skip": 1000 }
//! ```
//!
//! `total` and `skip` are optional and nullable. A bare array carries
//! neither, so the pager treats it as an uncounted page.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::source::FetchError;
use super::PagedFetchResult;

#[derive(Deserialize)]
#[serde(untagged)]
enum PageBody<T> {
    Envelope {
        items: Vec<T>,
        #[serde(default)]
        total: Option<usize>,
        #[serde(default)]
        skip: Option<usize>,
    },
    Bare(Vec<T>),
}

/// Decode one page body. `page_size` is set to the number of items received.
pub fn decode_page<T: DeserializeOwned>(body: &str) -> Result<PagedFetchResult<T>, FetchError> {
    let body: PageBody<T> =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    let (items, total_count, skip) = match body {
        PageBody::Envelope { items, total, skip } => (items, total, skip),
        PageBody::Bare(items) => (items, None, None),
    };
    Ok(PagedFetchResult {
        page_size: items.len(),
        items,
        total_count,
        skip,
    })
}
