//! HTTP page source: `GET <url>?skip=<n>&limit=<m>`.

use std::marker::PhantomData;
use std::time::Duration;

use serde::de::DeserializeOwned;

use super::source::{FetchError, PageSource};
use super::wire::decode_page;
use super::PagedFetchResult;
use crate::errors::{Error, Result};

/// Fetches pages from a JSON list endpoint with a blocking client.
pub struct HttpPageSource<T> {
    client: reqwest::blocking::Client,
    url: String,
    _item: PhantomData<fn() -> T>,
}

impl<T> HttpPageSource<T> {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ledgerlens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
            _item: PhantomData,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl<T: DeserializeOwned> PageSource<T> for HttpPageSource<T> {
    fn fetch_page(
        &mut self,
        skip: usize,
        limit: usize,
    ) -> std::result::Result<PagedFetchResult<T>, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("skip", skip), ("limit", limit)])
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let body = response
            .text()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        decode_page(&body)
    }
}
