mod common;

use common::{write_fixture, FailingSource};
use ledgerlens::config::{RetryConfig, RetryStrategy};
use ledgerlens::paging::{
    AssemblyError, FetchError, PageSource, PagedFetchResult, Pager, PagingConfig,
    ProtocolViolation, VecPageSource,
};
use pretty_assertions::assert_eq;
use serde_json::Value;

#[test]
fn test_round_trip_around_page_boundaries() {
    let page_size = 1000;
    for n in [0, 1, page_size - 1, page_size, page_size + 1, 2500] {
        let items: Vec<usize> = (0..n).collect();
        let mut source = VecPageSource::new(items.clone());
        let assembly = Pager::new(page_size).assemble(&mut source);

        assert!(assembly.is_complete(), "n = {n}");
        assert_eq!(assembly.collection.items, items, "n = {n}");
        assert_eq!(assembly.collection.total_count, n);
        assert_eq!(assembly.pages_fetched, n.div_ceil(page_size).max(1), "n = {n}");
    }
}

#[test]
fn test_uncounted_source_stops_on_short_page() {
    let items: Vec<usize> = (0..250).collect();
    let mut source = VecPageSource::new(items.clone()).uncounted();
    let assembly = Pager::new(100).assemble(&mut source);

    assert!(assembly.is_complete());
    assert_eq!(assembly.collection.items, items);
    assert_eq!(assembly.collection.total_count, 250);
    assert_eq!(assembly.pages_fetched, 3);
}

#[test]
fn test_failure_mid_collection_keeps_partial_items() {
    let mut source = FailingSource::new(250, 200);
    let assembly = Pager::new(100).assemble(&mut source);

    assert!(!assembly.is_complete());
    assert_eq!(assembly.collection.len(), 200);
    assert_eq!(assembly.collection.items, (0..200).collect::<Vec<u32>>());
    assert_eq!(assembly.collection.total_count, 250);
    match assembly.error {
        Some(AssemblyError::Network { skip, attempts, .. }) => {
            assert_eq!(skip, 200);
            assert_eq!(attempts, 1);
        }
        other => panic!("expected network error, got {other:?}"),
    }
    assert!(assembly_into_result_fails(FailingSource::new(250, 200)));
}

fn assembly_into_result_fails(mut source: FailingSource) -> bool {
    Pager::new(100).assemble(&mut source).into_result().is_err()
}

#[test]
fn test_retry_recovers_from_transient_failure() {
    let mut inner = VecPageSource::new((0..30u32).collect::<Vec<_>>());
    let mut failures_left = 2;
    let mut source = |skip: usize, limit: usize| {
        if skip == 10 && failures_left > 0 {
            failures_left -= 1;
            return Err(FetchError::Status {
                status: 503,
                url: "http://ledger.test/items".to_string(),
            });
        }
        inner.fetch_page(skip, limit)
    };
    let retry = RetryConfig {
        enabled: true,
        max_retries: 3,
        base_delay_ms: 1,
        strategy: RetryStrategy::Constant,
        timeout_seconds: 5,
    };
    let assembly = Pager::new(10).with_retry(retry).assemble(&mut source);

    assert!(assembly.is_complete());
    assert_eq!(assembly.collection.len(), 30);
}

#[test]
fn test_decode_errors_are_not_retried() {
    let mut calls = 0;
    let mut source = |_skip: usize, _limit: usize| -> Result<PagedFetchResult<u32>, FetchError> {
        calls += 1;
        Err(FetchError::Decode("expected an array".to_string()))
    };
    let retry = RetryConfig {
        enabled: true,
        max_retries: 5,
        base_delay_ms: 1,
        strategy: RetryStrategy::Constant,
        timeout_seconds: 5,
    };
    let assembly = Pager::new(10).with_retry(retry).assemble(&mut source);

    assert!(matches!(
        assembly.error,
        Some(AssemblyError::Network { attempts: 1, .. })
    ));
    assert_eq!(calls, 1);
}

#[test]
fn test_source_echoing_wrong_skip_is_a_protocol_error() {
    // Always claims to serve the first page
    let mut source = |_skip: usize, limit: usize| -> Result<PagedFetchResult<u32>, FetchError> {
        Ok(PagedFetchResult {
            items: vec![7; limit],
            total_count: Some(100),
            page_size: limit,
            skip: Some(0),
        })
    };
    let assembly = Pager::new(10).assemble(&mut source);

    assert_eq!(assembly.collection.len(), 10);
    assert_eq!(
        assembly.error,
        Some(AssemblyError::Protocol {
            skip: 10,
            violation: ProtocolViolation::RepeatedSkip(0),
        })
    );
}

#[test]
fn test_file_source_with_config() {
    let json = serde_json::to_string(&(0..42).collect::<Vec<u32>>()).unwrap();
    let (_dir, path) = write_fixture(&json, "items.json");

    let config: PagingConfig = toml::from_str("page_size = 5000\nserver_max = 20").unwrap();
    config.validate().unwrap();

    let mut source = VecPageSource::<Value>::from_json_file(&path).unwrap();
    let assembly = Pager::from_config(&config).assemble(&mut source);

    assert!(assembly.is_complete());
    assert_eq!(assembly.collection.len(), 42);
    assert_eq!(assembly.pages_fetched, 3);
}
