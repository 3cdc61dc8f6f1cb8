// Test utility module for ledgerlens integration tests
#![allow(dead_code)]

use std::path::PathBuf;

use ledgerlens::paging::{FetchError, PageSource, PagedFetchResult};
use ledgerlens::tasks::{Task, TaskState};
use ledgerlens::variance::AccountAmount;
use rust_decimal::Decimal;

// Helper to create a temporary JSON fixture
pub fn write_fixture(contents: &str, name: &str) -> (tempfile::TempDir, PathBuf) {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join(name);
    std::fs::write(&file_path, contents).expect("Failed to write fixture");
    (temp_dir, file_path)
}

pub fn accounts(rows: &[(&str, Decimal)]) -> Vec<AccountAmount> {
    rows.iter()
        .map(|(code, amount)| AccountAmount::new(*code, *amount))
        .collect()
}

/// Five tasks, two of them failed at positions 1 and 3.
pub fn sample_tasks() -> Vec<Task> {
    vec![
        Task::new("t-1", "extraction", TaskState::Pending).with_name("January rent roll"),
        Task::new(
            "t-2",
            "extraction",
            TaskState::Failed {
                error: "OCR timeout".to_string(),
            },
        )
        .with_name("February rent roll")
        .with_property("ESP"),
        Task::new("t-3", "reconciliation", TaskState::Processing { progress: 0.4 }),
        Task::new(
            "t-4",
            "reconciliation",
            TaskState::Failed {
                error: "balance mismatch".to_string(),
            },
        )
        .with_property("WEND"),
        Task::new(
            "t-5",
            "extraction",
            TaskState::Completed {
                completed_at: None,
                records_extracted: 120,
            },
        ),
    ]
}

/// Serves pages from a vector and fails every fetch at or past `fail_from`.
pub struct FailingSource {
    pub items: Vec<u32>,
    pub fail_from: usize,
    pub calls: usize,
}

impl FailingSource {
    pub fn new(len: u32, fail_from: usize) -> Self {
        Self {
            items: (0..len).collect(),
            fail_from,
            calls: 0,
        }
    }
}

impl PageSource<u32> for FailingSource {
    fn fetch_page(&mut self, skip: usize, limit: usize) -> Result<PagedFetchResult<u32>, FetchError> {
        self.calls += 1;
        if skip >= self.fail_from {
            return Err(FetchError::Transport("connection reset".to_string()));
        }
        let end = (skip + limit).min(self.items.len());
        Ok(PagedFetchResult {
            items: self.items[skip..end].to_vec(),
            total_count: Some(self.items.len()),
            page_size: limit,
            skip: Some(skip),
        })
    }
}
