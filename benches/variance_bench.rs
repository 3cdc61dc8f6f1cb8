//! Benchmarks for variance computation, filtering and page assembly.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ledgerlens::filter::{filter, FilterPredicateSet};
use ledgerlens::paging::{Pager, VecPageSource};
use ledgerlens::tasks::{Task, TaskState};
use ledgerlens::variance::{compute, AccountAmount, VarianceOptions, VarianceSummary};
use rust_decimal::Decimal;
use std::hint::black_box;

fn snapshot(size: usize, scale: i64) -> Vec<AccountAmount> {
    (0..size)
        .map(|i| {
            let cents = (i as i64 * 7_919 % 1_000_000) * scale;
            AccountAmount::new(format!("{:05}", i), Decimal::new(cents, 2))
        })
        .collect()
}

fn bench_variance_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("variance_compute");
    let options = VarianceOptions::default();

    for size in [100, 1_000, 10_000].iter() {
        let previous = snapshot(*size, 1);
        // Every tenth account missing on the current side
        let current: Vec<AccountAmount> = snapshot(*size, 2)
            .into_iter()
            .enumerate()
            .filter(|(i, _)| i % 10 != 0)
            .map(|(_, row)| row)
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let accounts = compute(black_box(&previous), black_box(&current), &options)
                    .expect("bench amounts fit in Decimal");
                VarianceSummary::from_accounts(&accounts)
            })
        });
    }
    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let tasks: Vec<Task> = (0..10_000)
        .map(|i| {
            let state = match i % 4 {
                0 => TaskState::Pending,
                1 => TaskState::Processing { progress: 0.5 },
                2 => TaskState::Failed {
                    error: "timeout".to_string(),
                },
                _ => TaskState::Completed {
                    completed_at: None,
                    records_extracted: 10,
                },
            };
            Task::new(format!("task-{i}"), "extraction", state).with_name(format!("Batch {i}"))
        })
        .collect();
    let predicates = FilterPredicateSet::all()
        .with_status("FAILURE")
        .with_search("batch 9");

    c.bench_function("filter_10k_tasks", |b| {
        b.iter(|| filter(black_box(&tasks), black_box(&predicates)).len())
    });
}

fn bench_page_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_assembly");
    let items: Vec<u64> = (0..25_000).collect();

    for page_size in [100, 1_000].iter() {
        let pager = Pager::new(*page_size);
        group.bench_with_input(BenchmarkId::from_parameter(page_size), page_size, |b, _| {
            b.iter(|| {
                let mut source = VecPageSource::new(items.clone());
                pager.assemble(&mut source).collection.len()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_variance_compute, bench_filter, bench_page_assembly);
criterion_main!(benches);
