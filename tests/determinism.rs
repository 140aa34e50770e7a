//! Determinism properties: the parallel run must produce exactly the result
//! of a sequential left fold over the same inputs in the same order, no
//! matter how map calls are scheduled or when they complete.

mod common;

use common::{write_fixture_files, ConcatFactory, DelayedSource};
use mapfold::config::{ExecutorConfig, JobConfig};
use mapfold::executor::Executor;
use mapfold::source::{DirEnumerator, PathSource};
use mapfold::worker::{build_workers, LineCountFactory};
use rand::Rng;
use std::time::Duration;
use tempfile::TempDir;

async fn count_lines(dir: &TempDir, max_parallel: usize) -> u64 {
    let job = JobConfig::new().with("data_dir", dir.path().to_str().unwrap());
    let config = ExecutorConfig {
        max_parallel,
        ..Default::default()
    };
    let mut executor = Executor::new(config);
    mapfold::run(
        &DirEnumerator::new(),
        &LineCountFactory::<PathSource>::new(),
        &job,
        &mut executor,
    )
    .await
    .unwrap()
    .result
}

#[tokio::test]
async fn parallel_result_equals_sequential_fold() {
    let dir = TempDir::new().unwrap();
    let mut rng = rand::rng();
    let counts: Vec<usize> = (0..40).map(|_| rng.random_range(0..=100)).collect();
    write_fixture_files(dir.path(), &counts);
    let expected: u64 = counts.iter().map(|c| *c as u64).sum();

    assert_eq!(count_lines(&dir, 1).await, expected);
    assert_eq!(count_lines(&dir, 8).await, expected);
    assert_eq!(count_lines(&dir, 64).await, expected);
}

#[tokio::test]
async fn three_five_zero_separators_sum_to_eight() {
    let dir = TempDir::new().unwrap();
    write_fixture_files(dir.path(), &[3, 5, 0]);
    assert_eq!(count_lines(&dir, 4).await, 8);
}

#[tokio::test]
async fn inverted_completion_order_preserves_fold_order() {
    // First-enumerated sources get the longest delays, so completion order
    // is the reverse of enumeration order. The concatenated output must
    // still read in enumeration order.
    let sources: Vec<DelayedSource> = ["alpha ", "beta ", "gamma ", "delta"]
        .iter()
        .enumerate()
        .map(|(i, content)| {
            let delay = Duration::from_millis(((4 - i) * 30) as u64);
            DelayedSource::new(format!("src-{}", i), *content, delay)
        })
        .collect();

    let workers = build_workers(&ConcatFactory::new(), sources);
    let mut executor = Executor::new(ExecutorConfig {
        max_parallel: 4,
        ..Default::default()
    });
    let report = executor.execute(workers).await.unwrap();

    assert_eq!(report.result, "alpha beta gamma delta");
    assert_eq!(report.reduce_invocations, 3);
}

#[tokio::test]
async fn outcome_order_matches_enumeration_order() {
    let sources = vec![
        DelayedSource::new("z-last-name", "a", Duration::from_millis(60)),
        DelayedSource::new("a-first-name", "b", Duration::from_millis(1)),
    ];
    let workers = build_workers(&ConcatFactory::new(), sources);
    let mut executor = Executor::new(ExecutorConfig::default());
    let report = executor.execute(workers).await.unwrap();

    let locators: Vec<_> = report.outcomes.iter().map(|o| o.locator.as_str()).collect();
    assert_eq!(locators, ["z-last-name", "a-first-name"]);
    assert_eq!(report.result, "ab");
}
