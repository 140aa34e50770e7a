#![allow(dead_code)]

//! Shared helpers for the integration suite: sources with injected read
//! delays and an order-sensitive worker that exposes the fold order.

use async_trait::async_trait;
use mapfold::error::{MapFoldError, MapFoldResult};
use mapfold::source::{InMemorySource, InputSource};
use mapfold::worker::{Worker, WorkerFactory};
use std::marker::PhantomData;
use std::path::Path;
use std::time::Duration;

/// Wraps a source with an artificial read delay, to reorder the physical
/// completion time of map calls without changing their content.
pub struct DelayedSource {
    inner: InMemorySource,
    delay: Duration,
}

impl DelayedSource {
    pub fn new(locator: impl Into<String>, content: impl Into<String>, delay: Duration) -> Self {
        Self {
            inner: InMemorySource::new(locator, content),
            delay,
        }
    }
}

#[async_trait]
impl InputSource for DelayedSource {
    fn locator(&self) -> &str {
        self.inner.locator()
    }

    async fn read(&self) -> MapFoldResult<String> {
        tokio::time::sleep(self.delay).await;
        self.inner.read().await
    }
}

/// Worker whose reduce is string concatenation: associative but
/// order-sensitive, so any reordering of the fold shows up in the output.
pub struct ConcatWorker<S> {
    source: S,
    partial: Option<String>,
}

#[async_trait]
impl<S: InputSource> Worker for ConcatWorker<S> {
    type Output = String;

    fn locator(&self) -> &str {
        self.source.locator()
    }

    async fn map(&mut self) -> MapFoldResult<()> {
        self.partial = Some(self.source.read().await?);
        Ok(())
    }

    fn reduce(&mut self, other: &Self) -> MapFoldResult<()> {
        let theirs = other
            .partial
            .as_deref()
            .ok_or_else(|| MapFoldError::ReduceBeforeMap {
                locator: other.source.locator().to_string(),
            })?
            .to_string();
        let own = self
            .partial
            .as_mut()
            .ok_or_else(|| MapFoldError::ReduceBeforeMap {
                locator: self.source.locator().to_string(),
            })?;
        own.push_str(&theirs);
        Ok(())
    }

    fn into_output(self) -> Option<String> {
        self.partial
    }
}

pub struct ConcatFactory<S> {
    _source: PhantomData<fn() -> S>,
}

impl<S> ConcatFactory<S> {
    pub fn new() -> Self {
        Self {
            _source: PhantomData,
        }
    }
}

impl<S: InputSource> WorkerFactory for ConcatFactory<S> {
    type Source = S;
    type Worker = ConcatWorker<S>;

    fn create(&self, source: S) -> ConcatWorker<S> {
        ConcatWorker {
            source,
            partial: None,
        }
    }
}

/// Write one fixture file per entry, named so enumeration order matches
/// the slice order, each containing the given number of line separators.
pub fn write_fixture_files(dir: &Path, line_counts: &[usize]) {
    for (i, count) in line_counts.iter().enumerate() {
        std::fs::write(dir.join(format!("{:03}.txt", i)), "\n".repeat(*count)).unwrap();
    }
}
