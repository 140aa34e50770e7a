//! Workers and worker construction
//!
//! A [`Worker`] owns one input source and one partial-result slot. Its
//! `map` call reads the source and fills the slot; its `reduce` call merges
//! another worker's slot into its own. A [`WorkerFactory`] is the pure
//! construction capability that pairs each enumerated source with a worker,
//! preserving enumeration order.

use crate::error::{MapFoldError, MapFoldResult};
use crate::source::InputSource;
use async_trait::async_trait;
use std::marker::PhantomData;

/// One unit of map/fold work.
///
/// The combining operator behind `reduce` must be associative for a fixed
/// left-to-right fold to be deterministic; the executor guarantees the fold
/// order but not the operator's algebra.
#[async_trait]
pub trait Worker: Send + Sized + 'static {
    /// The folded result type
    type Output: Send;

    /// Identifier of the underlying input source
    fn locator(&self) -> &str;

    /// Read the input source and store the partial result
    async fn map(&mut self) -> MapFoldResult<()>;

    /// Merge `other`'s stored partial result into this worker's.
    ///
    /// Both sides must have completed `map`; the executor's barrier between
    /// the map and reduce phases enforces this.
    fn reduce(&mut self, other: &Self) -> MapFoldResult<()>;

    /// Consume the worker, yielding its stored partial result
    fn into_output(self) -> Option<Self::Output>;
}

/// Pure construction capability: one worker per input source, no I/O
pub trait WorkerFactory {
    type Source: InputSource;
    type Worker: Worker;

    fn create(&self, source: Self::Source) -> Self::Worker;
}

/// Construct one worker per source, preserving enumeration order
pub fn build_workers<F: WorkerFactory>(factory: &F, sources: Vec<F::Source>) -> Vec<F::Worker> {
    sources.into_iter().map(|s| factory.create(s)).collect()
}

/// Worker that counts line separators in its source
#[derive(Debug)]
pub struct LineCountWorker<S> {
    source: S,
    count: Option<u64>,
}

impl<S: InputSource> LineCountWorker<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            count: None,
        }
    }

    /// The stored partial result, if `map` has completed
    pub fn count(&self) -> Option<u64> {
        self.count
    }
}

#[async_trait]
impl<S: InputSource> Worker for LineCountWorker<S> {
    type Output = u64;

    fn locator(&self) -> &str {
        self.source.locator()
    }

    async fn map(&mut self) -> MapFoldResult<()> {
        let content = self.source.read().await?;
        self.count = Some(content.bytes().filter(|b| *b == b'\n').count() as u64);
        Ok(())
    }

    fn reduce(&mut self, other: &Self) -> MapFoldResult<()> {
        let own = self.count.ok_or_else(|| MapFoldError::ReduceBeforeMap {
            locator: self.locator().to_string(),
        })?;
        let theirs = other.count.ok_or_else(|| MapFoldError::ReduceBeforeMap {
            locator: other.locator().to_string(),
        })?;
        self.count = Some(own + theirs);
        Ok(())
    }

    fn into_output(self) -> Option<u64> {
        self.count
    }
}

/// Factory producing [`LineCountWorker`]s for any source kind
pub struct LineCountFactory<S> {
    _source: PhantomData<fn() -> S>,
}

impl<S> LineCountFactory<S> {
    pub fn new() -> Self {
        Self {
            _source: PhantomData,
        }
    }
}

impl<S> Default for LineCountFactory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: InputSource> WorkerFactory for LineCountFactory<S> {
    type Source = S;
    type Worker = LineCountWorker<S>;

    fn create(&self, source: S) -> LineCountWorker<S> {
        LineCountWorker::new(source)
    }
}
