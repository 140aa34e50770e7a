//! mapfold - bounded-parallel map/fold execution over enumerable inputs
//!
//! The pipeline: an opaque job configuration feeds an
//! [`InputEnumerator`](source::InputEnumerator), which yields an ordered
//! sequence of [`InputSource`](source::InputSource)s; a
//! [`WorkerFactory`](worker::WorkerFactory) pairs each source with a
//! [`Worker`](worker::Worker); the [`Executor`](executor::Executor) runs
//! every worker's map concurrently behind a concurrency bound, joins them
//! all, then folds the partial results sequentially in enumeration order.
//!
//! ```no_run
//! use mapfold::config::{ExecutorConfig, JobConfig};
//! use mapfold::executor::Executor;
//! use mapfold::source::{DirEnumerator, PathSource};
//! use mapfold::worker::LineCountFactory;
//!
//! # async fn example() -> mapfold::error::MapFoldResult<()> {
//! let job = JobConfig::new().with("data_dir", "./inputs");
//! let mut executor = Executor::new(ExecutorConfig::default());
//! let report = mapfold::run(
//!     &DirEnumerator::new(),
//!     &LineCountFactory::<PathSource>::new(),
//!     &job,
//!     &mut executor,
//! )
//! .await?;
//! println!("{} lines", report.result);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod source;
pub mod worker;

pub use config::{ErrorPolicy, ExecutorConfig, JobConfig, JobFile};
pub use error::{MapFoldError, MapFoldResult};
pub use executor::{ExecutionReport, Executor, ExecutorState, MapOutcome, MapStatus};
pub use source::{DirEnumerator, InMemorySource, InputEnumerator, InputSource, PathSource};
pub use worker::{build_workers, LineCountFactory, LineCountWorker, Worker, WorkerFactory};

use tracing::info;

/// Wire the whole pipeline: enumerate inputs, construct one worker per
/// input, and execute.
///
/// The enumerator and factory are independent capabilities; any pairing
/// whose source types line up composes here.
pub async fn run<E, F>(
    enumerator: &E,
    factory: &F,
    job: &JobConfig,
    executor: &mut Executor,
) -> MapFoldResult<ExecutionReport<<F::Worker as Worker>::Output>>
where
    E: InputEnumerator,
    F: WorkerFactory<Source = E::Source>,
{
    let sources = enumerator.enumerate(job)?;
    info!("enumerated {} input sources", sources.len());
    let workers = build_workers(factory, sources);
    executor.execute(workers).await
}
