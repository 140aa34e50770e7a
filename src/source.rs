//! Input sources and their enumeration
//!
//! An [`InputSource`] produces the raw content for one unit of work; an
//! [`InputEnumerator`] turns an opaque job configuration into a finite,
//! ordered sequence of sources. The two concerns are deliberately separate
//! capabilities so an executor can be composed with any pairing of the two.

use crate::config::JobConfig;
use crate::error::{MapFoldError, MapFoldResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One unit of work's raw content, produced on demand.
///
/// Sources are immutable once constructed and owned exclusively by their
/// worker, so concurrent map calls never share mutable state.
#[async_trait]
pub trait InputSource: Send + Sync + 'static {
    /// Opaque identifier for this source, used in outcomes and errors
    fn locator(&self) -> &str;

    /// Read the full content of this source
    async fn read(&self) -> MapFoldResult<String>;
}

/// Input source backed by a file on disk
#[derive(Debug, Clone)]
pub struct PathSource {
    path: PathBuf,
    locator: String,
}

impl PathSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let locator = path.display().to_string();
        Self { path, locator }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl InputSource for PathSource {
    fn locator(&self) -> &str {
        &self.locator
    }

    async fn read(&self) -> MapFoldResult<String> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| MapFoldError::SourceRead {
                locator: self.locator.clone(),
                reason: e.to_string(),
                source: Some(e),
            })
    }
}

/// Input source holding its content in memory.
///
/// Useful for drivers that already have the data in process, and as a
/// lightweight source for exercising executors without touching disk.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    locator: String,
    content: String,
}

impl InMemorySource {
    pub fn new(locator: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            content: content.into(),
        }
    }
}

#[async_trait]
impl InputSource for InMemorySource {
    fn locator(&self) -> &str {
        &self.locator
    }

    async fn read(&self) -> MapFoldResult<String> {
        Ok(self.content.clone())
    }
}

/// Produces a finite sequence of input sources from a job configuration.
///
/// Restartable only by re-invoking with the same configuration; this is not
/// a resumable cursor. Implementations must fail before constructing any
/// source when a required configuration key is absent.
pub trait InputEnumerator {
    type Source: InputSource;

    fn enumerate(&self, config: &JobConfig) -> MapFoldResult<Vec<Self::Source>>;
}

/// Enumerates every regular file directly under a configured directory.
///
/// Requires the `data_dir` key. Entries are sorted by file name so that
/// enumeration order, and therefore the fold order downstream, is
/// reproducible across platforms and filesystems.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirEnumerator;

impl DirEnumerator {
    pub const DATA_DIR_KEY: &'static str = "data_dir";

    pub fn new() -> Self {
        Self
    }
}

impl InputEnumerator for DirEnumerator {
    type Source = PathSource;

    fn enumerate(&self, config: &JobConfig) -> MapFoldResult<Vec<PathSource>> {
        let data_dir = PathBuf::from(config.require_str(Self::DATA_DIR_KEY)?);
        debug!("enumerating input files under {}", data_dir.display());

        let entries = std::fs::read_dir(&data_dir).map_err(|e| MapFoldError::Enumeration {
            path: data_dir.clone(),
            reason: format!("failed to list directory: {}", e),
            source: Some(e),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| MapFoldError::Enumeration {
                path: data_dir.clone(),
                reason: format!("failed to read directory entry: {}", e),
                source: Some(e),
            })?;
            let file_type = entry.file_type().map_err(|e| MapFoldError::Enumeration {
                path: data_dir.clone(),
                reason: format!("failed to stat entry {}: {}", entry.path().display(), e),
                source: Some(e),
            })?;
            if file_type.is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort();

        debug!("found {} input files", paths.len());
        Ok(paths.into_iter().map(PathSource::new).collect())
    }
}
