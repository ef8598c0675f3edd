// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Single-entry HAR file writing.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::HarError;
use crate::filename::{default_file_name_fn, FileNameFn, RequestMeta};
use crate::har::{HarDocument, HarEntry};
use crate::path_guard;

/// Writes one HAR document per exchange into an output directory.
///
/// All writes go through a single lock spanning directory creation, path
/// validation and the file write, so concurrent exchanges never interleave.
#[derive(Clone)]
pub struct HarWriter {
    inner: Arc<Inner>,
}

struct Inner {
    output_dir: PathBuf,
    file_name_fn: FileNameFn,
    lock: Mutex<()>,
}

impl HarWriter {
    /// Writer using the default filename strategy.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        let file_name_fn = default_file_name_fn(output_dir.clone());
        Self::with_file_name_fn(output_dir, file_name_fn)
    }

    pub fn with_file_name_fn(output_dir: impl Into<PathBuf>, file_name_fn: FileNameFn) -> Self {
        Self {
            inner: Arc::new(Inner {
                output_dir: output_dir.into(),
                file_name_fn,
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.inner.output_dir
    }

    /// Persist `entry` as a complete single-entry document, replacing any
    /// existing file at the generated path. Returns the path written.
    pub async fn persist(&self, meta: &RequestMeta, entry: HarEntry) -> Result<PathBuf, HarError> {
        let _guard = self.inner.lock.lock().await;

        create_output_dir(&self.inner.output_dir).await?;

        let candidate = (self.inner.file_name_fn)(meta);
        let target = path_guard::validate(&candidate, &self.inner.output_dir).await?;

        let mut data =
            serde_json::to_vec_pretty(&HarDocument::single(entry)).map_err(HarError::Encode)?;
        data.push(b'\n');

        let mut opts = OpenOptions::new();
        opts.write(true).create(true).truncate(true);
        #[cfg(unix)]
        opts.mode(0o600);
        let mut file = opts
            .open(&target)
            .await
            .map_err(HarError::io("failed to create file"))?;
        file.write_all(&data)
            .await
            .map_err(HarError::io("failed to write HAR"))?;
        file.flush()
            .await
            .map_err(HarError::io("failed to write HAR"))?;

        tracing::debug!(path = %target.display(), "wrote HAR entry");
        Ok(target)
    }
}

async fn create_output_dir(dir: &Path) -> Result<(), HarError> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o750);
    builder
        .create(dir)
        .await
        .map_err(HarError::io("failed to create output directory"))
}

/// Structured notice for a failed persist.
#[derive(Debug)]
pub struct PersistFailure<'a> {
    pub error: &'a HarError,
    pub path: &'a str,
    pub method: &'a str,
    pub host: &'a str,
}

impl<'a> PersistFailure<'a> {
    pub fn new(error: &'a HarError, meta: &'a RequestMeta) -> Self {
        Self {
            error,
            path: meta.uri.path(),
            method: meta.method.as_str(),
            host: &meta.host,
        }
    }
}

/// Receives persistence failures from the capture adapters.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, failure: &PersistFailure<'_>);
}

/// Reports failures through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, failure: &PersistFailure<'_>) {
        tracing::error!(
            error = %failure.error,
            path = failure.path,
            method = failure.method,
            host = failure.host,
            "failed to save HAR"
        );
    }
}
