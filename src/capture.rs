// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Shared capture state behind the inbound and outbound adapters.

use std::path::PathBuf;
use std::sync::Arc;

use crate::filename::{FileNameFn, RequestMeta};
use crate::har::HarEntry;
use crate::service::HarService;
use crate::transport::HarTransport;
use crate::writer::{ErrorReporter, HarWriter, PersistFailure, TracingReporter};

const DEFAULT_OUTPUT_DIR: &str = ".";
const DEFAULT_SCHEME: &str = "http";

/// Cloneable handle that records exchanges as HAR files.
///
/// Build one with [`HarLogger::builder`], then wrap services with
/// [`HarLogger::wrap_service`] and transports with
/// [`HarLogger::wrap_transport`]. All adapters built from the same logger
/// share one writer and therefore one write lock.
#[derive(Clone)]
pub struct HarLogger {
    writer: HarWriter,
    reporter: Arc<dyn ErrorReporter>,
    scheme: Arc<str>,
}

impl HarLogger {
    pub fn builder() -> HarLoggerBuilder {
        HarLoggerBuilder::default()
    }

    /// Logger writing default-named files into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self::builder().output_dir(output_dir).build()
    }

    pub fn writer(&self) -> &HarWriter {
        &self.writer
    }

    /// Scheme used to make origin-form request URIs absolute.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn wrap_service<S>(&self, inner: S) -> HarService<S> {
        HarService::new(inner, self.clone())
    }

    pub fn wrap_transport<T>(&self, inner: T) -> HarTransport<T> {
        HarTransport::new(inner, self.clone())
    }

    /// Persist an entry; failures are reported, never returned.
    pub(crate) async fn record(&self, meta: &RequestMeta, entry: HarEntry) {
        if let Err(e) = self.writer.persist(meta, entry).await {
            self.reporter.report(&PersistFailure::new(&e, meta));
        }
    }
}

/// Builder for [`HarLogger`].
pub struct HarLoggerBuilder {
    output_dir: PathBuf,
    file_name_fn: Option<FileNameFn>,
    reporter: Arc<dyn ErrorReporter>,
    scheme: String,
}

impl Default for HarLoggerBuilder {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            file_name_fn: None,
            reporter: Arc::new(TracingReporter),
            scheme: DEFAULT_SCHEME.to_string(),
        }
    }
}

impl HarLoggerBuilder {
    /// Directory that every written file must stay inside.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Replace the default filename strategy.
    pub fn file_name_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestMeta) -> PathBuf + Send + Sync + 'static,
    {
        self.file_name_fn = Some(Arc::new(f));
        self
    }

    /// Where persistence failures are sent. Defaults to [`TracingReporter`].
    pub fn reporter<R: ErrorReporter + 'static>(mut self, reporter: R) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn build(self) -> HarLogger {
        let writer = match self.file_name_fn {
            Some(f) => HarWriter::with_file_name_fn(self.output_dir, f),
            None => HarWriter::new(self.output_dir),
        };
        HarLogger {
            writer,
            reporter: self.reporter,
            scheme: self.scheme.into(),
        }
    }
}
