// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Error types shared by the codec, writer, parser and capture adapters.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error used at the hyper seams (services, transports, bodies).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while converting, persisting or parsing HAR data.
#[derive(Debug, Error)]
pub enum HarError {
    /// A HAR value could not be turned into a live HTTP message.
    #[error("malformed HAR input: {0}")]
    MalformedInput(String),

    /// The HAR document does not have the expected structure.
    #[error("failed to parse HAR data: {0}")]
    MalformedDocument(#[source] serde_json::Error),

    /// The filename strategy produced a path outside the output directory.
    #[error("file path {} is outside of output directory {}", path.display(), root.display())]
    PathEscape { path: PathBuf, root: PathBuf },

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode HAR: {0}")]
    Encode(#[source] serde_json::Error),
}

impl HarError {
    pub(crate) fn io(context: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| HarError::Io { context, source }
    }
}

/// Errors surfaced by the capture adapters to their caller.
///
/// Persistence failures are never represented here; they go to the
/// configured [`crate::writer::ErrorReporter`] instead.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The wrapped service or transport failed.
    #[error("wrapped call failed: {0}")]
    Inner(#[source] BoxError),

    /// Reading a request or response body to completion failed.
    #[error("failed to drain body: {0}")]
    BodyDrain(#[source] BoxError),
}
