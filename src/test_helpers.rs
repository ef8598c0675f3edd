// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Shared test utilities to reduce duplication across test modules.

use bytes::Bytes;
use hyper::body::{Body, Frame};
use hyper::http::{request, response};
use hyper::{HeaderMap, Request, Response};
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use uuid::Uuid;

use crate::codec::{capture_request, capture_response};
use crate::har::HarEntry;
use crate::writer::{ErrorReporter, PersistFailure};

/// A unique, not yet created directory under the system temp dir.
pub fn make_temp_dir(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("harlog_{}_{}", prefix, Uuid::new_v4()))
}

pub fn make_request_parts(method: &str, uri: &str, headers: &[(&str, &str)]) -> request::Parts {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
        builder = builder.header(*k, *v);
    }
    builder.body(()).expect("valid test request").into_parts().0
}

pub fn make_response_parts(status: u16, headers: &[(&str, &str)]) -> response::Parts {
    let mut builder = Response::builder().status(status);
    for (k, v) in headers {
        builder = builder.header(*k, *v);
    }
    builder.body(()).expect("valid test response").into_parts().0
}

/// Sorted (name, value) pairs, so header sets compare regardless of order.
pub fn header_multiset(headers: &HeaderMap) -> Vec<(String, Vec<u8>)> {
    let mut v: Vec<_> = headers
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), v.as_bytes().to_vec()))
        .collect();
    v.sort();
    v
}

/// A small GET exchange for `url` returning `200 ok`.
pub fn sample_entry(url: &str) -> HarEntry {
    let req = make_request_parts("GET", url, &[("accept", "*/*")]);
    let resp = make_response_parts(200, &[("content-type", "text/plain")]);
    crate::codec::build_entry(
        chrono::Utc::now(),
        std::time::Duration::from_millis(5),
        capture_request(&req, "http", None),
        capture_response(&resp, &Bytes::from_static(b"ok")),
    )
}

/// A body whose first poll fails.
pub struct FailingBody;

impl Body for FailingBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Poll::Ready(Some(Err(std::io::Error::other("connection reset"))))
    }
}

/// Owned copy of a [`PersistFailure`].
#[derive(Debug, Clone)]
pub struct RecordedFailure {
    pub error: String,
    pub path: String,
    pub method: String,
    pub host: String,
}

/// Reporter that keeps every failure for later assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    failures: Arc<Mutex<Vec<RecordedFailure>>>,
}

impl RecordingReporter {
    pub fn reports(&self) -> Vec<RecordedFailure> {
        self.failures.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, failure: &PersistFailure<'_>) {
        if let Ok(mut f) = self.failures.lock() {
            f.push(RecordedFailure {
                error: failure.error.to_string(),
                path: failure.path.to_string(),
                method: failure.method.to_string(),
                host: failure.host.to_string(),
            });
        }
    }
}
