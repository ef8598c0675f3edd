// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Inbound capture: a hyper service wrapper that records every exchange.

use chrono::Utc;
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::service::Service;
use hyper::{Request, Response};
use std::future::Future;
use std::pin::Pin;
use tokio::time::Instant;

use crate::body::ReplayBody;
use crate::capture::HarLogger;
use crate::codec;
use crate::error::{BoxError, CaptureError};
use crate::filename::RequestMeta;

type CaptureFuture<T> = Pin<Box<dyn Future<Output = Result<T, CaptureError>> + Send>>;

/// Wraps a request handler and records each request/response it serves.
///
/// The request is passed through untouched; its body is left to the inner
/// service. The response body is drained, recorded, and handed back to the
/// caller as a fresh body over the same bytes and trailers.
#[derive(Clone)]
pub struct HarService<S> {
    inner: S,
    logger: HarLogger,
}

impl<S> HarService<S> {
    pub fn new(inner: S, logger: HarLogger) -> Self {
        Self { inner, logger }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for HarService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Error: Into<BoxError>,
    S::Future: Send + 'static,
    ResBody: Body + Send + 'static,
    ResBody::Data: Send,
    ResBody::Error: Into<BoxError>,
{
    type Response = Response<ReplayBody>;
    type Error = CaptureError;
    type Future = CaptureFuture<Self::Response>;

    fn call(&self, req: Request<ReqBody>) -> Self::Future {
        let started_at = Utc::now();
        let started = Instant::now();

        let (parts, body) = req.into_parts();
        let har_request = codec::capture_request(&parts, self.logger.scheme(), None);
        let meta = RequestMeta::from_parts(&parts);
        let fut = self.inner.call(Request::from_parts(parts, body));
        let logger = self.logger.clone();

        Box::pin(async move {
            let resp = fut.await.map_err(|e| CaptureError::Inner(e.into()))?;

            let (parts, body) = resp.into_parts();
            let collected = body
                .collect()
                .await
                .map_err(|e| CaptureError::BodyDrain(e.into()))?;
            let trailers = collected.trailers().cloned();
            let bytes = collected.to_bytes();

            let har_response = codec::capture_response(&parts, &bytes);
            let entry = codec::build_entry(started_at, started.elapsed(), har_request, har_response);
            logger.record(&meta, entry).await;

            Ok(Response::from_parts(
                parts,
                ReplayBody::from_bytes(bytes).with_trailers(trailers),
            ))
        })
    }
}
