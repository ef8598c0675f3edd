// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Outbound capture: a transport wrapper that records every request it sends.

use bytes::Bytes;
use chrono::Utc;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Incoming};
use hyper::{Request, Response};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::{Connect, HttpConnector};
use hyper_util::client::legacy::Client as LegacyClient;
use hyper_util::rt::TokioExecutor;
use std::future::Future;
use std::pin::Pin;
use tokio::time::Instant;

use crate::body::ReplayBody;
use crate::capture::HarLogger;
use crate::codec;
use crate::error::{BoxError, CaptureError};
use crate::filename::RequestMeta;

pub type TransportFuture<'a, B> =
    Pin<Box<dyn Future<Output = Result<Response<B>, BoxError>> + Send + 'a>>;

pub type HttpsClient = LegacyClient<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Pooled client speaking plain HTTP or TLS (native roots), HTTP/1 and HTTP/2.
pub fn https_client() -> std::io::Result<HttpsClient> {
    let https = HttpsConnectorBuilder::new()
        .with_native_roots()?
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .build();
    Ok(LegacyClient::builder(TokioExecutor::new()).build(https))
}

/// Something that sends a fully materialized request and yields a response.
pub trait Transport: Send + Sync {
    type ResBody: Body<Data = Bytes> + Send + 'static;

    fn round_trip(&self, req: Request<Full<Bytes>>) -> TransportFuture<'_, Self::ResBody>;
}

impl<C> Transport for LegacyClient<C, Full<Bytes>>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    type ResBody = Incoming;

    fn round_trip(&self, req: Request<Full<Bytes>>) -> TransportFuture<'_, Incoming> {
        let fut = self.request(req);
        Box::pin(async move { fut.await.map_err(BoxError::from) })
    }
}

/// Wraps a [`Transport`] and records each exchange it carries.
///
/// Both bodies are drained before recording. The wrapped transport gets a
/// fresh body over the request bytes, and the caller gets a fresh body over
/// the response bytes and trailers, so neither side notices the capture.
#[derive(Clone)]
pub struct HarTransport<T> {
    inner: T,
    logger: HarLogger,
}

impl<T> HarTransport<T> {
    pub fn new(inner: T, logger: HarLogger) -> Self {
        Self { inner, logger }
    }
}

impl<T> HarTransport<T>
where
    T: Transport,
    <T::ResBody as Body>::Error: Into<BoxError>,
{
    /// Send `req` through the wrapped transport, recording the exchange.
    ///
    /// Transport and drain failures are returned without writing an entry.
    /// Persistence failures are reported and otherwise ignored.
    pub async fn send<B>(&self, req: Request<B>) -> Result<Response<ReplayBody>, CaptureError>
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let started_at = Utc::now();
        let started = Instant::now();

        let (parts, body) = req.into_parts();
        let req_bytes = body
            .collect()
            .await
            .map_err(|e| CaptureError::BodyDrain(e.into()))?
            .to_bytes();
        let har_request = codec::capture_request(&parts, self.logger.scheme(), Some(&req_bytes));
        let meta = RequestMeta::from_parts(&parts);

        let resp = self
            .inner
            .round_trip(Request::from_parts(parts, Full::new(req_bytes)))
            .await
            .map_err(CaptureError::Inner)?;

        let (parts, body) = resp.into_parts();
        let collected = body
            .collect()
            .await
            .map_err(|e| CaptureError::BodyDrain(e.into()))?;
        let trailers = collected.trailers().cloned();
        let bytes = collected.to_bytes();

        let har_response = codec::capture_response(&parts, &bytes);
        let entry = codec::build_entry(started_at, started.elapsed(), har_request, har_response);
        self.logger.record(&meta, entry).await;

        Ok(Response::from_parts(
            parts,
            ReplayBody::from_bytes(bytes).with_trailers(trailers),
        ))
    }
}

impl<T> Transport for HarTransport<T>
where
    T: Transport,
    <T::ResBody as Body>::Error: Into<BoxError>,
{
    type ResBody = ReplayBody;

    fn round_trip(&self, req: Request<Full<Bytes>>) -> TransportFuture<'_, ReplayBody> {
        Box::pin(async move { self.send(req).await.map_err(BoxError::from) })
    }
}
