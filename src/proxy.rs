// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Recording reverse proxy: forwards every request to one upstream and
//! writes each exchange as a HAR file.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Incoming};
use hyper::header::{HeaderMap, HeaderName, CONNECTION, HOST};
use hyper::service::{service_fn, Service};
use hyper::{Request, Response, StatusCode, Uri, Version};
use hyper_util::client::legacy::connect::Connect;
use hyper_util::client::legacy::Client as LegacyClient;
use hyper_util::rt::TokioExecutor;
use hyper_util::rt::TokioIo;
use hyper_util::server::conn::auto::Builder as AutoConnBuilder;
use std::collections::HashSet;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::body::ReplayBody;
use crate::capture::HarLogger;
use crate::error::BoxError;
use crate::transport::https_client;

type ForwardFuture = Pin<Box<dyn Future<Output = Result<Response<Incoming>, BoxError>> + Send>>;

// RFC 7230 Section 6.1: Hop-by-hop headers must not be forwarded by proxies.
static HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Parse and check an upstream base URL. Scheme and authority are required.
pub fn parse_upstream(s: &str) -> anyhow::Result<Uri> {
    let uri: Uri = s.parse()?;
    match uri.scheme_str() {
        Some("http") | Some("https") => {}
        _ => anyhow::bail!("upstream '{}' must be an http:// or https:// URL", s),
    }
    if uri.authority().is_none() {
        anyhow::bail!("upstream '{}' has no host", s);
    }
    Ok(uri)
}

/// Sends each request on to a fixed upstream.
#[derive(Clone)]
pub struct Forwarder<C> {
    client: LegacyClient<C, Full<Bytes>>,
    upstream: Uri,
}

impl<C> Forwarder<C> {
    pub fn new(client: LegacyClient<C, Full<Bytes>>, upstream: Uri) -> Self {
        Self { client, upstream }
    }
}

impl<C, B> Service<Request<B>> for Forwarder<C>
where
    C: Connect + Clone + Send + Sync + 'static,
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Response = Response<Incoming>;
    type Error = BoxError;
    type Future = ForwardFuture;

    fn call(&self, req: Request<B>) -> Self::Future {
        let client = self.client.clone();
        let upstream = self.upstream.clone();

        Box::pin(async move {
            let (mut parts, body) = req.into_parts();
            let bytes = body
                .collect()
                .await
                .map_err(|e| -> BoxError { e.into() })?
                .to_bytes();

            parts.uri = upstream_uri(&upstream, &parts.uri)?;
            // The client negotiates the upstream protocol itself.
            parts.version = Version::HTTP_11;
            strip_hop_by_hop(&mut parts.headers);
            parts.headers.remove(HOST);

            let resp = client
                .request(Request::from_parts(parts, Full::new(bytes)))
                .await?;
            let (mut parts, body) = resp.into_parts();
            strip_hop_by_hop(&mut parts.headers);
            Ok(Response::from_parts(parts, body))
        })
    }
}

// Join the upstream base path with the incoming path and query.
fn upstream_uri(upstream: &Uri, incoming: &Uri) -> Result<Uri, BoxError> {
    let base = upstream.path().trim_end_matches('/');
    let pq = incoming
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let mut parts = upstream.clone().into_parts();
    parts.path_and_query = Some(format!("{}{}", base, pq).parse()?);
    Ok(Uri::from_parts(parts)?)
}

// Parse a Connection header value into a lowercased set of tokens
fn parse_connection_tokens(val: Option<&hyper::header::HeaderValue>) -> HashSet<String> {
    let mut set = HashSet::new();
    if let Some(conn_val) = val {
        if let Ok(conn_str) = conn_val.to_str() {
            for token in conn_str.split(',') {
                let trimmed = token.trim().to_ascii_lowercase();
                if !trimmed.is_empty() {
                    set.insert(trimmed);
                }
            }
        }
    }
    set
}

fn is_hop_by_hop_header(name: &str, connection_hop_headers: &HashSet<String>) -> bool {
    connection_hop_headers.contains(name) || HOP_BY_HOP_HEADERS.contains(&name)
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let tokens = parse_connection_tokens(headers.get(CONNECTION));
    let doomed: Vec<HeaderName> = headers
        .keys()
        .filter(|name| is_hop_by_hop_header(name.as_str(), &tokens))
        .cloned()
        .collect();
    for name in doomed {
        headers.remove(name);
    }
}

fn bad_gateway() -> Response<ReplayBody> {
    let mut resp = Response::new(ReplayBody::from_bytes(Bytes::from_static(b"bad gateway")));
    *resp.status_mut() = StatusCode::BAD_GATEWAY;
    resp
}

pub async fn run_proxy(listen: SocketAddr, upstream: Uri, logger: HarLogger) -> anyhow::Result<()> {
    // Default behavior: no accept limit (runs forever)
    run_proxy_with_limit(listen, upstream, logger, None).await
}

/// Testable variant of `run_proxy` that accepts an optional `accept_limit`.
/// When `accept_limit` is `Some(n)`, the accept loop returns after accepting
/// the Nth connection. Connection handlers are spawned and may still be
/// running when this function returns.
pub async fn run_proxy_with_limit(
    listen: SocketAddr,
    upstream: Uri,
    logger: HarLogger,
    accept_limit: Option<usize>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(listen).await?;
    info!(%listen, %upstream, output_dir = %logger.writer().output_dir().display(), "listening");
    let forwarder = Forwarder::new(https_client()?, upstream);
    serve(listener, forwarder, logger, accept_limit).await
}

/// Accept loop over an already bound listener.
pub async fn serve<C>(
    listener: TcpListener,
    forwarder: Forwarder<C>,
    logger: HarLogger,
    accept_limit: Option<usize>,
) -> anyhow::Result<()>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    let svc = logger.wrap_service(forwarder);
    let server_builder = AutoConnBuilder::new(TokioExecutor::new());

    let mut remaining = accept_limit;
    loop {
        if let Some(0) = remaining {
            break;
        }

        let (stream, remote_addr) = listener.accept().await?;

        if let Some(ref mut n) = remaining {
            *n -= 1;
        }

        let svc = svc.clone();
        let builder_clone = server_builder.clone();
        tokio::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let svc = svc.clone();
                async move {
                    match svc.call(req).await {
                        Ok(resp) => Ok::<_, Infallible>(resp),
                        Err(e) => {
                            warn!(error = %e, %remote_addr, "forwarding failed");
                            Ok(bad_gateway())
                        }
                    }
                }
            });

            let io = TokioIo::new(stream);
            if let Err(e) = builder_clone.serve_connection(io, service).await {
                error!(%e, %remote_addr, "connection error");
            }
        });
    }

    Ok(())
}
