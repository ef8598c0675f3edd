// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Conversion between live hyper messages and HAR records, in both directions.
//!
//! The capture direction never touches a body stream: callers drain bodies
//! themselves and pass the collected bytes in, so they stay in charge of
//! handing a fresh body to whoever consumes the message next.

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE, HOST};
use hyper::http::{request, response};
use hyper::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use std::time::Duration;
use url::Url;

use crate::body::ReplayBody;
use crate::error::HarError;
use crate::har::{
    HarCache, HarContent, HarEntry, HarHeader, HarPostData, HarQueryParam, HarRequest,
    HarResponse, HarTimings, SIZE_UNKNOWN,
};
use crate::version::{format_http_version, ProtocolVersion};

/// Status used for rebuilt responses whose recorded status hyper cannot
/// represent, such as the `0` browsers write for blocked requests.
pub const FALLBACK_STATUS: StatusCode = StatusCode::BAD_GATEWAY;

/// The status integer exactly as recorded, attached to every rebuilt response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawStatus(pub u16);

/// Capture request metadata and, when already materialized, its body.
///
/// `body` is `None` for inbound requests whose body is left to the handler;
/// sizes then use the `-1` sentinel. An empty materialized body yields no
/// `postData` and a zero `bodySize`.
pub fn capture_request(parts: &request::Parts, scheme: &str, body: Option<&Bytes>) -> HarRequest {
    let (post_data, body_size) = match body {
        Some(b) if !b.is_empty() => (
            Some(HarPostData {
                mime_type: content_type(&parts.headers),
                text: String::from_utf8_lossy(b).into_owned(),
            }),
            b.len() as i64,
        ),
        Some(_) => (None, 0),
        None => (None, SIZE_UNKNOWN),
    };

    HarRequest {
        method: parts.method.as_str().to_string(),
        url: absolute_url(&parts.uri, &parts.headers, scheme),
        http_version: format_http_version(parts.version),
        headers: flatten_headers(&parts.headers),
        query_string: flatten_query(parts.uri.query()),
        post_data,
        headers_size: SIZE_UNKNOWN,
        body_size,
    }
}

/// Capture a response whose body has already been drained into `body`.
pub fn capture_response(parts: &response::Parts, body: &Bytes) -> HarResponse {
    HarResponse {
        status: parts.status.as_u16(),
        status_text: parts.status.canonical_reason().unwrap_or("").to_string(),
        http_version: format_http_version(parts.version),
        headers: flatten_headers(&parts.headers),
        content: HarContent {
            size: body.len() as i64,
            mime_type: content_type(&parts.headers),
            text: String::from_utf8_lossy(body).into_owned(),
        },
        headers_size: SIZE_UNKNOWN,
        body_size: body.len() as i64,
    }
}

/// Assemble a finished entry from its captured halves.
pub fn build_entry(
    started: DateTime<Utc>,
    elapsed: Duration,
    request: HarRequest,
    response: HarResponse,
) -> HarEntry {
    let time = elapsed.as_secs_f64() * 1000.0;
    HarEntry {
        started_date_time: started.to_rfc3339_opts(SecondsFormat::Millis, true),
        time,
        request,
        response,
        cache: HarCache::default(),
        timings: HarTimings {
            send: 0.0,
            wait: time,
            receive: 0.0,
        },
    }
}

/// Rebuild a live request from its HAR form.
///
/// The `queryString` array is only replayed into the URL when the URL has no
/// query of its own; the URL wins when both are present.
pub fn to_live_request(har: &HarRequest) -> Result<Request<ReplayBody>, HarError> {
    let mut url = Url::parse(&har.url).map_err(|e| {
        HarError::MalformedInput(format!("failed to parse request URL {:?}: {}", har.url, e))
    })?;
    if !har.query_string.is_empty() && url.query().is_none_or(str::is_empty) {
        let mut pairs = url.query_pairs_mut();
        for q in &har.query_string {
            pairs.append_pair(&q.name, &q.value);
        }
    }
    let uri: Uri = url
        .as_str()
        .parse()
        .map_err(|e| HarError::MalformedInput(format!("invalid request URI {}: {}", url, e)))?;
    let method = Method::from_bytes(har.method.as_bytes())
        .map_err(|e| HarError::MalformedInput(format!("invalid method {:?}: {}", har.method, e)))?;

    let body = match &har.post_data {
        Some(post) => ReplayBody::from_bytes(post.text.clone()),
        None => ReplayBody::absent(),
    };

    let protocol = ProtocolVersion::parse(&har.http_version);
    let mut req = Request::new(body);
    *req.method_mut() = method;
    *req.uri_mut() = uri;
    if let Some(v) = protocol.to_http() {
        *req.version_mut() = v;
    }
    replay_headers(req.headers_mut(), &har.headers);
    req.extensions_mut().insert(protocol);
    Ok(req)
}

/// Rebuild a live response from its HAR form.
///
/// Never fails: an unrepresentable status becomes [`FALLBACK_STATUS`], and
/// the recorded value is always available as a [`RawStatus`] extension.
pub fn to_live_response(har: &HarResponse) -> Response<ReplayBody> {
    let status = StatusCode::from_u16(har.status).unwrap_or_else(|_| {
        tracing::debug!(status = har.status, fallback = %FALLBACK_STATUS, "unrepresentable status");
        FALLBACK_STATUS
    });

    let protocol = ProtocolVersion::parse(&har.http_version);
    let mut resp = Response::new(ReplayBody::from_bytes(har.content.text.clone()));
    *resp.status_mut() = status;
    if let Some(v) = protocol.to_http() {
        *resp.version_mut() = v;
    }
    replay_headers(resp.headers_mut(), &har.headers);
    resp.extensions_mut().insert(protocol);
    resp.extensions_mut().insert(RawStatus(har.status));
    if !har.status_text.is_empty() {
        if let Ok(reason) = hyper::ext::ReasonPhrase::try_from(har.status_text.clone()) {
            resp.extensions_mut().insert(reason);
        }
    }
    resp
}

/// One pair per header value, in map order.
pub fn flatten_headers(headers: &HeaderMap) -> Vec<HarHeader> {
    headers
        .iter()
        .map(|(name, value)| HarHeader {
            name: name.as_str().to_string(),
            value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
        })
        .collect()
}

/// One pair per query parameter occurrence, in URL order.
pub fn flatten_query(query: Option<&str>) -> Vec<HarQueryParam> {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .map(|(name, value)| HarQueryParam {
                    name: name.into_owned(),
                    value: value.into_owned(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Build an absolute URL, falling back to the `Host` header for origin-form URIs.
pub fn absolute_url(uri: &Uri, headers: &HeaderMap, scheme: &str) -> String {
    if uri.scheme().is_some() && uri.authority().is_some() {
        return uri.to_string();
    }
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");
    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    format!("{}://{}{}", scheme, host, path)
}

fn content_type(headers: &HeaderMap) -> String {
    headers
        .get(CONTENT_TYPE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default()
}

// HTTP/2 pseudo-headers (`:authority`, `:path`, ...) and anything hyper
// cannot represent are skipped, never fatal.
fn replay_headers(target: &mut HeaderMap, headers: &[HarHeader]) {
    for h in headers {
        if h.name.starts_with(':') {
            tracing::debug!(name = %h.name, "skipping pseudo-header");
            continue;
        }
        let name = match HeaderName::from_bytes(h.name.as_bytes()) {
            Ok(name) => name,
            Err(e) => {
                tracing::debug!(name = %h.name, error = %e, "skipping header with invalid name");
                continue;
            }
        };
        match HeaderValue::from_str(&h.value) {
            Ok(value) => {
                target.append(name, value);
            }
            Err(e) => tracing::debug!(name = %h.name, error = %e, "skipping header with invalid value"),
        }
    }
}
