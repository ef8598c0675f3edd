// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! HAR 1.2 document model.
//!
//! Field names follow the HAR convention exactly so that written files can be
//! opened by browsers and other HAR tooling. Only the subset needed to
//! describe a request/response exchange is modeled; unknown fields in
//! foreign documents are ignored on load.

use serde::{Deserialize, Serialize};

use crate::body::ReplayBody;

/// HAR format version written in every document.
pub const HAR_VERSION: &str = "1.2";

/// Creator name written in every document.
pub const CREATOR_NAME: &str = "harlog";

/// Sentinel for sizes that are not computed.
pub const SIZE_UNKNOWN: i64 = -1;

/// Root of a HAR file: `{"log": {...}}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HarDocument {
    pub log: HarLog,
}

impl HarDocument {
    /// Wrap a single entry into a complete document with this crate as creator.
    pub fn single(entry: HarEntry) -> Self {
        Self {
            log: HarLog {
                version: HAR_VERSION.to_string(),
                creator: HarCreator::default(),
                entries: vec![entry],
            },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HarLog {
    pub version: String,
    pub creator: HarCreator,
    #[serde(default)]
    pub entries: Vec<HarEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HarCreator {
    pub name: String,
    pub version: String,
}

impl Default for HarCreator {
    fn default() -> Self {
        Self {
            name: CREATOR_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// One recorded request/response exchange.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HarEntry {
    /// RFC 3339 start time of the exchange.
    pub started_date_time: String,
    /// Total elapsed time in milliseconds.
    pub time: f64,
    pub request: HarRequest,
    pub response: HarResponse,
    #[serde(default)]
    pub cache: HarCache,
    #[serde(default)]
    pub timings: HarTimings,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HarRequest {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub http_version: String,
    #[serde(default)]
    pub headers: Vec<HarHeader>,
    #[serde(default)]
    pub query_string: Vec<HarQueryParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_data: Option<HarPostData>,
    #[serde(default = "size_unknown")]
    pub headers_size: i64,
    #[serde(default = "size_unknown")]
    pub body_size: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HarResponse {
    pub status: u16,
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub http_version: String,
    #[serde(default)]
    pub headers: Vec<HarHeader>,
    pub content: HarContent,
    #[serde(default = "size_unknown")]
    pub headers_size: i64,
    #[serde(default = "size_unknown")]
    pub body_size: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HarHeader {
    pub name: String,
    pub value: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HarQueryParam {
    pub name: String,
    pub value: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HarPostData {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub text: String,
}

/// Response body, stored as text (never base64).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HarContent {
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub text: String,
}

/// Placeholder required by the format; always written as `{}`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct HarCache {}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct HarTimings {
    pub send: f64,
    pub wait: f64,
    pub receive: f64,
}

/// A reconstructed exchange, ready for replay or inspection.
#[derive(Debug)]
pub struct HttpMessagePair {
    pub request: hyper::Request<ReplayBody>,
    pub response: hyper::Response<ReplayBody>,
}

fn size_unknown() -> i64 {
    SIZE_UNKNOWN
}
