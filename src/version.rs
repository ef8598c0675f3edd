// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! HTTP-version token parsing and formatting.

use hyper::Version;

/// Numeric protocol version decomposed from an `HTTP/x.y` token.
///
/// Malformed tokens decompose to `0.0`; this is an annotation, never an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ProtocolVersion {
    pub major: u32,
    pub minor: u32,
}

impl ProtocolVersion {
    /// Parse `HTTP/major.minor`. A missing minor part is read as `0`.
    pub fn parse(token: &str) -> Self {
        let Some(rest) = token.strip_prefix("HTTP/") else {
            return Self::default();
        };
        let (major, minor) = match rest.split_once('.') {
            Some((major, minor)) => (major.parse::<u32>(), minor.parse::<u32>()),
            None => (rest.parse::<u32>(), Ok(0)),
        };
        match (major, minor) {
            (Ok(major), Ok(minor)) => Self { major, minor },
            _ => Self::default(),
        }
    }

    /// The matching `hyper::Version`, if this is a version hyper knows.
    pub fn to_http(self) -> Option<Version> {
        match (self.major, self.minor) {
            (0, 9) => Some(Version::HTTP_09),
            (1, 0) => Some(Version::HTTP_10),
            (1, 1) => Some(Version::HTTP_11),
            (2, 0) => Some(Version::HTTP_2),
            (3, 0) => Some(Version::HTTP_3),
            _ => None,
        }
    }
}

// Convert hyper::Version into the textual HTTP-version token used in start/status lines.
pub fn format_http_version(v: Version) -> String {
    match v {
        Version::HTTP_09 => "HTTP/0.9".to_string(),
        Version::HTTP_10 => "HTTP/1.0".to_string(),
        Version::HTTP_11 => "HTTP/1.1".to_string(),
        Version::HTTP_2 => "HTTP/2.0".to_string(),
        Version::HTTP_3 => "HTTP/3.0".to_string(),
        _ => "HTTP/1.1".to_string(),
    }
}
