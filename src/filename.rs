// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Output filename strategies.

use chrono::Utc;
use hyper::header::HOST;
use hyper::http::request;
use hyper::{HeaderMap, Method, Uri};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Request metadata handed to filename strategies.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub method: Method,
    pub uri: Uri,
    /// `Host` header, else the URI host, else `"unknown"`.
    pub host: String,
    pub headers: HeaderMap,
}

impl RequestMeta {
    pub fn from_parts(parts: &request::Parts) -> Self {
        let host = parts
            .headers
            .get(HOST)
            .and_then(|h| h.to_str().ok())
            .filter(|h| !h.is_empty())
            .or_else(|| parts.uri.host())
            .unwrap_or("unknown")
            .to_string();
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            host,
            headers: parts.headers.clone(),
        }
    }
}

/// Pluggable filename strategy. Its output is untrusted and always
/// checked by [`crate::path_guard::validate`] before writing.
pub type FileNameFn = Arc<dyn Fn(&RequestMeta) -> PathBuf + Send + Sync>;

/// The default strategy, rooted at `output_dir`.
pub fn default_file_name_fn(output_dir: impl Into<PathBuf>) -> FileNameFn {
    let output_dir = output_dir.into();
    Arc::new(move |meta| default_file_name(&output_dir, meta))
}

/// `<dir>/<YYYYMMDD-HHMMSS.mmm>-<id>-<METHOD>-<host>-<path>.har`
pub fn default_file_name(output_dir: &Path, meta: &RequestMeta) -> PathBuf {
    let now = Utc::now();
    let id = Uuid::new_v4().simple().to_string();
    let mut path = sanitize_component(meta.uri.path());
    if path.is_empty() {
        path = "root".to_string();
    }
    output_dir.join(format!(
        "{}-{}-{}-{}-{}.har",
        now.format("%Y%m%d-%H%M%S%.3f"),
        &id[..8],
        sanitize_component(meta.method.as_str()),
        sanitize_component(&meta.host),
        path,
    ))
}

/// Replace characters that are unsafe in filenames with `_`, collapse runs
/// of `_`, and trim `_` and `.` from both ends. Idempotent.
pub fn sanitize_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_underscore = false;

    for c in s.chars() {
        let unsafe_char = matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
            || c.is_whitespace()
            || c.is_control();
        let c = if unsafe_char { '_' } else { c };

        if c == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = false;
        }
    }

    out.trim_matches(|c| c == '_' || c == '.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::make_request_parts;
    use rstest::rstest;

    #[rstest]
    #[case("/api/v1/users", "api_v1_users")]
    #[case("example.com:8080", "example.com_8080")]
    #[case("a//b\\\\c", "a_b_c")]
    #[case("what?*<>|\"", "what")]
    #[case("  spaced out  ", "spaced_out")]
    #[case("..hidden..", "hidden")]
    #[case("/", "")]
    #[case("tab\tand\nnewline", "tab_and_newline")]
    fn sanitize_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_component(input), expected);
    }

    #[rstest]
    #[case("/api/v1/users")]
    #[case("__a__b__")]
    #[case("x.:.y")]
    #[case("._._.")]
    #[case("héllo wörld/..")]
    fn sanitize_is_a_fixed_point(#[case] input: &str) {
        let once = sanitize_component(input);
        assert_eq!(sanitize_component(&once), once);
    }

    #[test]
    fn meta_prefers_host_header() {
        let parts = make_request_parts("GET", "http://uri.example/x", &[("host", "hdr.example")]);
        assert_eq!(RequestMeta::from_parts(&parts).host, "hdr.example");

        let parts = make_request_parts("GET", "http://uri.example/x", &[]);
        assert_eq!(RequestMeta::from_parts(&parts).host, "uri.example");

        let parts = make_request_parts("GET", "/x", &[]);
        assert_eq!(RequestMeta::from_parts(&parts).host, "unknown");
    }

    #[test]
    fn default_name_layout() {
        let parts = make_request_parts("POST", "http://api.example.com:8080/users/42?x=1", &[]);
        let meta = RequestMeta::from_parts(&parts);
        let p = default_file_name(Path::new("/out"), &meta);
        assert_eq!(p.parent(), Some(Path::new("/out")));

        let name = p.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        assert!(name.ends_with("-POST-api.example.com-users_42.har"), "{}", name);
        // 8 date + '-' + 6 time + ".mmm" + '-' + 8 id
        let (stamp, rest) = name.split_at(19);
        assert_eq!(stamp.len(), 19);
        assert!(stamp.chars().nth(8) == Some('-'));
        assert!(rest.starts_with('-'));
        assert!(rest[1..9].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn default_name_for_root_path() {
        let parts = make_request_parts("GET", "http://example.com/", &[]);
        let meta = RequestMeta::from_parts(&parts);
        let p = default_file_name(Path::new("out"), &meta);
        let name = p.to_string_lossy();
        assert!(name.ends_with("-GET-example.com-root.har"), "{}", name);
    }

    #[test]
    fn default_names_do_not_collide() {
        let parts = make_request_parts("GET", "http://example.com/same", &[]);
        let meta = RequestMeta::from_parts(&parts);
        let f = default_file_name_fn("out");
        assert_ne!(f(&meta), f(&meta));
    }
}
