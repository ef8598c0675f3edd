// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Loading HAR archives back into live HTTP messages.

use std::path::Path;

use crate::codec::{to_live_request, to_live_response};
use crate::error::HarError;
use crate::har::{HarDocument, HttpMessagePair};

/// Read a HAR file and convert every entry, in document order.
pub async fn parse_har_file<P: AsRef<Path>>(path: P) -> Result<Vec<HttpMessagePair>, HarError> {
    let data = tokio::fs::read(path.as_ref())
        .await
        .map_err(HarError::io("failed to read HAR file"))?;
    parse_har_data(&data)
}

/// Parse HAR bytes and convert every entry, in document order.
///
/// Fails on the first entry that cannot be converted; no partial output is
/// returned.
pub fn parse_har_data(data: &[u8]) -> Result<Vec<HttpMessagePair>, HarError> {
    let doc: HarDocument = serde_json::from_slice(data).map_err(HarError::MalformedDocument)?;

    doc.log
        .entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let request = to_live_request(&entry.request).map_err(|e| at_entry(i, e))?;
            let response = to_live_response(&entry.response);
            Ok(HttpMessagePair { request, response })
        })
        .collect()
}

fn at_entry(index: usize, e: HarError) -> HarError {
    match e {
        HarError::MalformedInput(msg) => HarError::MalformedInput(format!("entry {}: {}", index, msg)),
        other => other,
    }
}
