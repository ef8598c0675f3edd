// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Record HTTP exchanges as HAR 1.2 files and load them back.
//!
//! [`HarLogger`] wraps a hyper service ([`HarService`]) or an outbound
//! transport ([`HarTransport`]) and writes one HAR document per exchange.
//! [`parse_har_file`] and [`parse_har_data`] turn HAR documents back into
//! live `hyper` requests and responses.

pub mod body;
pub mod capture;
pub mod codec;
pub mod config;
pub mod error;
pub mod filename;
pub mod har;
pub mod parser;
pub mod path_guard;
pub mod proxy;
pub mod service;
pub mod transport;
pub mod version;
pub mod writer;

#[cfg(test)]
pub mod test_helpers;

pub use body::ReplayBody;
pub use capture::{HarLogger, HarLoggerBuilder};
pub use codec::{RawStatus, FALLBACK_STATUS};
pub use error::{CaptureError, HarError};
pub use filename::{FileNameFn, RequestMeta};
pub use har::{HarDocument, HarEntry, HttpMessagePair};
pub use parser::{parse_har_data, parse_har_file};
pub use service::HarService;
pub use transport::{HarTransport, Transport};
pub use version::ProtocolVersion;
pub use writer::{ErrorReporter, HarWriter, PersistFailure, TracingReporter};
