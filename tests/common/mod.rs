// SPDX-FileCopyrightText: 2026 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tokio::time::sleep;

use harlog::proxy::{parse_upstream, run_proxy};
use harlog::HarLogger;

/// A unique, not yet created directory under the system temp dir.
pub fn temp_output_dir(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("harlog_integ_{}_{}", prefix, uuid::Uuid::new_v4()))
}

// Minimal helper: start run_proxy and wait until it is accepting
pub async fn start_run_proxy_and_wait(
    upstream: &str,
    output_dir: &Path,
) -> anyhow::Result<(tokio::task::JoinHandle<()>, SocketAddr)> {
    // Choose a free port by binding then dropping
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);

    let upstream = parse_upstream(upstream)?;
    let logger = HarLogger::new(output_dir);
    let handle = tokio::spawn(async move {
        let _ = run_proxy(addr, upstream, logger).await;
    });

    // Wait for server to accept connections
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if Instant::now() > deadline {
            return Err(anyhow::anyhow!("timeout waiting for proxy to start"));
        }
        if let Ok(mut s) = tokio::net::TcpStream::connect(addr).await {
            let _ = s.shutdown().await;
            break;
        }
        sleep(Duration::from_millis(50)).await;
    }

    Ok((handle, addr))
}

/// All `.har` files in `dir`, sorted by name.
pub async fn har_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut rd = tokio::fs::read_dir(dir).await?;
    while let Some(e) = rd.next_entry().await? {
        if e.path().extension().is_some_and(|x| x == "har") {
            out.push(e.path());
        }
    }
    out.sort();
    Ok(out)
}

/// Sorted (name, value) pairs, so header sets compare regardless of order.
pub fn header_multiset(headers: &hyper::HeaderMap) -> Vec<(String, Vec<u8>)> {
    let mut v: Vec<_> = headers
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), v.as_bytes().to_vec()))
        .collect();
    v.sort();
    v
}
