// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use clap::{Parser, Subcommand};
use hyper::Version;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;

use harlog::{config, parser, proxy, transport, HarLogger, HttpMessagePair, RawStatus};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "harlog", version, about = "Record and replay HTTP traffic as HAR files")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a reverse proxy that records every exchange
    Record {
        /// Optional config TOML path
        #[arg(long)]
        config: Option<String>,

        /// Listen address, e.g. 127.0.0.1:3000
        #[arg(long)]
        listen: Option<String>,

        /// Upstream base URL, e.g. http://127.0.0.1:8080
        #[arg(long)]
        upstream: Option<String>,

        /// Directory HAR files are written into
        #[arg(long)]
        output_dir: Option<String>,
    },
    /// Print one line per exchange in a HAR file
    Inspect { file: PathBuf },
    /// Re-send every request in a HAR file, recording the new exchanges
    Replay {
        file: PathBuf,

        #[arg(long, default_value = "har")]
        output_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    match args.command {
        Command::Record {
            config,
            listen,
            upstream,
            output_dir,
        } => {
            let cfg = load_config(config.as_deref()).await;
            let cfg = apply_overrides(cfg, listen, upstream, output_dir);
            record(cfg).await
        }
        Command::Inspect { file } => {
            for pair in parser::parse_har_file(&file).await? {
                println!("{}", describe(&pair));
            }
            Ok(())
        }
        Command::Replay { file, output_dir } => replay(&file, output_dir).await,
    }
}

// Load config: optional CLI path; defaults if not provided
async fn load_config(path: Option<&str>) -> config::Config {
    match path {
        Some(p) => config::Config::load_from_path(p).await.unwrap_or_else(|e| {
            warn!(%p, %e, "failed to load config, using defaults");
            config::Config::default()
        }),
        None => config::Config::default(),
    }
}

fn apply_overrides(
    mut cfg: config::Config,
    listen: Option<String>,
    upstream: Option<String>,
    output_dir: Option<String>,
) -> config::Config {
    if let Some(l) = listen {
        cfg.general.listen = l;
    }
    if let Some(u) = upstream {
        cfg.general.upstream = u;
    }
    if let Some(d) = output_dir {
        cfg.general.output_dir = d;
    }
    cfg
}

async fn record(cfg: config::Config) -> anyhow::Result<()> {
    let addr: SocketAddr = cfg.general.listen.parse()?;
    let upstream = proxy::parse_upstream(&cfg.general.upstream)?;
    let logger = HarLogger::builder()
        .output_dir(&cfg.general.output_dir)
        .scheme(cfg.capture.scheme.as_str())
        .build();

    let server = proxy::run_proxy(addr, upstream, logger);

    tokio::select! {
        res = server => {
            if let Err(e) = res {
                error!(%e, "server error");
            }
        }
        _ = signal::ctrl_c() => {
            info!("shutting down");
        }
    }

    Ok(())
}

async fn replay(file: &std::path::Path, output_dir: PathBuf) -> anyhow::Result<()> {
    let pairs = parser::parse_har_file(file).await?;
    let transport = HarLogger::new(output_dir).wrap_transport(transport::https_client()?);

    let total = pairs.len();
    let mut failed = 0usize;
    for pair in pairs {
        let mut req = pair.request;
        // Let the client negotiate; recorded HTTP/2 requests would be refused on HTTP/1 connections.
        if req.version() != Version::HTTP_10 {
            *req.version_mut() = Version::HTTP_11;
        }
        let method = req.method().clone();
        let uri = req.uri().clone();
        match transport.send(req).await {
            Ok(resp) => info!(%method, %uri, status = resp.status().as_u16(), "replayed"),
            Err(e) => {
                failed += 1;
                warn!(%method, %uri, error = %e, "replay failed");
            }
        }
    }

    info!(total, failed, "replay finished");
    if failed > 0 {
        anyhow::bail!("{} of {} requests failed", failed, total);
    }
    Ok(())
}

fn describe(pair: &HttpMessagePair) -> String {
    let status = pair
        .response
        .extensions()
        .get::<RawStatus>()
        .map_or(pair.response.status().as_u16(), |s| s.0);
    format!(
        "{} {} -> {} ({} bytes)",
        pair.request.method(),
        pair.request.uri(),
        status,
        pair.response.body().content_length()
    )
}
