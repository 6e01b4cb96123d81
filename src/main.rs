//! CLI entry point wiring a record source, an optional recursive upstream,
//! a cache filter, and a [`kennelns::server::DnsServer`] together. Argument
//! parsing itself sits outside the core this crate specifies; this is
//! ambient scaffolding to make the core runnable, in the style of
//! `goatns`'s own `clap::Parser`-derived CLI.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use kennelns::chain::Chain;
use kennelns::config::{ListenHost, ServerConfig};
use kennelns::filters::cache::CacheFilter;
use kennelns::server::DnsServer;
use kennelns::sources::{JsonSource, MapSource, RecursiveSource};

#[derive(Parser, Debug)]
#[command(name = "kennelnsd", about = "An authoritative DNS server over UDP")]
struct Cli {
    /// UDP port to listen on.
    #[arg(long, default_value_t = 5300)]
    port: u16,

    /// JSON zone file to load (see spec section 6's record-loading format).
    #[arg(long)]
    zone_file: Option<String>,

    /// Upstream DNS server to delegate unmatched queries to, e.g. `8.8.8.8:53`.
    #[arg(long)]
    upstream: Option<SocketAddr>,

    /// Disable the TTL cache in front of the configured sources.
    #[arg(long)]
    no_cache: bool,

    /// Drive the receive loop and the consumer from the same task.
    #[arg(long, default_value_t = true)]
    own_consumer: bool,

    /// Emit per-query tracing at DEBUG level.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(if cli.debug { "debug" } else { "info" })
        }))
        .init();

    let map_source: Box<dyn kennelns::chain::Source> = match &cli.zone_file {
        Some(path) => Box::new(JsonSource::from_path(path)?.into_map_source()),
        None => Box::new(MapSource::new()),
    };

    let mut sources = vec![map_source];
    if let Some(upstream) = cli.upstream {
        let local_addr: SocketAddr = SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), 0);
        let recursive = RecursiveSource::bind(local_addr, upstream, kennelns::RECURSIVE_DEFAULT_RETRIES).await?;
        sources.push(Box::new(recursive));
    }

    let filters: Vec<Box<dyn kennelns::chain::Filter>> = if cli.no_cache {
        vec![]
    } else {
        vec![Box::new(CacheFilter::new())]
    };

    let chain = Chain::new(sources, filters);

    let config = ServerConfig::new(vec![chain])
        .listen_host(ListenHost::V4(Ipv4Addr::UNSPECIFIED))
        .listen_port(cli.port)
        .own_consumer(cli.own_consumer)
        .debug(cli.debug);

    let server = Arc::new(DnsServer::bind(config).await?);
    tracing::info!(port = cli.port, "listening");

    if !cli.own_consumer {
        server.spawn_consumers(4);
    }

    let serve_server = server.clone();
    let serve_task = tokio::spawn(async move { serve_server.serve().await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    server.stop().await;
    serve_task.abort();

    Ok(())
}
