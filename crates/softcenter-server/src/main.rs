//! Softcenter mirror server.
//!
//! Serves the softcenter metadata and push feeds (JSON or JSONP), package
//! icons and package archives from an installation directory. Before the
//! listener is bound, the metadata feed's checksums are refreshed against the
//! archives on disk.

mod handlers;
mod server;

use anyhow::Result;
use clap::Parser;
use softcenter_core::{refresh_checksums, ContentLocator, HttpConfig, SoftcenterPaths};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "softcenter-server")]
#[command(about = "Package feed, icon and archive server for the softcenter mirror")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, env = "SOFTCENTER_PORT", default_value_t = HttpConfig::DEFAULT_PORT)]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "SOFTCENTER_HOST", default_value = HttpConfig::DEFAULT_HOST)]
    host: String,

    /// Installation root holding the feeds, `picture/` and `file/`
    /// (defaults to the current directory)
    #[arg(long, env = "SOFTCENTER_ROOT")]
    root: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Do not refresh feed checksums at startup
    #[arg(long, conflicts_with = "refresh_only")]
    skip_refresh: bool,

    /// Refresh feed checksums and exit without serving
    #[arg(long)]
    refresh_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.debug, args.json_logs);

    info!("Starting softcenter server");

    let root = match args.root {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    info!("Installation root: {}", root.display());

    let paths = SoftcenterPaths::new(&root);

    if !args.skip_refresh {
        refresh_on_startup(&paths).await;
    }
    if args.refresh_only {
        return Ok(());
    }

    let handle = server::start_server(paths, &args.host, args.port).await?;

    // Port line for supervisors that start us with --port 0
    println!("SOFTCENTER_PORT={}", handle.addr.port());

    info!("Softcenter server running on {}", handle.addr);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, draining connections");
    handle.shutdown().await;

    Ok(())
}

/// Set up the tracing subscriber. `RUST_LOG` wins over `--debug`.
fn init_logging(debug: bool, json: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout is reserved for the port line
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false);

    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

/// Bring the metadata feed's checksums up to date before serving.
///
/// Failures are logged and otherwise ignored; the server starts regardless.
async fn refresh_on_startup(paths: &SoftcenterPaths) {
    let feed = paths.app_response();
    let locator = ContentLocator::new(paths.file_dir());

    let task_feed = feed.clone();
    match tokio::task::spawn_blocking(move || refresh_checksums(&task_feed, &locator)).await {
        Ok(outcome) => outcome.log(&feed),
        Err(e) => warn!("Checksum refresh task failed: {}", e),
    }
}
