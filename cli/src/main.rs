//! CLI entrypoint for browser-dap
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result};
use browser_dap_application::{
    BrowserLauncher, CdpTransport, NoProtocolTrace, PathResolver, ProtocolTraceLogger,
    SessionController,
};
use browser_dap_domain::IdeEvent;
use browser_dap_infrastructure::{
    CdpGateway, ChromeLauncher, ConfigLoader, FileConfig, FileUrlPathResolver, JsonlTraceLogger,
};
use browser_dap_presentation::{Cli, DapServer};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Adapters shared by every client session.
struct Adapters {
    transport: Arc<dyn CdpTransport>,
    launcher: Arc<dyn BrowserLauncher>,
    paths: Arc<dyn PathResolver>,
    trace: Arc<dyn ProtocolTraceLogger>,
}

impl Adapters {
    fn server(&self) -> (DapServer, mpsc::UnboundedReceiver<IdeEvent>) {
        let (controller, events) = SessionController::new(
            self.transport.clone(),
            self.launcher.clone(),
            self.paths.clone(),
        );
        (DapServer::new(controller).with_trace(self.trace.clone()), events)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let config: FileConfig = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };
    config.validate()?;

    // Stdout carries the DAP stream, so logs never go there.
    let log_file = cli.log_file.clone().or_else(|| config.logging.file.clone());
    let _log_guard = init_logging(cli.verbose, log_file.as_deref())?;

    info!("Starting browser-dap");

    // === Dependency Injection ===
    let trace: Arc<dyn ProtocolTraceLogger> =
        match cli.trace_file.as_ref().or(config.logging.trace_file.as_ref()) {
            Some(path) => match JsonlTraceLogger::new(path) {
                Some(logger) => {
                    info!("Protocol trace: {}", logger.path().display());
                    Arc::new(logger)
                }
                None => Arc::new(NoProtocolTrace),
            },
            None => Arc::new(NoProtocolTrace),
        };

    let adapters = Adapters {
        transport: Arc::new(CdpGateway::with_trace(
            config.cdp.to_settings(),
            trace.clone(),
        )),
        launcher: Arc::new(ChromeLauncher::new(config.launch.to_settings())),
        paths: Arc::new(FileUrlPathResolver::new()),
        trace,
    };

    match cli.listen {
        Some(addr) => {
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to listen on {}", addr))?;
            info!("Listening for DAP clients on {}", listener.local_addr()?);

            loop {
                let (stream, peer) = listener.accept().await?;
                info!("DAP client connected from {}", peer);
                let (reader, writer) = stream.into_split();
                let (server, events) = adapters.server();
                if let Err(e) = server.serve(reader, writer, events).await {
                    warn!("DAP session with {} ended with error: {}", peer, e);
                }
                info!("DAP client {} disconnected", peer);
                if cli.oneshot {
                    break;
                }
            }
        }
        None => {
            let (server, events) = adapters.server();
            server
                .serve(tokio::io::stdin(), tokio::io::stdout(), events)
                .await
                .context("DAP session failed")?;
        }
    }

    info!("browser-dap exiting");
    Ok(())
}

/// Initialize logging based on verbosity level.
///
/// `RUST_LOG` overrides `-v`. Returns the guard that flushes the file
/// writer; keep it alive until exit.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file path: {}", path.display()))?;
            let dir = match path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir,
                _ => Path::new("."),
            };
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}
