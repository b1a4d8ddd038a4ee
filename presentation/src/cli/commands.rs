//! CLI command definitions

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// CLI arguments for browser-dap
#[derive(Parser, Debug)]
#[command(name = "browser-dap")]
#[command(author, version, about = "Debug adapter bridging DAP clients to Chromium-based browsers")]
#[command(long_about = r#"
browser-dap speaks the Debug Adapter Protocol to an IDE and the Chrome
DevTools Protocol to a browser. It keeps the IDE's breakpoints in sync
with the browser across page reloads and forwards console output.

By default the adapter talks DAP over stdin/stdout. With --listen it
accepts IDE connections on a TCP socket instead, one client at a time.

Configuration files are loaded from (in priority order):
1. --config <path>            Explicit config file
2. ./browser-dap.toml         Project-level config
3. ~/.config/browser-dap/config.toml   Global config

Environment variables prefixed with BROWSER_DAP_ override file values,
e.g. BROWSER_DAP_CDP__REQUEST_TIMEOUT_MS=3000.

Example:
  browser-dap
  browser-dap --listen 127.0.0.1:4711 -vv
  browser-dap --trace-file /tmp/browser-dap.jsonl
"#)]
pub struct Cli {
    /// Serve DAP on a TCP address instead of stdio
    #[arg(short, long, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,

    /// With --listen, exit after the first client disconnects
    #[arg(long, requires = "listen")]
    pub oneshot: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Record every CDP and DAP message to this JSONL file
    #[arg(long, value_name = "PATH")]
    pub trace_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_stdio() {
        let cli = Cli::try_parse_from(["browser-dap"]).unwrap();
        assert!(cli.listen.is_none());
        assert!(!cli.oneshot);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_listen_and_verbosity() {
        let cli =
            Cli::try_parse_from(["browser-dap", "--listen", "127.0.0.1:4711", "--oneshot", "-vv"])
                .unwrap();
        assert_eq!(cli.listen, Some("127.0.0.1:4711".parse().unwrap()));
        assert!(cli.oneshot);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_oneshot_requires_listen() {
        assert!(Cli::try_parse_from(["browser-dap", "--oneshot"]).is_err());
    }

    #[test]
    fn test_file_options() {
        let cli = Cli::try_parse_from([
            "browser-dap",
            "--config",
            "dap.toml",
            "--trace-file",
            "trace.jsonl",
            "--log-file",
            "adapter.log",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("dap.toml")));
        assert_eq!(cli.trace_file, Some(PathBuf::from("trace.jsonl")));
        assert_eq!(cli.log_file, Some(PathBuf::from("adapter.log")));
    }
}
