// # ddnsd - DDNS Daemon
//
// This daemon is a THIN integration layer:
// - DO NOT add DNS logic or retry logic here
// - All update logic lives in ddns-core
//
// The ddnsd daemon is responsible for:
// 1. Reading flags and environment variables
// 2. Initializing logging and the runtime
// 3. Building the IP source, the DigitalOcean provider and the engine
// 4. Running the engine until SIGTERM/SIGINT
//
// ## Configuration
//
// ### Flags (single or double dash)
// - `-domain` / `DDNS_DOMAIN`: Domain whose A record is kept current (required)
// - `-interval` / `DDNS_INTERVAL`: Delay between cycles, e.g. `5m`, `90s` (default 5m)
// - `-ip-url` / `DDNS_IP_SOURCE_URL`: Plaintext IP-echo endpoint
// - `-api-url` / `DDNS_PROVIDER_API_URL`: DigitalOcean API base override
// - `-dry-run` / `DDNS_MODE=dry-run`: List records but never edit them
// - `-log-level` / `DDNS_LOG_LEVEL`: trace, debug, info, warn, error
//
// ### Credential
// - `DO_KEY`: DigitalOcean API token (required)
//
// ## Example
//
// ```bash
// export DO_KEY=dop_v1_...
// ddnsd -domain home.example.com -interval 10m
// ```

use anyhow::Result;
use clap::Parser;
use ddns_core::config::{self, DdnsConfig, IpSourceConfig, ProviderConfig};
use ddns_core::{DdnsEngine, SplitDomain};
use ddns_ip_http::HttpIpSource;
use ddns_provider_digitalocean::DigitalOceanProvider;
use std::env;
use std::ffi::OsString;
use std::future::Future;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Environment variable holding the DigitalOcean API token
const TOKEN_ENV: &str = "DO_KEY";

/// Long flags that may also be written with a single dash
const LONG_FLAGS: &[&str] = &[
    "domain",
    "interval",
    "ip-url",
    "api-url",
    "dry-run",
    "log-level",
    "help",
    "version",
];

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Keep one DigitalOcean A record pointed at this machine's public IP
#[derive(Parser, Debug)]
#[command(name = "ddnsd", version, about, long_about = None)]
struct Args {
    /// Fully qualified domain name to keep updated (e.g. home.example.com)
    #[arg(long, env = "DDNS_DOMAIN")]
    domain: String,

    /// How long to wait between checks (e.g. 30s, 5m, 1h30m)
    #[arg(long, env = "DDNS_INTERVAL", default_value = "5m")]
    interval: String,

    /// Plaintext IP-echo endpoint
    #[arg(long, env = "DDNS_IP_SOURCE_URL", default_value = config::DEFAULT_IP_ECHO_URL)]
    ip_url: String,

    /// DigitalOcean API base URL
    #[arg(long, env = "DDNS_PROVIDER_API_URL")]
    api_url: Option<String>,

    /// List records but never edit them
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DDNS_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

/// Rewrite `-domain x` / `-interval=5m` into their `--` form
///
/// Everything after a bare `--` is left untouched.
fn normalize_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut passthrough = false;
    args.into_iter()
        .map(|arg| {
            if passthrough {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                passthrough = true;
                return arg;
            }
            match text.strip_prefix('-') {
                Some(rest) if !rest.starts_with('-') => {
                    let name = rest.split_once('=').map_or(rest, |(name, _)| name);
                    if LONG_FLAGS.contains(&name) {
                        OsString::from(format!("-{text}"))
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}

/// Application configuration
struct Config {
    domain: String,
    interval: Duration,
    ip_source_url: String,
    provider_api_url: Option<String>,
    provider_api_token: String,
    dry_run: bool,
    log_level: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("domain", &self.domain)
            .field("interval", &self.interval)
            .field("ip_source_url", &self.ip_source_url)
            .field("provider_api_url", &self.provider_api_url)
            .field("provider_api_token", &"<redacted>")
            .field("dry_run", &self.dry_run)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Combine parsed flags with the environment
    fn from_args(args: Args) -> Result<Self> {
        let token = env::var(TOKEN_ENV).ok();
        let mode = env::var("DDNS_MODE").ok();
        Self::from_parts(args, token, mode.as_deref())
    }

    fn from_parts(args: Args, token: Option<String>, mode: Option<&str>) -> Result<Self> {
        let provider_api_token = token.unwrap_or_default();
        if provider_api_token.is_empty() {
            anyhow::bail!(
                "{TOKEN_ENV} env variable not set. \
                Set it via: export {TOKEN_ENV}=your_digitalocean_token"
            );
        }

        let interval = config::parse_interval(&args.interval)
            .map_err(|e| anyhow::anyhow!("-interval: {}", e))?;

        let dry_run = args.dry_run || mode.is_some_and(|m| m.eq_ignore_ascii_case("dry-run"));

        Ok(Self {
            domain: args.domain,
            interval,
            ip_source_url: args.ip_url,
            provider_api_url: args.api_url,
            provider_api_token,
            dry_run,
            log_level: args.log_level,
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.domain.is_empty() {
            anyhow::bail!("-domain not passed");
        }
        SplitDomain::parse(&self.domain)?;

        if self.ip_source_url.starts_with("http://") {
            eprintln!(
                "WARNING: IP source URL uses HTTP (not HTTPS). \
                The reported address could be tampered with in transit."
            );
        }

        log_level(&self.log_level)?;

        self.ddns_config().validate()?;

        Ok(())
    }

    /// Library configuration for the engine
    fn ddns_config(&self) -> DdnsConfig {
        let provider = ProviderConfig::DigitalOcean {
            api_token: self.provider_api_token.clone(),
            base_url: self.provider_api_url.clone(),
            dry_run: self.dry_run,
        };

        let mut ddns_config =
            DdnsConfig::new(self.domain.clone(), provider).with_interval(self.interval);
        ddns_config.ip_source = IpSourceConfig {
            url: self.ip_source_url.clone(),
        };
        ddns_config
    }
}

fn log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "DDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

/// Build the engine and its collaborators (no runtime needed)
fn build_engine(config: &Config) -> ddns_core::Result<DdnsEngine> {
    let ddns_config = config.ddns_config();
    let ip_source = HttpIpSource::from_config(&ddns_config.ip_source)?;
    info!("Public address source: {}", ip_source.url());
    let provider = DigitalOceanProvider::from_config(&ddns_config.provider)?;

    // Events are only for embedders; the daemon reports through logs
    let (engine, _events) = DdnsEngine::new(Box::new(ip_source), Box::new(provider), ddns_config)?;
    Ok(engine)
}

/// Exit code for an engine that could not be built
///
/// Bad configuration is the operator's to fix; anything else (such as an
/// HTTP client that cannot be created) is an internal failure.
fn startup_exit_code(err: &ddns_core::Error) -> DdnsExitCode {
    if err.is_startup_error() {
        DdnsExitCode::ConfigError
    } else {
        DdnsExitCode::RuntimeError
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse_from(normalize_flags(env::args_os())) {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => {
            // --help / --version
            let _ = e.print();
            return DdnsExitCode::CleanShutdown.into();
        }
        Err(e) => {
            let _ = e.print();
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Load configuration from flags and environment
    let config = match Config::from_args(args) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    // Initialize tracing
    let level = log_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd daemon");
    info!(
        "Configuration loaded: domain={}, interval={:?}, dry_run={}",
        config.domain, config.interval, config.dry_run
    );

    let engine = match build_engine(&config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Startup error: {}", e);
            return startup_exit_code(&e).into();
        }
    };

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(engine).await {
            error!("Daemon error: {}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(engine: DdnsEngine) -> Result<()> {
    let shutdown = shutdown_signal()?;
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        let signal = shutdown.await;
        info!("Received shutdown signal: {}", signal);
        let _ = shutdown_tx.send(());
    });

    engine.run_with_shutdown(Some(shutdown_rx)).await?;

    info!("Shutting down daemon");
    Ok(())
}

/// Install handlers for SIGTERM and SIGINT
///
/// Handlers are registered before returning, so a signal that arrives
/// while the first cycle runs is not lost. The future resolves to the
/// name of the signal received.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = &'static str>> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    })
}

/// Wait for Ctrl-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = &'static str>> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to wait for CTRL-C: {}", e);
            std::future::pending::<()>().await;
        }
        "SIGINT"
    })
}
