//! Main application entry point (CLI binary).
//!
//! A thin wrapper around the `safe_surf` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - JSON output for one-shot commands

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use safe_surf::config::{
    DEFAULT_LISTEN_ADDR, DEFAULT_RDAP_BASE_URL, DEFAULT_REPUTATION_BASE_URL, DEFAULT_USER_AGENT,
};
use safe_surf::initialization::{
    init_crypto_provider, init_logger_with, init_redirect_client, init_resources,
};
use safe_surf::redirect::{analyze_redirects, tracer_for_mode};
use safe_surf::server::{serve, ServerState};
use safe_surf::{Config, LogFormat, LogLevel, TraceMode, VerdictRequest};

/// Classifies URLs as safe, suspicious, or malicious.
#[derive(Debug, Parser)]
#[command(name = "safe_surf", version, about)]
struct Cli {
    /// Log level
    #[arg(long, value_enum, default_value = "info", global = true)]
    log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain", global = true)]
    log_format: LogFormat,

    /// Reputation service API key
    #[arg(long, env = "VT_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Reputation service base URL
    #[arg(long, env = "VT_BASE_URL", default_value = DEFAULT_REPUTATION_BASE_URL, global = true)]
    reputation_base_url: String,

    /// RDAP base URL for registration lookups
    #[arg(long, default_value = DEFAULT_RDAP_BASE_URL, global = true)]
    rdap_base_url: String,

    /// Redirect tracing mode
    #[arg(long, value_enum, default_value = "http", global = true)]
    trace_mode: TraceMode,

    /// Per-request HTTP timeout in seconds
    #[arg(long, default_value_t = 10, global = true)]
    timeout_seconds: u64,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT, global = true)]
    user_agent: String,

    /// SQLite file for the result cache (in-memory when omitted)
    #[arg(long, env = "SAFE_SURF_CACHE_DB", global = true)]
    cache_db: Option<PathBuf>,

    /// Directory for cached registration lookups
    #[arg(long, global = true)]
    whois_cache_dir: Option<PathBuf>,

    /// Public Suffix List file replacing the bundled snapshot
    #[arg(long, global = true)]
    suffix_list: Option<PathBuf>,

    /// JSON weights file for the phishing model
    #[arg(long, env = "SAFE_SURF_MODEL", global = true)]
    model: Option<PathBuf>,

    /// Webhook receiving alert notifications (alerts are logged when omitted)
    #[arg(long, env = "SAFE_SURF_ALERT_WEBHOOK", global = true)]
    alert_webhook: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, env = "SAFE_SURF_LISTEN", default_value = DEFAULT_LISTEN_ADDR)]
        listen: String,
    },
    /// Classify one URL and print the verdict as JSON
    Check {
        /// URL to classify
        #[arg(long)]
        url: String,
        /// Address alerted when the URL is not safe
        #[arg(long)]
        email: String,
    },
    /// Trace one URL's redirect chain and print the analysis as JSON
    Trace {
        /// URL to trace
        #[arg(long)]
        url: String,
    },
}

impl Cli {
    fn to_config(&self) -> Config {
        let listen_addr = match &self.command {
            Command::Serve { listen } => listen.clone(),
            _ => DEFAULT_LISTEN_ADDR.to_string(),
        };
        Config {
            listen_addr,
            log_level: self.log_level.clone(),
            log_format: self.log_format.clone(),
            reputation_api_key: self.api_key.clone(),
            reputation_base_url: self.reputation_base_url.clone(),
            rdap_base_url: self.rdap_base_url.clone(),
            trace_mode: self.trace_mode,
            timeout_seconds: self.timeout_seconds,
            user_agent: self.user_agent.clone(),
            cache_db: self.cache_db.clone(),
            whois_cache_dir: self.whois_cache_dir.clone(),
            suffix_list: self.suffix_list.clone(),
            model_path: self.model.clone(),
            alert_webhook: self.alert_webhook.clone(),
        }
    }
}

async fn run(command: Command, config: Config) -> Result<()> {
    match command {
        Command::Serve { .. } => {
            let resources = init_resources(&config).await?;
            serve(
                &config.listen_addr,
                ServerState::new(resources.engine, resources.tracer),
            )
            .await
        }
        Command::Check { url, email } => {
            let resources = init_resources(&config).await?;
            let verdict = resources
                .engine
                .evaluate(&VerdictRequest::new(url, email), &CancellationToken::new())
                .await?;
            println!("{}", serde_json::to_string_pretty(&verdict)?);

            // Let queued alerts drain before exiting
            drop(resources.engine);
            resources
                .alert_worker
                .await
                .context("Alert worker failed")?;
            Ok(())
        }
        Command::Trace { url } => {
            init_crypto_provider();
            let tracer = tracer_for_mode(config.trace_mode, init_redirect_client(&config)?);
            let report = analyze_redirects(tracer.as_ref(), &url).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; VT_API_KEY usually lives there
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = cli.to_config();
    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;

    if let Err(e) = run(cli.command, config).await {
        eprintln!("safe_surf error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}
