use akamai_mcp_gateway::config;
use akamai_mcp_gateway::error::Error;
use akamai_mcp_gateway::logging::{self, LogFormat};
use akamai_mcp_gateway::{constants, dispatcher, Server};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

/// Dynamic API gateway exposing an OpenAPI catalog over a JSON-RPC tool-call transport.
#[derive(Parser, Debug)]
#[command(name = "akamai-mcp-gateway", version, about)]
struct Cli {
    /// Directory tree of OpenAPI specs to load into the registry.
    #[arg(long, default_value = "./specs")]
    spec_dir: PathBuf,

    /// Path to an edgerc-format credentials file (defaults to ~/.edgerc).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format.
    #[arg(long, value_enum, default_value = "text")]
    log_format: CliLogFormat,

    /// Seconds to wait for in-flight calls to finish when draining.
    #[arg(long, default_value_t = constants::DEFAULT_DRAIN_TIMEOUT_SECS)]
    drain_timeout_secs: u64,

    /// Emit fatal startup errors as JSON instead of human-readable text.
    #[arg(long)]
    json_errors: bool,

    /// Attach redacted request/response bodies to debug/trace logs.
    #[arg(long)]
    log_bodies: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CliLogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;

    if let Some(path) = &cli.config {
        std::env::set_var(constants::ENV_EDGERC_PATH, path);
    }

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            print_error(&e, json_errors);
            1
        }
    };

    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> Result<i32, Error> {
    let log_format = match cli.log_format {
        CliLogFormat::Text => LogFormat::Text,
        CliLogFormat::Json => LogFormat::Json,
    };

    let credentials = config::load_credentials()?;
    let mut settings = config::load_settings()?;
    if let Some(level) = &cli.log_level {
        settings.log_level = level.clone();
    }
    if cli.log_bodies {
        settings.log_bodies = true;
    }
    logging::init(&settings.log_level, log_format)?;

    let server = Arc::new(Server::new(&cli.spec_dir, credentials, &settings, cli.drain_timeout_secs)?);
    install_signal_handlers(&server);

    Ok(dispatcher::run(server).await)
}

/// Cancels the shutdown coordinator's shared token on SIGTERM/SIGINT so
/// the dispatcher loop breaks and the drain sequence runs.
fn install_signal_handlers(server: &Arc<Server>) {
    let token = server.shutdown.cancellation_token();
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }
        token.cancel();
    });
}

/// Prints a fatal startup error, either as JSON or human-readable text.
fn print_error(error: &Error, json_format: bool) {
    if json_format {
        if let Ok(rendered) = serde_json::to_string_pretty(&error.to_json()) {
            eprintln!("{rendered}");
            return;
        }
    }
    eprintln!("fatal: {error}");
}
