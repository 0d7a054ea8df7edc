use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use relaychat::config::Config;
use relaychat::llm::{LLMRequest, ProviderRegistry};
use relaychat::response::NO_RESPONSE_MESSAGE;
use relaychat::server::{AppState, build_app};

#[derive(Parser)]
#[command(name = "relaychat", version, about = "Relay chat messages to LLM providers")]
struct Cli {
    /// Path to the YAML config file
    #[arg(short, long, global = true, default_value = "relaychat.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Override the configured host
        #[arg(long)]
        host: Option<String>,
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Send one message and print the reply
    Ask {
        message: String,
        /// Provider id to use instead of rotation
        #[arg(short, long)]
        provider: Option<String>,
    },
    /// List configured providers
    Providers,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr; stdout carries `ask` replies.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .await
        .with_context(|| format!("loading {}", cli.config.display()))?;

    match cli.command {
        Command::Serve { host, port } => serve(config, host, port).await,
        Command::Ask { message, provider } => ask(config, message, provider).await,
        Command::Providers => providers(&config),
    }
}

async fn serve(config: Config, host: Option<String>, port: Option<u16>) -> Result<ExitCode> {
    let dispatcher = relaychat::build_dispatcher(&config)?;
    let state = AppState {
        dispatcher: Arc::new(dispatcher),
    };
    let app = build_app(state, config.server.request_timeout_seconds);

    let host = host.unwrap_or(config.server.host);
    let port = port.unwrap_or(config.server.port);
    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("binding {host}:{port}"))?;
    info!(address = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutting down");
        })
        .await
        .context("server error")?;

    Ok(ExitCode::SUCCESS)
}

async fn ask(config: Config, message: String, provider: Option<String>) -> Result<ExitCode> {
    let dispatcher = relaychat::build_dispatcher(&config)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let mut request = LLMRequest::new(message);
    if let Some(id) = provider {
        request = request.with_provider(id);
    }

    match dispatcher.dispatch_with_cancel(request, &cancel).await {
        Ok(result) => {
            println!("{}", result.content);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(error = %e, "LLM dispatch failed");
            eprintln!("{NO_RESPONSE_MESSAGE}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn providers(config: &Config) -> Result<ExitCode> {
    let registry = ProviderRegistry::from_env(config)?;
    for p in registry.all() {
        println!(
            "{:<12} {:<16} {:<28} {:>3}  {}",
            p.id,
            p.display_name,
            p.model,
            p.priority,
            if p.is_active() { "active" } else { "inactive" }
        );
    }
    Ok(ExitCode::SUCCESS)
}
