//! MCP Demo - Rust Implementation
//!
//! Runs the demo MCP server, the three client walkthroughs, or the
//! interactive menu that ties them together.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::BufReader;

use mcp_demo::catalog;
use mcp_demo::config::Config;
use mcp_demo::demo::{ai_mcp, function_calling, orchestrator::Orchestrator, simple};
use mcp_demo::mcp::http;

/// MCP vs. function calling demo
#[derive(Parser)]
#[command(name = "mcp-demo")]
#[command(author, version, about = "MCP Demo - Model Context Protocol vs. function calling")]
struct Cli {
    /// Base URL of the MCP server the clients talk to
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo MCP server
    Serve {
        #[arg(long, value_enum, default_value_t = TransportKind::Http)]
        transport: TransportKind,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,
    },
    /// Check whether a server answers at the configured URL
    Status,
    /// Plain MCP client walkthrough
    SimpleClient,
    /// LLM-driven client over MCP
    AiClient,
    /// LLM-driven traditional function calling
    FunctionCalling,
    /// Interactive menu (default)
    Demo,
}

#[derive(Clone, Copy, ValueEnum)]
enum TransportKind {
    Http,
    Stdio,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries narration or the stdio transport
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::new().context("failed to load configuration")?;
    if let Some(url) = cli.url {
        config = config.with_server_url(url);
    }

    match cli.command.unwrap_or(Commands::Demo) {
        Commands::Serve {
            transport,
            host,
            port,
        } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            run_server(&config, transport).await?;
        }
        Commands::Status => {
            let health = http::probe_health(&config.health_url(), config.request_timeout)
                .await
                .with_context(|| format!("no MCP server responding at {}", config.server_url))?;
            println!(
                "{} {} is {} at {}",
                health.name, health.version, health.status, config.server_url
            );
        }
        Commands::SimpleClient => simple::run_http(&config).await?,
        Commands::AiClient => ai_mcp::run_http(&config).await?,
        Commands::FunctionCalling => function_calling::run_local(&config).await?,
        Commands::Demo => {
            let stdin = BufReader::new(tokio::io::stdin());
            Orchestrator::new(config).run_menu(stdin).await?;
        }
    }

    Ok(())
}

async fn run_server(config: &Config, transport: TransportKind) -> anyhow::Result<()> {
    let server = Arc::new(catalog::demo_server().context("failed to build demo server")?);

    match transport {
        TransportKind::Stdio => server.run_stdio().await?,
        TransportKind::Http => {
            let listener = http::bind(&config.host, config.port).await?;
            http::serve(listener, server, shutdown_signal()).await?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
