//! Reqguard CLI binary.
//!
//! Request validation and threat detection for JSON APIs.
//!
//! # Commands
//!
//! - `scan` - Scan a JSON payload for injection/pollution patterns
//! - `validate` - Validate a JSON payload against a built-in schema
//! - `serve` - Start the guarded HTTP API server

use std::io::{self, Read};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use reqguard::{
    config::Config,
    scan::{ScanLimits, ThreatScanner},
    schema::SchemaCatalog,
    server::{create_router, AppState, ServerConfig},
    validate::{validate, Mode},
    VERSION,
};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "reqguard")]
#[command(version = VERSION)]
#[command(about = "Request validation and threat detection for JSON APIs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a JSON payload for injection/pollution patterns
    Scan {
        /// JSON input (or - for stdin)
        input: Option<String>,

        /// Input file path
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Maximum nesting depth
        #[arg(long, default_value_t = 32)]
        max_depth: usize,
    },

    /// Validate a JSON payload against a built-in schema
    Validate {
        /// Schema name (see --list)
        #[arg(short, long)]
        schema: Option<String>,

        /// JSON input (or - for stdin)
        input: Option<String>,

        /// Input file path
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Reject undeclared fields
        #[arg(long)]
        strict: bool,

        /// List available schema names
        #[arg(long)]
        list: bool,
    },

    /// Start the guarded HTTP API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 8080)]
        port: u16,

        /// Bind to all interfaces
        #[arg(long)]
        bind_all: bool,

        /// TOML config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            input,
            file,
            max_depth,
        } => scan_command(input, file, max_depth),
        Commands::Validate {
            schema,
            input,
            file,
            strict,
            list,
        } => validate_command(schema, input, file, strict, list),
        Commands::Serve {
            port,
            bind_all,
            config,
        } => serve_command(port, bind_all, config).await,
    }
}

fn scan_command(input: Option<String>, file: Option<PathBuf>, max_depth: usize) -> anyhow::Result<()> {
    let content = read_input(input, file)?;
    let value: Value = serde_json::from_str(&content).context("input is not valid JSON")?;

    let scanner = ThreatScanner::with_limits(ScanLimits {
        max_depth,
        ..ScanLimits::default()
    });

    match scanner.scan_value(&value) {
        Ok(None) => {
            println!("{}", json!({"safe": true}));
            Ok(())
        },
        Ok(Some(category)) => {
            println!("{}", json!({"safe": false, "category": category}));
            std::process::exit(1);
        },
        Err(breach) => {
            println!("{}", json!({"safe": false, "limit": breach.to_string()}));
            std::process::exit(1);
        },
    }
}

fn validate_command(
    schema: Option<String>,
    input: Option<String>,
    file: Option<PathBuf>,
    strict: bool,
    list: bool,
) -> anyhow::Result<()> {
    let catalog = SchemaCatalog::build()?;

    if list {
        for name in SchemaCatalog::names() {
            println!("{name}");
        }
        return Ok(());
    }

    let Some(name) = schema else {
        bail!("--schema is required (use --list to see available names)");
    };
    let Some(schema) = catalog.by_name(&name) else {
        bail!("unknown schema '{name}' (use --list to see available names)");
    };

    let content = read_input(input, file)?;
    let value: Value = serde_json::from_str(&content).context("input is not valid JSON")?;

    let mode = if strict { Mode::Strict } else { Mode::Passthrough };

    match validate(&schema, &value, mode) {
        Ok(canonical) => {
            println!("{}", serde_json::to_string_pretty(&canonical)?);
            Ok(())
        },
        Err(errors) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "success": false,
                    "errors": errors,
                }))?
            );
            std::process::exit(1);
        },
    }
}

async fn serve_command(
    port: u16,
    bind_all: bool,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reqguard=info,tower_http=info".into()),
        )
        .init();

    let file_config = match config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let config = file_config.merge(Config::from_env());

    let mut server_config = ServerConfig::from_config(&config).with_port(port);
    if bind_all {
        server_config = server_config.bind_all();
    }
    let addr = server_config.addr;

    let state = Arc::new(AppState::new(server_config)?);
    let router = create_router(state);

    tracing::info!("Reqguard v{VERSION} listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}

/// Read from the positional arg, a file, or stdin
fn read_input(input: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()));
    }

    match input.as_deref() {
        Some("-") | None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        },
        Some(input) => Ok(input.to_string()),
    }
}
