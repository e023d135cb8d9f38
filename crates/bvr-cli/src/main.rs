//! # bvr CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bvr_cli::openapi::{run_openapi, OpenApiArgs};
use bvr_cli::roles::{run_roles, RolesArgs};
use bvr_cli::store::StoreArgs;
use bvr_cli::token::{run_token, TokenArgs};

/// Operator CLI for bv REST role resolution.
#[derive(Parser, Debug)]
#[command(name = "bvr", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve, check and evict login roles; list grants.
    Roles(RolesArgs),

    /// Verify api_key tokens.
    Token(TokenArgs),

    /// Write the OpenAPI document.
    #[command(name = "openapi")]
    OpenApi(OpenApiArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Roles(args) => run_roles(args, &cli.store).await,
        Commands::Token(args) => run_token(args),
        Commands::OpenApi(args) => run_openapi(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
