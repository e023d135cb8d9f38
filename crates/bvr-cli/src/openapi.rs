//! # OpenAPI Subcommand
//!
//! Writes the document the server serves at `GET /api`, without starting
//! the server.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

/// Arguments for the `bvr openapi` subcommand.
#[derive(Args, Debug)]
pub struct OpenApiArgs {
    /// Write to this file instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Execute the openapi subcommand.
pub fn run_openapi(args: &OpenApiArgs) -> Result<u8> {
    let json = render()?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("OK: wrote OpenAPI document to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(0)
}

/// The OpenAPI document as pretty-printed JSON.
pub fn render() -> Result<String> {
    serde_json::to_string_pretty(&bvr_api::openapi::document())
        .context("failed to serialize OpenAPI document")
}
