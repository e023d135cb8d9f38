//! # Token Subcommand
//!
//! Verify an `api_key` token the way the server does and print the login it
//! names.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bvr_core::{TokenVerifier, DEFAULT_ISSUER, DEFAULT_PUBLIC_KEY_PATH};
use clap::{Args, Subcommand};

/// Arguments for the `bvr token` subcommand.
#[derive(Args, Debug)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

/// Token subcommands.
#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Verify a token. Exits 1 if it is rejected.
    Verify {
        /// PEM public key.
        #[arg(long, env = "BV_API_KEY_PUBLIC_KEY", default_value = DEFAULT_PUBLIC_KEY_PATH)]
        key: PathBuf,
        /// Required issuer claim.
        #[arg(long, env = "BV_TOKEN_ISSUER", default_value = DEFAULT_ISSUER)]
        issuer: String,
        /// The token, or `-` to read it from stdin.
        token: String,
    },
}

/// Execute the token subcommand.
pub fn run_token(args: &TokenArgs) -> Result<u8> {
    match &args.command {
        TokenCommand::Verify { key, issuer, token } => {
            let verifier = TokenVerifier::from_public_key_file(key, issuer.clone())
                .with_context(|| format!("failed to load public key: {}", key.display()))?;
            let token = if token == "-" {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("failed to read token from stdin")?;
                buf
            } else {
                token.clone()
            };
            Ok(verify(&verifier, &token))
        }
    }
}

/// Verify `token`, print the outcome, and return the exit code.
pub fn verify(verifier: &TokenVerifier, token: &str) -> u8 {
    match verifier.verify(Some(token)) {
        Ok(login) => {
            println!("OK: token valid for login '{login}'");
            0
        }
        Err(e) => {
            println!("REJECTED: {e}");
            1
        }
    }
}
