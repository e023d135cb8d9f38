//! # Roles Subcommand
//!
//! Resolve and check a login's roles, evict its cached set, and list the
//! grant table. Output is JSON on stdout.

use anyhow::{Context, Result};
use bvr_core::{Login, RoleResolver};
use clap::{Args, Subcommand};
use serde_json::json;

use crate::store::{open_resolver, StoreArgs};

/// Arguments for the `bvr roles` subcommand.
#[derive(Args, Debug)]
pub struct RolesArgs {
    #[command(subcommand)]
    pub command: RolesCommand,
}

/// Role subcommands.
#[derive(Subcommand, Debug)]
pub enum RolesCommand {
    /// Print the resolved roles of a login (cached or freshly computed).
    Resolve {
        /// Login to resolve.
        login: String,
    },

    /// Check that a login holds every listed role. Exits 2 if any is missing.
    Check {
        /// Login to check.
        login: String,
        /// Required roles.
        #[arg(required = true)]
        roles: Vec<String>,
    },

    /// Drop a login's cached role set so the next request recomputes it.
    Evict {
        /// Login to evict.
        login: String,
    },

    /// Print every row of the grant table.
    Grants,
}

/// Execute the roles subcommand.
pub async fn run_roles(args: &RolesArgs, store: &StoreArgs) -> Result<u8> {
    let resolver = open_resolver(store).await?;
    let (code, output) = execute(&args.command, &resolver).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(code)
}

/// Run `command` against `resolver`, returning the exit code and JSON output.
pub async fn execute(
    command: &RolesCommand,
    resolver: &RoleResolver,
) -> Result<(u8, serde_json::Value)> {
    match command {
        RolesCommand::Resolve { login } => {
            let login = parse_login(login)?;
            let roles = resolver
                .resolve_roles(&login)
                .await
                .with_context(|| format!("failed to resolve roles for '{login}'"))?;
            Ok((0, json!({ "login": login.as_str(), "roles": roles })))
        }
        RolesCommand::Check { login, roles } => {
            let login = parse_login(login)?;
            let held = resolver
                .resolve_roles(&login)
                .await
                .with_context(|| format!("failed to resolve roles for '{login}'"))?;
            let (granted, missing): (Vec<&String>, Vec<&String>) =
                roles.iter().partition(|role| held.contains(role));
            let code = if missing.is_empty() { 0 } else { 2 };
            Ok((code, json!({ "granted": granted, "missing": missing })))
        }
        RolesCommand::Evict { login } => {
            let login = parse_login(login)?;
            let evicted = resolver
                .evict(&login)
                .await
                .with_context(|| format!("failed to evict roles for '{login}'"))?;
            Ok((0, json!({ "login": login.as_str(), "evicted": evicted })))
        }
        RolesCommand::Grants => {
            let grants = resolver.grants().await.context("failed to load grants")?;
            Ok((0, json!({ "count": grants.len(), "grants": grants })))
        }
    }
}

fn parse_login(raw: &str) -> Result<Login> {
    Login::new(raw).with_context(|| format!("invalid login '{raw}'"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bvr_core::{Grant, MemoryRoleStore};

    use super::*;

    fn resolver() -> RoleResolver {
        RoleResolver::new(Arc::new(MemoryRoleStore::with_grants(vec![
            Grant::new("staff", "$alice", true),
            Grant::new("editor", "staff", false),
        ])))
    }

    #[tokio::test]
    async fn resolve_prints_closure() {
        let command = RolesCommand::Resolve {
            login: "alice".into(),
        };
        let (code, out) = execute(&command, &resolver()).await.unwrap();
        assert_eq!(code, 0);
        assert_eq!(out["roles"], json!(["$alice", "editor", "staff"]));
    }

    #[tokio::test]
    async fn check_exits_2_on_missing_role() {
        let command = RolesCommand::Check {
            login: "alice".into(),
            roles: vec!["editor".into(), "admin".into()],
        };
        let (code, out) = execute(&command, &resolver()).await.unwrap();
        assert_eq!(code, 2);
        assert_eq!(out["granted"], json!(["editor"]));
        assert_eq!(out["missing"], json!(["admin"]));

        let command = RolesCommand::Check {
            login: "alice".into(),
            roles: vec!["staff".into()],
        };
        let (code, _) = execute(&command, &resolver()).await.unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn evict_reports_whether_cached() {
        let resolver = resolver();
        let evict = RolesCommand::Evict {
            login: "alice".into(),
        };
        let (_, out) = execute(&evict, &resolver).await.unwrap();
        assert_eq!(out["evicted"], false);

        resolver
            .resolve_roles(&Login::new("alice").unwrap())
            .await
            .unwrap();
        let (_, out) = execute(&evict, &resolver).await.unwrap();
        assert_eq!(out["evicted"], true);
    }

    #[tokio::test]
    async fn grants_lists_rows() {
        let (_, out) = execute(&RolesCommand::Grants, &resolver()).await.unwrap();
        assert_eq!(out["count"], 2);
        assert_eq!(out["grants"][0]["given_to"], "$alice");
    }

    #[tokio::test]
    async fn marked_login_is_rejected() {
        let command = RolesCommand::Resolve {
            login: "$alice".into(),
        };
        assert!(execute(&command, &resolver()).await.is_err());
    }
}
