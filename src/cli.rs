//! Command layer: argument parsing, user-facing presentation of broker
//! errors, and delegation of everything else to the legacy CLI.

use std::ffi::OsString;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

use crate::fallback;
use crate::resolve::{resolve, resolve_identity, ResolveOptions};
use crate::utils::logging::{LogFormat, LogLevel};

#[derive(Debug, Parser)]
#[command(name = "token-broker", about = "Local cloud credential broker")]
pub struct Cli {
    /// Act as this service account for all token requests
    #[arg(long, global = true)]
    pub impersonate_service_account: Option<String>,

    #[arg(long, global = true, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    #[arg(long, global = true, value_enum, default_value = "compact")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve credentials and print a valid access token
    PrintAccessToken,

    /// Print an identity token, optionally scoped to an audience
    PrintIdentityToken {
        #[arg(long, env = "GCLOUD_ID_TOKEN_AUDIENCES")]
        audiences: Option<String>,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
        rest: Vec<String>,
    },

    /// Print the active credential in tooling-consumable formats
    ConfigHelper {
        #[arg(short = 'o', long, default_value = "yaml")]
        format: String,
    },

    /// Anything else is delegated to the legacy CLI with a shared token file
    #[command(external_subcommand)]
    External(Vec<OsString>),
}

#[derive(Debug, Serialize)]
struct ConfigHelperOutputCredential {
    access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_expiry: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct ConfigHelperOutput {
    credential: ConfigHelperOutputCredential,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecCredentialStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    expiration_timestamp: Option<DateTime<Utc>>,
    token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecCredential {
    api_version: String,
    kind: String,
    status: ExecCredentialStatus,
}

const EXEC_CREDENTIAL_API_VERSION: &str = "client.authentication.k8s.io/v1";

/// Dispatch the parsed command; returns the process exit code.
pub async fn run(cli: Cli) -> Result<i32> {
    let opts = ResolveOptions {
        impersonate_target: cli.impersonate_service_account.clone(),
        ..Default::default()
    };

    match cli.command {
        Command::PrintAccessToken => {
            let ts = resolve(&opts)?;
            let tok = ts.token().await?;
            println!("{}", tok.access_token);
            Ok(0)
        }
        Command::PrintIdentityToken { audiences, rest } => {
            // the legacy CLI handles identity tokens for impersonated or
            // otherwise qualified principals
            if !rest.is_empty() || opts.impersonate_target().is_some() {
                debug!("identity token request outside broker scope, delegating");
                return fallback::delegate(false, &opts).await;
            }
            let ts = match audiences.as_deref().filter(|aud| !aud.is_empty()) {
                Some(audience) => resolve_identity(audience, &opts)?,
                None => resolve(&opts)?.identity_view(),
            };
            let tok = ts.token().await?;
            println!("{}", tok.access_token);
            Ok(0)
        }
        Command::ConfigHelper { format } => {
            let ts = resolve(&opts)?;
            let tok = ts.token().await?;
            print_config_helper(&format, tok)?;
            Ok(0)
        }
        Command::External(_) => fallback::delegate(true, &opts).await,
    }
}

fn print_config_helper(format: &str, tok: crate::cache::AccessToken) -> Result<()> {
    match format {
        "yaml" | "json" => {
            let output = ConfigHelperOutput {
                credential: ConfigHelperOutputCredential {
                    access_token: tok.access_token,
                    id_token: tok.id_token,
                    token_expiry: tok.expiry,
                },
            };
            if format == "json" {
                println!("{}", serde_json::to_string(&output)?);
            } else {
                print!("{}", serde_yaml::to_string(&output)?);
            }
        }
        EXEC_CREDENTIAL_API_VERSION => {
            let output = ExecCredential {
                api_version: EXEC_CREDENTIAL_API_VERSION.to_owned(),
                kind: "ExecCredential".to_owned(),
                status: ExecCredentialStatus {
                    expiration_timestamp: tok.expiry,
                    token: tok.access_token,
                },
            };
            println!("{}", serde_json::to_string(&output)?);
        }
        other => return Err(anyhow!("invalid output format: {other}")),
    }
    Ok(())
}
