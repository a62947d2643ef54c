#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod commands;
mod config;

use std::process;
use std::sync::Arc;

use anyhow::Context as _;
use vantage_auth::{AuthContext, AuthProvider, RbacStore};
use vantage_core::Credentials;
use vantage_reqwest::{AuthClient, BackendConfig, InviteFunctionClient, RowsClient, TokenCell};

use crate::config::{Cli, Command};

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "vantage_cli::startup";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_STARTUP,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();
    Cli::init_tracing();

    let mut backend = BackendConfig::from_parts(&cli.backend_url, &cli.api_key)
        .context("invalid backend configuration")?;
    if let Some(site_url) = cli.site_url.clone() {
        backend = backend.with_site_url(site_url);
    }

    let token = cli
        .access_token
        .clone()
        .map(TokenCell::with_token)
        .unwrap_or_default();
    let auth_client =
        AuthClient::new(backend.clone(), token.clone()).context("failed to create auth client")?;
    let rows_client =
        RowsClient::new(backend.clone(), token.clone()).context("failed to create rows client")?;
    let invite_client = InviteFunctionClient::new(backend, token)
        .context("failed to create invite function client")?;

    let context = AuthContext::new(
        Arc::new(auth_client) as Arc<dyn AuthProvider>,
        Arc::new(rows_client) as Arc<dyn RbacStore>,
    );

    match (&cli.email, &cli.password) {
        (Some(email), Some(password)) => {
            context
                .sign_in(Credentials::new(email, password))
                .await
                .context("sign-in failed")?;
        }
        _ => context.initialize().await,
    }

    let command = cli.command.unwrap_or(Command::Status);
    commands::execute(command, &context, &invite_client).await
}
