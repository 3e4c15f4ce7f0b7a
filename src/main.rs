//! Gmail Terraform Provider
//!
//! Manages Gmail mail filters. By default serves the provider to a plugin
//! host over stdio; the other subcommands are for operators.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use terraform_provider_gmail::config::{ProviderConfig, CLIENT_ENV_VAR, TOKEN_ENV_VAR};
use terraform_provider_gmail::context::RequestContext;
use terraform_provider_gmail::gmail::{Credentials, FilterService, GmailService};
use terraform_provider_gmail::host::HostServer;
use terraform_provider_gmail::provider::{provider_schema, GmailProvider};

/// Gmail Terraform Provider
#[derive(Parser)]
#[command(name = "terraform-provider-gmail")]
#[command(author, version, about = "Terraform provider managing Gmail filters")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the provider over stdio (default)
    Serve,

    /// Print the provider schema as JSON
    Schema,

    /// Load credentials and report problems without calling Gmail
    Validate(CredentialArgs),

    /// Print the mailbox's filters as JSON
    List {
        #[command(flatten)]
        credentials: CredentialArgs,

        /// Give up after this many seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
}

#[derive(Args)]
struct CredentialArgs {
    /// Client credentials JSON or path to it
    #[arg(long, env = CLIENT_ENV_VAR, hide_env_values = true)]
    client: Option<String>,

    /// OAuth token JSON or path to it
    #[arg(long, env = TOKEN_ENV_VAR, hide_env_values = true)]
    token: Option<String>,
}

impl CredentialArgs {
    fn load(self) -> anyhow::Result<Credentials> {
        let config = ProviderConfig {
            client: self.client,
            token: self.token,
        };
        Credentials::from_config(&config).context("failed to load credentials")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve().await,
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&provider_schema())?);
            Ok(())
        }
        Commands::Validate(args) => {
            let credentials = args.load()?;
            if let Some(client) = credentials.client() {
                eprintln!(
                    "Credentials OK (client {}, scopes {})",
                    client.secret.client_id,
                    client.scopes.join(" ")
                );
            }
            Ok(())
        }
        Commands::List {
            credentials,
            timeout_secs,
        } => {
            let service = GmailService::new(&credentials.load()?)?;
            let ctx = RequestContext::background().with_timeout(Duration::from_secs(timeout_secs));
            let filters = service
                .list_filters(&ctx)
                .await
                .context("failed to list filters")?;
            println!("{}", serde_json::to_string_pretty(&filters)?);
            Ok(())
        }
    }
}

async fn serve() -> anyhow::Result<()> {
    let root = RequestContext::background();

    let on_signal = root.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling in-flight requests");
            on_signal.cancel();
        }
    });

    let server = HostServer::new(Arc::new(GmailProvider::new())).with_context(root.clone());

    tokio::select! {
        result = server.run_stdio() => result.context("provider server failed")?,
        _ = root.cancelled() => tracing::info!("Shutting down"),
    }

    Ok(())
}
