//! CRM command-line client.
//!
//! # Architecture Overview
//!
//! ```text
//!   CLI args ──▶ config ──▶ SubmissionGuard (login form)
//!                                  │
//!                                  ▼
//!                           ┌──────────────┐     ┌──────────────┐
//!                           │ api wrappers │────▶│   pipeline   │────▶ Backend
//!                           └──────────────┘     │ bearer/401/  │
//!                                                │ refresh/retry│
//!                                                └──────┬───────┘
//!                                                       ▼
//!                                                   notifier (stderr via tracing)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use crm_client::api::{login_form_schema, ApiClient};
use crm_client::auth::InMemoryCredentialStore;
use crm_client::config::{load_config, ClientConfig};
use crm_client::guard::SubmissionGuard;
use crm_client::notify::TracingNotifier;
use crm_client::observability::logging;
use crm_client::pipeline::RequestPipeline;

#[derive(Parser)]
#[command(name = "crm-client")]
#[command(about = "Command-line client for the CRM backend", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, env = "CRM_EMAIL")]
    email: String,

    #[arg(short, long, env = "CRM_PASSWORD", hide_env_values = true)]
    password: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List leads
    Leads,
    /// List campaigns
    Campaigns,
    /// Show the analytics overview
    Analytics,
    /// Show the signed-in user
    Me,
    /// GET an arbitrary API path
    Get { path: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    logging::init(&config.observability);

    tracing::debug!(
        base_url = %config.api.base_url,
        timeout_ms = config.api.timeout_ms,
        "Configuration loaded"
    );

    let notifier = Arc::new(TracingNotifier);
    let pipeline = RequestPipeline::new(
        &config.api,
        Arc::new(InMemoryCredentialStore::new()),
        notifier.clone(),
    )?;
    let client = ApiClient::new(Arc::new(pipeline));

    let guard = SubmissionGuard::new(login_form_schema(), &config.guard, notifier);
    let mut payload = Map::new();
    payload.insert("email".into(), Value::String(cli.email));
    payload.insert("password".into(), Value::String(cli.password));

    let auth = client.auth();
    guard
        .submit(payload, |values| async move { auth.submit_login(values).await })
        .await?;

    let body = match cli.command {
        Commands::Leads => client.leads().list(&[]).await?,
        Commands::Campaigns => client.campaigns().list(&[]).await?,
        Commands::Analytics => client.analytics().list(&[]).await?,
        Commands::Me => client.auth().me().await?,
        Commands::Get { path } => {
            client
                .pipeline()
                .send(crm_client::pipeline::RequestDescriptor::get(path))
                .await?
                .body
        }
    };

    print_response(&body)?;

    if let Err(e) = client.auth().logout().await {
        tracing::debug!(error = %e, "Logout call failed; local session cleared");
    }
    Ok(())
}

fn print_response(body: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(body)?);
    Ok(())
}
