//! # MAASCTL CLI
//!
//! Operator command line for the MaaS provisioner. Runs the same provisioning chain as
//! the REST service, directly against the configured gateway.
//!
//! ## Usage
//!
//! ```bash
//! # Find or create the gateway account of a user
//! maasctl check-user alice
//!
//! # Find or create an application and print its key
//! maasctl check-app alice parasol-demo-nb granite
//!
//! # Delete an application
//! maasctl delete-app alice parasol-demo-nb
//!
//! # Resolve the plan and endpoint serving a service
//! maasctl plan granite
//! maasctl endpoint granite
//!
//! # Print the first model advertised by an endpoint
//! maasctl models https://granite.example:443 $KEY --auth bearer
//!
//! # Print the environment injected into a workbench
//! maasctl workspace-env --user alice --project demo --notebook nb --image custom-custom-cai-code
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use maas_provisioner::config::AppConfig;
use maas_provisioner::models::ModelAuth;

mod provision;
mod workspace;

/// MaaS provisioner CLI
#[derive(Parser)]
#[command(name = "maasctl")]
#[command(
    about = "MaaS provisioner CLI",
    long_about = None,
    after_help = "\
Configuration is read from the environment (or a .env file):
  MAAS_API_URL, MAAS_API_KEY (required)

Examples:
  maasctl check-user alice
  maasctl check-app alice parasol-demo-nb granite
  maasctl endpoint guard
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find or create the gateway account of a user
    #[command(name = "check-user")]
    CheckUser {
        #[arg(value_name = "USERNAME")]
        username: String,
    },
    /// Find or create an application and print its key
    #[command(name = "check-app")]
    CheckApp {
        #[arg(value_name = "USERNAME")]
        username: String,
        #[arg(value_name = "APP_NAME")]
        app_name: String,
        #[arg(value_name = "SERVICE")]
        service: String,
    },
    /// Delete an application by name
    #[command(name = "delete-app")]
    DeleteApp {
        #[arg(value_name = "USERNAME")]
        username: String,
        #[arg(value_name = "APP_NAME")]
        app_name: String,
    },
    /// Resolve the public endpoint of a service
    Endpoint {
        #[arg(value_name = "SERVICE")]
        service: String,
    },
    /// Resolve the application plan serving a service
    Plan {
        #[arg(value_name = "SERVICE")]
        service: String,
    },
    /// Print the first model advertised by an endpoint
    Models {
        #[arg(value_name = "ENDPOINT")]
        endpoint: String,
        #[arg(value_name = "KEY")]
        key: String,
        /// How the key is sent: bearer or query
        #[arg(long, default_value = "bearer")]
        auth: ModelAuth,
    },
    /// Print the environment variables injected into a workbench
    #[command(name = "workspace-env")]
    WorkspaceEnv {
        #[arg(long)]
        user: String,
        #[arg(long)]
        project: String,
        #[arg(long)]
        notebook: String,
        /// Workbench image, e.g. custom-custom-cai-code
        #[arg(long)]
        image: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider already installed");
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "maasctl=info,maas_provisioner=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    // The model listing probe needs no gateway configuration
    if let Commands::Models {
        endpoint,
        key,
        auth,
    } = &cli.command
    {
        return workspace::models_command(endpoint, key, *auth).await;
    }

    // Only load .env for commands that talk to the gateway
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::CheckUser { username } => provision::check_user_command(&config, &username).await,
        Commands::CheckApp {
            username,
            app_name,
            service,
        } => provision::check_app_command(&config, &username, &app_name, &service).await,
        Commands::DeleteApp { username, app_name } => {
            provision::delete_app_command(&config, &username, &app_name).await
        }
        Commands::Endpoint { service } => provision::endpoint_command(&config, &service).await,
        Commands::Plan { service } => provision::plan_command(&config, &service).await,
        Commands::WorkspaceEnv {
            user,
            project,
            notebook,
            image,
        } => workspace::workspace_env_command(&config, user, project, notebook, image).await,
        Commands::Models { .. } => Ok(()),
    }
}
