mod action;
mod commands;
mod manifest;
mod state;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use telflow_provider::ResourceKind;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "telflow")]
#[command(about = "Declare Twilio phone numbers, messaging services, subaccounts and API keys", long_about = None)]
struct Cli {
    /// Project directory containing telflow.resources.yaml
    #[arg(short = 'C', long = "project-dir", env = "TELFLOW_PROJECT_DIR", global = true)]
    project_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the changes apply would make
    Plan,
    /// Create, update and delete remote resources to match the declaration
    Apply {
        /// Apply without stopping at the plan
        #[arg(short, long)]
        yes: bool,
    },
    /// Read tracked resources back from the remote
    Refresh {
        /// Stop tracking resources that no longer exist remotely
        #[arg(long)]
        prune: bool,
    },
    /// Delete every tracked resource
    Destroy {
        /// Destroy without stopping at the plan
        #[arg(short, long)]
        yes: bool,
    },
    /// Find an existing remote resource by its attributes
    Lookup {
        /// Resource type (phone_number, messaging_service, subaccount)
        kind: ResourceKind,
        #[arg(long)]
        friendly_name: Option<String>,
        /// E.164 phone number
        #[arg(long)]
        number: Option<String>,
        /// Number pattern, matched by the API
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        area_code: Option<String>,
    },
    /// Track an existing remote resource under a declared name
    Import {
        name: String,
        kind: ResourceKind,
        /// Remote SID
        id: String,
    },
    /// List tracked resources, or show one
    Show { name: Option<String> },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Version = cli.command {
        println!("telflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let project_root = utils::project_root(cli.project_dir)?;
    tracing::debug!("Project root: {}", project_root.display());

    match cli.command {
        Commands::Plan => commands::plan::handle(&project_root).await?,
        Commands::Apply { yes } => commands::apply::handle(&project_root, yes).await?,
        Commands::Refresh { prune } => commands::refresh::handle(&project_root, prune).await?,
        Commands::Destroy { yes } => commands::destroy::handle(&project_root, yes).await?,
        Commands::Lookup {
            kind,
            friendly_name,
            number,
            search,
            area_code,
        } => {
            let args = commands::lookup::LookupArgs {
                friendly_name,
                number,
                search,
                area_code,
            };
            commands::lookup::handle(kind, args).await?
        }
        Commands::Import { name, kind, id } => {
            commands::import::handle(&project_root, &name, kind, &id).await?
        }
        Commands::Show { name } => commands::show::handle(&project_root, name.as_deref()).await?,
        Commands::Version => {}
    }

    Ok(())
}
