//! Facegate command-line interface.
//!
//! Enrolls and authenticates faces against the local store and talks to the
//! controller board over serial. Face frames are JSON signature arrays
//! produced by an external extraction tool.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use config::Settings;

#[derive(Parser)]
#[command(name = "facegate")]
#[command(version, about = "Face-recognition access controller", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    settings: Settings,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a face sample for an identity
    Enroll {
        /// Identity id
        #[arg(long)]
        id: String,

        /// Display name; defaults to the id
        #[arg(long)]
        name: Option<String>,

        /// Signature file, or - for stdin
        #[arg(long)]
        frame: PathBuf,
    },

    /// Authenticate a face and open the door on a match
    Authenticate {
        /// Signature file, or - for stdin
        #[arg(long)]
        frame: PathBuf,
    },

    /// Manage enrolled faces
    #[command(subcommand)]
    Faces(FacesCommand),

    /// Show recent access events
    Events {
        /// Maximum number of events
        #[arg(short, long, default_value_t = 20)]
        limit: i64,

        /// Only events for this identity
        #[arg(long)]
        identity: Option<String>,
    },

    /// Follow the controller and log its state periodically
    Monitor {
        /// Seconds between state reports
        #[arg(long, default_value_t = 5)]
        interval: u64,
    },

    /// Switch a device on or off
    Toggle {
        /// fan or lights
        device: String,

        /// on or off
        state: String,
    },

    /// List serial ports
    Ports,
}

#[derive(Subcommand)]
enum FacesCommand {
    /// List enrolled identities
    List,

    /// Remove an identity and its samples
    Remove {
        /// Identity id
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let settings = &cli.settings;
    match cli.command {
        Commands::Enroll { id, name, frame } => {
            commands::enroll(settings, &id, name.as_deref(), &frame).await?;
        }
        Commands::Authenticate { frame } => {
            commands::authenticate(settings, &frame).await?;
        }
        Commands::Faces(FacesCommand::List) => {
            commands::list_faces(settings).await?;
        }
        Commands::Faces(FacesCommand::Remove { id }) => {
            commands::remove_face(settings, &id).await?;
        }
        Commands::Events { limit, identity } => {
            commands::events(settings, limit, identity.as_deref()).await?;
        }
        Commands::Monitor { interval } => {
            commands::monitor(settings, interval).await?;
        }
        Commands::Toggle { device, state } => {
            commands::toggle(settings, &device, &state).await?;
        }
        Commands::Ports => {
            commands::ports()?;
        }
    }

    Ok(())
}
