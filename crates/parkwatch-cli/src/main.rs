mod context;
mod manage;
mod query;
mod run;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::context::{Runtime, StoreAccess};

#[derive(Debug, Parser)]
#[command(name = "parkwatch")]
#[command(about = "Commuter car park occupancy refresher")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Seed the store, load every facility, then refresh until interrupted
    Run {
        /// Skip the one-time prioritised load and go straight to the refresh loop
        #[arg(long)]
        no_initial_load: bool,
    },
    /// List facilities known to the occupancy API
    Facilities,
    /// Show stored facilities and their latest availability
    Status,
    /// Clear the store and reload it from the facility catalogue
    Reset,
    /// Force-refresh one facility now
    Refresh {
        /// Facility id (e.g. 6)
        facility_id: String,
        /// Only fetch when the stored reading is stale
        #[arg(long)]
        if_stale: bool,
    },
    /// Mark or unmark a facility as a favourite
    Favourite {
        /// Facility id (e.g. 6)
        facility_id: String,
        /// Remove the favourite flag instead of setting it
        #[arg(long)]
        remove: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("parkwatch ready; run `parkwatch --help` for commands");
        return Ok(());
    };

    let config = parkwatch_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let access = match command {
        Commands::Facilities | Commands::Status => StoreAccess::ReadOnly,
        _ => StoreAccess::Exclusive,
    };
    let runtime = Runtime::open(config, access).await?;
    match command {
        Commands::Run { no_initial_load } => run::run_daemon(runtime, !no_initial_load).await,
        Commands::Facilities => query::run_facilities(&runtime).await,
        Commands::Status => query::run_status(&runtime).await,
        Commands::Reset => manage::run_reset(&runtime).await,
        Commands::Refresh {
            facility_id,
            if_stale,
        } => manage::run_refresh(&runtime, &facility_id, if_stale).await,
        Commands::Favourite {
            facility_id,
            remove,
        } => manage::run_favourite(&runtime, &facility_id, !remove).await,
    }
}
