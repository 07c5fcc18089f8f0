//! ahp-session: developer harness for the session clock and navigation store.
//!
//! ## Subcommands
//!
//! - `resolve`: Map a URL (path + query) to its navigation state and access decision
//! - `simulate`: Run a token lifecycle on virtual time and print each transition

mod logging;
mod resolve;
mod simulate;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ahp-session")]
#[command(about = "AHP client session and navigation harness")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a location to a navigation state (prints JSON)
    Resolve {
        /// Location pathname (e.g., /evaluator)
        #[arg(long, default_value = "/")]
        path: String,

        /// Location query string, with or without the leading '?'
        #[arg(long, default_value = "")]
        query: String,

        /// Decide access as a signed-in user
        #[arg(long)]
        authenticated: bool,
    },

    /// Simulate a token lifecycle on virtual time
    Simulate {
        /// Token lifetime from the start of the simulation, in ms
        #[arg(long, value_name = "MS")]
        expires_in: i64,

        /// Warning lead time in ms (overrides config)
        #[arg(long, value_name = "MS")]
        warning_lead: Option<u64>,

        /// Grace delay after expiry in ms (overrides config)
        #[arg(long, value_name = "MS")]
        grace: Option<u64>,

        /// Request an extension at this offset, in ms
        #[arg(long, value_name = "MS", requires = "extend_by")]
        extend_at: Option<i64>,

        /// Lifetime granted by the extension, counted from --extend-at
        #[arg(long, value_name = "MS")]
        extend_by: Option<i64>,

        /// Client config file (JSON), defaults to ~/.ahp-client/config.json
        #[arg(long)]
        config: Option<PathBuf>,

        /// Cache the simulated user in the configured user store file
        #[arg(long)]
        persist: bool,
    },
}

fn main() {
    logging::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Resolve {
            path,
            query,
            authenticated,
        } => resolve::run(&path, &query, authenticated),
        Commands::Simulate {
            expires_in,
            warning_lead,
            grace,
            extend_at,
            extend_by,
            config,
            persist,
        } => simulate::run(simulate::SimulateArgs {
            expires_in,
            warning_lead,
            grace,
            extend: extend_at.zip(extend_by),
            config,
            persist,
        }),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "ahp-session failed");
        std::process::exit(1);
    }
}
