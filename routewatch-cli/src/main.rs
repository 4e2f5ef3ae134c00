//! RouteWatch CLI - Command-line interface
//!
//! Prints the live driving distance from a position feed to a fixed
//! destination.

mod commands;
mod error;
mod presenter;
mod runner;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::route::RouteArgs;
use commands::track::TrackArgs;

#[derive(Parser)]
#[command(name = "routewatch")]
#[command(version, about = "Live driving distance to a fixed destination", long_about = None)]
struct Cli {
    /// Mirror log output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow a position feed (stdin or file) and print the distance
    Track(TrackArgs),

    /// Fetch a single route and print its distance
    Route(RouteArgs),

    /// View or create the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Track(args) => commands::track::run(args, cli.verbose),
        Commands::Route(args) => commands::route::run(args, cli.verbose),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
