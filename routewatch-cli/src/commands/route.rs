//! Route command - fetch a single route and print it.

use clap::Args;
use tracing::info;

use routewatch::coord::{Coordinate, Destination};
use routewatch::route::{RouteClient, RouteResult};

use super::common::{resolve_destination, DestinationArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the route command.
#[derive(Debug, Args)]
pub struct RouteArgs {
    /// Starting point as LAT,LON
    #[arg(long, value_name = "LAT,LON", allow_hyphen_values = true)]
    pub from: Coordinate,

    #[command(flatten)]
    pub destination: DestinationArgs,

    /// Also print every point of the route geometry
    #[arg(long)]
    pub geometry: bool,
}

/// Run the route command.
pub fn run(args: RouteArgs, verbose: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(verbose)?;
    runner.log_startup("route");

    let destination = resolve_destination(&args.destination, runner.config());
    let client = runner.route_client()?;
    let runtime = runner.build_runtime()?;

    info!(from = %args.from, to = %destination, "Fetching route");
    let route = runtime.block_on(client.fetch_route(args.from, destination.coordinate()))?;

    for line in summary_lines(&destination, &route, args.geometry) {
        println!("{}", line);
    }

    Ok(())
}

/// Formats a fetched route for printing.
fn summary_lines(destination: &Destination, route: &RouteResult, geometry: bool) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Distance to {}: {:.2} km",
            destination.name(),
            route.distance_km()
        ),
        format!(
            "Estimated driving time: {:.0} min",
            route.duration_seconds() / 60.0
        ),
        format!("Route points: {}", route.geometry().len()),
    ];

    if geometry {
        lines.push(format!("Route ends at: {}", route.end()));
        lines.extend(route.geometry().iter().map(|point| format!("  {}", point)));
    }

    lines
}
