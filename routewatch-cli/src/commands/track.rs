//! Track command - follow a position feed and print the live distance.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::info;

use routewatch::config::GeolocationSettings;
use routewatch::geo::{LineLocationProvider, LocationProvider, WatchOptions};
use routewatch::route::RouteClient;
use routewatch::sync::{SyncController, SyncControllerConfig, SyncError, SyncSnapshot};

use super::common::{install_interrupt_handler, resolve_destination, DestinationArgs};
use crate::error::CliError;
use crate::presenter::{Notice, TextPresenter};
use crate::runner::CliRunner;

/// Arguments for the track command.
#[derive(Debug, Args)]
pub struct TrackArgs {
    /// Read `lat,lon[,accuracy]` lines from this file instead of stdin
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// Minimum delay between readings, for replaying recorded tracks
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Give up on a single fix attempt after this long
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Oldest cached reading that may be used (0 = fresh readings only)
    #[arg(long, value_name = "MS")]
    pub maximum_age_ms: Option<u64>,

    /// Do not request high-accuracy positioning
    #[arg(long)]
    pub low_accuracy: bool,

    #[command(flatten)]
    pub destination: DestinationArgs,
}

/// Run the track command.
pub fn run(args: TrackArgs, verbose: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(verbose)?;
    runner.log_startup("track");

    let destination = resolve_destination(&args.destination, runner.config());
    let options = watch_options(&args, &runner.config().geolocation);
    let client = runner.route_client()?;
    let runtime = runner.build_runtime()?;

    let shutdown = CancellationToken::new();
    install_interrupt_handler(shutdown.clone())?;

    let pacing = args.interval_ms.map(Duration::from_millis);
    let config = SyncControllerConfig::new(destination);

    runtime.block_on(async move {
        match &args.input {
            Some(path) => {
                let provider = LineLocationProvider::open(path)
                    .await
                    .map_err(|error| CliError::Input {
                        path: path.display().to_string(),
                        error,
                    })?;
                let provider = match pacing {
                    Some(interval) => provider.with_pacing(interval),
                    None => provider,
                };
                track(config, provider, options, client, shutdown).await;
            }
            None => {
                let provider = LineLocationProvider::stdin();
                let provider = match pacing {
                    Some(interval) => provider.with_pacing(interval),
                    None => provider,
                };
                track(config, provider, options, client, shutdown).await;
            }
        }
        Ok(())
    })
}

/// Command-line flags override `[geolocation]` settings.
fn watch_options(args: &TrackArgs, settings: &GeolocationSettings) -> WatchOptions {
    let mut options = settings.watch_options();
    if let Some(ms) = args.timeout_ms {
        options = options.with_timeout(Duration::from_millis(ms.max(1)));
    }
    if let Some(ms) = args.maximum_age_ms {
        options = options.with_maximum_age(Duration::from_millis(ms));
    }
    if args.low_accuracy {
        options = options.with_high_accuracy(false);
    }
    options
}

/// Runs the controller until the feed ends or `shutdown` fires.
async fn track<P, R>(
    config: SyncControllerConfig,
    provider: P,
    options: WatchOptions,
    client: R,
    shutdown: CancellationToken,
) where
    P: LocationProvider,
    R: RouteClient,
{
    println!(
        "Tracking distance to {} (Ctrl+C to stop)",
        config.destination
    );

    let controller = SyncController::start(config, provider, options, client);
    present(
        controller.subscribe(),
        controller.subscribe_errors(),
        &shutdown,
        |notice| println!("{}", notice.styled()),
    )
    .await;
    controller.shutdown().await;
}

/// Prints notices until the snapshot channel closes or `shutdown` fires.
///
/// Errors are polled before snapshots, so a route failure reported just before
/// the feed ends is still shown.
async fn present(
    mut snapshots: watch::Receiver<SyncSnapshot>,
    mut errors: broadcast::Receiver<SyncError>,
    shutdown: &CancellationToken,
    mut emit: impl FnMut(Notice),
) {
    let mut presenter = TextPresenter::new();

    let initial = snapshots.borrow_and_update().clone();
    presenter.update(&initial).into_iter().for_each(&mut emit);

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                println!();
                println!("Stopping...");
                break;
            }

            Ok(error) = errors.recv() => {
                if let Some(notice) = presenter.error(&error) {
                    emit(notice);
                }
            }

            changed = snapshots.changed() => {
                if changed.is_err() {
                    info!("Position feed ended");
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                presenter.update(&snapshot).into_iter().for_each(&mut emit);
            }
        }
    }
}
