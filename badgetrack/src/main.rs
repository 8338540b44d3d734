mod config;

use clap::{Args, Parser};
use config::{Config, LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
enum CliCommand {
    /// Run the badge tracking API
    Tracker(TrackerArgs),
}

#[derive(Args)]
struct TrackerArgs {
    #[arg(long)]
    config_file_path: PathBuf,
}

fn main() {
    let cli = CliCommand::parse();

    match cli {
        CliCommand::Tracker(args) => {
            let config = match Config::from_file(&args.config_file_path) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Failed to load config: {e}");
                    process::exit(1);
                }
            };

            // Sentry flushes when the guard drops
            let _sentry = init_logging(config.common.logging.as_ref());
            if let Some(metrics) = &config.common.metrics {
                init_metrics(metrics);
            }

            if let Err(e) = run_tracker(config) {
                tracing::error!(error = %e, "Tracker exited");
                process::exit(1);
            }
        }
    }
}

fn init_logging(logging: Option<&LoggingConfig>) -> Option<sentry::ClientInitGuard> {
    let guard = logging.and_then(|logging| match logging.sentry_dsn.parse::<sentry::types::Dsn>() {
        Ok(dsn) => Some(sentry::init(sentry::ClientOptions {
            dsn: Some(dsn),
            release: sentry::release_name!(),
            ..Default::default()
        })),
        Err(e) => {
            eprintln!("Invalid Sentry DSN, error reporting disabled: {e}");
            None
        }
    });

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let sentry_layer = guard
        .as_ref()
        .map(|_| sentry::integrations::tracing::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_layer)
        .init();

    guard
}

fn init_metrics(config: &MetricsConfig) {
    let recorder = match StatsdBuilder::from(config.statsd_host.as_str(), config.statsd_port)
        .build(Some("badgetrack"))
    {
        Ok(recorder) => recorder,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build statsd recorder, metrics disabled");
            return;
        }
    };

    if let Err(e) = metrics::set_global_recorder(recorder) {
        tracing::error!(error = %e, "Failed to install metrics recorder");
        return;
    }
    shared::metrics_defs::describe_all(tracker::metrics_defs::ALL_METRICS);
}

#[derive(thiserror::Error, Debug)]
enum RunError {
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("could not create document store: {0}")]
    Store(#[from] docstore::StoreError),
    #[error(transparent)]
    Tracker(#[from] tracker::errors::TrackerError),
}

fn run_tracker(config: Config) -> Result<(), RunError> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    rt.block_on(async move {
        let store = docstore::get_store(&config.tracker.store)?;
        tracker::run(config.tracker, store).await?;
        Ok::<_, RunError>(())
    })
}
