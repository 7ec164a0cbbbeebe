//! Periodic derived-cache updater daemon.

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use color_eyre::eyre;
use tracing_subscriber::EnvFilter;

use toplist_service::ToplistService;
use toplist_store::{HttpStore, TOKEN_ENV};

#[derive(Debug, Parser)]
#[command(
	version = toplist_cli::VERSION,
	rename_all = "kebab",
	styles = toplist_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Run a single update cycle and exit instead of looping.
	#[arg(long)]
	pub once: bool,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = toplist_config::load(&args.config)?;

	init_tracing(&config);

	let token = std::env::var(TOKEN_ENV)
		.map_err(|_| eyre::eyre!("{TOKEN_ENV} must hold the store bearer credential."))?;
	let store = HttpStore::new(&config.store, token)?;
	let interval = Duration::from_secs(config.service.updater_interval_secs);
	let service = ToplistService::new(config, store);

	if args.once {
		service.run_updater_once().await?;

		return Ok(());
	}

	tracing::info!(interval_secs = interval.as_secs(), "Updater loop starting.");

	loop {
		// A failed cycle never advances the watermark, so the next cycle
		// reprocesses the same window.
		if let Err(err) = service.run_updater_once().await {
			tracing::error!(error = %err, "Updater cycle failed.");
		}

		tokio::time::sleep(interval).await;
	}
}

fn init_tracing(config: &toplist_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}
