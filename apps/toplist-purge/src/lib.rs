//! Operator CLI that removes legacy numeric-id entity namespaces, dry-run by
//! default.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre;
use tracing_subscriber::EnvFilter;

use toplist_service::{PurgeRequest, ToplistService};
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
	/// Store project to purge; overrides the configured project id.
	#[arg(long)]
	pub project: String,
	/// Actually delete. Without this flag the run only reports what it found.
	#[arg(long)]
	pub execute: bool,
	/// Cap on discovered namespaces, below the configured maximum.
	#[arg(long)]
	pub limit: Option<usize>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let mut config = toplist_config::load(&args.config)?;

	init_tracing(&config);

	config.store.project_id = args.project;

	toplist_config::validate(&config)?;

	let token = std::env::var(TOKEN_ENV)
		.map_err(|_| eyre::eyre!("{TOKEN_ENV} must hold the store bearer credential."))?;
	let store = HttpStore::new(&config.store, token)?;
	let service = ToplistService::new(config, store);
	let report = service
		.run_purge(&PurgeRequest { execute: args.execute, limit: args.limit })
		.await?;

	println!("{}", serde_json::to_string_pretty(&report)?);

	Ok(())
}

fn init_tracing(config: &toplist_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}
