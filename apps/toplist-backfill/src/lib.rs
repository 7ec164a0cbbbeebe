//! Operator CLI that builds a historical toplist snapshot for one partition
//! and time window.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre;
use time::{Date, OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};
use tracing_subscriber::EnvFilter;

use toplist_service::{BackfillRequest, ToplistService};
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
	/// Partition code, e.g. `EU1` or `F3`.
	#[arg(long)]
	pub server: String,
	/// Window start: epoch seconds, RFC 3339, or `YYYY-MM-DD`.
	#[arg(long)]
	pub from: String,
	/// Window end, same formats as `--from`. Inclusive.
	#[arg(long)]
	pub to: String,
	/// Snapshot label (`YYYY-MM`); defaults to the month before the window.
	#[arg(long)]
	pub label: Option<String>,
	#[arg(long, default_value_t = 500)]
	pub top_n: usize,
	/// Rank and size-check without writing the snapshot.
	#[arg(long)]
	pub dry_run: bool,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = toplist_config::load(&args.config)?;

	init_tracing(&config);

	let token = std::env::var(TOKEN_ENV)
		.map_err(|_| eyre::eyre!("{TOKEN_ENV} must hold the store bearer credential."))?;
	let store = HttpStore::new(&config.store, token)?;
	let request = BackfillRequest {
		server: args.server,
		from_s: parse_timestamp(&args.from)?,
		to_s: parse_timestamp(&args.to)?,
		label: args.label,
		top_n: args.top_n,
		dry_run: args.dry_run,
	};
	let service = ToplistService::new(config, store);
	let report = service.run_backfill(&request).await?;

	println!("{}", serde_json::to_string_pretty(&report)?);

	Ok(())
}

fn init_tracing(config: &toplist_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn parse_timestamp(raw: &str) -> color_eyre::Result<i64> {
	let trimmed = raw.trim();

	if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
		return Ok(trimmed.parse()?);
	}
	if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
		return Ok(parsed.unix_timestamp());
	}

	let date_only = format_description!("[year]-[month]-[day]");

	if let Ok(date) = Date::parse(trimmed, &date_only) {
		return Ok(date.midnight().assume_utc().unix_timestamp());
	}

	Err(eyre::eyre!("Cannot parse {trimmed:?} as epoch seconds, RFC 3339, or YYYY-MM-DD."))
}
