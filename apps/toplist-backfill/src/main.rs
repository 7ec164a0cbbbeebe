use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = toplist_backfill::Args::parse();
	toplist_backfill::run(args).await
}
