use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = toplist_updater::Args::parse();
	toplist_updater::run(args).await
}
