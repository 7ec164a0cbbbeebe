use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = toplist_purge::Args::parse();
	toplist_purge::run(args).await
}
