use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = toplist_trigger::Args::parse();
	toplist_trigger::run(args).await
}
