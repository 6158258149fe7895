use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = nearby_discover::Args::parse();
	nearby_discover::run(args).await
}
