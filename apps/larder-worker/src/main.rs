use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = larder_worker::Args::parse();
	larder_worker::run(args).await
}
