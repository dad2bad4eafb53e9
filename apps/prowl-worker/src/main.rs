use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = prowl_worker::Args::parse();
	prowl_worker::run(args).await
}
