use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = seat_api::Args::parse();

	seat_api::run(args).await
}
