use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = smarty_api::Args::parse();

	smarty_api::run(args).await
}
