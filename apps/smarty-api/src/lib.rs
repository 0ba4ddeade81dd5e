pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use color_eyre::eyre;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = smarty_cli::VERSION,
	rename_all = "kebab",
	styles = smarty_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = smarty_config::load(&args.config)?;

	init_tracing(&config);

	let http_addr: SocketAddr = config.service.http_bind.parse()?;

	check_bind(&config, http_addr)?;

	let state = AppState::new(config).await?;
	let app = routes::router(state);
	let listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, "HTTP server listening.");

	axum::serve(listener, app).await?;

	Ok(())
}

fn check_bind(config: &smarty_config::Config, http_addr: SocketAddr) -> color_eyre::Result<()> {
	if config.security.bind_localhost_only && !http_addr.ip().is_loopback() {
		return Err(eyre::eyre!(
			"http_bind must be a loopback address when bind_localhost_only is true."
		));
	}

	Ok(())
}

fn init_tracing(config: &smarty_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn loopback_only_rejects_public_binds() {
		let config = smarty_testkit::test_config();

		assert!(check_bind(&config, "127.0.0.1:8080".parse().expect("valid addr")).is_ok());
		assert!(check_bind(&config, "0.0.0.0:8080".parse().expect("valid addr")).is_err());
	}

	#[test]
	fn public_binds_are_allowed_when_not_restricted() {
		let mut config = smarty_testkit::test_config();

		config.security.bind_localhost_only = false;

		assert!(check_bind(&config, "0.0.0.0:8080".parse().expect("valid addr")).is_ok());
	}
}
