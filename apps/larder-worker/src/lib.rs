use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod store;
pub mod worker;

mod error;

pub use error::{Error, Result};

use store::{ItemScope, PgStore};
use worker::{RunOptions, WorkerState};

#[derive(Debug, Parser)]
#[command(
	version = larder_cli::VERSION,
	rename_all = "kebab",
	styles = larder_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Reclassify every recipe instead of only the unassigned ones.
	#[arg(long)]
	pub all: bool,
	/// Classify and log without writing assignments.
	#[arg(long)]
	pub dry_run: bool,
	/// Keep polling for new recipes after the first pass. Store errors are retried on the next
	/// poll; an unusable taxonomy stops the worker.
	#[arg(long)]
	pub follow: bool,
}
impl Args {
	pub fn options(&self) -> RunOptions {
		RunOptions {
			scope: if self.all { ItemScope::All } else { ItemScope::Unassigned },
			dry_run: self.dry_run,
			follow: self.follow,
		}
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = larder_config::load(&args.config)?;
	let filter = EnvFilter::try_new(&config.service.log_level)
		.unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = larder_storage::db::Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let state = WorkerState {
		store: Arc::new(PgStore { db }),
		classifier: config.classifier,
		batch: config.batch,
		options: args.options(),
	};
	let report = worker::run_worker(state).await?;

	println!("{}", serde_json::to_string_pretty(&report)?);

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn flags_map_to_run_options() {
		let args = Args::parse_from(["larder-worker", "-c", "larder.toml", "--all", "--dry-run"]);
		let options = args.options();

		assert_eq!(args.config, PathBuf::from("larder.toml"));
		assert_eq!(options.scope, ItemScope::All);
		assert!(options.dry_run);
		assert!(!options.follow);

		let args = Args::parse_from(["larder-worker", "--config", "larder.toml", "--follow"]);
		let options = args.options();

		assert_eq!(options.scope, ItemScope::Unassigned);
		assert!(options.follow);
	}
}
