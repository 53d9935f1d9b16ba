mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr, thread};

use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

/// A scratch database created next to the one `LARDER_PG_DSN` names.
///
/// The base DSN's own database is used for `CREATE`/`DROP`, so it should point at a maintenance
/// database such as `postgres`. The scratch database is dropped by `cleanup`, or on drop when a
/// test panics first.
pub struct TestDatabase {
	name: String,
	dsn: String,
	base: PgConnectOptions,
	dropped: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn).map_err(Error::InvalidDsn)?;
		let name = format!("larder_test_{}", Uuid::new_v4().simple());

		run_admin(&base, &name, "create", format!(r#"CREATE DATABASE "{name}""#)).await?;

		let dsn = base.clone().database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, base, dropped: false })
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Storage settings pointing at this database.
	pub fn postgres_config(&self, pool_max_conns: u32) -> larder_config::Postgres {
		larder_config::Postgres { dsn: self.dsn.clone(), pool_max_conns }
	}

	pub async fn cleanup(mut self) -> Result<()> {
		drop_database(&self.base, &self.name).await?;

		self.dropped = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.dropped {
			return;
		}

		let base = self.base.clone();
		let name = self.name.clone();
		// Drop can run on a runtime worker, where blocking on a nested runtime would panic.
		let handle = thread::spawn(move || {
			let result = Builder::new_current_thread()
				.enable_all()
				.build()
				.map_err(|err| err.to_string())
				.and_then(|runtime| {
					runtime.block_on(drop_database(&base, &name)).map_err(|err| err.to_string())
				});

			if let Err(err) = result {
				eprintln!("Leaked test database: {err}.");
			}
		});
		let _ = handle.join();
	}
}

pub fn env_dsn() -> Option<String> {
	env::var("LARDER_PG_DSN").ok().filter(|dsn| !dsn.trim().is_empty())
}

async fn drop_database(base: &PgConnectOptions, name: &str) -> Result<()> {
	run_admin(base, name, "drop", format!(r#"DROP DATABASE IF EXISTS "{name}" WITH (FORCE)"#)).await
}

async fn run_admin(
	base: &PgConnectOptions,
	name: &str,
	action: &'static str,
	sql: String,
) -> Result<()> {
	let admin_error = |source| Error::Admin { action, name: name.to_string(), source };
	let mut conn = PgConnection::connect_with(base).await.map_err(admin_error)?;

	conn.execute(sql.as_str()).await.map_err(admin_error)?;
	conn.close().await.map_err(admin_error)?;

	Ok(())
}
