pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("LARDER_PG_DSN is not a valid Postgres DSN: {0}")]
	InvalidDsn(sqlx::Error),
	#[error("Failed to {action} test database {name}: {source}")]
	Admin { action: &'static str, name: String, source: sqlx::Error },
}
