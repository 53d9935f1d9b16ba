pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0}")]
	Message(String),
	#[error(transparent)]
	Taxonomy(#[from] larder_taxonomy::Error),
	#[error(transparent)]
	Storage(#[from] larder_storage::Error),
}
