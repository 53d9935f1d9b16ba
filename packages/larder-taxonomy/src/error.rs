pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Taxonomy has no root nodes with a centroid; nothing can be classified.")]
	NoRoots,
	#[error("Taxonomy node {node_id} appears more than once.")]
	DuplicateNode { node_id: i64 },
	#[error("Taxonomy node {node_id} is part of a parent cycle.")]
	Cycle { node_id: i64 },
	#[error("Taxonomy node {node_id} is not in the tree.")]
	UnknownNode { node_id: i64 },
}
