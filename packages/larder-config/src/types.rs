use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub classifier: Classifier,
	#[serde(default)]
	pub batch: Batch,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

/// Tunables of the assignment engine. Scores are cosine similarities, so every threshold lives in
/// `[-1.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Classifier {
	/// Minimum score for an intermediate node to be remembered as a branch's internal candidate.
	pub parent_thresh: f64,
	/// Minimum score for a leaf to be collected as a candidate.
	pub leaf_thresh: f64,
	/// Number of best-scoring roots whose subtrees are explored.
	pub roots_to_explore: u32,
	/// Maximum number of nodes carried from one level of a branch to the next.
	pub beam_width: u32,
	/// Maximum number of labels kept per item.
	pub max_total: u32,
	/// A top leaf at or above this score is accepted regardless of its runner-up.
	pub high_conf: f64,
	/// Minimum lead of the top leaf over the second-best leaf of the same branch.
	pub branch_margin_min: f64,
	/// Minimum score for a branch's internal candidate to become its winner.
	pub internal_strong_min: f64,
}
impl Default for Classifier {
	fn default() -> Self {
		Self {
			parent_thresh: 0.78,
			leaf_thresh: 0.82,
			roots_to_explore: 3,
			beam_width: 4,
			max_total: 4,
			high_conf: 0.86,
			branch_margin_min: 0.02,
			internal_strong_min: 0.83,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Batch {
	/// Items fetched per page.
	pub page_size: u32,
	/// Items classified and persisted concurrently within a page.
	pub concurrency: u32,
	/// Sleep between passes in follow mode.
	pub poll_interval_ms: u64,
}
impl Default for Batch {
	fn default() -> Self {
		Self { page_size: 256, concurrency: 8, poll_interval_ms: 30_000 }
	}
}
