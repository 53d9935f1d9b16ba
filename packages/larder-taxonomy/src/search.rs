use std::cmp::Ordering;

use serde::Serialize;

use crate::{tree::TaxonomyTree, vector};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candidate {
	pub node_id: i64,
	pub score: f64,
}
impl Candidate {
	/// Descending score, then ascending id.
	pub fn rank_order(&self, other: &Self) -> Ordering {
		other.score.total_cmp(&self.score).then_with(|| self.node_id.cmp(&other.node_id))
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchResult {
	/// Leaves that cleared the leaf threshold, in visit order.
	pub leaves: Vec<Candidate>,
	/// Best-scoring node with children that cleared the parent threshold, at any depth.
	pub best_internal: Option<Candidate>,
	/// Nodes taken from a frontier and inspected.
	pub visited: usize,
}

/// Level-by-level beam search below a single root.
pub struct BranchSearcher<'a> {
	tree: &'a TaxonomyTree,
	parent_thresh: f64,
	leaf_thresh: f64,
	beam_width: usize,
}
impl<'a> BranchSearcher<'a> {
	pub fn new(tree: &'a TaxonomyTree, cfg: &larder_config::Classifier) -> Self {
		Self {
			tree,
			parent_thresh: cfg.parent_thresh,
			leaf_thresh: cfg.leaf_thresh,
			beam_width: cfg.beam_width as usize,
		}
	}

	pub fn search(&self, vector: &[f32], root_id: i64) -> BranchResult {
		let mut result = BranchResult::default();
		let Some(root) = self.score(vector, root_id) else {
			return result;
		};
		let mut frontier = vec![root];

		while !frontier.is_empty() {
			frontier.sort_by(Candidate::rank_order);

			let mut pool = Vec::new();

			for candidate in &frontier {
				result.visited += 1;

				let children = self.tree.children(candidate.node_id);

				if children.is_empty() {
					if candidate.score >= self.leaf_thresh {
						result.leaves.push(*candidate);
					}

					continue;
				}

				if candidate.score >= self.parent_thresh
					&& result.best_internal.map(|best| candidate.score > best.score).unwrap_or(true)
				{
					result.best_internal = Some(*candidate);
				}

				pool.extend(children.iter().filter_map(|child| self.score(vector, *child)));
			}

			if pool.is_empty() {
				break;
			}

			pool.sort_by(Candidate::rank_order);
			pool.truncate(self.beam_width);

			frontier = pool;
		}

		result
	}

	fn score(&self, vector: &[f32], node_id: i64) -> Option<Candidate> {
		let node = self.tree.node(node_id)?;

		Some(Candidate { node_id, score: vector::cosine(vector, &node.centroid) })
	}
}
