use serde::Serialize;

use crate::{
	search::{BranchResult, BranchSearcher, Candidate},
	tree::TaxonomyTree,
	vector,
};

/// Absorbs float rounding when comparing a leaf lead against `branch_margin_min`.
const MARGIN_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WinnerKind {
	Leaf,
	Internal,
	Fallback,
}
impl WinnerKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Leaf => "leaf",
			Self::Internal => "internal",
			Self::Fallback => "fallback",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Winner {
	pub category_id: i64,
	pub score: f64,
	pub kind: WinnerKind,
}

/// Which gate decided a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchOutcome {
	HighConfidence,
	SoleLeaf,
	Margin,
	Internal,
	NoWinner,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchTrace {
	pub root: Candidate,
	pub leaf_count: usize,
	pub best_internal: Option<Candidate>,
	pub visited: usize,
	pub outcome: BranchOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
	/// Final labels, best first, at most `max_total`.
	pub winners: Vec<Winner>,
	/// True when no branch produced a winner and the tree-wide scan was used.
	pub fallback: bool,
	pub branches: Vec<BranchTrace>,
}

/// Per-item orchestration: root ranking, branch exploration, gating, fallback, capping.
///
/// Holds only shared references, so one tree can serve many engines across tasks.
pub struct AssignmentEngine<'a> {
	tree: &'a TaxonomyTree,
	cfg: larder_config::Classifier,
}
impl<'a> AssignmentEngine<'a> {
	pub fn new(tree: &'a TaxonomyTree, cfg: &larder_config::Classifier) -> Self {
		Self { tree, cfg: *cfg }
	}

	pub fn classify(&self, vector: &[f32]) -> Classification {
		let searcher = BranchSearcher::new(self.tree, &self.cfg);
		let mut roots = self.rank_roots(vector);

		roots.truncate(self.cfg.roots_to_explore as usize);

		let mut winners = Vec::new();
		let mut branches = Vec::with_capacity(roots.len());

		for root in roots {
			let branch = searcher.search(vector, root.node_id);
			let (winner, outcome) = self.gate(&branch);

			winners.extend(winner);
			branches.push(BranchTrace {
				root,
				leaf_count: branch.leaves.len(),
				best_internal: branch.best_internal,
				visited: branch.visited,
				outcome,
			});
		}

		let fallback = winners.is_empty();

		if fallback {
			winners.extend(self.fallback(vector));
		}

		winners.sort_by(|lhs, rhs| {
			rhs.score.total_cmp(&lhs.score).then_with(|| lhs.category_id.cmp(&rhs.category_id))
		});
		winners.truncate(self.cfg.max_total as usize);

		Classification { winners, fallback, branches }
	}

	/// Every root scored against `vector`, best first.
	pub fn rank_roots(&self, vector: &[f32]) -> Vec<Candidate> {
		let mut roots = self
			.tree
			.roots()
			.iter()
			.filter_map(|root_id| {
				self.tree.node(*root_id).map(|node| Candidate {
					node_id: *root_id,
					score: vector::cosine(vector, &node.centroid),
				})
			})
			.collect::<Vec<_>>();

		roots.sort_by(Candidate::rank_order);

		roots
	}

	/// Decides the single winner of one branch, if any.
	///
	/// The top leaf wins on high confidence, on being the only leaf, or on its lead over the
	/// runner-up. Only when no leaf wins may a strong internal candidate stand in.
	pub fn gate(&self, branch: &BranchResult) -> (Option<Winner>, BranchOutcome) {
		let mut leaves = branch.leaves.clone();

		leaves.sort_by(Candidate::rank_order);

		if let Some(top) = leaves.first() {
			let second = leaves.get(1).map(|leaf| leaf.score);
			let outcome = match second {
				_ if top.score >= self.cfg.high_conf => Some(BranchOutcome::HighConfidence),
				None if top.score >= self.cfg.leaf_thresh => Some(BranchOutcome::SoleLeaf),
				Some(second)
					if top.score - second + MARGIN_TOLERANCE >= self.cfg.branch_margin_min =>
					Some(BranchOutcome::Margin),
				_ => None,
			};

			if let Some(outcome) = outcome {
				let winner =
					Winner { category_id: top.node_id, score: top.score, kind: WinnerKind::Leaf };

				return (Some(winner), outcome);
			}
		}

		if let Some(internal) = branch.best_internal
			&& internal.score >= self.cfg.internal_strong_min
		{
			let winner = Winner {
				category_id: internal.node_id,
				score: internal.score,
				kind: WinnerKind::Internal,
			};

			return (Some(winner), BranchOutcome::Internal);
		}

		(None, BranchOutcome::NoWinner)
	}

	/// Tree-wide linear scan: the best leaf, or the best node of any kind when no leaf exists.
	pub fn fallback(&self, vector: &[f32]) -> Option<Winner> {
		let mut best_leaf: Option<Candidate> = None;
		let mut best_any: Option<Candidate> = None;

		for node in self.tree.nodes() {
			let candidate =
				Candidate { node_id: node.node_id, score: vector::cosine(vector, &node.centroid) };

			if best_any.map(|best| candidate.score > best.score).unwrap_or(true) {
				best_any = Some(candidate);
			}
			if !self.tree.has_children(node.node_id)
				&& best_leaf.map(|best| candidate.score > best.score).unwrap_or(true)
			{
				best_leaf = Some(candidate);
			}
		}

		best_leaf.or(best_any).map(|best| Winner {
			category_id: best.node_id,
			score: best.score,
			kind: WinnerKind::Fallback,
		})
	}

	/// True when `dim` differs from any centroid length, meaning some comparisons are truncated.
	pub fn dimension_mismatch(&self, dim: usize) -> bool {
		self.tree.dimensions().iter().any(|centroid_dim| *centroid_dim != dim)
	}
}
