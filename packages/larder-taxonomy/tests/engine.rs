use larder_config::Classifier;
use larder_taxonomy::{AssignmentEngine, NodeRow, TaxonomyTree, WinnerKind};

const ITEM: [f32; 2] = [1.0, 0.0];

/// Unit vector whose cosine with `ITEM` equals `score`.
fn at(score: f64) -> Vec<f32> {
	vec![score as f32, (1.0 - score * score).sqrt() as f32]
}

fn row(node_id: i64, parent_id: Option<i64>, score: f64) -> NodeRow {
	NodeRow { node_id, parent_id, title: format!("node-{node_id}"), centroid: Some(at(score)) }
}

fn bare(node_id: i64, parent_id: Option<i64>) -> NodeRow {
	NodeRow { node_id, parent_id, title: format!("node-{node_id}"), centroid: None }
}

/// Deterministic generator for property-style checks.
struct Lcg(u64);
impl Lcg {
	fn next_f32(&mut self) -> f32 {
		self.0 = self
			.0
			.wrapping_mul(6_364_136_223_846_793_005)
			.wrapping_add(1_442_695_040_888_963_407);

		((self.0 >> 40) as f32 / (1_u64 << 24) as f32) * 2.0 - 1.0
	}

	fn vector(&mut self, dim: usize) -> Vec<f32> {
		(0..dim).map(|_| self.next_f32()).collect()
	}
}

fn random_tree(rng: &mut Lcg, dim: usize) -> TaxonomyTree {
	let mut rows = Vec::new();
	let mut next_id = 1;

	for _ in 0..3 {
		let root_id = next_id;

		next_id += 1;

		rows.push(NodeRow {
			node_id: root_id,
			parent_id: None,
			title: format!("root-{root_id}"),
			centroid: Some(rng.vector(dim)),
		});

		for _ in 0..3 {
			let mid_id = next_id;

			next_id += 1;

			rows.push(NodeRow {
				node_id: mid_id,
				parent_id: Some(root_id),
				title: format!("mid-{mid_id}"),
				centroid: Some(rng.vector(dim)),
			});

			for _ in 0..3 {
				rows.push(NodeRow {
					node_id: next_id,
					parent_id: Some(mid_id),
					title: format!("leaf-{next_id}"),
					centroid: Some(rng.vector(dim)),
				});

				next_id += 1;
			}
		}
	}

	TaxonomyTree::build(rows).expect("Random tree must build.")
}

#[test]
fn every_valid_item_gets_between_one_and_max_total_labels() {
	let mut rng = Lcg(7);
	let tree = random_tree(&mut rng, 4);
	let cfg = Classifier::default();
	let engine = AssignmentEngine::new(&tree, &cfg);

	for _ in 0..200 {
		let item = rng.vector(4);
		let classification = engine.classify(&item);

		assert!(!classification.winners.is_empty(), "Item {item:?} received no label.");
		assert!(classification.winners.len() <= cfg.max_total as usize);
	}
}

#[test]
fn winner_kinds_match_node_shapes() {
	let mut rng = Lcg(11);
	let tree = random_tree(&mut rng, 3);
	let cfg = Classifier {
		leaf_thresh: 0.3,
		parent_thresh: 0.2,
		internal_strong_min: 0.25,
		..Classifier::default()
	};
	let engine = AssignmentEngine::new(&tree, &cfg);

	for _ in 0..200 {
		let classification = engine.classify(&rng.vector(3));

		for winner in &classification.winners {
			match winner.kind {
				WinnerKind::Leaf => assert!(tree.is_leaf(winner.category_id)),
				WinnerKind::Internal => assert!(tree.has_children(winner.category_id)),
				WinnerKind::Fallback => assert!(classification.fallback),
			}
		}
	}
}

#[test]
fn classification_is_repeatable() {
	let mut rng = Lcg(23);
	let tree = random_tree(&mut rng, 5);
	let cfg = Classifier::default();
	let engine = AssignmentEngine::new(&tree, &cfg);

	for _ in 0..50 {
		let item = rng.vector(5);

		assert_eq!(engine.classify(&item), engine.classify(&item));
	}
}

#[test]
fn fallback_picks_best_leaf_tree_wide() {
	// Internal node 2 outscores every leaf, but the fallback still prefers a leaf.
	let tree = TaxonomyTree::build([
		row(1, None, 0.40),
		row(2, Some(1), 0.70),
		row(3, Some(2), 0.55),
		row(4, Some(2), 0.60),
		row(5, None, 0.30),
		row(6, Some(5), 0.50),
	])
	.expect("Tree must build.");
	let cfg = Classifier { roots_to_explore: 1, ..Classifier::default() };
	let classification = AssignmentEngine::new(&tree, &cfg).classify(&ITEM);

	assert!(classification.fallback);
	assert_eq!(classification.winners.len(), 1);
	assert_eq!(classification.winners[0].category_id, 4);
	assert_eq!(classification.winners[0].kind, WinnerKind::Fallback);
}

#[test]
fn fallback_scans_roots_that_were_not_explored() {
	let tree = TaxonomyTree::build([
		row(1, None, 0.50),
		row(2, Some(1), 0.10),
		row(3, None, 0.20),
		row(4, Some(3), 0.75),
	])
	.expect("Tree must build.");
	let cfg = Classifier { roots_to_explore: 1, ..Classifier::default() };
	let classification = AssignmentEngine::new(&tree, &cfg).classify(&ITEM);

	assert_eq!(classification.branches.len(), 1);
	assert_eq!(classification.branches[0].root.node_id, 1);
	assert_eq!(classification.winners[0].category_id, 4);
}

#[test]
fn nodes_without_centroid_never_surface() {
	let tree = TaxonomyTree::build([
		bare(100, None),
		bare(101, Some(100)),
		row(1, None, 0.50),
		bare(2, Some(1)),
		row(3, Some(1), 0.40),
	])
	.expect("Tree must build.");
	let cfg = Classifier::default();
	let engine = AssignmentEngine::new(&tree, &cfg);

	assert_eq!(tree.roots(), &[1]);
	assert_eq!(tree.children(1), &[3]);

	let classification = engine.classify(&ITEM);

	assert!(classification.branches.iter().all(|branch| branch.root.node_id == 1));
	assert_eq!(classification.winners.len(), 1);
	assert_eq!(classification.winners[0].category_id, 3);
}

#[test]
fn only_top_roots_are_explored() {
	let mut rows = Vec::new();

	for (root_id, score) in [(1, 0.99), (2, 0.98), (3, 0.97), (4, 0.96)] {
		rows.push(row(root_id, None, score));
		rows.push(row(root_id * 10, Some(root_id), score - 0.01));
	}

	let tree = TaxonomyTree::build(rows).expect("Tree must build.");
	let cfg = Classifier::default();
	let classification = AssignmentEngine::new(&tree, &cfg).classify(&ITEM);
	let ids = classification.winners.iter().map(|winner| winner.category_id).collect::<Vec<_>>();

	assert_eq!(ids, vec![10, 20, 30]);
	assert!(!classification.fallback);
}

#[test]
fn winners_are_capped_best_first() {
	let mut rows = Vec::new();

	for (root_id, score) in [(1, 0.91), (2, 0.99), (3, 0.93), (4, 0.97), (5, 0.95)] {
		rows.push(row(root_id, None, score));
		rows.push(row(root_id * 10, Some(root_id), score - 0.01));
	}

	let tree = TaxonomyTree::build(rows).expect("Tree must build.");
	let cfg = Classifier { roots_to_explore: 5, max_total: 2, ..Classifier::default() };
	let classification = AssignmentEngine::new(&tree, &cfg).classify(&ITEM);
	let ids = classification.winners.iter().map(|winner| winner.category_id).collect::<Vec<_>>();

	assert_eq!(classification.branches.len(), 5);
	assert_eq!(ids, vec![20, 40]);
}

#[test]
fn strong_internal_stands_in_for_ambiguous_leaves() {
	let tree = TaxonomyTree::build([
		row(1, None, 0.80),
		row(2, Some(1), 0.845),
		row(3, Some(2), 0.83),
		row(4, Some(2), 0.825),
	])
	.expect("Tree must build.");
	let cfg = Classifier::default();
	let classification = AssignmentEngine::new(&tree, &cfg).classify(&ITEM);

	assert!(!classification.fallback);
	assert_eq!(classification.winners.len(), 1);
	assert_eq!(classification.winners[0].category_id, 2);
	assert_eq!(classification.winners[0].kind, WinnerKind::Internal);
}

#[test]
fn dimension_mismatch_is_reported() {
	let tree = TaxonomyTree::build([row(1, None, 0.9)]).expect("Tree must build.");
	let cfg = Classifier::default();
	let engine = AssignmentEngine::new(&tree, &cfg);

	assert!(!engine.dimension_mismatch(2));
	assert!(engine.dimension_mismatch(3));

	let classification = engine.classify(&[1.0, 0.0, 0.5]);

	assert_eq!(classification.winners.len(), 1);
}

#[test]
fn tiny_magnitude_item_matches_like_its_direction() {
	let centroid = |node_id: i64, parent_id: Option<i64>, centroid: [f32; 2]| NodeRow {
		node_id,
		parent_id,
		title: format!("node-{node_id}"),
		centroid: Some(centroid.to_vec()),
	};
	let rows = [
		centroid(1, None, [1.0, 0.0]),
		centroid(2, Some(1), [0.0, 1.0]),
		centroid(3, Some(1), [1.0, 0.0]),
	];
	let tree = TaxonomyTree::build(rows).expect("Tree must build.");
	let cfg = Classifier::default();
	let engine = AssignmentEngine::new(&tree, &cfg);
	let unit = engine.classify(&[1.0, 0.0]);
	let tiny = engine.classify(&[1e-8, 0.0]);

	assert!(!tiny.fallback);
	assert_eq!(tiny.winners.len(), 1);
	assert_eq!(tiny.winners[0].category_id, 3);
	assert_eq!(tiny.winners[0].kind, WinnerKind::Leaf);
	assert_eq!(unit.winners[0].category_id, 3);
}
