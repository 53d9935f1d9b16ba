use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::{Error, Result};

/// One row of the taxonomy feed, before centroid filtering.
#[derive(Debug, Clone)]
pub struct NodeRow {
	pub node_id: i64,
	pub parent_id: Option<i64>,
	pub title: String,
	pub centroid: Option<Vec<f32>>,
}

#[derive(Debug, Clone)]
pub struct TaxonomyNode {
	pub node_id: i64,
	pub parent_id: Option<i64>,
	pub title: String,
	pub centroid: Vec<f32>,
}

/// Read-only forest of scorable taxonomy nodes.
///
/// Nodes live in an arena keyed by id; parent to child links are kept in a side table. Only nodes
/// with a centroid are admitted. A node whose parent was not admitted stays in the arena but is
/// unreachable from any root.
#[derive(Debug)]
pub struct TaxonomyTree {
	nodes: HashMap<i64, TaxonomyNode>,
	order: Vec<i64>,
	children: HashMap<i64, Vec<i64>>,
	roots: Vec<i64>,
	excluded: usize,
	dimensions: BTreeSet<usize>,
}
impl TaxonomyTree {
	pub fn build<I>(rows: I) -> Result<Self>
	where
		I: IntoIterator<Item = NodeRow>,
	{
		let mut seen = HashSet::new();
		let mut nodes = HashMap::new();
		let mut excluded = 0;
		let mut dimensions = BTreeSet::new();

		for row in rows {
			if !seen.insert(row.node_id) {
				return Err(Error::DuplicateNode { node_id: row.node_id });
			}

			let Some(centroid) = row.centroid.filter(|centroid| !centroid.is_empty()) else {
				tracing::debug!(node_id = row.node_id, "Taxonomy node has no centroid. Excluding.");

				excluded += 1;

				continue;
			};

			dimensions.insert(centroid.len());
			nodes.insert(
				row.node_id,
				TaxonomyNode {
					node_id: row.node_id,
					parent_id: row.parent_id,
					title: row.title,
					centroid,
				},
			);
		}

		let mut order = nodes.keys().copied().collect::<Vec<_>>();

		order.sort_unstable();

		let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
		let mut roots = Vec::new();

		for node_id in &order {
			match nodes[node_id].parent_id {
				None => roots.push(*node_id),
				Some(parent_id) if nodes.contains_key(&parent_id) =>
					children.entry(parent_id).or_default().push(*node_id),
				Some(parent_id) => {
					tracing::debug!(
						node_id = *node_id,
						parent_id,
						"Taxonomy node parent is not scorable. Node is only reachable by fallback."
					);
				},
			}
		}

		check_acyclic(&nodes, &order)?;

		if roots.is_empty() {
			return Err(Error::NoRoots);
		}

		Ok(Self { nodes, order, children, roots, excluded, dimensions })
	}

	pub fn node(&self, node_id: i64) -> Option<&TaxonomyNode> {
		self.nodes.get(&node_id)
	}

	/// All admitted nodes in ascending id order.
	pub fn nodes(&self) -> impl Iterator<Item = &TaxonomyNode> + '_ {
		self.order.iter().map(|node_id| &self.nodes[node_id])
	}

	pub fn roots(&self) -> &[i64] {
		&self.roots
	}

	/// Child ids in ascending order; empty for leaves and unknown ids.
	pub fn children(&self, node_id: i64) -> &[i64] {
		self.children.get(&node_id).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn has_children(&self, node_id: i64) -> bool {
		!self.children(node_id).is_empty()
	}

	pub fn is_root(&self, node_id: i64) -> bool {
		self.node(node_id).map(|node| node.parent_id.is_none()).unwrap_or(false)
	}

	pub fn is_leaf(&self, node_id: i64) -> bool {
		self.nodes.contains_key(&node_id) && !self.has_children(node_id)
	}

	pub fn is_intermediate(&self, node_id: i64) -> bool {
		self.node(node_id).map(|node| node.parent_id.is_some()).unwrap_or(false)
			&& self.has_children(node_id)
	}

	/// Ids from the top-most admitted ancestor down to `node_id`, inclusive.
	pub fn ancestor_path(&self, node_id: i64) -> Result<Vec<i64>> {
		let mut cursor = self.node(node_id).ok_or(Error::UnknownNode { node_id })?;
		let mut path = vec![cursor.node_id];

		while let Some(parent) = cursor.parent_id.and_then(|parent_id| self.node(parent_id)) {
			path.push(parent.node_id);

			cursor = parent;
		}

		path.reverse();

		Ok(path)
	}

	/// Every node below `node_id`, breadth-first, excluding `node_id` itself.
	pub fn descendants(&self, node_id: i64) -> Result<Vec<i64>> {
		if !self.nodes.contains_key(&node_id) {
			return Err(Error::UnknownNode { node_id });
		}

		let mut out = Vec::new();
		let mut queue = VecDeque::from([node_id]);

		while let Some(current) = queue.pop_front() {
			for child in self.children(current) {
				out.push(*child);
				queue.push_back(*child);
			}
		}

		Ok(out)
	}

	pub fn len(&self) -> usize {
		self.order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	/// Number of input rows dropped for lacking a centroid.
	pub fn excluded(&self) -> usize {
		self.excluded
	}

	/// Distinct centroid lengths seen while building.
	pub fn dimensions(&self) -> &BTreeSet<usize> {
		&self.dimensions
	}
}

fn check_acyclic(nodes: &HashMap<i64, TaxonomyNode>, order: &[i64]) -> Result<()> {
	let mut settled = HashSet::new();

	for node_id in order {
		let mut on_path = HashSet::new();
		let mut cursor = Some(*node_id);

		while let Some(current) = cursor {
			if settled.contains(&current) {
				break;
			}
			if !on_path.insert(current) {
				return Err(Error::Cycle { node_id: current });
			}

			cursor = nodes[&current].parent_id.filter(|parent_id| nodes.contains_key(parent_id));
		}

		settled.extend(on_path);
	}

	Ok(())
}
