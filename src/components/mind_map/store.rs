//! Graph data store: the visible nodes and edges the renderer reads from.

use std::collections::HashSet;

use indexmap::IndexMap;

use super::types::Position;

/// Roundness added for every second parallel edge between the same pair.
pub const ROUNDNESS_STEP: f64 = 0.18;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurveDirection {
	Clockwise,
	CounterClockwise,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Curve {
	pub direction: CurveDirection,
	pub roundness: f64,
}

impl Curve {
	/// Curve for the `index`-th edge between one pair of nodes.
	///
	/// Even indices bend clockwise, odd ones counter-clockwise; each following
	/// pair of edges bends further out.
	pub fn fan(index: usize, base: f64) -> Self {
		let direction = if index % 2 == 0 {
			CurveDirection::Clockwise
		} else {
			CurveDirection::CounterClockwise
		};
		Self {
			direction,
			roundness: base + (index / 2) as f64 * ROUNDNESS_STEP,
		}
	}

	/// Roundness with the bend direction folded into the sign.
	pub fn signed(&self) -> f64 {
		match self.direction {
			CurveDirection::Clockwise => self.roundness,
			CurveDirection::CounterClockwise => -self.roundness,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisualNode {
	pub id: String,
	pub label: String,
	pub title: String,
	pub color: String,
	pub size: f64,
	pub position: Option<Position>,
	pub opacity: f64,
	/// When false the simulation leaves this node where it is placed.
	pub physics: bool,
	pub ghost: bool,
}

impl VisualNode {
	pub fn new(id: impl Into<String>, label: impl Into<String>, color: impl Into<String>) -> Self {
		let label = label.into();
		Self {
			id: id.into(),
			title: label.clone(),
			label,
			color: color.into(),
			size: 24.0,
			position: None,
			opacity: 1.0,
			physics: true,
			ghost: false,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisualEdge {
	pub id: String,
	pub from: String,
	pub to: String,
	pub color: String,
	pub label: String,
	pub width: f64,
	pub opacity: f64,
	pub curve: Curve,
	/// Number of document edges collapsed into this one.
	pub count: usize,
	pub ghost: bool,
}

/// Immutable copy of the store contents.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphSnapshot {
	pub nodes: Vec<VisualNode>,
	pub edges: Vec<VisualEdge>,
}

impl GraphSnapshot {
	pub fn node(&self, id: &str) -> Option<&VisualNode> {
		self.nodes.iter().find(|n| n.id == id)
	}
}

/// Insertion-ordered nodes and edges keyed by id.
///
/// Every mutation bumps [`GraphStore::revision`] so observers can tell when
/// to resync.
#[derive(Clone, Debug, Default)]
pub struct GraphStore {
	nodes: IndexMap<String, VisualNode>,
	edges: IndexMap<String, VisualEdge>,
	revision: u64,
}

impl GraphStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn replace_all<N, E>(&mut self, nodes: N, edges: E)
	where
		N: IntoIterator<Item = VisualNode>,
		E: IntoIterator<Item = VisualEdge>,
	{
		self.nodes.clear();
		self.edges.clear();
		self.nodes
			.extend(nodes.into_iter().map(|n| (n.id.clone(), n)));
		self.edges
			.extend(edges.into_iter().map(|e| (e.id.clone(), e)));
		self.revision += 1;
	}

	pub fn upsert_nodes(&mut self, nodes: impl IntoIterator<Item = VisualNode>) {
		for node in nodes {
			self.nodes.insert(node.id.clone(), node);
		}
		self.revision += 1;
	}

	pub fn upsert_edges(&mut self, edges: impl IntoIterator<Item = VisualEdge>) {
		for edge in edges {
			self.edges.insert(edge.id.clone(), edge);
		}
		self.revision += 1;
	}

	/// Remove nodes and edges with the given ids, along with any edge left
	/// pointing at a removed node.
	pub fn remove_by_ids<I, S>(&mut self, ids: I)
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let ids: HashSet<String> = ids.into_iter().map(|s| s.as_ref().to_owned()).collect();
		if ids.is_empty() {
			return;
		}
		let mut removed_nodes = HashSet::new();
		self.nodes.retain(|id, _| {
			let keep = !ids.contains(id);
			if !keep {
				removed_nodes.insert(id.clone());
			}
			keep
		});
		self.edges.retain(|id, edge| {
			!ids.contains(id)
				&& !removed_nodes.contains(&edge.from)
				&& !removed_nodes.contains(&edge.to)
		});
		self.revision += 1;
	}

	pub fn snapshot(&self) -> GraphSnapshot {
		GraphSnapshot {
			nodes: self.nodes.values().cloned().collect(),
			edges: self.edges.values().cloned().collect(),
		}
	}

	pub fn node(&self, id: &str) -> Option<&VisualNode> {
		self.nodes.get(id)
	}

	pub fn edge(&self, id: &str) -> Option<&VisualEdge> {
		self.edges.get(id)
	}

	/// True for a non-ghost node currently in the store.
	pub fn contains_node(&self, id: &str) -> bool {
		self.nodes.get(id).is_some_and(|n| !n.ghost)
	}

	pub fn nodes(&self) -> impl Iterator<Item = &VisualNode> {
		self.nodes.values()
	}

	pub fn edges(&self) -> impl Iterator<Item = &VisualEdge> {
		self.edges.values()
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty() && self.edges.is_empty()
	}

	pub fn ghost_ids(&self) -> Vec<String> {
		self.nodes
			.values()
			.filter(|n| n.ghost)
			.map(|n| n.id.clone())
			.chain(self.edges.values().filter(|e| e.ghost).map(|e| e.id.clone()))
			.collect()
	}

	pub fn revision(&self) -> u64 {
		self.revision
	}
}
