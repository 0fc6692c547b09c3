use std::collections::{BTreeMap, HashMap};
use std::f64::consts::TAU;

use log::warn;

use super::error::{Error, Result};
use super::types::{Board, ConnectionType, Edge, MindMap, Node};

/// A broken invariant found in a document. Rendering still works; these
/// are reported, not fatal.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Violation {
	#[error("node `{node}` points at missing parent `{parent}`")]
	MissingParent { node: String, parent: String },

	#[error("node `{node}` is on layer {layer} but its parent is on layer {parent_layer}")]
	LayerMismatch {
		node: String,
		layer: u32,
		parent_layer: u32,
	},

	#[error("root node `{node}` should be on layer 0, found {layer}")]
	RootNotOnTop { node: String, layer: u32 },

	#[error("edge `{edge}` references missing node `{node}`")]
	DanglingEdge { edge: String, node: String },

	#[error("node id `{0}` is used more than once")]
	DuplicateNode(String),
}

impl MindMap {
	pub fn from_json(input: &str) -> Result<Self> {
		Ok(serde_json::from_str(input)?)
	}

	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string(self)?)
	}

	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Number of layers in use.
	pub fn levels(&self) -> u32 {
		self.nodes.iter().map(|n| n.layer).max().map_or(0, |l| l + 1)
	}

	/// Explicit connection types, or ones derived from the legend when the
	/// document has none.
	pub fn connection_types(&self) -> Vec<ConnectionType> {
		match &self.connection_types {
			Some(types) if !types.is_empty() => types.clone(),
			_ => self
				.legend
				.values()
				.map(|entry| ConnectionType {
					id: entry.id.clone(),
					name: entry.name.clone(),
					color: entry.color.clone(),
					description: None,
				})
				.collect(),
		}
	}

	/// Delete a node and every edge touching it.
	pub fn remove_node(&mut self, id: &str) -> Result<Node> {
		let index = self
			.nodes
			.iter()
			.position(|n| n.id == id)
			.ok_or_else(|| Error::UnknownNode { id: id.into() })?;
		let node = self.nodes.remove(index);
		self.edges.retain(|e| !e.touches(id));
		Ok(node)
	}

	/// Delete a connection type and every edge of that type.
	///
	/// The last remaining type cannot be removed.
	pub fn remove_connection_type(&mut self, id: &str) -> Result<Vec<Edge>> {
		let mut types = self.connection_types();
		let index = types
			.iter()
			.position(|t| t.id == id)
			.ok_or_else(|| Error::UnknownConnectionType { id: id.into() })?;
		if types.len() == 1 {
			return Err(Error::LastConnectionType { id: id.into() });
		}
		types.remove(index);
		self.connection_types = Some(types);
		self.legend.retain(|_, entry| entry.id != id);

		let (removed, kept): (Vec<Edge>, Vec<Edge>) = std::mem::take(&mut self.edges)
			.into_iter()
			.partition(|e| e.kind.as_deref() == Some(id));
		self.edges = kept;
		Ok(removed)
	}

	/// Add a user-created edge between two existing nodes.
	///
	/// At most one edge of a given type may join the same pair.
	pub fn add_edge(&mut self, edge: Edge) -> Result<()> {
		for end in [&edge.from, &edge.to] {
			if self.node(end).is_none() {
				return Err(Error::UnknownNode { id: end.clone() });
			}
		}
		if let Some(kind) = edge.kind.as_deref() {
			if !self.connection_types().iter().any(|t| t.id == kind) {
				return Err(Error::UnknownConnectionType { id: kind.into() });
			}
			if self
				.edges
				.iter()
				.any(|e| e.pair() == edge.pair() && e.kind.as_deref() == Some(kind))
			{
				return Err(Error::DuplicateConnection {
					kind: kind.into(),
					from: edge.from,
					to: edge.to,
				});
			}
		}
		self.edges.push(edge);
		Ok(())
	}

	/// Check the tree and edge invariants.
	pub fn validate(&self) -> Vec<Violation> {
		let mut violations = Vec::new();
		let mut by_id: HashMap<&str, &Node> = HashMap::new();
		for node in &self.nodes {
			if by_id.insert(node.id.as_str(), node).is_some() {
				violations.push(Violation::DuplicateNode(node.id.clone()));
			}
		}

		for node in &self.nodes {
			match node.parent() {
				None if node.layer != 0 => violations.push(Violation::RootNotOnTop {
					node: node.id.clone(),
					layer: node.layer,
				}),
				None => {}
				Some(parent_id) => match by_id.get(parent_id) {
					None => violations.push(Violation::MissingParent {
						node: node.id.clone(),
						parent: parent_id.into(),
					}),
					Some(parent) if node.layer != parent.layer + 1 => {
						violations.push(Violation::LayerMismatch {
							node: node.id.clone(),
							layer: node.layer,
							parent_layer: parent.layer,
						})
					}
					Some(_) => {}
				},
			}
		}

		for edge in &self.edges {
			for end in [&edge.from, &edge.to] {
				if !by_id.contains_key(end.as_str()) {
					violations.push(Violation::DanglingEdge {
						edge: edge.id.clone(),
						node: end.clone(),
					});
				}
			}
		}
		violations
	}

	/// Log every violation; returns how many there were.
	pub fn report_violations(&self) -> usize {
		let violations = self.validate();
		for violation in &violations {
			warn!("mind map `{}`: {violation}", self.id);
		}
		violations.len()
	}
}

impl Board {
	pub fn from_json(input: &str) -> Result<Self> {
		Ok(serde_json::from_str(input)?)
	}
}

impl From<Board> for MindMap {
	fn from(board: Board) -> Self {
		let name = if board.title.is_empty() { "Generated Map".into() } else { board.title };
		MindMap {
			id: board.id,
			name,
			context: "professional".into(),
			nodes: board.nodes,
			edges: board.edges,
			connection_types: board.connection_types,
			legend: board.legend,
		}
	}
}

/// Give every node lacking coordinates a spot on its layer's ring.
///
/// Nodes are grouped by `layer`; each group is spread evenly around a circle
/// of radius `ring_spacing * (layer + 1)` centred on the origin. Nodes that
/// already have both coordinates are left alone.
pub fn assign_concentric_positions(nodes: &mut [Node], ring_spacing: f64) -> usize {
	let mut rings: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
	for (index, node) in nodes.iter().enumerate() {
		if node.position().is_none() {
			rings.entry(node.layer).or_default().push(index);
		}
	}

	let mut placed = 0;
	for (layer, members) in rings {
		let radius = ring_spacing * (layer as f64 + 1.0);
		let count = members.len() as f64;
		for (slot, index) in members.into_iter().enumerate() {
			let angle = slot as f64 / count * TAU;
			nodes[index].x = Some(radius * angle.cos());
			nodes[index].y = Some(radius * angle.sin());
			placed += 1;
		}
	}
	placed
}
