//! Layer resolution: which nodes and edges are visible for a given view.
//!
//! The outer layer shows root nodes with document edges collapsed onto their
//! roots. The inner layer shows everything below the active parent.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::{debug, warn};

use super::config::VisualizationConfig;
use super::store::{Curve, VisualEdge, VisualNode};
use super::tags::synthesize_tag_edges;
use super::types::{ConnectionMode, Edge, Layer, LayerViewState, MindMap, Node, ordered_pair};

pub const GROUP_NODE_SIZE: f64 = 36.0;
pub const PERSONAL_NODE_SIZE: f64 = 24.0;
pub const PLACEHOLDER_ID: &str = "placeholder-root";

const GROUP_EDGE_ROUNDNESS: f64 = 0.18;
const PERSONAL_EDGE_ROUNDNESS: f64 = 0.1;
const PERSONAL_EDGE_WIDTH: f64 = 3.0;
const GROUP_EDGE_COLOR: &str = "#A0AEC0";
const PERSONAL_EDGE_COLOR: &str = "#777";

/// Width of an aggregated outer edge standing for `count` document edges.
pub fn aggregate_width(count: usize) -> f64 {
	(2.0 + (1.0 + count as f64).log2()).min(6.0)
}

/// Nodes and edges visible for one view.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedLayer {
	pub nodes: Vec<VisualNode>,
	pub edges: Vec<VisualEdge>,
}

struct Aggregate<'a> {
	a: &'a str,
	b: &'a str,
	type_key: &'a str,
	edge: &'a Edge,
	count: usize,
}

pub struct LayerResolver<'a> {
	map: &'a MindMap,
	by_id: HashMap<&'a str, &'a Node>,
	type_colors: HashMap<&'a str, &'a str>,
	type_names: HashMap<&'a str, &'a str>,
	fallback_prefix: usize,
}

impl<'a> LayerResolver<'a> {
	pub fn new(map: &'a MindMap) -> Self {
		let by_id = map.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

		// Explicit connection types win over legend entries with the same id.
		let mut type_colors = HashMap::new();
		let mut type_names = HashMap::new();
		let explicit = map.connection_types.iter().flatten().map(|t| (&t.id, &t.name, &t.color));
		let legend = map.legend.values().map(|l| (&l.id, &l.name, &l.color));
		for (id, name, color) in explicit.chain(legend) {
			if id.is_empty() {
				continue;
			}
			type_colors.entry(id.as_str()).or_insert(color.as_str());
			type_names.entry(id.as_str()).or_insert(name.as_str());
		}

		Self {
			map,
			by_id,
			type_colors,
			type_names,
			fallback_prefix: VisualizationConfig::default().fallback_prefix,
		}
	}

	pub fn with_fallback_prefix(mut self, fallback_prefix: usize) -> Self {
		self.fallback_prefix = fallback_prefix;
		self
	}

	pub fn node(&self, id: &str) -> Option<&'a Node> {
		self.by_id.get(id).copied()
	}

	/// Walk `parentId` links from `id` to the highest reachable node.
	///
	/// Stops at a missing parent or at the first revisited node.
	pub fn root_ancestor(&self, id: &str) -> Option<&'a str> {
		let mut current = self.node(id)?;
		let mut seen = HashSet::from([current.id.as_str()]);
		while let Some(parent) = current.parent().and_then(|p| self.node(p)) {
			if !seen.insert(parent.id.as_str()) {
				break;
			}
			current = parent;
		}
		Some(current.id.as_str())
	}

	/// True when `ancestor` is a strict ancestor of `id`.
	pub fn is_descendant(&self, id: &str, ancestor: &str) -> bool {
		let Some(mut current) = self.node(id) else {
			return false;
		};
		let mut seen = HashSet::from([current.id.as_str()]);
		while let Some(parent) = current.parent().and_then(|p| self.node(p)) {
			if parent.id == ancestor {
				return true;
			}
			if !seen.insert(parent.id.as_str()) {
				return false;
			}
			current = parent;
		}
		false
	}

	pub fn has_children(&self, id: &str) -> bool {
		self.map.nodes.iter().any(|n| n.parent() == Some(id) && n.id != id)
	}

	/// Parent of `id` when that parent exists in the map.
	pub fn parent_of(&self, id: &str) -> Option<&'a str> {
		self.node(id)?
			.parent()
			.and_then(|p| self.node(p))
			.map(|p| p.id.as_str())
	}

	/// Nodes shown on the outer layer.
	///
	/// Roots first; failing that, the highest ancestors of every edge
	/// endpoint; failing that, a short prefix of all nodes.
	pub fn outer_roots(&self) -> Vec<&'a Node> {
		let roots: Vec<&Node> = self.map.nodes.iter().filter(|n| n.parent().is_none()).collect();
		if !roots.is_empty() {
			return dedup_nodes(roots);
		}

		let mut ancestors = Vec::new();
		for edge in &self.map.edges {
			for end in [&edge.from, &edge.to] {
				if let Some(root) = self.root_ancestor(end).and_then(|r| self.node(r)) {
					ancestors.push(root);
				}
			}
		}
		if !ancestors.is_empty() {
			debug!("no parentless nodes, using {} edge ancestors as roots", ancestors.len());
			return dedup_nodes(ancestors);
		}

		if !self.map.nodes.is_empty() {
			warn!("no roots found, showing the first {} nodes", self.fallback_prefix);
		}
		let prefix = self.map.nodes.iter().take(self.fallback_prefix.max(1)).collect();
		dedup_nodes(prefix)
	}

	pub fn outer_nodes(&self) -> Vec<VisualNode> {
		let mut nodes: Vec<VisualNode> = self
			.outer_roots()
			.into_iter()
			.map(|n| visual_node(n, GROUP_NODE_SIZE))
			.collect();
		if nodes.is_empty() {
			let label = if self.map.name.is_empty() { "Mind Map" } else { self.map.name.as_str() };
			let mut placeholder = VisualNode::new(PLACEHOLDER_ID, label, "#6EE7F9");
			placeholder.size = 40.0;
			placeholder.title = "No nodes yet".into();
			nodes.push(placeholder);
		}
		nodes
	}

	/// Document edges collapsed to one edge per root pair and connection type.
	pub fn outer_edges(&self) -> Vec<VisualEdge> {
		let visible: HashSet<&str> = self.outer_roots().iter().map(|n| n.id.as_str()).collect();
		let mut aggregates: IndexMap<(&str, &str, &str), Aggregate> = IndexMap::new();
		let mut dropped = 0usize;

		for edge in &self.map.edges {
			let (Some(root_a), Some(root_b)) =
				(self.root_ancestor(&edge.from), self.root_ancestor(&edge.to))
			else {
				dropped += 1;
				continue;
			};
			if root_a == root_b || !visible.contains(root_a) || !visible.contains(root_b) {
				continue;
			}
			let (a, b) = ordered_pair(root_a, root_b);
			let type_key = edge.type_key();
			aggregates
				.entry((a, b, type_key))
				.or_insert(Aggregate { a: root_a, b: root_b, type_key, edge, count: 0 })
				.count += 1;
		}
		if dropped > 0 {
			debug!("skipped {dropped} edges with unknown endpoints");
		}

		let mut by_pair: IndexMap<(&str, &str), Vec<Aggregate>> = IndexMap::new();
		for ((a, b, _), aggregate) in aggregates {
			by_pair.entry((a, b)).or_default().push(aggregate);
		}

		let mut result = Vec::new();
		for ((a, b), mut group) in by_pair {
			group.sort_by(|x, y| x.type_key.cmp(y.type_key));
			for (idx, agg) in group.into_iter().enumerate() {
				let (color, label) = self.edge_style(agg.edge, GROUP_EDGE_COLOR);
				result.push(VisualEdge {
					id: format!("g-{a}__{b}__{}", agg.type_key),
					from: agg.a.to_owned(),
					to: agg.b.to_owned(),
					color,
					label,
					width: aggregate_width(agg.count),
					opacity: 0.9,
					curve: Curve::fan(idx, GROUP_EDGE_ROUNDNESS),
					count: agg.count,
					ghost: false,
				});
			}
		}
		result
	}

	/// Nodes strictly below `parent`, or the whole map when `parent` is `None`.
	pub fn inner_nodes(&self, parent: Option<&str>) -> Vec<VisualNode> {
		let nodes = self
			.map
			.nodes
			.iter()
			.filter(|n| parent.is_none_or(|p| self.is_descendant(&n.id, p)))
			.collect();
		dedup_nodes(nodes)
			.into_iter()
			.map(|n| visual_node(n, PERSONAL_NODE_SIZE))
			.collect()
	}

	/// Edges with both endpoints strictly below `parent`; parallel edges are
	/// kept and fanned out.
	pub fn inner_edges(&self, parent: Option<&str>) -> Vec<VisualEdge> {
		let inside = |id: &str| match parent {
			Some(p) => self.is_descendant(id, p),
			None => self.node(id).is_some(),
		};

		let mut by_pair: IndexMap<(&str, &str), Vec<&Edge>> = IndexMap::new();
		for edge in self.map.edges.iter().filter(|e| inside(&e.from) && inside(&e.to)) {
			by_pair.entry(edge.pair()).or_default().push(edge);
		}

		let mut result = Vec::new();
		for (_, mut group) in by_pair {
			group.sort_by(|x, y| sort_key(x).cmp(sort_key(y)));
			for (idx, edge) in group.into_iter().enumerate() {
				let (color, label) = self.edge_style(edge, PERSONAL_EDGE_COLOR);
				let id = if edge.id.is_empty() {
					format!(
						"{}_{}_{}_{idx}",
						edge.from,
						edge.to,
						edge.kind.as_deref().unwrap_or("t")
					)
				} else {
					edge.id.clone()
				};
				result.push(VisualEdge {
					id,
					from: edge.from.clone(),
					to: edge.to.clone(),
					color,
					label,
					width: PERSONAL_EDGE_WIDTH,
					opacity: 0.9,
					curve: Curve::fan(idx, PERSONAL_EDGE_ROUNDNESS),
					count: 1,
					ghost: false,
				});
			}
		}
		result
	}

	/// Everything visible for `view`.
	pub fn resolve(&self, view: &LayerViewState, mode: ConnectionMode) -> ResolvedLayer {
		let parent = view.active_parent.as_deref();
		let (nodes, edges) = match view.layer {
			Layer::Outer => (self.outer_nodes(), self.outer_edges()),
			Layer::Inner => (self.inner_nodes(parent), self.inner_edges(parent)),
		};
		let edges = match mode {
			ConnectionMode::Explicit => edges,
			ConnectionMode::Tags => {
				synthesize_tag_edges(nodes.iter().filter_map(|n| self.node(&n.id)))
			}
		};
		ResolvedLayer { nodes, edges }
	}

	fn edge_style(&self, edge: &Edge, default_color: &str) -> (String, String) {
		let kind = edge.kind.as_deref();
		let color = kind
			.and_then(|k| self.type_colors.get(k).copied())
			.or(edge.color.as_deref())
			.unwrap_or(default_color);
		let label = kind
			.and_then(|k| self.type_names.get(k).copied())
			.or(edge.label.as_deref())
			.unwrap_or_default();
		(color.to_owned(), label.to_owned())
	}
}

fn sort_key(edge: &Edge) -> &str {
	edge.kind
		.as_deref()
		.or(edge.label.as_deref())
		.unwrap_or_default()
}

fn dedup_nodes(nodes: Vec<&Node>) -> Vec<&Node> {
	let mut seen = HashSet::new();
	nodes.into_iter().filter(|n| seen.insert(n.id.as_str())).collect()
}

fn visual_node(node: &Node, size: f64) -> VisualNode {
	VisualNode {
		id: node.id.clone(),
		label: node.label.clone(),
		title: node.title(),
		color: node.color.clone(),
		size: node.size.unwrap_or(size),
		position: node.position(),
		opacity: 1.0,
		physics: true,
		ghost: false,
	}
}

impl LayerViewState {
	/// Explicit enter: make `node` the active parent on the inner layer.
	pub fn enter(&mut self, node: &str) {
		self.layer = Layer::Inner;
		self.active_parent = Some(node.to_owned());
	}

	/// One level up: to the active parent's own parent, else the outer layer.
	pub fn go_back(&mut self, resolver: &LayerResolver<'_>) {
		if self.layer == Layer::Outer {
			return;
		}
		match self.active_parent.as_deref().and_then(|p| resolver.parent_of(p)) {
			Some(grandparent) => self.active_parent = Some(grandparent.to_owned()),
			None => self.reset(),
		}
	}

	/// Back to the outer layer with no active parent.
	pub fn reset(&mut self) {
		self.layer = Layer::Outer;
		self.active_parent = None;
	}

	/// The view implied by the current zoom, if it differs from this one.
	///
	/// Leaving the inner layer needs zoom below the zoom-out threshold;
	/// entering needs zoom above the (higher) zoom-in threshold and a hovered
	/// node. Between the two thresholds the layer never changes.
	pub fn zoom_switch(&self, config: &VisualizationConfig) -> Option<LayerViewState> {
		match self.layer {
			Layer::Inner if self.zoom < config.zoom_out_threshold => {
				let mut next = self.clone();
				next.reset();
				Some(next)
			}
			Layer::Outer if self.zoom > config.zoom_in_threshold => {
				let hovered = self.hovered.as_deref()?;
				let mut next = self.clone();
				next.enter(hovered);
				Some(next)
			}
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::mind_map::types::{ConnectionType, LegendEntry};
	use proptest::prelude::*;

	/// Two groups, each with a couple of personal nodes.
	fn two_groups() -> MindMap {
		let alice = Node::new("alice", "Alice");
		let bob = Node::new("bob", "Bob");
		let photo = Node::new("photo", "Photography").child_of(&alice);
		let travel = Node::new("travel", "Travel").child_of(&alice);
		let film = Node::new("film", "Film").child_of(&photo);
		let cooking = Node::new("cooking", "Cooking").child_of(&bob);
		MindMap {
			name: "Friends".into(),
			nodes: vec![alice, bob, photo, travel, film, cooking],
			edges: vec![
				Edge::new("e1", "photo", "cooking").with_kind("t-hobby"),
				Edge::new("e2", "travel", "cooking").with_kind("t-hobby"),
				Edge::new("e3", "film", "cooking").with_kind("t-art"),
				Edge::new("e4", "photo", "travel").with_kind("t-hobby"),
				Edge::new("e5", "travel", "photo").with_kind("t-art"),
				Edge::new("e6", "photo", "ghost-node"),
			],
			connection_types: Some(vec![ConnectionType {
				id: "t-hobby".into(),
				name: "Hobby".into(),
				color: "#FF6B6B".into(),
				description: None,
			}]),
			legend: IndexMap::from([(
				"art".into(),
				LegendEntry { id: "t-art".into(), name: "Art".into(), color: "#FF4757".into() },
			)]),
			..Default::default()
		}
	}

	fn ids(nodes: &[VisualNode]) -> Vec<&str> {
		nodes.iter().map(|n| n.id.as_str()).collect()
	}

	#[test]
	fn root_ancestor_walks_to_the_top() {
		let map = two_groups();
		let r = LayerResolver::new(&map);
		assert_eq!(r.root_ancestor("film"), Some("alice"));
		assert_eq!(r.root_ancestor("alice"), Some("alice"));
		assert_eq!(r.root_ancestor("nope"), None);
	}

	#[test]
	fn root_ancestor_survives_cycles() {
		let mut a = Node::new("a", "a");
		let mut b = Node::new("b", "b");
		a.parent_id = Some("b".into());
		b.parent_id = Some("a".into());
		let map = MindMap { nodes: vec![a, b], ..Default::default() };
		let r = LayerResolver::new(&map);
		assert!(r.root_ancestor("a").is_some());
		assert!(!r.is_descendant("a", "c"));
	}

	#[test]
	fn outer_layer_shows_roots() {
		let map = two_groups();
		let r = LayerResolver::new(&map);
		assert_eq!(ids(&r.outer_nodes()), ["alice", "bob"]);
	}

	#[test]
	fn outer_edges_aggregate_by_root_pair_and_type() {
		let map = two_groups();
		let edges = LayerResolver::new(&map).outer_edges();
		assert_eq!(edges.len(), 2);

		let hobby = edges.iter().find(|e| e.label == "Hobby").unwrap();
		assert_eq!(hobby.count, 2);
		assert_eq!(hobby.color, "#FF6B6B");
		assert_eq!(hobby.width, aggregate_width(2));

		let art = edges.iter().find(|e| e.label == "Art").unwrap();
		assert_eq!(art.count, 1);
		assert_eq!(art.color, "#FF4757");
		assert_ne!(hobby.curve.direction, art.curve.direction);
	}

	#[test]
	fn aggregate_width_is_logarithmic_and_capped() {
		assert_eq!(aggregate_width(1), 3.0);
		assert_eq!(aggregate_width(3), 4.0);
		assert_eq!(aggregate_width(1000), 6.0);
	}

	#[test]
	fn inner_layer_excludes_parent_and_keeps_parallel_edges() {
		let map = two_groups();
		let r = LayerResolver::new(&map);
		assert_eq!(ids(&r.inner_nodes(Some("alice"))), ["photo", "travel", "film"]);

		let edges = r.inner_edges(Some("alice"));
		let mut edge_ids: Vec<_> = edges.iter().map(|e| e.id.as_str()).collect();
		edge_ids.sort();
		assert_eq!(edge_ids, ["e4", "e5"]);
		assert_ne!(edges[0].curve.direction, edges[1].curve.direction);
	}

	#[test]
	fn inner_edges_without_ids_get_generated_ones() {
		let mut map = two_groups();
		map.edges = vec![Edge::new("", "photo", "travel")];
		let edges = LayerResolver::new(&map).inner_edges(Some("alice"));
		assert_eq!(edges[0].id, "photo_travel_t_0");
	}

	#[test]
	fn drilling_into_a_child_shows_its_subtree() {
		let map = two_groups();
		let r = LayerResolver::new(&map);
		assert_eq!(ids(&r.inner_nodes(Some("photo"))), ["film"]);
	}

	#[test]
	fn root_fallback_uses_edge_ancestors() {
		let mut a = Node::new("a", "a");
		a.parent_id = Some("missing".into());
		let mut b = Node::new("b", "b");
		b.parent_id = Some("a".into());
		let mut c = Node::new("c", "c");
		c.parent_id = Some("gone".into());
		let map = MindMap {
			nodes: vec![a, b, c],
			edges: vec![Edge::new("e", "b", "b")],
			..Default::default()
		};
		let r = LayerResolver::new(&map);
		assert_eq!(ids(&r.outer_nodes()), ["a"]);
	}

	#[test]
	fn root_fallback_uses_prefix_without_edges() {
		let nodes = (0..8)
			.map(|i| {
				let mut n = Node::new(format!("n{i}"), "");
				n.parent_id = Some("elsewhere".into());
				n
			})
			.collect();
		let map = MindMap { nodes, ..Default::default() };
		assert_eq!(LayerResolver::new(&map).outer_nodes().len(), 5);
		assert_eq!(
			LayerResolver::new(&map).with_fallback_prefix(2).outer_nodes().len(),
			2
		);
	}

	#[test]
	fn empty_map_gets_a_placeholder() {
		let map = MindMap { name: "Empty".into(), ..Default::default() };
		let nodes = LayerResolver::new(&map).outer_nodes();
		assert_eq!(ids(&nodes), [PLACEHOLDER_ID]);
		assert_eq!(nodes[0].label, "Empty");
	}

	#[test]
	fn tag_mode_synthesizes_edges_from_visible_nodes() {
		let map = MindMap {
			nodes: vec![
				Node::new("A", "A").with_tags(["x", "y"]),
				Node::new("B", "B").with_tags(["y", "z"]),
				Node::new("C", "C").with_tags(["z"]),
			],
			..Default::default()
		};
		let r = LayerResolver::new(&map);
		let outer = r.resolve(&LayerViewState::default(), ConnectionMode::Tags);
		assert_eq!(outer.nodes.len(), 3);
		assert_eq!(outer.edges.len(), 2);

		let mut view = LayerViewState::default();
		view.enter("A");
		let inner = r.resolve(&view, ConnectionMode::Tags);
		assert!(inner.nodes.is_empty());
		assert!(inner.edges.is_empty());
	}

	#[test]
	fn go_back_climbs_one_level_then_leaves() {
		let map = two_groups();
		let r = LayerResolver::new(&map);
		let mut view = LayerViewState::default();
		view.enter("photo");
		view.go_back(&r);
		assert_eq!(view.layer, Layer::Inner);
		assert_eq!(view.active_parent.as_deref(), Some("alice"));
		view.go_back(&r);
		assert_eq!(view, LayerViewState::default());
	}

	#[test]
	fn zoom_in_needs_a_hovered_node() {
		let config = VisualizationConfig::default();
		let mut view = LayerViewState { zoom: 2.0, ..Default::default() };
		assert!(view.zoom_switch(&config).is_none());
		view.hovered = Some("alice".into());
		let next = view.zoom_switch(&config).unwrap();
		assert_eq!(next.layer, Layer::Inner);
		assert_eq!(next.active_parent.as_deref(), Some("alice"));
	}

	#[test]
	fn zoom_out_clears_active_parent() {
		let config = VisualizationConfig::default();
		let mut view = LayerViewState::default();
		view.enter("alice");
		view.zoom = 0.4;
		let next = view.zoom_switch(&config).unwrap();
		assert_eq!(next.layer, Layer::Outer);
		assert_eq!(next.active_parent, None);
	}

	/// Random forest: each node's parent, if any, comes earlier in the list.
	fn arb_forest() -> impl Strategy<Value = MindMap> {
		prop::collection::vec((any::<bool>(), any::<prop::sample::Index>()), 1..20).prop_map(
			|specs| {
				let mut nodes: Vec<Node> = Vec::new();
				for (i, (is_root, pick)) in specs.into_iter().enumerate() {
					let node = Node::new(format!("n{i}"), "");
					let node = if is_root || nodes.is_empty() {
						node
					} else {
						let parent = nodes[pick.index(nodes.len())].clone();
						node.child_of(&parent)
					};
					nodes.push(node);
				}
				MindMap { nodes, ..Default::default() }
			},
		)
	}

	fn arb_parentless() -> impl Strategy<Value = MindMap> {
		(1usize..12, prop::collection::vec((0usize..12, 0usize..12), 0..6)).prop_map(
			|(count, links)| {
				let nodes = (0..count)
					.map(|i| {
						let mut n = Node::new(format!("n{i}"), "");
						n.parent_id = Some(format!("n{}", (i + 1) % count));
						n
					})
					.collect();
				let edges = links
					.into_iter()
					.enumerate()
					.map(|(i, (a, b))| Edge::new(format!("e{i}"), format!("n{a}"), format!("n{b}")))
					.collect();
				MindMap { nodes, edges, ..Default::default() }
			},
		)
	}

	proptest! {
		#[test]
		fn outer_layer_is_never_blank(map in prop_oneof![arb_forest(), arb_parentless()]) {
			let r = LayerResolver::new(&map);
			prop_assert!(!r.outer_nodes().is_empty());
		}

		#[test]
		fn inner_layer_partitions_by_root(map in arb_forest()) {
			let r = LayerResolver::new(&map);
			let roots: Vec<&str> = map.nodes.iter().filter(|n| n.parent().is_none()).map(|n| n.id.as_str()).collect();
			for root in roots {
				let visible: HashSet<String> = r.inner_nodes(Some(root)).into_iter().map(|n| n.id).collect();
				for node in &map.nodes {
					let expected = r.root_ancestor(&node.id) == Some(root) && node.id != root;
					prop_assert_eq!(visible.contains(&node.id), expected);
				}
			}
		}

		#[test]
		fn outer_edges_count_distinct_types(
			map in arb_forest(),
			links in prop::collection::vec((0usize..20, 0usize..20, 0usize..3), 0..15),
		) {
			let mut map = map;
			let n = map.nodes.len();
			map.edges = links
				.into_iter()
				.enumerate()
				.map(|(i, (a, b, t))| Edge::new(format!("e{i}"), format!("n{}", a % n), format!("n{}", b % n)).with_kind(format!("k{t}")))
				.collect();

			let r = LayerResolver::new(&map);
			let rendered = r.outer_edges();
			let mut expected: HashMap<(String, String), HashSet<String>> = HashMap::new();
			for e in &map.edges {
				let (ra, rb) = (r.root_ancestor(&e.from).unwrap(), r.root_ancestor(&e.to).unwrap());
				if ra != rb {
					let (a, b) = ordered_pair(ra, rb);
					expected.entry((a.into(), b.into())).or_default().insert(e.type_key().into());
				}
			}
			let mut actual: HashMap<(String, String), usize> = HashMap::new();
			for e in &rendered {
				let (a, b) = ordered_pair(&e.from, &e.to);
				*actual.entry((a.into(), b.into())).or_default() += 1;
			}
			prop_assert_eq!(actual.len(), expected.len());
			for (pair, types) in expected {
				prop_assert_eq!(actual.get(&pair).copied(), Some(types.len()));
			}
		}
	}
}
