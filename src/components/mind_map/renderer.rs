use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData};
use log::debug;

use super::config::VisualizationConfig;
use super::store::{GraphSnapshot, VisualEdge, VisualNode};
use super::types::Position;

pub const HIT_RADIUS: f64 = 12.0;
pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 10.0;

const NODE_MASS: f32 = 10.0;
const STABILIZE_DT: f32 = 0.016;
const SEED_RADIUS: f64 = 100.0;

/// The command surface the visualization drives its renderer through.
pub trait NetworkRenderer {
	/// Replace everything shown, forgetting simulated positions.
	fn set_data(&mut self, snapshot: &GraphSnapshot);
	/// Match `snapshot`, keeping the simulated position of nodes that stay.
	fn sync(&mut self, snapshot: &GraphSnapshot);
	fn positions(&self, ids: &[&str]) -> HashMap<String, Position>;
	/// Center the camera on `id` at `scale`.
	fn focus(&mut self, id: &str, scale: f64, animate: bool);
	/// Run the simulation until the layout settles.
	fn stabilize(&mut self);
	fn set_physics(&mut self, enabled: bool);
	fn physics_enabled(&self) -> bool;
	/// Advance simulation and camera animation by `dt` seconds.
	fn tick(&mut self, dt: f64);
	fn destroy(&mut self);
	fn is_destroyed(&self) -> bool;
}

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub id: String,
	pub label: String,
	pub title: String,
	pub color: String,
	pub radius: f64,
	pub opacity: f64,
	pub ghost: bool,
}

impl From<&VisualNode> for NodeInfo {
	fn from(node: &VisualNode) -> Self {
		Self {
			id: node.id.clone(),
			label: node.label.clone(),
			title: node.title.clone(),
			color: node.color.clone(),
			radius: node.size / 2.0,
			opacity: node.opacity,
			ghost: node.ghost,
		}
	}
}

#[derive(Clone, Debug)]
pub struct EdgeInfo {
	pub from: DefaultNodeIdx,
	pub to: DefaultNodeIdx,
	pub style: VisualEdge,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub moved: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Rise time of the hover emphasis, in seconds.
const EMPHASIS_RISE: f64 = 0.25;
/// Fall time once the pointer leaves, in seconds.
const EMPHASIS_FALL: f64 = 0.4;
/// Pointer must rest this long before emphasis starts.
const EMPHASIS_HOLD: f64 = 0.08;

/// Emphasis of the hovered node and of the nodes it is connected to.
///
/// After the pointer leaves, the last group stays emphasized while the
/// strength falls back to zero.
#[derive(Clone, Debug, Default)]
pub struct Highlight {
	pub focus: Option<DefaultNodeIdx>,
	pub related: HashSet<DefaultNodeIdx>,
	fading: Option<(DefaultNodeIdx, HashSet<DefaultNodeIdx>)>,
	strength: f64,
	held: f64,
}

impl Highlight {
	fn group(&self) -> Option<(DefaultNodeIdx, &HashSet<DefaultNodeIdx>)> {
		match (self.focus, &self.fading) {
			(Some(focus), _) => Some((focus, &self.related)),
			(None, Some((focus, related))) => Some((*focus, related)),
			(None, None) => None,
		}
	}

	fn advance(&mut self, dt: f64) {
		if self.focus.is_some() {
			self.held = (self.held + dt).min(EMPHASIS_HOLD);
			if self.held >= EMPHASIS_HOLD {
				self.strength = (self.strength + dt / EMPHASIS_RISE).min(1.0);
			}
			return;
		}
		self.strength = (self.strength - dt / EMPHASIS_FALL).max(0.0);
		if self.strength == 0.0 {
			self.fading = None;
		}
	}
}

#[derive(Clone, Debug)]
struct FocusAnimation {
	from: ViewTransform,
	to: ViewTransform,
	elapsed: f64,
	duration: f64,
}

pub fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Renderer backed by a `force_graph` simulation, drawn on a 2D canvas.
///
/// Graph space is centred on the origin; `transform` maps it to the screen.
pub struct ForceGraphRenderer {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub highlight: Highlight,
	pub width: f64,
	pub height: f64,
	config: VisualizationConfig,
	ids: HashMap<String, DefaultNodeIdx>,
	by_idx: HashMap<DefaultNodeIdx, String>,
	node_order: Vec<String>,
	edge_order: Vec<String>,
	edges: Vec<EdgeInfo>,
	pinned: HashSet<DefaultNodeIdx>,
	physics: bool,
	focus: Option<FocusAnimation>,
	destroyed: bool,
}

impl ForceGraphRenderer {
	pub fn new(width: f64, height: f64, config: &VisualizationConfig) -> Self {
		Self {
			graph: ForceGraph::new(config.physics.simulation_parameters()),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			highlight: Highlight::default(),
			width,
			height,
			config: config.clone(),
			ids: HashMap::new(),
			by_idx: HashMap::new(),
			node_order: Vec::new(),
			edge_order: Vec::new(),
			edges: Vec::new(),
			pinned: HashSet::new(),
			physics: true,
			focus: None,
			destroyed: false,
		}
	}

	fn current_positions(&self) -> HashMap<String, Position> {
		let mut out = HashMap::new();
		self.graph.visit_nodes(|node| {
			out.insert(
				node.data.user_data.id.clone(),
				Position::new(node.x() as f64, node.y() as f64),
			);
		});
		out
	}

	fn rebuild(&mut self, snapshot: &GraphSnapshot, keep_positions: bool) {
		let previous = if keep_positions {
			self.current_positions()
		} else {
			HashMap::new()
		};
		let mut graph = ForceGraph::new(self.config.physics.simulation_parameters());
		let mut ids = HashMap::new();
		let mut by_idx = HashMap::new();
		let count = snapshot.nodes.len().max(1) as f64;

		for (i, node) in snapshot.nodes.iter().enumerate() {
			if ids.contains_key(&node.id) {
				continue;
			}
			let kept = previous.get(&node.id).copied();
			// Animated nodes go where the store says; simulated ones stay put.
			let position = if node.physics && !node.ghost {
				kept.or(node.position)
			} else {
				node.position.or(kept)
			}
			.unwrap_or_else(|| {
				let angle = i as f64 * 2.0 * PI / count;
				Position::new(SEED_RADIUS * angle.cos(), SEED_RADIUS * angle.sin())
			});

			let idx = graph.add_node(NodeData {
				x: position.x as f32,
				y: position.y as f32,
				mass: NODE_MASS,
				is_anchor: !node.physics || node.ghost,
				user_data: NodeInfo::from(node),
			});
			ids.insert(node.id.clone(), idx);
			by_idx.insert(idx, node.id.clone());
		}

		let mut edges = Vec::new();
		let mut skipped = 0usize;
		for edge in &snapshot.edges {
			let (Some(&from), Some(&to)) = (ids.get(&edge.from), ids.get(&edge.to)) else {
				skipped += 1;
				continue;
			};
			if from != to {
				graph.add_edge(from, to, EdgeData::default());
			}
			edges.push(EdgeInfo {
				from,
				to,
				style: edge.clone(),
			});
		}
		if skipped > 0 {
			debug!("renderer skipped {skipped} edges with missing endpoints");
		}

		self.graph = graph;
		self.ids = ids;
		self.by_idx = by_idx;
		self.node_order = unique_ids(snapshot.nodes.iter().map(|n| n.id.as_str()));
		self.edge_order = snapshot.edges.iter().map(|e| e.id.clone()).collect();
		self.edges = edges;
		self.pinned.clear();
		self.highlight = Highlight::default();
		self.drag = DragState::default();
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let info = &node.data.user_data;
			// ghosts still fading in are not clickable yet
			if info.opacity < 0.5 {
				return;
			}
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			if (dx * dx + dy * dy).sqrt() < info.radius.max(HIT_RADIUS) {
				found = Some(node.index());
			}
		});
		found
	}

	pub fn node_id(&self, idx: DefaultNodeIdx) -> Option<&str> {
		self.by_idx.get(&idx).map(String::as_str)
	}

	pub fn node_index(&self, id: &str) -> Option<DefaultNodeIdx> {
		self.ids.get(id).copied()
	}

	/// Zoom by `factor` around a screen point; returns the new scale.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) -> f64 {
		let new_k = (self.transform.k * factor).clamp(MIN_SCALE, MAX_SCALE);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
		self.focus = None;
		new_k
	}

	pub fn scale(&self) -> f64 {
		self.transform.k
	}

	/// Keep a dragged node where the user dropped it.
	pub fn pin(&mut self, idx: DefaultNodeIdx) {
		self.pinned.insert(idx);
		self.graph.visit_nodes_mut(|node| {
			if node.index() == idx {
				node.data.is_anchor = true;
			}
		});
	}

	pub fn edges(&self) -> &[EdgeInfo] {
		&self.edges
	}

	/// Emphasize `node` and the nodes joined to it by visible edges.
	///
	/// Ghosts are never emphasized; hovering one counts as hovering nothing.
	pub fn set_hover(&mut self, node: Option<DefaultNodeIdx>) {
		let node = node.filter(|idx| {
			let mut ghost = true;
			self.graph.visit_nodes(|n| {
				if n.index() == *idx {
					ghost = n.data.user_data.ghost;
				}
			});
			!ghost
		});
		if self.highlight.focus == node {
			return;
		}

		let previous = self.highlight.focus.take();
		let related = std::mem::take(&mut self.highlight.related);
		match (previous, node) {
			(Some(prev), None) => self.highlight.fading = Some((prev, related)),
			(None, Some(_)) => {
				self.highlight.fading = None;
				self.highlight.held = 0.0;
			}
			_ => self.highlight.fading = None,
		}

		let Some(idx) = node else {
			return;
		};
		self.highlight.focus = Some(idx);
		self.highlight.related = self
			.edges
			.iter()
			.filter(|e| !e.style.ghost && e.style.opacity > 0.0)
			.filter_map(|e| match (e.from == idx, e.to == idx) {
				(true, _) => Some(e.to),
				(_, true) => Some(e.from),
				_ => None,
			})
			.collect();
	}

	/// The hovered (or fading) node and its connections.
	pub fn is_emphasized(&self, idx: DefaultNodeIdx) -> bool {
		self.highlight
			.group()
			.is_some_and(|(focus, related)| focus == idx || related.contains(&idx))
	}

	pub fn is_focus(&self, idx: DefaultNodeIdx) -> bool {
		self.highlight.group().is_some_and(|(focus, _)| focus == idx)
	}

	pub fn emphasis_active(&self) -> bool {
		self.highlight.group().is_some()
	}

	/// Eased emphasis strength in `0..=1`.
	pub fn emphasis(&self) -> f64 {
		ease_out_cubic(self.highlight.strength)
	}

	fn tick_focus(&mut self, dt: f64) {
		let Some(focus) = self.focus.as_mut() else {
			return;
		};
		focus.elapsed += dt;
		let t = ease_out_cubic((focus.elapsed / focus.duration).min(1.0));
		let lerp = |a: f64, b: f64| a + (b - a) * t;
		self.transform = ViewTransform {
			x: lerp(focus.from.x, focus.to.x),
			y: lerp(focus.from.y, focus.to.y),
			k: lerp(focus.from.k, focus.to.k),
		};
		if focus.elapsed >= focus.duration {
			self.focus = None;
		}
	}

	pub fn is_focusing(&self) -> bool {
		self.focus.is_some()
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

impl NetworkRenderer for ForceGraphRenderer {
	fn set_data(&mut self, snapshot: &GraphSnapshot) {
		if self.destroyed {
			return;
		}
		self.rebuild(snapshot, false);
	}

	fn sync(&mut self, snapshot: &GraphSnapshot) {
		if self.destroyed {
			return;
		}
		let same_nodes = unique_ids(snapshot.nodes.iter().map(|n| n.id.as_str())) == self.node_order;
		let same_edges = snapshot.edges.len() == self.edge_order.len()
			&& snapshot.edges.iter().zip(&self.edge_order).all(|(e, id)| &e.id == id);
		if !(same_nodes && same_edges) {
			self.rebuild(snapshot, true);
			return;
		}

		let by_id: HashMap<&str, &VisualNode> =
			snapshot.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
		let pinned = &self.pinned;
		self.graph.visit_nodes_mut(|node| {
			let Some(visual) = by_id.get(node.data.user_data.id.as_str()) else {
				return;
			};
			node.data.user_data = NodeInfo::from(*visual);
			node.data.is_anchor =
				!visual.physics || visual.ghost || pinned.contains(&node.index());
			if !visual.physics || visual.ghost {
				if let Some(p) = visual.position {
					node.data.x = p.x as f32;
					node.data.y = p.y as f32;
				}
			}
		});
		let styles: HashMap<&str, &VisualEdge> =
			snapshot.edges.iter().map(|e| (e.id.as_str(), e)).collect();
		for edge in &mut self.edges {
			if let Some(style) = styles.get(edge.style.id.as_str()) {
				edge.style = (*style).clone();
			}
		}
	}

	fn positions(&self, ids: &[&str]) -> HashMap<String, Position> {
		let wanted: HashSet<&str> = ids.iter().copied().collect();
		let mut out = HashMap::new();
		self.graph.visit_nodes(|node| {
			let id = node.data.user_data.id.as_str();
			if wanted.contains(id) {
				out.insert(id.to_owned(), Position::new(node.x() as f64, node.y() as f64));
			}
		});
		out
	}

	fn focus(&mut self, id: &str, scale: f64, animate: bool) {
		let Some(position) = self.positions(&[id]).remove(id) else {
			return;
		};
		let k = scale.clamp(MIN_SCALE, MAX_SCALE);
		let to = ViewTransform {
			x: self.width / 2.0 - position.x * k,
			y: self.height / 2.0 - position.y * k,
			k,
		};
		let duration = self.config.focus_duration_ms / 1000.0;
		if animate && duration > 0.0 {
			self.focus = Some(FocusAnimation {
				from: self.transform.clone(),
				to,
				elapsed: 0.0,
				duration,
			});
		} else {
			self.transform = to;
			self.focus = None;
		}
	}

	fn stabilize(&mut self) {
		if self.destroyed {
			return;
		}
		for _ in 0..self.config.stabilization_iterations {
			self.graph.update(STABILIZE_DT);
		}
	}

	fn set_physics(&mut self, enabled: bool) {
		self.physics = enabled;
	}

	fn physics_enabled(&self) -> bool {
		self.physics
	}

	fn tick(&mut self, dt: f64) {
		if self.destroyed {
			return;
		}
		if self.physics {
			self.graph.update(dt as f32);
		}
		self.tick_focus(dt);
		self.highlight.advance(dt);
	}

	fn destroy(&mut self) {
		self.graph = ForceGraph::new(self.config.physics.simulation_parameters());
		self.ids.clear();
		self.by_idx.clear();
		self.node_order.clear();
		self.edge_order.clear();
		self.edges.clear();
		self.pinned.clear();
		self.highlight = Highlight::default();
		self.focus = None;
		self.physics = false;
		self.destroyed = true;
	}

	fn is_destroyed(&self) -> bool {
		self.destroyed
	}
}

fn unique_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
	let mut seen = HashSet::new();
	ids.filter(|id| seen.insert(*id)).map(str::to_owned).collect()
}
