//! One mounted visualization: document, store, renderer and view state.

use log::{debug, info};

use super::config::VisualizationConfig;
use super::document::assign_concentric_positions;
use super::error::Result;
use super::interaction::{Effect, Interaction, InteractionController, Scene};
use super::renderer::NetworkRenderer;
use super::resolver::LayerResolver;
use super::store::{GraphSnapshot, GraphStore};
use super::tags::tag_legend;
use super::transition::{Animator, StepOutcome};
use super::types::{ConnectionMode, Layer, LayerViewState, MindMap, Position};

struct SessionScene<'a> {
	store: &'a GraphStore,
	resolver: &'a LayerResolver<'a>,
}

impl Scene for SessionScene<'_> {
	fn is_visible(&self, id: &str) -> bool {
		self.store.contains_node(id)
	}

	fn has_children(&self, id: &str) -> bool {
		self.resolver.has_children(id)
	}

	fn parent_of(&self, id: &str) -> Option<String> {
		self.resolver.parent_of(id).map(str::to_owned)
	}
}

/// Created on mount, disposed on unmount. Once disposed every call is a no-op.
pub struct VisualizationSession<R: NetworkRenderer> {
	document: MindMap,
	config: VisualizationConfig,
	mode: ConnectionMode,
	store: GraphStore,
	renderer: R,
	view: LayerViewState,
	controller: InteractionController,
	animator: Animator,
	synced_revision: u64,
	settling: Option<u64>,
	selected: Option<String>,
	disposed: bool,
}

impl<R: NetworkRenderer> VisualizationSession<R> {
	/// Lay out the document, show its outer layer and let it settle.
	pub fn new(
		mut document: MindMap,
		config: VisualizationConfig,
		mode: ConnectionMode,
		mut renderer: R,
	) -> Self {
		let placed = assign_concentric_positions(&mut document.nodes, config.ring_spacing);
		if placed > 0 {
			debug!("placed {placed} nodes without coordinates on concentric rings");
		}
		document.report_violations();

		let view = LayerViewState::default();
		let mut store = GraphStore::new();
		let initial = LayerResolver::new(&document)
			.with_fallback_prefix(config.fallback_prefix)
			.resolve(&view, mode);
		info!(
			"showing `{}`: {} nodes, {} edges on the outer layer",
			document.name,
			initial.nodes.len(),
			initial.edges.len()
		);
		store.replace_all(initial.nodes, initial.edges);

		renderer.set_data(&store.snapshot());
		renderer.stabilize();
		renderer.set_physics(false);

		Self {
			controller: InteractionController::new(&config),
			animator: Animator::new(&config),
			synced_revision: store.revision(),
			document,
			config,
			mode,
			store,
			renderer,
			view,
			settling: None,
			selected: None,
			disposed: false,
		}
	}

	fn resolver(&self) -> LayerResolver<'_> {
		LayerResolver::new(&self.document).with_fallback_prefix(self.config.fallback_prefix)
	}

	/// Feed one input event through the controller and apply its effects.
	///
	/// Returns the generation of a transition it started, so the caller can
	/// schedule [`VisualizationSession::advance`].
	pub fn dispatch(&mut self, event: Interaction, now_ms: f64) -> Option<u64> {
		if self.disposed {
			return None;
		}
		let (next, effects) = {
			let resolver = LayerResolver::new(&self.document)
				.with_fallback_prefix(self.config.fallback_prefix);
			let scene = SessionScene {
				store: &self.store,
				resolver: &resolver,
			};
			self.controller.handle(&self.view, event, now_ms, &scene)
		};
		self.view = next;

		let mut started = None;
		for effect in effects {
			match effect {
				Effect::Transition { from, to } => {
					debug!("{:?} -> {:?}", from.layer, to.layer);
					started = Some(self.start_transition(&to));
				}
				Effect::Focus { node, scale } => {
					self.renderer.focus(&node, scale, true);
					self.view.zoom = scale;
				}
				Effect::Select(node) => {
					info!("selected {node}");
					self.selected = Some(node);
				}
			}
		}
		started
	}

	fn start_transition(&mut self, to: &LayerViewState) -> u64 {
		let start = match (to.layer, to.active_parent.as_deref()) {
			(Layer::Inner, Some(parent)) => self
				.renderer
				.positions(&[parent])
				.remove(parent)
				.or_else(|| self.store.node(parent).and_then(|n| n.position))
				.unwrap_or(Position::ORIGIN),
			_ => Position::ORIGIN,
		};
		let next = self.resolver().resolve(to, self.mode);
		self.settling = None;
		self.renderer.set_physics(false);
		self.animator.begin(&mut self.store, next, start)
	}

	/// Timer callback for the transition of `generation`.
	pub fn advance(&mut self, generation: u64) -> StepOutcome {
		if self.disposed {
			return StepOutcome::Stale;
		}
		let outcome = self.animator.step(generation, &mut self.store);
		match outcome {
			StepOutcome::Stale => {}
			StepOutcome::Animating { .. } => self.sync_renderer(),
			StepOutcome::Committed => {
				self.sync_renderer();
				self.renderer.stabilize();
				self.renderer.set_physics(true);
				self.settling = Some(generation);
			}
		}
		outcome
	}

	/// Freeze the layout once the committed layer of `generation` has settled.
	///
	/// Returns false when a newer transition has started since.
	pub fn finish_settle(&mut self, generation: u64) -> bool {
		if self.disposed || self.settling != Some(generation) {
			return false;
		}
		self.settling = None;
		self.renderer.set_physics(false);
		debug!("layout settled after transition {generation}");
		true
	}

	/// Per-frame work: resolve expired clicks, resync, step the renderer.
	pub fn frame(&mut self, dt: f64, now_ms: f64) {
		if self.disposed {
			return;
		}
		if self.controller.has_pending_click() {
			self.dispatch(Interaction::Tick, now_ms);
		}
		self.sync_renderer();
		self.renderer.tick(dt);
	}

	fn sync_renderer(&mut self) {
		if self.store.revision() != self.synced_revision {
			self.renderer.sync(&self.store.snapshot());
			self.synced_revision = self.store.revision();
		}
	}

	/// Switch between explicit and tag-derived edges for the current view.
	pub fn set_mode(&mut self, mode: ConnectionMode) {
		if self.disposed || self.mode == mode {
			return;
		}
		self.mode = mode;
		self.animator.cancel(&mut self.store);
		let layer = self.resolver().resolve(&self.view, mode);
		self.store.replace_all(layer.nodes, layer.edges);
		self.sync_renderer();
	}

	pub fn mode(&self) -> ConnectionMode {
		self.mode
	}

	pub fn view(&self) -> &LayerViewState {
		&self.view
	}

	pub fn document(&self) -> &MindMap {
		&self.document
	}

	pub fn config(&self) -> &VisualizationConfig {
		&self.config
	}

	pub fn snapshot(&self) -> GraphSnapshot {
		self.store.snapshot()
	}

	pub fn renderer(&self) -> &R {
		&self.renderer
	}

	pub fn renderer_mut(&mut self) -> &mut R {
		&mut self.renderer
	}

	pub fn is_transitioning(&self) -> bool {
		self.animator.is_running()
	}

	/// The last confirmed single click, if not yet taken.
	pub fn take_selection(&mut self) -> Option<String> {
		self.selected.take()
	}

	/// Tags on the nodes currently shown, with their colours.
	pub fn tag_legend(&self) -> Vec<(String, &'static str)> {
		let resolver = self.resolver();
		tag_legend(self.store.nodes().filter(|n| !n.ghost).filter_map(|n| resolver.node(&n.id)))
	}

	/// The document with positions of shown nodes taken from the renderer.
	pub fn save_payload(&self) -> Result<String> {
		let mut document = self.document.clone();
		let ids: Vec<&str> = self.document.nodes.iter().map(|n| n.id.as_str()).collect();
		let positions = self.renderer.positions(&ids);
		for node in &mut document.nodes {
			if let Some(p) = positions.get(&node.id) {
				node.x = Some(p.x);
				node.y = Some(p.y);
			}
		}
		document.to_json()
	}

	pub fn dispose(&mut self) {
		if self.disposed {
			return;
		}
		self.animator.cancel(&mut self.store);
		self.renderer.destroy();
		self.settling = None;
		self.disposed = true;
		debug!("visualization session disposed");
	}

	pub fn is_disposed(&self) -> bool {
		self.disposed
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;
	use crate::components::mind_map::renderer::ForceGraphRenderer;
	use crate::components::mind_map::types::{Edge, Node};

	#[derive(Debug, Default)]
	struct RecordingRenderer {
		calls: Vec<String>,
		shown: HashMap<String, Position>,
		physics: bool,
		destroyed: bool,
	}

	impl RecordingRenderer {
		fn show(&mut self, snapshot: &GraphSnapshot) {
			self.shown = snapshot
				.nodes
				.iter()
				.filter_map(|n| n.position.map(|p| (n.id.clone(), p)))
				.collect();
		}
	}

	impl NetworkRenderer for RecordingRenderer {
		fn set_data(&mut self, snapshot: &GraphSnapshot) {
			self.calls.push("set_data".into());
			self.show(snapshot);
		}

		fn sync(&mut self, snapshot: &GraphSnapshot) {
			self.calls.push("sync".into());
			self.show(snapshot);
		}

		fn positions(&self, ids: &[&str]) -> HashMap<String, Position> {
			ids.iter()
				.filter_map(|id| self.shown.get(*id).map(|p| (id.to_string(), *p)))
				.collect()
		}

		fn focus(&mut self, id: &str, scale: f64, _animate: bool) {
			self.calls.push(format!("focus {id} {scale}"));
		}

		fn stabilize(&mut self) {
			self.calls.push("stabilize".into());
		}

		fn set_physics(&mut self, enabled: bool) {
			self.physics = enabled;
		}

		fn physics_enabled(&self) -> bool {
			self.physics
		}

		fn tick(&mut self, _dt: f64) {}

		fn destroy(&mut self) {
			self.calls.push("destroy".into());
			self.destroyed = true;
		}

		fn is_destroyed(&self) -> bool {
			self.destroyed
		}
	}

	/// Two group roots; Alice has two tagged children, one with a child of its own.
	fn sample() -> MindMap {
		let alice = Node::new("alice", "Alice");
		let bob = Node::new("bob", "Bob");
		let hiking = Node::new("hiking", "Hiking")
			.child_of(&alice)
			.with_tags(["travel", "outdoors"]);
		let paris = Node::new("paris", "Paris").child_of(&alice).with_tags(["travel"]);
		let alps = Node::new("alps", "Alps").child_of(&hiking).with_tags(["outdoors"]);
		MindMap {
			id: "m1".into(),
			name: "Friends".into(),
			nodes: vec![alice, bob, hiking, paris, alps],
			edges: vec![Edge::new("e1", "alice", "bob").with_label("Friends")],
			..Default::default()
		}
	}

	fn session(mode: ConnectionMode) -> VisualizationSession<RecordingRenderer> {
		VisualizationSession::new(
			sample(),
			VisualizationConfig::default(),
			mode,
			RecordingRenderer::default(),
		)
	}

	fn run_to_commit<R: NetworkRenderer>(s: &mut VisualizationSession<R>, generation: u64) {
		for _ in 0..s.config().fade_steps {
			if s.advance(generation) == StepOutcome::Committed {
				return;
			}
		}
		panic!("transition {generation} never committed");
	}

	fn shown_ids<R: NetworkRenderer>(s: &VisualizationSession<R>) -> Vec<String> {
		s.snapshot().nodes.into_iter().map(|n| n.id).collect()
	}

	#[test]
	fn mount_shows_outer_layer_frozen() {
		let s = session(ConnectionMode::Explicit);
		assert_eq!(shown_ids(&s), ["alice", "bob"]);
		assert_eq!(s.renderer().calls, ["set_data", "stabilize"]);
		assert!(!s.renderer().physics_enabled());
		// every node got coordinates on mount
		assert!(s.document().nodes.iter().all(|n| n.position().is_some()));
	}

	#[test]
	fn double_click_enters_and_commits_inner_layer() {
		let mut s = session(ConnectionMode::Tags);
		let generation = s.dispatch(Interaction::DoubleClick("alice".into()), 0.0).unwrap();
		assert_eq!(s.view().layer, Layer::Inner);
		assert_eq!(s.view().active_parent.as_deref(), Some("alice"));
		assert!(s.renderer().calls.iter().any(|c| c == "focus alice 1"));
		assert!(s.is_transitioning());

		run_to_commit(&mut s, generation);
		let expected = s.resolver().resolve(s.view(), ConnectionMode::Tags);
		let snapshot = s.snapshot();
		let expected_ids: Vec<&String> = expected.nodes.iter().map(|n| &n.id).collect();
		assert_eq!(snapshot.nodes.iter().map(|n| &n.id).collect::<Vec<_>>(), expected_ids);
		assert!(snapshot.nodes.iter().all(|n| !n.ghost));
		assert!(snapshot.edges.iter().all(|e| !e.ghost));
		// hiking/paris share travel; hiking/alps share outdoors
		assert_eq!(snapshot.edges.len(), 2);
		// once on mount, once for the committed layer
		assert_eq!(s.renderer().calls.iter().filter(|c| *c == "stabilize").count(), 2);
		assert!(s.renderer().physics_enabled());

		assert!(s.finish_settle(generation));
		assert!(!s.renderer().physics_enabled());
		assert_eq!(s.advance(generation), StepOutcome::Stale);
	}

	#[test]
	fn committed_layer_opens_where_the_ghosts_landed() {
		let mut s = session(ConnectionMode::Explicit);
		let start = s.renderer().positions(&["alice"])["alice"];
		let generation = s.dispatch(Interaction::DoubleClick("alice".into()), 0.0).unwrap();
		run_to_commit(&mut s, generation);

		let spread = s.config().ghost_spread;
		let snapshot = s.snapshot();
		assert_eq!(snapshot.nodes.len(), 3);
		for node in &snapshot.nodes {
			// the concentric layout had put these nodes elsewhere
			let at = node.position.unwrap();
			let dist = ((at.x - start.x).powi(2) + (at.y - start.y).powi(2)).sqrt();
			assert!((dist - spread).abs() < 1e-6, "{} is {dist} from the start", node.id);
			assert_eq!(s.renderer().positions(&[node.id.as_str()])[&node.id], at);
		}
	}

	#[test]
	fn rendered_ghosts_follow_the_fan_out() {
		let config = VisualizationConfig::default();
		let renderer = ForceGraphRenderer::new(800.0, 600.0, &config);
		let mut s = VisualizationSession::new(sample(), config, ConnectionMode::Explicit, renderer);
		let generation = s.dispatch(Interaction::DoubleClick("alice".into()), 0.0).unwrap();
		s.renderer_mut().set_physics(true);

		let steps = s.config().fade_steps;
		for step in 1..steps {
			assert!(matches!(s.advance(generation), StepOutcome::Animating { .. }));
			s.frame(1.0 / 60.0, step as f64 * 16.0);
		}

		let snapshot = s.snapshot();
		let ghosts: Vec<_> = snapshot.nodes.iter().filter(|n| n.ghost).collect();
		assert_eq!(ghosts.len(), 3);
		// past the halfway mark ghosts have physics set but still follow the fan
		assert!(ghosts.iter().all(|n| n.physics));
		let ids: Vec<&str> = ghosts.iter().map(|n| n.id.as_str()).collect();
		let rendered = s.renderer().positions(&ids);
		for ghost in ghosts {
			let want = ghost.position.unwrap();
			let got = rendered[&ghost.id];
			assert!(
				(got.x - want.x).abs() < 1e-3 && (got.y - want.y).abs() < 1e-3,
				"{} rendered at {got:?}, store has {want:?}",
				ghost.id
			);
		}
	}

	#[test]
	fn superseded_transition_goes_stale() {
		let mut s = session(ConnectionMode::Explicit);
		let first = s.dispatch(Interaction::DoubleClick("alice".into()), 0.0).unwrap();
		s.advance(first);
		let second = s.dispatch(Interaction::GoBack, 10.0).unwrap();
		assert!(second > first);
		assert_eq!(s.advance(first), StepOutcome::Stale);
		assert!(!s.finish_settle(first));

		run_to_commit(&mut s, second);
		assert_eq!(s.view().layer, Layer::Outer);
		assert_eq!(shown_ids(&s), ["alice", "bob"]);
	}

	#[test]
	fn zoom_switching_respects_hysteresis() {
		let mut s = session(ConnectionMode::Explicit);
		s.dispatch(Interaction::Hover("bob".into()), 0.0);
		assert_eq!(s.dispatch(Interaction::Zoom(1.2), 0.0), None);
		let generation = s.dispatch(Interaction::Zoom(1.6), 0.0).unwrap();
		assert_eq!(s.view().active_parent.as_deref(), Some("bob"));
		run_to_commit(&mut s, generation);

		assert_eq!(s.dispatch(Interaction::Zoom(0.8), 100.0), None);
		assert_eq!(s.view().layer, Layer::Inner);
		let back = s.dispatch(Interaction::Zoom(0.3), 200.0).unwrap();
		assert_eq!(s.view().layer, Layer::Outer);
		run_to_commit(&mut s, back);
	}

	#[test]
	fn explicit_enter_suppresses_zoom_out_for_a_while() {
		let mut s = session(ConnectionMode::Explicit);
		let generation = s.dispatch(Interaction::DoubleClick("alice".into()), 0.0).unwrap();
		run_to_commit(&mut s, generation);

		assert_eq!(s.dispatch(Interaction::Zoom(0.3), 100.0), None);
		assert_eq!(s.view().layer, Layer::Inner);
		assert!(s.dispatch(Interaction::Zoom(0.3), 5_000.0).is_some());
		assert_eq!(s.view().layer, Layer::Outer);
	}

	#[test]
	fn drill_down_and_go_back_one_level() {
		let mut s = session(ConnectionMode::Explicit);
		let g = s.dispatch(Interaction::DoubleClick("alice".into()), 0.0).unwrap();
		run_to_commit(&mut s, g);
		let g = s.dispatch(Interaction::DoubleClick("hiking".into()), 1_000.0).unwrap();
		run_to_commit(&mut s, g);
		assert_eq!(shown_ids(&s), ["alps"]);

		let g = s.dispatch(Interaction::GoBack, 2_000.0).unwrap();
		run_to_commit(&mut s, g);
		assert_eq!(s.view().active_parent.as_deref(), Some("alice"));

		// leaf nodes cannot be entered
		assert_eq!(s.dispatch(Interaction::DoubleClick("paris".into()), 3_000.0), None);
	}

	#[test]
	fn single_click_selects_after_the_window() {
		let mut s = session(ConnectionMode::Explicit);
		s.dispatch(Interaction::Click("bob".into()), 0.0);
		s.frame(0.016, 100.0);
		assert_eq!(s.take_selection(), None);
		s.frame(0.016, 1_000.0);
		assert_eq!(s.take_selection().as_deref(), Some("bob"));
		assert_eq!(s.view().layer, Layer::Outer);
	}

	#[test]
	fn clicks_on_missing_nodes_do_nothing() {
		let mut s = session(ConnectionMode::Explicit);
		assert_eq!(s.dispatch(Interaction::DoubleClick("nobody".into()), 0.0), None);
		assert_eq!(s.dispatch(Interaction::EnterNode("paris".into()), 0.0), None);
		assert_eq!(s.view(), &LayerViewState::default());
	}

	#[test]
	fn mode_switch_rebuilds_edges_in_place() {
		let mut s = session(ConnectionMode::Explicit);
		let g = s.dispatch(Interaction::EnterNode("alice".into()), 0.0).unwrap();
		run_to_commit(&mut s, g);
		assert!(s.snapshot().edges.is_empty());
		s.set_mode(ConnectionMode::Tags);
		assert_eq!(s.snapshot().edges.len(), 2);
		let tags: Vec<String> = s.tag_legend().into_iter().map(|(t, _)| t).collect();
		assert_eq!(tags, ["outdoors", "travel"]);
	}

	#[test]
	fn save_payload_merges_rendered_positions() {
		let mut s = session(ConnectionMode::Explicit);
		s.renderer_mut().shown.insert("bob".into(), Position::new(7.0, 8.0));
		let saved = MindMap::from_json(&s.save_payload().unwrap()).unwrap();
		let bob = saved.node("bob").unwrap();
		assert_eq!((bob.x, bob.y), (Some(7.0), Some(8.0)));
		assert_eq!(saved.edges, s.document().edges);
	}

	#[test]
	fn disposed_session_ignores_everything() {
		let mut s = session(ConnectionMode::Explicit);
		let g = s.dispatch(Interaction::DoubleClick("alice".into()), 0.0).unwrap();
		s.dispose();
		assert!(s.renderer().is_destroyed());
		assert!(!s.is_transitioning());
		assert_eq!(s.advance(g), StepOutcome::Stale);
		assert_eq!(s.dispatch(Interaction::GoBack, 10.0), None);
		s.frame(0.016, 20.0);
		s.dispose();
		assert_eq!(s.renderer().calls.iter().filter(|c| *c == "destroy").count(), 1);
	}
}
