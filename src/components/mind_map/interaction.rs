//! Pointer and zoom input turned into layer changes.
//!
//! [`InteractionController::handle`] is a reducer: it takes the current view
//! and one event and returns the next view plus the effects to apply. It
//! keeps only the click-timing and cooldown bookkeeping of its own.

use log::{debug, info};

use super::config::VisualizationConfig;
use super::types::{Layer, LayerViewState};

/// Input events, already mapped to node ids.
#[derive(Clone, Debug, PartialEq)]
pub enum Interaction {
	Hover(String),
	Blur,
	Zoom(f64),
	Click(String),
	DoubleClick(String),
	/// Explicit zoom-to-node request, e.g. from a menu.
	EnterNode(String),
	GoBack,
	/// Time passing; resolves a pending click once the double-click window closes.
	Tick,
}

/// Side effects requested by the controller, applied after it returns.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
	Transition {
		from: LayerViewState,
		to: LayerViewState,
	},
	Focus {
		node: String,
		scale: f64,
	},
	/// A confirmed single click.
	Select(String),
}

/// What the controller needs to know about the graph being shown.
pub trait Scene {
	/// Whether `id` is a real (non-ghost) node currently shown.
	fn is_visible(&self, id: &str) -> bool;
	fn has_children(&self, id: &str) -> bool;
	fn parent_of(&self, id: &str) -> Option<String>;
}

#[derive(Clone, Debug, PartialEq)]
struct PendingClick {
	node: String,
	at_ms: f64,
}

#[derive(Clone, Debug)]
pub struct InteractionController {
	config: VisualizationConfig,
	pending: Option<PendingClick>,
	cooldown_until: Option<f64>,
}

impl InteractionController {
	pub fn new(config: &VisualizationConfig) -> Self {
		Self {
			config: config.clone(),
			pending: None,
			cooldown_until: None,
		}
	}

	/// True while zoom-based switching is suppressed.
	pub fn cooldown_active(&self, now_ms: f64) -> bool {
		self.cooldown_until.is_some_and(|until| now_ms < until)
	}

	pub fn has_pending_click(&self) -> bool {
		self.pending.is_some()
	}

	pub fn handle(
		&mut self,
		view: &LayerViewState,
		event: Interaction,
		now_ms: f64,
		scene: &dyn Scene,
	) -> (LayerViewState, Vec<Effect>) {
		let mut next = view.clone();
		let mut effects = Vec::new();

		match event {
			// a node that is not shown cannot stay hovered
			Interaction::Hover(id) => next.hovered = scene.is_visible(&id).then_some(id),
			Interaction::Blur => next.hovered = None,
			Interaction::Zoom(scale) => {
				next.zoom = scale;
				if self.cooldown_active(now_ms) {
					return (next, effects);
				}
				let hovered_ok = next.hovered.as_deref().is_none_or(|h| scene.is_visible(h));
				if let Some(switched) = next.zoom_switch(&self.config).filter(|_| hovered_ok) {
					info!(
						"zoom {:.2}: switching to {:?} layer ({:?})",
						scale, switched.layer, switched.active_parent
					);
					next = self.transition(view, switched, &mut effects);
				}
			}
			Interaction::Click(id) => {
				if !scene.is_visible(&id) {
					return (next, effects);
				}
				let double = self.pending.as_ref().is_some_and(|p| {
					p.node == id && now_ms - p.at_ms <= self.config.double_click_ms
				});
				if double {
					self.pending = None;
					return self.enter(view, id, now_ms, scene);
				}
				if let Some(previous) = self.pending.take() {
					effects.push(Effect::Select(previous.node));
				}
				self.pending = Some(PendingClick { node: id, at_ms: now_ms });
			}
			Interaction::DoubleClick(id) => {
				self.pending = None;
				return self.enter(view, id, now_ms, scene);
			}
			Interaction::EnterNode(id) => return self.enter(view, id, now_ms, scene),
			Interaction::GoBack => {
				if view.layer == Layer::Inner {
					let mut back = view.clone();
					match back.active_parent.as_deref().and_then(|p| scene.parent_of(p)) {
						Some(grandparent) => back.active_parent = Some(grandparent),
						None => back.reset(),
					}
					self.cooldown_until = Some(now_ms + self.config.cooldown_ms);
					next = self.transition(view, back, &mut effects);
				}
			}
			Interaction::Tick => {
				let window = self.config.double_click_ms;
				if let Some(pending) = self.pending.take_if(|p| now_ms - p.at_ms > window) {
					effects.push(Effect::Select(pending.node));
				}
			}
		}
		(next, effects)
	}

	/// Whether `id` can be entered from `view`: any shown node on the outer
	/// layer, or a shown node with children on the inner one.
	pub fn can_enter(&self, view: &LayerViewState, id: &str, scene: &dyn Scene) -> bool {
		if !scene.is_visible(id) {
			return false;
		}
		match view.layer {
			Layer::Outer => true,
			Layer::Inner => view.active_parent.as_deref() != Some(id) && scene.has_children(id),
		}
	}

	fn enter(
		&mut self,
		view: &LayerViewState,
		id: String,
		now_ms: f64,
		scene: &dyn Scene,
	) -> (LayerViewState, Vec<Effect>) {
		let mut effects = Vec::new();
		if !self.can_enter(view, &id, scene) {
			debug!("ignoring enter on {id}");
			return (view.clone(), effects);
		}
		self.cooldown_until = Some(now_ms + self.config.cooldown_ms);

		let mut entered = view.clone();
		entered.enter(&id);
		entered.zoom = self.config.focus_scale;
		info!("entering {id}");
		let next = self.transition(view, entered, &mut effects);
		effects.push(Effect::Focus {
			node: id,
			scale: self.config.focus_scale,
		});
		(next, effects)
	}

	fn transition(
		&self,
		from: &LayerViewState,
		mut to: LayerViewState,
		effects: &mut Vec<Effect>,
	) -> LayerViewState {
		// Whatever was under the pointer is about to be replaced.
		to.hovered = None;
		if !from.same_view(&to) {
			effects.push(Effect::Transition {
				from: from.clone(),
				to: to.clone(),
			});
		}
		to
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::collections::{HashMap, HashSet};

	struct TestScene {
		visible: HashSet<&'static str>,
		parents: HashMap<&'static str, &'static str>,
	}

	impl TestScene {
		fn new() -> Self {
			Self {
				visible: HashSet::from(["alice", "bob", "photo", "film"]),
				parents: HashMap::from([("photo", "alice"), ("film", "photo")]),
			}
		}
	}

	impl Scene for TestScene {
		fn is_visible(&self, id: &str) -> bool {
			self.visible.contains(id)
		}

		fn has_children(&self, id: &str) -> bool {
			self.parents.values().any(|p| *p == id)
		}

		fn parent_of(&self, id: &str) -> Option<String> {
			self.parents.get(id).map(|p| p.to_string())
		}
	}

	fn controller() -> InteractionController {
		InteractionController::new(&VisualizationConfig::default())
	}

	fn transitions(effects: &[Effect]) -> usize {
		effects
			.iter()
			.filter(|e| matches!(e, Effect::Transition { .. }))
			.count()
	}

	#[test]
	fn hover_tracks_visible_nodes_only() {
		let mut c = controller();
		let scene = TestScene::new();
		let (view, _) = c.handle(&LayerViewState::default(), Interaction::Hover("alice".into()), 0.0, &scene);
		assert_eq!(view.hovered.as_deref(), Some("alice"));
		let (view, _) = c.handle(&view, Interaction::Hover("bob".into()), 0.0, &scene);
		assert_eq!(view.hovered.as_deref(), Some("bob"));
		let (view, _) = c.handle(&view, Interaction::Blur, 0.0, &scene);
		assert_eq!(view.hovered, None);
	}

	#[test]
	fn hovering_a_hidden_node_drops_the_previous_hover() {
		let mut c = controller();
		let scene = TestScene::new();
		let (view, _) = c.handle(&LayerViewState::default(), Interaction::Hover("alice".into()), 0.0, &scene);
		let (view, _) = c.handle(&view, Interaction::Hover("nobody".into()), 0.0, &scene);
		assert_eq!(view.hovered, None);
		// zooming in afterwards has nothing to enter
		let (view, effects) = c.handle(&view, Interaction::Zoom(1.6), 0.0, &scene);
		assert_eq!(view.layer, Layer::Outer);
		assert_eq!(transitions(&effects), 0);
	}

	#[test]
	fn zoom_in_over_hovered_node_enters_it() {
		let mut c = controller();
		let scene = TestScene::new();
		let view = LayerViewState { hovered: Some("alice".into()), ..Default::default() };
		let (view, effects) = c.handle(&view, Interaction::Zoom(1.6), 0.0, &scene);
		assert_eq!(view.layer, Layer::Inner);
		assert_eq!(view.active_parent.as_deref(), Some("alice"));
		assert_eq!(transitions(&effects), 1);
	}

	#[test]
	fn zoom_in_without_hover_stays_outer() {
		let mut c = controller();
		let (view, effects) = c.handle(&LayerViewState::default(), Interaction::Zoom(3.0), 0.0, &TestScene::new());
		assert_eq!(view.layer, Layer::Outer);
		assert_eq!(view.zoom, 3.0);
		assert!(effects.is_empty());
	}

	#[test]
	fn second_click_within_window_is_a_double_click() {
		let mut c = controller();
		let scene = TestScene::new();
		let view = LayerViewState::default();
		let (view, effects) = c.handle(&view, Interaction::Click("alice".into()), 1000.0, &scene);
		assert!(effects.is_empty());
		assert!(c.has_pending_click());

		let (view, effects) = c.handle(&view, Interaction::Click("alice".into()), 1200.0, &scene);
		assert!(!c.has_pending_click());
		assert_eq!(view.layer, Layer::Inner);
		assert_eq!(transitions(&effects), 1);
		assert!(effects.contains(&Effect::Focus { node: "alice".into(), scale: 1.0 }));
		assert!(!effects.iter().any(|e| matches!(e, Effect::Select(_))));
		assert!(c.cooldown_active(1300.0));
		assert!(!c.cooldown_active(1900.0));
	}

	#[test]
	fn slow_clicks_are_two_single_clicks() {
		let mut c = controller();
		let scene = TestScene::new();
		let view = LayerViewState::default();
		let (view, _) = c.handle(&view, Interaction::Click("alice".into()), 0.0, &scene);
		let (view, effects) = c.handle(&view, Interaction::Click("alice".into()), 301.0, &scene);
		assert_eq!(effects, vec![Effect::Select("alice".into())]);
		assert_eq!(view.layer, Layer::Outer);

		let (_, effects) = c.handle(&view, Interaction::Tick, 700.0, &scene);
		assert_eq!(effects, vec![Effect::Select("alice".into())]);
		assert!(!c.has_pending_click());
	}

	#[test]
	fn tick_inside_window_keeps_click_pending() {
		let mut c = controller();
		let scene = TestScene::new();
		let (view, _) = c.handle(&LayerViewState::default(), Interaction::Click("bob".into()), 0.0, &scene);
		let (_, effects) = c.handle(&view, Interaction::Tick, 100.0, &scene);
		assert!(effects.is_empty());
		assert!(c.has_pending_click());
	}

	#[test]
	fn clicks_on_missing_nodes_are_ignored() {
		let mut c = controller();
		let scene = TestScene::new();
		let view = LayerViewState::default();
		let (next, effects) = c.handle(&view, Interaction::Click("gone".into()), 0.0, &scene);
		assert_eq!(next, view);
		assert!(effects.is_empty());
		let (next, effects) = c.handle(&view, Interaction::DoubleClick("gone".into()), 0.0, &scene);
		assert_eq!(next, view);
		assert!(effects.is_empty());
	}

	#[test]
	fn cooldown_blocks_zoom_switch_after_explicit_enter() {
		let mut c = controller();
		let scene = TestScene::new();
		let (view, _) = c.handle(&LayerViewState::default(), Interaction::DoubleClick("alice".into()), 0.0, &scene);
		assert_eq!(view.layer, Layer::Inner);

		let (view, effects) = c.handle(&view, Interaction::Zoom(0.3), 200.0, &scene);
		assert!(effects.is_empty());
		assert_eq!(view.layer, Layer::Inner);

		let (view, effects) = c.handle(&view, Interaction::Zoom(0.3), 700.0, &scene);
		assert_eq!(transitions(&effects), 1);
		assert_eq!(view.layer, Layer::Outer);
	}

	#[test]
	fn inner_double_click_drills_into_nodes_with_children() {
		let mut c = controller();
		let scene = TestScene::new();
		let mut view = LayerViewState::default();
		view.enter("alice");

		let (next, effects) = c.handle(&view, Interaction::DoubleClick("film".into()), 0.0, &scene);
		assert_eq!(next, view);
		assert!(effects.is_empty());

		let (next, _) = c.handle(&view, Interaction::DoubleClick("photo".into()), 0.0, &scene);
		assert_eq!(next.active_parent.as_deref(), Some("photo"));
	}

	#[test]
	fn go_back_walks_up_then_out() {
		let mut c = controller();
		let scene = TestScene::new();
		let mut view = LayerViewState::default();
		view.enter("photo");

		let (view, effects) = c.handle(&view, Interaction::GoBack, 0.0, &scene);
		assert_eq!(view.active_parent.as_deref(), Some("alice"));
		assert_eq!(transitions(&effects), 1);

		let (view, _) = c.handle(&view, Interaction::GoBack, 0.0, &scene);
		assert_eq!(view.layer, Layer::Outer);

		let (view, effects) = c.handle(&view, Interaction::GoBack, 0.0, &scene);
		assert_eq!(view.layer, Layer::Outer);
		assert!(effects.is_empty());
	}

	#[test]
	fn sweep_between_thresholds_never_switches() {
		let mut c = controller();
		let scene = TestScene::new();
		let mut view = LayerViewState { hovered: Some("alice".into()), ..Default::default() };
		let mut switches = 0;
		let up = (50..=150).map(|z| z as f64 / 100.0);
		let down = (50..=150).rev().map(|z| z as f64 / 100.0);
		for (i, zoom) in up.chain(down).enumerate() {
			let (next, effects) = c.handle(&view, Interaction::Zoom(zoom), i as f64 * 16.0, &scene);
			switches += transitions(&effects);
			view = next;
		}
		assert_eq!(switches, 0);
	}

	#[test]
	fn sweep_past_both_thresholds_switches_once_each_way() {
		let mut c = controller();
		let scene = TestScene::new();
		let mut view = LayerViewState { hovered: Some("alice".into()), ..Default::default() };
		let mut switches = 0;
		let up = (30..=200).map(|z| z as f64 / 100.0);
		let down = (30..=200).rev().map(|z| z as f64 / 100.0);
		for (i, zoom) in up.chain(down).enumerate() {
			if view.hovered.is_none() {
				view.hovered = Some("alice".into());
			}
			let (next, effects) = c.handle(&view, Interaction::Zoom(zoom), i as f64 * 16.0, &scene);
			switches += transitions(&effects);
			view = next;
		}
		assert_eq!(switches, 2);
		assert_eq!(view.layer, Layer::Outer);
	}

	proptest! {
		#[test]
		fn layer_switches_respect_hysteresis(zooms in prop::collection::vec(0.05f64..3.0, 1..200)) {
			let config = VisualizationConfig::default();
			let mut c = InteractionController::new(&config);
			let scene = TestScene::new();
			let mut view = LayerViewState::default();
			for (i, zoom) in zooms.into_iter().enumerate() {
				view.hovered = Some("alice".into());
				let before = view.layer;
				let (next, effects) = c.handle(&view, Interaction::Zoom(zoom), i as f64 * 16.0, &scene);
				if transitions(&effects) > 0 {
					match before {
						Layer::Outer => prop_assert!(zoom > config.zoom_in_threshold),
						Layer::Inner => prop_assert!(zoom < config.zoom_out_threshold),
					}
				} else {
					prop_assert_eq!(next.layer, before);
				}
				view = next;
			}
		}
	}
}
