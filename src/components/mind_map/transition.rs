//! Cross-fade between layers.
//!
//! A transition adds ghost copies of the next layer next to the current one,
//! fans them out from a start point while fading them in, and finally swaps
//! the store over to the real next layer. Each transition has a generation;
//! callbacks carrying an older generation are ignored.

use std::collections::{HashMap, HashSet};
use std::f64::consts::TAU;

use log::debug;

use super::config::VisualizationConfig;
use super::resolver::ResolvedLayer;
use super::store::{GraphStore, VisualEdge, VisualNode};
use super::types::Position;

const GHOST_PREFIX: &str = "~ghost";
const GHOST_EDGE_OPACITY: f64 = 0.8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepOutcome {
	/// The generation was superseded or nothing is running.
	Stale,
	Animating { progress: f64 },
	/// The store now holds the next layer.
	Committed,
}

#[derive(Debug)]
struct Transition {
	start: Position,
	step: u32,
	ghost_nodes: Vec<VisualNode>,
	/// Real id behind each ghost node.
	origins: Vec<String>,
	ghost_edges: Vec<VisualEdge>,
	next: ResolvedLayer,
}

#[derive(Debug)]
pub struct Animator {
	generation: u64,
	steps: u32,
	spread: f64,
	active: Option<Transition>,
}

impl Default for Animator {
	fn default() -> Self {
		Self::new(&VisualizationConfig::default())
	}
}

impl Animator {
	pub fn new(config: &VisualizationConfig) -> Self {
		Self {
			generation: 0,
			steps: config.fade_steps.max(1),
			spread: config.ghost_spread,
			active: None,
		}
	}

	pub fn generation(&self) -> u64 {
		self.generation
	}

	pub fn is_running(&self) -> bool {
		self.active.is_some()
	}

	pub fn steps(&self) -> u32 {
		self.steps
	}

	/// Start a transition to `next`, superseding any transition in flight.
	///
	/// Returns the generation the caller must pass to [`Animator::step`].
	pub fn begin(&mut self, store: &mut GraphStore, next: ResolvedLayer, start: Position) -> u64 {
		self.cancel(store);
		self.generation += 1;
		let generation = self.generation;

		let mut ghost_ids: HashMap<&str, String> = HashMap::new();
		let mut taken: HashSet<String> = HashSet::new();
		let mut ghost_nodes = Vec::with_capacity(next.nodes.len());
		let mut origins = Vec::with_capacity(next.nodes.len());
		for n in &next.nodes {
			if ghost_ids.contains_key(n.id.as_str()) {
				continue;
			}
			let id = unique_ghost_id(store, &mut taken, format!("{GHOST_PREFIX}{generation}:{}", n.id));
			ghost_ids.insert(n.id.as_str(), id.clone());
			origins.push(n.id.clone());
			ghost_nodes.push(VisualNode {
				id,
				position: Some(start),
				opacity: 0.0,
				physics: false,
				ghost: true,
				..n.clone()
			});
		}
		let ghost_edges: Vec<VisualEdge> = next
			.edges
			.iter()
			.enumerate()
			.filter_map(|(idx, e)| {
				let from = ghost_ids.get(e.from.as_str())?;
				let to = ghost_ids.get(e.to.as_str())?;
				let id = unique_ghost_id(store, &mut taken, format!("{GHOST_PREFIX}{generation}:edge:{idx}"));
				Some(VisualEdge {
					id,
					from: from.clone(),
					to: to.clone(),
					opacity: 0.0,
					ghost: true,
					..e.clone()
				})
			})
			.collect();

		debug!(
			"transition {generation}: {} ghost nodes, {} ghost edges from ({:.1}, {:.1})",
			ghost_nodes.len(),
			ghost_edges.len(),
			start.x,
			start.y
		);
		store.upsert_nodes(ghost_nodes.iter().cloned());
		store.upsert_edges(ghost_edges.iter().cloned());
		self.active = Some(Transition {
			start,
			step: 0,
			ghost_nodes,
			origins,
			ghost_edges,
			next,
		});
		generation
	}

	/// Advance the transition of `generation` by one step.
	pub fn step(&mut self, generation: u64, store: &mut GraphStore) -> StepOutcome {
		if generation != self.generation {
			return StepOutcome::Stale;
		}
		let Some(transition) = self.active.as_mut() else {
			return StepOutcome::Stale;
		};

		transition.step += 1;
		let progress = (transition.step as f64 / self.steps as f64).min(1.0);
		let count = transition.ghost_nodes.len().max(1) as f64;
		let radius = self.spread * progress;
		for (index, node) in transition.ghost_nodes.iter_mut().enumerate() {
			let angle = index as f64 / count * TAU;
			node.position = Some(Position::new(
				transition.start.x + angle.cos() * radius,
				transition.start.y + angle.sin() * radius,
			));
			node.opacity = progress;
			node.physics = progress > 0.5;
		}
		for edge in &mut transition.ghost_edges {
			edge.opacity = GHOST_EDGE_OPACITY * progress;
		}
		store.upsert_nodes(transition.ghost_nodes.iter().cloned());
		store.upsert_edges(transition.ghost_edges.iter().cloned());

		if transition.step < self.steps {
			return StepOutcome::Animating { progress };
		}
		if let Some(transition) = self.active.take() {
			commit(store, transition);
		}
		debug!("transition {generation} committed");
		StepOutcome::Committed
	}

	/// Drop the transition in flight and its ghosts. Returns whether one was running.
	pub fn cancel(&mut self, store: &mut GraphStore) -> bool {
		let Some(transition) = self.active.take() else {
			return false;
		};
		let ids = transition
			.ghost_nodes
			.iter()
			.map(|n| n.id.as_str())
			.chain(transition.ghost_edges.iter().map(|e| e.id.as_str()));
		store.remove_by_ids(ids);
		debug!("transition {} cancelled at step {}", self.generation, transition.step);
		true
	}
}

fn unique_ghost_id(store: &GraphStore, taken: &mut HashSet<String>, mut id: String) -> String {
	while store.node(&id).is_some() || store.edge(&id).is_some() || taken.contains(&id) {
		id.push('~');
	}
	taken.insert(id.clone());
	id
}

/// Swap the store over to the real next layer, de-duplicated by id.
///
/// Every committed node starts where its ghost ended, so the layer does not
/// jump away from the fan the user just watched.
fn commit(store: &mut GraphStore, transition: Transition) {
	let Transition {
		ghost_nodes,
		origins,
		next,
		..
	} = transition;
	let landed: HashMap<String, Position> = origins
		.into_iter()
		.zip(&ghost_nodes)
		.filter_map(|(origin, ghost)| Some((origin, ghost.position?)))
		.collect();

	let mut seen = HashSet::new();
	let nodes: Vec<VisualNode> = next
		.nodes
		.into_iter()
		.filter(|n| seen.insert(n.id.clone()))
		.map(|mut n| {
			if let Some(at) = landed.get(&n.id) {
				n.position = Some(*at);
			}
			n
		})
		.collect();
	let mut seen = HashSet::new();
	let edges: Vec<VisualEdge> = next
		.edges
		.into_iter()
		.filter(|e| seen.insert(e.id.clone()))
		.collect();
	store.replace_all(nodes, edges);
}
