//! Tag colors and edges synthesized from shared tags.

use std::collections::{BTreeSet, HashMap};

use super::store::{Curve, VisualEdge};
use super::types::{Node, ordered_pair};

pub const DEFAULT_TAG_COLOR: &str = "#95A5A6";
pub const TAG_EDGE_WIDTH: f64 = 3.0;
pub const TAG_EDGE_ROUNDNESS: f64 = 0.1;

const TAG_COLORS: &[(&str, &str)] = &[
	// hobbies
	("hobby", "#FF6B6B"),
	("creative", "#FF8C42"),
	("art", "#FF4757"),
	("music", "#FF6348"),
	("gaming", "#FF9FF3"),
	("sports", "#FFA502"),
	// skills
	("skill", "#96CEB4"),
	("technology", "#5F27CD"),
	("career", "#00D2D3"),
	("programming", "#54A0FF"),
	// memories
	("memory", "#45B7D1"),
	("travel", "#48DBFB"),
	("culture", "#0ABDE3"),
	// life
	("life-skill", "#10AC84"),
	("entertainment", "#EE5A6F"),
];

const FALLBACK_PALETTE: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

/// Display color for a tag. Same tag, same color, everywhere.
pub fn tag_color(tag: &str) -> &'static str {
	let normalized = tag.trim().to_lowercase();
	if normalized.is_empty() {
		return DEFAULT_TAG_COLOR;
	}
	if let Some((_, color)) = TAG_COLORS.iter().find(|(name, _)| *name == normalized) {
		return color;
	}
	FALLBACK_PALETTE[(fnv1a(&normalized) % FALLBACK_PALETTE.len() as u64) as usize]
}

// Stable across runs and platforms, unlike `DefaultHasher`.
fn fnv1a(s: &str) -> u64 {
	s.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
		(hash ^ byte as u64).wrapping_mul(0x0100_0000_01b3)
	})
}

/// Sorted, de-duplicated tags across `nodes`.
pub fn unique_tags<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Vec<String> {
	nodes
		.into_iter()
		.flat_map(|n| n.tags.iter().cloned())
		.collect::<BTreeSet<_>>()
		.into_iter()
		.collect()
}

/// Tag and color pairs for a legend.
pub fn tag_legend<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Vec<(String, &'static str)> {
	unique_tags(nodes)
		.into_iter()
		.map(|tag| {
			let color = tag_color(&tag);
			(tag, color)
		})
		.collect()
}

/// One edge per tag shared by each unordered pair of distinct nodes.
///
/// Output depends only on the set of nodes: within a pair, tags follow the
/// order of the node with the smaller id, and edge ids use the ordered pair.
pub fn synthesize_tag_edges<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Vec<VisualEdge> {
	let nodes: Vec<&Node> = nodes.into_iter().collect();
	let mut per_pair: HashMap<(&str, &str), usize> = HashMap::new();
	let mut edges = Vec::new();

	for (i, a) in nodes.iter().enumerate() {
		for b in &nodes[i + 1..] {
			if a.id == b.id {
				continue;
			}
			let (lo, hi) = ordered_pair(&a.id, &b.id);
			let (first, second) = if a.id == lo { (a, b) } else { (b, a) };

			let mut seen = BTreeSet::new();
			for tag in first.tags.iter().filter(|t| second.tags.contains(t)) {
				if !seen.insert(tag.as_str()) {
					continue;
				}
				let index = per_pair.entry((lo, hi)).or_default();
				edges.push(VisualEdge {
					id: format!("tag:{lo}:{hi}:{tag}"),
					from: lo.to_owned(),
					to: hi.to_owned(),
					color: tag_color(tag).to_owned(),
					label: tag.clone(),
					width: TAG_EDGE_WIDTH,
					opacity: 1.0,
					curve: Curve::fan(*index, TAG_EDGE_ROUNDNESS),
					count: 1,
					ghost: false,
				});
				*index += 1;
			}
		}
	}
	edges
}
