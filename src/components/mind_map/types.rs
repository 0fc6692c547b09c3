use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Color given to nodes whose document entry has none.
pub const DEFAULT_NODE_COLOR: &str = "#6EE7F9";

fn default_node_color() -> String {
	DEFAULT_NODE_COLOR.into()
}

/// A point in graph space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

impl Position {
	pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// A mind-map node as stored in a personal map or a board.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
	pub id: String,
	#[serde(default)]
	pub label: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default = "default_node_color")]
	pub color: String,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default)]
	pub layer: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub parent_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub x: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub y: Option<f64>,
	#[serde(default, alias = "radius", skip_serializing_if = "Option::is_none")]
	pub size: Option<f64>,
}

impl Node {
	pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			label: label.into(),
			description: None,
			color: default_node_color(),
			tags: Vec::new(),
			layer: 0,
			parent_id: None,
			x: None,
			y: None,
			size: None,
		}
	}

	pub fn with_tags<I, S>(mut self, tags: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.tags = tags.into_iter().map(Into::into).collect();
		self
	}

	pub fn with_color(mut self, color: impl Into<String>) -> Self {
		self.color = color.into();
		self
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	/// Attach this node below `parent`, one layer deeper.
	pub fn child_of(mut self, parent: &Node) -> Self {
		self.parent_id = Some(parent.id.clone());
		self.layer = parent.layer + 1;
		self
	}

	/// Parent id, treating an empty string as "no parent".
	pub fn parent(&self) -> Option<&str> {
		self.parent_id.as_deref().filter(|p| !p.is_empty())
	}

	pub fn position(&self) -> Option<Position> {
		match (self.x, self.y) {
			(Some(x), Some(y)) => Some(Position { x, y }),
			_ => None,
		}
	}

	/// Hover text: the description when present, else the label.
	pub fn title(&self) -> String {
		self.description
			.clone()
			.filter(|d| !d.is_empty())
			.unwrap_or_else(|| self.label.clone())
	}
}

/// A typed relationship between two nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
	#[serde(default)]
	pub id: String,
	pub from: String,
	pub to: String,
	#[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
	pub kind: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub color: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub label: Option<String>,
}

impl Edge {
	pub fn new(id: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			from: from.into(),
			to: to.into(),
			kind: None,
			color: None,
			label: None,
		}
	}

	pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
		self.kind = Some(kind.into());
		self
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	pub fn with_color(mut self, color: impl Into<String>) -> Self {
		self.color = Some(color.into());
		self
	}

	/// Grouping key: connection type, else label, else color.
	pub fn type_key(&self) -> &str {
		[&self.kind, &self.label, &self.color]
			.into_iter()
			.find_map(|v| v.as_deref().filter(|s| !s.is_empty()))
			.unwrap_or("default")
	}

	/// Unordered pair identity; `(a, b)` and `(b, a)` map to the same key.
	pub fn pair(&self) -> (&str, &str) {
		ordered_pair(&self.from, &self.to)
	}

	pub fn touches(&self, id: &str) -> bool {
		self.from == id || self.to == id
	}
}

pub(crate) fn ordered_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
	if a <= b { (a, b) } else { (b, a) }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionType {
	pub id: String,
	pub name: String,
	pub color: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
	pub id: String,
	pub name: String,
	pub color: String,
}

/// A personal mind map.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindMap {
	#[serde(default, alias = "_id")]
	pub id: String,
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub context: String,
	#[serde(default)]
	pub nodes: Vec<Node>,
	#[serde(default)]
	pub edges: Vec<Edge>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub connection_types: Option<Vec<ConnectionType>>,
	#[serde(default)]
	pub legend: IndexMap<String, LegendEntry>,
}

/// A collaborative board; node coordinates may be missing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
	#[serde(default, alias = "_id")]
	pub id: String,
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub nodes: Vec<Node>,
	#[serde(default)]
	pub edges: Vec<Edge>,
	#[serde(default)]
	pub legend: IndexMap<String, LegendEntry>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub connection_types: Option<Vec<ConnectionType>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Layer {
	/// Root nodes only.
	#[default]
	Outer,
	/// Descendants of the active parent.
	Inner,
}

/// Where displayed edges come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionMode {
	/// Edges stored in the document.
	#[default]
	Explicit,
	/// Edges derived from tags shared between visible nodes.
	Tags,
}

/// Ephemeral view state driving the layer resolver.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerViewState {
	pub layer: Layer,
	pub active_parent: Option<String>,
	pub zoom: f64,
	pub hovered: Option<String>,
}

impl Default for LayerViewState {
	fn default() -> Self {
		Self {
			layer: Layer::Outer,
			active_parent: None,
			zoom: 1.0,
			hovered: None,
		}
	}
}

impl LayerViewState {
	pub fn is_personal_layer(&self) -> bool {
		self.layer == Layer::Inner
	}

	/// Same layer and parent; zoom and hover are ignored.
	pub fn same_view(&self, other: &LayerViewState) -> bool {
		self.layer == other.layer && self.active_parent == other.active_parent
	}
}
