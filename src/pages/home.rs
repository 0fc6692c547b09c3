use leptos::prelude::*;

use crate::components::mind_map::types::ConnectionType;
use crate::components::mind_map::{ConnectionMode, Edge, MindMapCanvas, MindMap, Node};

/// A small friend group: four people, each with a few tagged interests.
fn sample_map() -> MindMap {
	let people = [
		("alice", "Alice", "#F97316"),
		("bob", "Bob", "#22C55E"),
		("charlie", "Charlie", "#A855F7"),
		("diana", "Diana", "#EAB308"),
	];
	let interests: [(&str, &str, &[&str]); 12] = [
		("alice", "Kyoto trip", &["travel", "food"]),
		("alice", "Film cameras", &["photography", "art"]),
		("alice", "Trail running", &["sports", "outdoors"]),
		("bob", "Sourdough", &["food", "cooking"]),
		("bob", "Jazz guitar", &["music"]),
		("bob", "Alps hike", &["outdoors", "travel"]),
		("charlie", "Street photos", &["photography", "travel"]),
		("charlie", "Synth patches", &["music", "technology"]),
		("charlie", "Chess club", &["gaming"]),
		("diana", "Watercolour", &["art"]),
		("diana", "Marathon", &["sports", "fitness"]),
		("diana", "Ramen tour", &["food", "travel"]),
	];

	let mut nodes: Vec<Node> = people
		.iter()
		.map(|(id, label, color)| Node::new(*id, *label).with_color(*color))
		.collect();
	for (i, (owner, label, tags)) in interests.iter().enumerate() {
		let Some(parent) = nodes.iter().find(|n| n.id == *owner).cloned() else {
			continue;
		};
		nodes.push(
			Node::new(format!("{owner}-{i}"), *label)
				.child_of(&parent)
				.with_color(parent.color.clone())
				.with_tags(tags.iter().copied()),
		);
	}

	MindMap {
		id: "demo".into(),
		name: "Weekend crew".into(),
		context: "personal".into(),
		nodes,
		edges: vec![
			Edge::new("e1", "alice", "bob").with_kind("friends"),
			Edge::new("e2", "alice", "charlie").with_kind("friends"),
			Edge::new("e3", "bob", "diana").with_kind("family"),
			Edge::new("e4", "charlie", "diana").with_kind("colleagues"),
			Edge::new("e5", "alice", "diana").with_kind("colleagues"),
			Edge::new("e6", "alice", "bob").with_kind("colleagues"),
		],
		connection_types: Some(vec![
			ConnectionType {
				id: "friends".into(),
				name: "Friends".into(),
				color: "#60A5FA".into(),
				description: None,
			},
			ConnectionType {
				id: "family".into(),
				name: "Family".into(),
				color: "#F472B6".into(),
				description: None,
			},
			ConnectionType {
				id: "colleagues".into(),
				name: "Colleagues".into(),
				color: "#34D399".into(),
				description: Some("Met through work".into()),
			},
		]),
		..Default::default()
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let document = Signal::derive(sample_map);
	let (selected, set_selected) = signal(None::<String>);
	let (mode, set_mode) = signal(ConnectionMode::Tags);
	let toggle_mode = move |_: leptos::ev::MouseEvent| {
		set_mode.update(|m| {
			*m = match *m {
				ConnectionMode::Tags => ConnectionMode::Explicit,
				ConnectionMode::Explicit => ConnectionMode::Tags,
			}
		})
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<MindMapCanvas
					document=document
					mode=mode
					fullscreen=true
					on_select=move |id: String| set_selected.set(Some(id))
				/>
				<div class="graph-overlay">
					<h1>"Mind Map"</h1>
					<p class="subtitle">
						"Double-click a person to open their interests. Zoom out or press Back to return."
					</p>
					<button class="mode-toggle" on:click=toggle_mode>
						{move || match mode.get() {
							ConnectionMode::Tags => "Show relationships",
							ConnectionMode::Explicit => "Show shared interests",
						}}
					</button>
					<p class="selection">
						{move || selected.get().map(|id| format!("Selected: {id}"))}
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
