use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::DefaultNodeIdx;
use web_sys::CanvasRenderingContext2d;

use super::renderer::ForceGraphRenderer;

const BACKGROUND: &str = "#1a1a2e";

struct Placed {
	x: f64,
	y: f64,
	radius: f64,
}

pub fn render(renderer: &ForceGraphRenderer, ctx: &CanvasRenderingContext2d) {
	ctx.set_global_alpha(1.0);
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, renderer.width, renderer.height);
	ctx.save();
	let _ = ctx.translate(renderer.transform.x, renderer.transform.y);
	let _ = ctx.scale(renderer.transform.k, renderer.transform.k);
	draw_edges(renderer, ctx);
	draw_nodes(renderer, ctx);
	ctx.restore();
}

fn draw_edges(renderer: &ForceGraphRenderer, ctx: &CanvasRenderingContext2d) {
	let k = renderer.transform.k;
	let t = renderer.emphasis();
	let has_highlight = renderer.emphasis_active();

	let mut placed: HashMap<DefaultNodeIdx, Placed> = HashMap::new();
	renderer.graph.visit_nodes(|node| {
		placed.insert(
			node.index(),
			Placed {
				x: node.x() as f64,
				y: node.y() as f64,
				radius: node.data.user_data.radius,
			},
		);
	});

	for edge in renderer.edges() {
		let (Some(a), Some(b)) = (placed.get(&edge.from), placed.get(&edge.to)) else {
			continue;
		};
		let (dx, dy) = (b.x - a.x, b.y - a.y);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 || edge.style.opacity <= 0.0 {
			continue;
		}

		let is_highlighted =
			has_highlight && renderer.is_emphasized(edge.from) && renderer.is_emphasized(edge.to);
		let (alpha, width) = if !has_highlight {
			(0.8, edge.style.width)
		} else if is_highlighted {
			(0.8 + 0.2 * t, edge.style.width * (1.0 + 0.3 * t))
		} else {
			(0.8 - 0.6 * t, edge.style.width * (1.0 - 0.3 * t))
		};

		let (ux, uy) = (dx / dist, dy / dist);
		let (x1, y1) = (a.x + ux * a.radius, a.y + uy * a.radius);
		let (x2, y2) = (b.x - ux * b.radius, b.y - uy * b.radius);
		// control point sits off the midpoint, perpendicular to the chord
		let bend = edge.style.curve.signed() * dist;
		let (cx, cy) = ((a.x + b.x) / 2.0 - uy * bend, (a.y + b.y) / 2.0 + ux * bend);

		ctx.set_global_alpha(alpha * edge.style.opacity);
		ctx.set_stroke_style_str(&edge.style.color);
		ctx.set_line_width(width / k.max(0.5));
		ctx.begin_path();
		ctx.move_to(x1, y1);
		ctx.quadratic_curve_to(cx, cy, x2, y2);
		ctx.stroke();

		if is_highlighted && t > 0.01 && !edge.style.label.is_empty() {
			// midpoint of the quadratic curve
			let (mx, my) = (
				0.25 * x1 + 0.5 * cx + 0.25 * x2,
				0.25 * y1 + 0.5 * cy + 0.25 * y2,
			);
			ctx.set_global_alpha(t * edge.style.opacity);
			ctx.set_fill_style_str("white");
			ctx.set_font(&format!("{}px sans-serif", 9.0 / k.max(0.5)));
			let _ = ctx.fill_text(&edge.style.label, mx + 2.0, my - 2.0);
		}
	}
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(renderer: &ForceGraphRenderer, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		renderer.emphasis_active(),
		renderer.emphasis(),
		renderer.transform.k,
	);

	renderer.graph.visit_nodes(|node| {
		let idx = node.index();
		if has_highlight && renderer.is_emphasized(idx) {
			return;
		}
		let info = &node.data.user_data;
		if info.opacity <= 0.0 {
			return;
		}
		let (x, y) = (node.x() as f64, node.y() as f64);
		let (alpha, radius) = (1.0 - 0.7 * t, info.radius * (1.0 - 0.15 * t));

		ctx.set_global_alpha(alpha * info.opacity);
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&info.color);
		ctx.fill();

		ctx.set_fill_style_str("rgba(255, 255, 255, 0.8)");
		ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
		let _ = ctx.fill_text(&info.label, x + radius + 3.0, y + 3.0);
	});
	ctx.set_global_alpha(1.0);

	if !has_highlight {
		return;
	}

	renderer.graph.visit_nodes(|node| {
		let idx = node.index();
		if !renderer.is_emphasized(idx) {
			return;
		}
		let info = &node.data.user_data;
		let (x, y) = (node.x() as f64, node.y() as f64);
		let is_hovered = renderer.is_focus(idx);
		let radius = if is_hovered {
			info.radius * (1.0 + 0.35 * t)
		} else {
			info.radius * (1.0 + 0.2 * t)
		};

		ctx.set_global_alpha(info.opacity);
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&info.color);
		ctx.fill();

		if is_hovered && t > 0.01 {
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 2.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(&format!("rgba(255, 255, 255, {})", 0.7 * t));
			ctx.set_line_width(1.5 / k);
			ctx.stroke();
		}

		ctx.set_fill_style_str("white");
		ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
		let _ = ctx.fill_text(&info.label, x + radius + 3.0, y + 3.0);

		// tooltip for the node under the cursor
		if is_hovered && t > 0.5 && !info.title.is_empty() && info.title != info.label {
			ctx.set_fill_style_str("rgba(255, 255, 255, 0.7)");
			ctx.set_font(&format!("{}px sans-serif", 8.0 / k.max(0.5)));
			let _ = ctx.fill_text(&info.title, x + radius + 3.0, y + 14.0 / k.max(0.5));
		}
	});
	ctx.set_global_alpha(1.0);
}
