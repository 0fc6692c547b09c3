use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::config::VisualizationConfig;
use super::interaction::Interaction;
use super::render;
use super::renderer::{ForceGraphRenderer, NetworkRenderer};
use super::session::VisualizationSession;
use super::transition::StepOutcome;
use super::types::{ConnectionMode, Layer, MindMap};

type Session = VisualizationSession<ForceGraphRenderer>;
type Shared<T> = Rc<RefCell<Option<T>>>;

/// Pointer travel, in pixels, below which a press counts as a click.
const CLICK_SLOP: f64 = 4.0;
const MAX_FRAME_DT: f64 = 0.05;

#[derive(Default)]
struct Timers {
	fade: Option<(u64, i32, Closure<dyn FnMut()>)>,
	settle: Option<(u64, i32, Closure<dyn FnMut()>)>,
}

impl Timers {
	fn clear(&mut self) {
		let Some(window) = web_sys::window() else {
			return;
		};
		if let Some((_, handle, _)) = self.fade.take() {
			window.clear_interval_with_handle(handle);
		}
		if let Some((_, handle, _)) = self.settle.take() {
			window.clear_timeout_with_handle(handle);
		}
	}

	fn stop_fade(&self, generation: u64) {
		if let (Some(window), Some((owner, handle, _))) = (web_sys::window(), self.fade.as_ref()) {
			if *owner == generation {
				window.clear_interval_with_handle(*handle);
			}
		}
	}
}

/// Reactive outputs shown next to the canvas.
#[derive(Clone, Copy)]
struct Indicators {
	caption: WriteSignal<String>,
	inner: WriteSignal<bool>,
	legend: WriteSignal<Vec<(String, &'static str)>>,
}

impl Indicators {
	fn update(&self, session: &Session) {
		let view = session.view();
		let caption = match (view.layer, view.active_parent.as_deref()) {
			(Layer::Inner, Some(parent)) => {
				let label = session.document().node(parent).map_or(parent, |n| n.label.as_str());
				format!("Personal layer: {label}")
			}
			_ => "Group layer".to_owned(),
		};
		self.caption.set(caption);
		self.inner.set(view.layer == Layer::Inner);
		let legend = match session.mode() {
			ConnectionMode::Tags => session.tag_legend(),
			ConnectionMode::Explicit => Vec::new(),
		};
		self.legend.set(legend);
	}
}

/// Drive the fade of `generation` with an interval, then let the layout
/// settle before freezing it. Replaces timers of any earlier transition.
fn run_transition(
	session: &Shared<Session>,
	timers: &Rc<RefCell<Timers>>,
	indicators: Indicators,
	generation: u64,
) {
	let Some(window) = web_sys::window() else {
		return;
	};
	let (interval, settle_delay) = match session.borrow().as_ref() {
		Some(s) => (s.config().fade_interval_ms, s.config().settle_delay_ms),
		None => return,
	};
	timers.borrow_mut().clear();

	let (session_fade, timers_fade) = (session.clone(), timers.clone());
	let fade = Closure::<dyn FnMut()>::new(move || {
		let outcome = match session_fade.borrow_mut().as_mut() {
			Some(s) => s.advance(generation),
			None => StepOutcome::Stale,
		};
		match outcome {
			StepOutcome::Animating { .. } => {}
			StepOutcome::Stale => timers_fade.borrow().stop_fade(generation),
			StepOutcome::Committed => {
				timers_fade.borrow().stop_fade(generation);
				if let Some(s) = session_fade.borrow().as_ref() {
					indicators.update(s);
				}
				arm_settle(&session_fade, &timers_fade, generation, settle_delay);
			}
		}
	});
	match window.set_interval_with_callback_and_timeout_and_arguments_0(
		fade.as_ref().unchecked_ref(),
		interval as i32,
	) {
		Ok(handle) => timers.borrow_mut().fade = Some((generation, handle, fade)),
		Err(err) => warn!("could not schedule transition {generation}: {err:?}"),
	}
}

fn arm_settle(session: &Shared<Session>, timers: &Rc<RefCell<Timers>>, generation: u64, delay: u32) {
	let Some(window) = web_sys::window() else {
		return;
	};
	let session = session.clone();
	let settle = Closure::<dyn FnMut()>::new(move || {
		if let Some(s) = session.borrow_mut().as_mut() {
			s.finish_settle(generation);
		}
	});
	match window.set_timeout_with_callback_and_timeout_and_arguments_0(
		settle.as_ref().unchecked_ref(),
		delay as i32,
	) {
		Ok(handle) => timers.borrow_mut().settle = Some((generation, handle, settle)),
		Err(err) => warn!("could not schedule settle for {generation}: {err:?}"),
	}
}

fn canvas_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

/// Everything released on unmount.
struct Teardown {
	session: Shared<Session>,
	timers: Rc<RefCell<Timers>>,
	alive: Rc<Cell<bool>>,
	resize_cb: Shared<Closure<dyn FnMut()>>,
}

impl Teardown {
	fn run(&self) {
		self.alive.set(false);
		self.timers.borrow_mut().clear();
		if let Some(s) = self.session.borrow_mut().as_mut() {
			s.dispose();
		}
		if let (Some(window), Some(cb)) = (web_sys::window(), self.resize_cb.borrow().as_ref()) {
			let _ = window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
	}
}

/// Two-layer mind map on a canvas: group roots outside, one person's nodes inside.
///
/// Double-click a group (or zoom in while hovering it) to open it; zoom out
/// or press "Back" to leave.
#[component]
pub fn MindMapCanvas(
	#[prop(into)] document: Signal<MindMap>,
	/// Explicit or tag-derived edges; switching keeps the current layer.
	#[prop(into, default = Signal::stored(ConnectionMode::default()))]
	mode: Signal<ConnectionMode>,
	#[prop(optional)] config: VisualizationConfig,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	/// Called with the node id of each confirmed single click.
	#[prop(optional, into)]
	on_select: Option<Callback<String>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let session: Shared<Session> = Rc::new(RefCell::new(None));
	let timers = Rc::new(RefCell::new(Timers::default()));
	let animate: Shared<Closure<dyn FnMut()>> = Rc::new(RefCell::new(None));
	let resize_cb: Shared<Closure<dyn FnMut()>> = Rc::new(RefCell::new(None));
	let alive = Rc::new(Cell::new(true));

	let (caption, set_caption) = signal(String::from("Group layer"));
	let (inner, set_inner) = signal(false);
	let (legend, set_legend) = signal(Vec::<(String, &'static str)>::new());
	let indicators = Indicators {
		caption: set_caption,
		inner: set_inner,
		legend: set_legend,
	};

	let teardown = StoredValue::new_local(Teardown {
		session: session.clone(),
		timers: timers.clone(),
		alive: alive.clone(),
		resize_cb: resize_cb.clone(),
	});
	on_cleanup(move || {
		teardown.try_with_value(Teardown::run);
	});

	let (session_init, timers_init, animate_init, resize_init, alive_init) = (
		session.clone(),
		timers.clone(),
		animate.clone(),
		resize_cb.clone(),
		alive.clone(),
	);
	Effect::new(move |_| {
		let document = document.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Ok(Some(ctx)) = canvas.get_context("2d") else {
			warn!("canvas has no 2d context");
			return;
		};
		let Ok(ctx) = ctx.dyn_into::<CanvasRenderingContext2d>() else {
			return;
		};

		// A new document replaces the running session.
		timers_init.borrow_mut().clear();
		if let Some(old) = session_init.borrow_mut().as_mut() {
			old.dispose();
		}
		let renderer = ForceGraphRenderer::new(w, h, &config);
		let fresh = VisualizationSession::new(document, config.clone(), mode.get_untracked(), renderer);
		indicators.update(&fresh);
		*session_init.borrow_mut() = Some(fresh);

		if fullscreen && resize_init.borrow().is_none() {
			let (session_resize, canvas_resize) = (session_init.clone(), canvas.clone());
			*resize_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(s) = session_resize.borrow_mut().as_mut() {
					s.renderer_mut().resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		if animate_init.borrow().is_some() {
			return;
		}
		let (session_anim, animate_inner, alive_anim) =
			(session_init.clone(), animate_init.clone(), alive_init.clone());
		let mut last_frame = js_sys::Date::now();
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if !alive_anim.get() {
				return;
			}
			let now = js_sys::Date::now();
			let dt = ((now - last_frame) / 1000.0).clamp(0.0, MAX_FRAME_DT);
			last_frame = now;

			let selected = match session_anim.borrow_mut().as_mut() {
				Some(s) => {
					s.frame(dt, now);
					render::render(s.renderer(), &ctx);
					s.take_selection()
				}
				None => None,
			};
			if let (Some(id), Some(cb)) = (selected, on_select) {
				cb.run(id);
			}

			if let (Some(window), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let session_mode = session.clone();
	Effect::new(move |_| {
		let mode = mode.get();
		if let Some(s) = session_mode.borrow_mut().as_mut() {
			s.set_mode(mode);
			indicators.update(s);
		}
	});

	let dispatch = {
		let (session, timers) = (session.clone(), timers.clone());
		move |event: Interaction| {
			let now = js_sys::Date::now();
			let (started, selected) = {
				let mut guard = session.borrow_mut();
				let Some(s) = guard.as_mut() else {
					return;
				};
				let started = s.dispatch(event, now);
				indicators.update(s);
				(started, s.take_selection())
			};
			if let (Some(id), Some(cb)) = (selected, on_select) {
				cb.run(id);
			}
			if let Some(generation) = started {
				debug!("transition {generation} scheduled");
				run_transition(&session, &timers, indicators, generation);
			}
		}
	};

	let state_md = session.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = canvas_point(&canvas.into(), &ev);

		if let Some(s) = state_md.borrow_mut().as_mut() {
			let r = s.renderer_mut();
			r.drag.moved = false;
			if let Some(idx) = r.node_at_position(x, y) {
				r.drag.active = true;
				r.drag.node_idx = Some(idx);
				r.drag.start_x = x;
				r.drag.start_y = y;
				let mut start = (0.0, 0.0);
				r.graph.visit_nodes(|node| {
					if node.index() == idx {
						start = (node.x(), node.y());
					}
				});
				(r.drag.node_start_x, r.drag.node_start_y) = start;
			} else {
				r.pan.active = true;
				r.pan.start_x = x;
				r.pan.start_y = y;
				r.pan.transform_start_x = r.transform.x;
				r.pan.transform_start_y = r.transform.y;
			}
		}
	};

	let (state_mm, dispatch_mm) = (session.clone(), dispatch.clone());
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = canvas_point(&canvas.into(), &ev);

		let hover_change = {
			let mut guard = state_mm.borrow_mut();
			let Some(s) = guard.as_mut() else {
				return;
			};
			let shown = s.view().hovered.clone();
			let r = s.renderer_mut();
			let mut change = None;
			if !r.drag.active {
				let hovered = r.node_at_position(x, y);
				r.set_hover(hovered);
				let id = hovered.and_then(|idx| r.node_id(idx)).map(str::to_owned);
				if id != shown {
					change = Some(id.map_or(Interaction::Blur, Interaction::Hover));
				}
			}

			if r.drag.active {
				let (dx, dy) = (x - r.drag.start_x, y - r.drag.start_y);
				if (dx * dx + dy * dy).sqrt() > CLICK_SLOP {
					r.drag.moved = true;
				}
				if let (Some(idx), true) = (r.drag.node_idx, r.drag.moved) {
					let (nx, ny) = (
						r.drag.node_start_x + (dx / r.transform.k) as f32,
						r.drag.node_start_y + (dy / r.transform.k) as f32,
					);
					r.graph.visit_nodes_mut(|node| {
						if node.index() == idx {
							node.data.x = nx;
							node.data.y = ny;
							node.data.is_anchor = true;
						}
					});
				}
			} else if r.pan.active {
				r.transform.x = r.pan.transform_start_x + (x - r.pan.start_x);
				r.transform.y = r.pan.transform_start_y + (y - r.pan.start_y);
			}
			change
		};
		if let Some(event) = hover_change {
			dispatch_mm(event);
		}
	};

	let (state_mu, dispatch_mu) = (session.clone(), dispatch.clone());
	let on_mouseup = move |_: MouseEvent| {
		let clicked = {
			let mut guard = state_mu.borrow_mut();
			let Some(s) = guard.as_mut() else {
				return;
			};
			let r = s.renderer_mut();
			let mut clicked = None;
			if let (true, Some(idx)) = (r.drag.active, r.drag.node_idx) {
				if r.drag.moved {
					r.pin(idx);
				} else {
					clicked = r.node_id(idx).map(str::to_owned);
				}
			}
			r.drag.active = false;
			r.drag.node_idx = None;
			r.pan.active = false;
			clicked
		};
		if let Some(id) = clicked {
			dispatch_mu(Interaction::Click(id));
		}
	};

	let (state_ml, dispatch_ml) = (session.clone(), dispatch.clone());
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(s) = state_ml.borrow_mut().as_mut() {
			let r = s.renderer_mut();
			r.drag.active = false;
			r.drag.node_idx = None;
			r.pan.active = false;
			r.set_hover(None);
		}
		dispatch_ml(Interaction::Blur);
	};

	let (state_wh, dispatch_wh) = (session.clone(), dispatch.clone());
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = canvas_point(&canvas.into(), &ev);

		let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
		let scale = match state_wh.borrow_mut().as_mut() {
			Some(s) => s.renderer_mut().zoom_at(x, y, factor),
			None => return,
		};
		dispatch_wh(Interaction::Zoom(scale));
	};

	let dispatch_back = dispatch.clone();
	let on_back = move |_: MouseEvent| dispatch_back(Interaction::GoBack);

	view! {
		<div class="mind-map" style="position: relative; width: 100%; height: 100%;">
			<canvas
				node_ref=canvas_ref
				class="mind-map-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			<div class="layer-indicator">
				<span>{move || caption.get()}</span>
				<button
					class="layer-back"
					style:display=move || if inner.get() { "inline-block" } else { "none" }
					on:click=on_back
				>
					"Back"
				</button>
			</div>
			<ul class="tag-legend">
				{move || {
					legend
						.get()
						.into_iter()
						.map(|(tag, color)| {
							view! {
								<li>
									<span
										class="tag-swatch"
										style=format!("background: {color};")
									></span>
									{tag}
								</li>
							}
						})
						.collect_view()
				}}
			</ul>
		</div>
	}
}
