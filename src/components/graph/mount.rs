use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use leptos::task::spawn_local;
use log::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, Element, HtmlCanvasElement, HtmlElement, KeyboardEvent, MouseEvent,
	WheelEvent,
};

use super::config::GraphConfig;
use super::dom::{BrowserTimers, EventListener, RafScheduler, SurfaceGuard, local_point, now};
use super::error::GraphError;
use super::frame::FrameLoop;
use super::interaction::{GraphEvents, NavigationRequest};
use super::lifecycle::{GraphHandle, GraphKind, GraphMounter, MountRequest};
use super::neighborhood::{NeighborhoodParams, build_graph};
use super::popover::{PopoverService, preview_address};
use super::preview::DomPopoverHost;
use super::render::render;
use super::state::GraphState;
use super::theme::ThemeTokens;
use super::types::ContentIndex;

pub const LOCAL_SELECTOR: &str = ".graph-container";
pub const GLOBAL_SELECTOR: &str = ".global-graph-container";
pub const GLOBAL_OUTER_SELECTOR: &str = ".global-graph-outer";
const POPOVER_LAYER_CLASS: &str = "graph-popover-layer";
/// Canvas size used when a container has not been laid out yet.
const FALLBACK_SIZE: (f64, f64) = (800.0, 600.0);

/// Receives in-app navigation requests raised by a graph.
pub type Navigator = Rc<dyn Fn(NavigationRequest)>;

type SharedState = Rc<RefCell<GraphState>>;
type SharedPopover = Rc<RefCell<PopoverService<BrowserTimers>>>;

fn with_state<R>(state: &SharedState, f: impl FnOnce(&mut GraphState) -> R) -> Option<R> {
	match state.try_borrow_mut() {
		Ok(mut state) => Some(f(&mut state)),
		Err(_) => {
			warn!("graph state busy, dropping event");
			None
		}
	}
}

fn with_popover(popover: &SharedPopover, f: impl FnOnce(&mut PopoverService<BrowserTimers>)) {
	match popover.try_borrow_mut() {
		Ok(mut service) => f(&mut service),
		Err(_) => warn!("popover service busy, dropping event"),
	}
}

/// Hand a navigation to the host once the current listener has returned, so
/// the rebuild it triggers never tears down the closure that is running.
fn defer_navigation(navigator: &Navigator, request: Option<NavigationRequest>) {
	let Some(request) = request else {
		return;
	};
	let navigator = navigator.clone();
	spawn_local(async move { navigator(request) });
}

/// Client size of a container, falling back per axis when it is zero.
fn surface_size(client_width: i32, client_height: i32) -> (f64, f64) {
	let pick = |client: i32, fallback: f64| {
		if client > 0 { client as f64 } else { fallback }
	};
	(
		pick(client_width, FALLBACK_SIZE.0),
		pick(client_height, FALLBACK_SIZE.1),
	)
}

fn overlay_display(visible: bool) -> &'static str {
	if visible { "flex" } else { "none" }
}

fn document() -> Result<web_sys::Document, GraphError> {
	web_sys::window()
		.and_then(|w| w.document())
		.ok_or(GraphError::NoWindow)
}

/// Mounts graphs into the containers of the current document.
pub struct BrowserMounter {
	index: Arc<ContentIndex>,
	navigator: Navigator,
}

impl BrowserMounter {
	pub fn new(index: Arc<ContentIndex>, navigator: Navigator) -> Self {
		Self { index, navigator }
	}
}

impl GraphMounter for BrowserMounter {
	type Container = Element;

	fn containers(&self, kind: GraphKind) -> Vec<Element> {
		let selector = match kind {
			GraphKind::Local => LOCAL_SELECTOR,
			GraphKind::Global => GLOBAL_SELECTOR,
		};
		let Ok(found) = document().and_then(|d| Ok(d.query_selector_all(selector)?)) else {
			return Vec::new();
		};
		(0..found.length())
			.filter_map(|i| found.item(i)?.dyn_into::<Element>().ok())
			.collect()
	}

	fn mount(
		&self,
		container: &Element,
		request: MountRequest<'_>,
	) -> Result<GraphHandle, GraphError> {
		let raw = container
			.get_attribute("data-cfg")
			.ok_or(GraphError::MissingConfig)?;
		let config = GraphConfig::from_json(&raw)?;
		let data = build_graph(&self.index, request.focal, &NeighborhoodParams::from(&config));

		let document = document()?;
		let canvas: HtmlCanvasElement = document
			.create_element("canvas")?
			.dyn_into()
			.map_err(|_| GraphError::Surface("could not create a canvas".into()))?;
		let (width, height) = surface_size(container.client_width(), container.client_height());
		canvas.set_width(width as u32);
		canvas.set_height(height as u32);
		let _ = canvas.set_attribute("style", "display: block; cursor: grab;");
		let ctx: CanvasRenderingContext2d = canvas
			.get_context("2d")?
			.ok_or_else(|| GraphError::Surface("no 2d context".into()))?
			.dyn_into()
			.map_err(|_| GraphError::Surface("unexpected context type".into()))?;

		let node_count = data.nodes.len();
		let drag_enabled = config.drag;
		let state: SharedState = Rc::new(RefCell::new(GraphState::new(
			data,
			config,
			request.focal,
			request.theme,
			request.visited,
			width,
			height,
		)));

		let frame_loop = {
			let state = state.clone();
			FrameLoop::new(Box::new(RafScheduler::default()), move |now| {
				match state.try_borrow_mut() {
					Ok(mut state) => {
						let again = state.frame(now);
						render(&state, &ctx);
						again
					}
					Err(_) => {
						warn!("graph state busy, retrying next frame");
						true
					}
				}
			})
		};

		let layer = document.create_element("div")?;
		layer.set_class_name(POPOVER_LAYER_CLASS);
		let host = DomPopoverHost::new(layer.clone());
		let popover: SharedPopover = Rc::new(RefCell::new(PopoverService::new(
			BrowserTimers,
			Rc::new(host),
		)));
		let origin = web_sys::window()
			.ok_or(GraphError::NoWindow)?
			.location()
			.origin()?;

		let mut handle = GraphHandle::new()
			.with(frame_loop.clone())
			.with(popover.clone());

		let window = web_sys::window().ok_or(GraphError::NoWindow)?;

		handle.push(EventListener::<MouseEvent>::new(&canvas, "mousedown", {
			let (state, frame_loop, canvas) = (state.clone(), frame_loop.clone(), canvas.clone());
			move |ev| {
				let (sx, sy) = local_point(&ev, &canvas);
				let at = now();
				with_state(&state, |s| match s.node_at_position(sx, sy) {
					Some(node) => s.on_drag_start(node, sx, sy, at),
					None => s.on_pan_start(sx, sy),
				});
				frame_loop.kick();
			}
		})?);

		handle.push(EventListener::<MouseEvent>::new(&canvas, "mousemove", {
			let (state, frame_loop, canvas, popover) = (
				state.clone(),
				frame_loop.clone(),
				canvas.clone(),
				popover.clone(),
			);
			let origin = origin.clone();
			move |ev| {
				let (sx, sy) = local_point(&ev, &canvas);
				let cursor = (ev.client_x() as f64, ev.client_y() as f64);
				let at = now();
				let hover = with_state(&state, |s| {
					if s.controller.is_dragging() {
						s.on_drag_move(sx, sy);
						return None;
					}
					if s.controller.is_panning() {
						s.on_pan_move(sx, sy);
						return None;
					}
					let hit = s.node_at_position(sx, sy);
					if hit == s.controller.hover.node {
						return None;
					}
					match hit {
						Some(node) => {
							s.on_hover_start(node, at);
							s.slug_of(node).map(|slug| Some(preview_address(&origin, slug)))
						}
						None => {
							s.on_hover_end(at);
							Some(None)
						}
					}
				})
				.flatten();
				with_popover(&popover, |service| {
					match hover {
						Some(Some(address)) => service.hover_start(address, cursor, ev.shift_key()),
						Some(None) => service.hover_end(),
						None => service.pointer_moved(cursor),
					}
				});
				frame_loop.kick();
			}
		})?);

		handle.push(EventListener::<MouseEvent>::new(&canvas, "mouseleave", {
			let (state, frame_loop, popover) = (state.clone(), frame_loop.clone(), popover.clone());
			move |_| {
				let at = now();
				let left = with_state(&state, |s| {
					let hovering = s.controller.hover.is_hovering();
					if hovering && !s.controller.is_dragging() {
						s.on_hover_end(at);
					}
					hovering
				});
				if left == Some(true) {
					with_popover(&popover, |service| service.hover_end());
				}
				frame_loop.kick();
			}
		})?);

		// released anywhere, so a drag that leaves the canvas still ends
		handle.push(EventListener::<MouseEvent>::new(&window, "mouseup", {
			let (state, frame_loop, navigator) =
				(state.clone(), frame_loop.clone(), self.navigator.clone());
			move |_| {
				let at = now();
				let request = with_state(&state, |s| {
					s.on_pan_end();
					s.on_drag_end(at)
				})
				.flatten();
				frame_loop.kick();
				defer_navigation(&navigator, request);
			}
		})?);

		if !drag_enabled {
			handle.push(EventListener::<MouseEvent>::new(&canvas, "click", {
				let (state, canvas, navigator) =
					(state.clone(), canvas.clone(), self.navigator.clone());
				move |ev| {
					let (sx, sy) = local_point(&ev, &canvas);
					let request = with_state(&state, |s| {
						s.node_at_position(sx, sy).and_then(|node| s.on_click(node))
					})
					.flatten();
					defer_navigation(&navigator, request);
				}
			})?);
		}

		handle.push(EventListener::<WheelEvent>::new(&canvas, "wheel", {
			let (state, frame_loop, canvas) = (state.clone(), frame_loop.clone(), canvas.clone());
			move |ev| {
				let (sx, sy) = local_point(&ev, &canvas);
				let at = now();
				let zoomed = with_state(&state, |s| {
					s.on_zoom(sx, sy, ev.delta_y(), at);
					s.controller.zoom_enabled
				});
				if zoomed == Some(true) {
					ev.prevent_default();
				}
				frame_loop.kick();
			}
		})?);

		for event in ["keydown", "keyup"] {
			handle.push(EventListener::<KeyboardEvent>::new(&window, event, {
				let popover = popover.clone();
				move |ev| {
					if ev.key() == "Shift" {
						with_popover(&popover, |service| service.modifier_changed(ev.shift_key()));
					}
				}
			})?);
		}

		handle.push(EventListener::<MouseEvent>::new(&layer, "mouseover", {
			let popover = popover.clone();
			move |_| with_popover(&popover, |service| service.enter_popover())
		})?);
		handle.push(EventListener::<MouseEvent>::new(&layer, "mouseout", {
			let popover = popover.clone();
			move |_| with_popover(&popover, |service| service.leave_popover())
		})?);

		handle.push(EventListener::<web_sys::Event>::new(&window, "resize", {
			let (state, frame_loop, canvas, container) = (
				state.clone(),
				frame_loop.clone(),
				canvas.clone(),
				container.clone(),
			);
			move |_| {
				let (width, height) =
					surface_size(container.client_width(), container.client_height());
				canvas.set_width(width as u32);
				canvas.set_height(height as u32);
				with_state(&state, |s| s.resize(width, height));
				frame_loop.kick();
			}
		})?);

		let body = document
			.body()
			.ok_or_else(|| GraphError::Dom("document has no body".into()))?;
		body.append_child(&layer)?;
		handle.push(SurfaceGuard::new(layer));
		container.append_child(&canvas)?;
		handle.push(SurfaceGuard::new(canvas.into()));

		frame_loop.kick();
		info!(
			"mounted {:?} graph around {} with {node_count} nodes",
			request.kind, request.focal
		);
		Ok(handle)
	}

	fn read_theme(&self) -> ThemeTokens {
		ThemeTokens::from_document()
	}

	fn set_global_visible(&self, visible: bool) {
		let Ok(Some(outer)) = document().and_then(|d| Ok(d.query_selector(GLOBAL_OUTER_SELECTOR)?))
		else {
			return;
		};
		let classes = outer.class_list();
		let _ = if visible {
			classes.add_1("active")
		} else {
			classes.remove_1("active")
		};
		if let Some(outer) = outer.dyn_ref::<HtmlElement>() {
			let _ = outer.style().set_property("display", overlay_display(visible));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_unsized_container_falls_back() {
		assert_eq!(surface_size(0, 0), FALLBACK_SIZE);
		assert_eq!(surface_size(320, 0), (320.0, FALLBACK_SIZE.1));
		assert_eq!(surface_size(320, 250), (320.0, 250.0));
	}

	#[test]
	fn test_overlay_display_follows_visibility() {
		assert_eq!(overlay_display(true), "flex");
		assert_eq!(overlay_display(false), "none");
	}
}
