use std::collections::BTreeSet;

use super::types::{GraphLink, Point, slug_href};

/// A press/release shorter than this counts as a click.
pub const CLICK_TIME_MS: f64 = 500.0;
/// A press/release that travelled less than this (screen pixels) counts as a click.
pub const CLICK_DISTANCE_PX: f64 = 5.0;
/// Zoom bounds of the viewport.
pub const ZOOM_EXTENT: (f64, f64) = (0.25, 4.0);
/// Extra slack around a node's radius for hit testing, in layout units.
pub const HIT_SLOP: f64 = 4.0;

/// Pointer and wheel input as seen by one graph instance.
///
/// Every handler completes its state change before returning, so the next
/// frame reads a consistent hover set. Callers re-kick the frame loop after
/// each call.
pub trait GraphEvents {
	/// Mark `node` hovered, activate it, its neighbours and its links, and
	/// start link/node/label transitions toward the highlighted state.
	fn on_hover_start(&mut self, node: usize, now: f64);
	/// Clear every active flag and transition back to the resting state.
	fn on_hover_end(&mut self, now: f64);
	/// Pin `node` where it is and reheat the layout.
	fn on_drag_start(&mut self, node: usize, sx: f64, sy: f64, now: f64);
	/// Move the pinned node by the pointer delta divided by the zoom factor.
	fn on_drag_move(&mut self, sx: f64, sy: f64);
	/// Unpin and cool the layout; a short, small gesture is a click and
	/// yields a navigation request.
	fn on_drag_end(&mut self, now: f64) -> Option<NavigationRequest>;
	/// Start panning the viewport from the given screen point.
	fn on_pan_start(&mut self, sx: f64, sy: f64);
	fn on_pan_move(&mut self, sx: f64, sy: f64);
	fn on_pan_end(&mut self);
	/// Zoom around the pointer and re-derive label alpha and scale.
	fn on_zoom(&mut self, sx: f64, sy: f64, delta_y: f64, now: f64);
	/// Navigation for a plain click when dragging is disabled.
	fn on_click(&mut self, node: usize) -> Option<NavigationRequest>;
}

/// In-app navigation issued by the graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationRequest {
	pub slug: String,
}

impl NavigationRequest {
	pub fn href(&self) -> String {
		slug_href(&self.slug)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	/// Zoom by `scale` around the centre of a `width` × `height` viewport.
	pub fn centered(width: f64, height: f64, scale: f64) -> Self {
		Self {
			x: width / 2.0 * (1.0 - scale),
			y: height / 2.0 * (1.0 - scale),
			k: scale,
		}
	}

	pub fn screen_to_world(&self, sx: f64, sy: f64) -> Point {
		Point::new((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	pub fn world_to_screen(&self, p: Point) -> (f64, f64) {
		(p.x * self.k + self.x, p.y * self.k + self.y)
	}

	/// Multiply the zoom by `factor`, keeping the world point under
	/// `(sx, sy)` fixed; the result is clamped to [`ZOOM_EXTENT`].
	pub fn zoom_about(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_k = (self.k * factor).clamp(ZOOM_EXTENT.0, ZOOM_EXTENT.1);
		let ratio = new_k / self.k;
		self.x = sx - (sx - self.x) * ratio;
		self.y = sy - (sy - self.y) * ratio;
		self.k = new_k;
	}
}

/// Wheel delta to zoom multiplier.
pub fn wheel_zoom_factor(delta_y: f64) -> f64 {
	2f64.powf(-delta_y * 0.002)
}

pub fn is_click(duration_ms: f64, travel_px: f64) -> bool {
	duration_ms < CLICK_TIME_MS && travel_px < CLICK_DISTANCE_PX
}

/// The hovered node plus everything it highlights.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HoverState {
	pub node: Option<usize>,
	/// The hovered node and the nodes at the far end of its links.
	pub nodes: BTreeSet<usize>,
	/// Links touching the hovered node.
	pub links: BTreeSet<usize>,
}

impl HoverState {
	pub fn around(links: &[GraphLink], node: usize) -> Self {
		let mut state = HoverState {
			node: Some(node),
			..Default::default()
		};
		state.nodes.insert(node);
		for (i, link) in links.iter().enumerate() {
			if let Some(other) = link.other(node) {
				state.links.insert(i);
				state.nodes.insert(other);
			}
		}
		state
	}

	pub fn is_hovering(&self) -> bool {
		self.node.is_some()
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct DragGesture {
	pub node: usize,
	pub pointer_start: (f64, f64),
	pub node_start: Point,
	pub started_at: f64,
	/// Furthest the pointer has been from where it was pressed.
	pub travel: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PanGesture {
	pub pointer_start: (f64, f64),
	pub transform_start: (f64, f64),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Gesture {
	#[default]
	Idle,
	Drag(DragGesture),
	Pan(PanGesture),
}

/// Viewport, hover and gesture state of one graph instance.
#[derive(Clone, Debug, Default)]
pub struct InteractionController {
	pub transform: ViewTransform,
	pub hover: HoverState,
	pub gesture: Gesture,
	pub drag_enabled: bool,
	pub zoom_enabled: bool,
}

impl InteractionController {
	pub fn new(transform: ViewTransform, drag_enabled: bool, zoom_enabled: bool) -> Self {
		Self {
			transform,
			hover: HoverState::default(),
			gesture: Gesture::Idle,
			drag_enabled,
			zoom_enabled,
		}
	}

	pub fn is_dragging(&self) -> bool {
		matches!(self.gesture, Gesture::Drag(_))
	}

	pub fn is_panning(&self) -> bool {
		matches!(self.gesture, Gesture::Pan(_))
	}

	pub fn begin_drag(&mut self, node: usize, sx: f64, sy: f64, node_start: Point, now: f64) {
		self.gesture = Gesture::Drag(DragGesture {
			node,
			pointer_start: (sx, sy),
			node_start,
			started_at: now,
			travel: 0.0,
		});
	}

	/// New pinned position for the dragged node, if one is being dragged.
	pub fn drag_to(&mut self, sx: f64, sy: f64) -> Option<(usize, Point)> {
		let Gesture::Drag(drag) = &mut self.gesture else {
			return None;
		};
		let (dx, dy) = (sx - drag.pointer_start.0, sy - drag.pointer_start.1);
		drag.travel = drag.travel.max(dx.hypot(dy));
		let k = self.transform.k;
		Some((
			drag.node,
			Point::new(drag.node_start.x + dx / k, drag.node_start.y + dy / k),
		))
	}

	/// Finish a drag; returns the dragged node and whether it was a click.
	pub fn end_drag(&mut self, now: f64) -> Option<(usize, bool)> {
		match std::mem::take(&mut self.gesture) {
			Gesture::Drag(drag) => Some((drag.node, is_click(now - drag.started_at, drag.travel))),
			other => {
				self.gesture = other;
				None
			}
		}
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.gesture = Gesture::Pan(PanGesture {
			pointer_start: (sx, sy),
			transform_start: (self.transform.x, self.transform.y),
		});
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if let Gesture::Pan(pan) = &self.gesture {
			self.transform.x = pan.transform_start.0 + (sx - pan.pointer_start.0);
			self.transform.y = pan.transform_start.1 + (sy - pan.pointer_start.1);
		}
	}

	pub fn end_pan(&mut self) {
		if self.is_panning() {
			self.gesture = Gesture::Idle;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn links() -> Vec<GraphLink> {
		// 0 - 1 - 2, plus 3 - 0
		vec![
			GraphLink { source: 0, target: 1 },
			GraphLink { source: 1, target: 2 },
			GraphLink { source: 3, target: 0 },
		]
	}

	#[test]
	fn test_hover_collects_both_directions() {
		let hover = HoverState::around(&links(), 0);
		assert_eq!(hover.node, Some(0));
		assert_eq!(hover.nodes, BTreeSet::from([0, 1, 3]));
		assert_eq!(hover.links, BTreeSet::from([0, 2]));
	}

	#[test]
	fn test_click_thresholds() {
		assert!(is_click(120.0, 2.0));
		assert!(!is_click(CLICK_TIME_MS, 0.0));
		assert!(!is_click(10.0, CLICK_DISTANCE_PX));
	}

	#[test]
	fn test_drag_is_scaled_by_zoom() {
		let mut controller = InteractionController::new(
			ViewTransform {
				x: 0.0,
				y: 0.0,
				k: 2.0,
			},
			true,
			true,
		);
		controller.begin_drag(4, 100.0, 100.0, Point::new(10.0, 10.0), 0.0);
		let (node, at) = controller.drag_to(120.0, 90.0).unwrap();
		assert_eq!(node, 4);
		assert_eq!(at, Point::new(20.0, 5.0));
		assert_eq!(controller.end_drag(100.0), Some((4, false)));
		assert_eq!(controller.gesture, Gesture::Idle);
	}

	#[test]
	fn test_end_drag_ignores_pan() {
		let mut controller = InteractionController::default();
		controller.begin_pan(0.0, 0.0);
		assert_eq!(controller.end_drag(0.0), None);
		assert!(controller.is_panning());
		controller.pan_to(15.0, -5.0);
		assert_eq!((controller.transform.x, controller.transform.y), (15.0, -5.0));
		controller.end_pan();
		assert_eq!(controller.gesture, Gesture::Idle);
	}

	#[test]
	fn test_zoom_is_bounded_and_anchored() {
		let mut transform = ViewTransform::default();
		let anchor = transform.screen_to_world(50.0, 50.0);
		transform.zoom_about(50.0, 50.0, 2.0);
		assert_eq!(transform.k, 2.0);
		assert_eq!(transform.screen_to_world(50.0, 50.0), anchor);

		transform.zoom_about(0.0, 0.0, 100.0);
		assert_eq!(transform.k, ZOOM_EXTENT.1);
		transform.zoom_about(0.0, 0.0, 0.0001);
		assert_eq!(transform.k, ZOOM_EXTENT.0);
	}

	#[test]
	fn test_centered_transform_keeps_centre() {
		let transform = ViewTransform::centered(400.0, 300.0, 1.1);
		let (cx, cy) = transform.world_to_screen(Point::new(200.0, 150.0));
		assert!((cx - 200.0).abs() < 1e-9);
		assert!((cy - 150.0).abs() < 1e-9);
	}

	#[test]
	fn test_wheel_factor_direction() {
		assert!(wheel_zoom_factor(100.0) < 1.0);
		assert!(wheel_zoom_factor(-100.0) > 1.0);
		assert_eq!(wheel_zoom_factor(0.0), 1.0);
	}

	#[test]
	fn test_navigation_href() {
		let request = NavigationRequest {
			slug: "notes/a".into(),
		};
		assert_eq!(request.href(), "/notes/a");
	}
}
