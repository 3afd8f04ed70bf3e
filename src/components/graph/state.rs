use super::config::GraphConfig;
use super::interaction::{
	GraphEvents, HIT_SLOP, HoverState, InteractionController, NavigationRequest, ViewTransform,
	wheel_zoom_factor,
};
use super::layout::{DRAG_ALPHA_TARGET, LayoutEngine, LayoutParams, STEP_MS};
use super::scene::Scene;
use super::theme::ThemeTokens;
use super::transition::{
	TransitionKind, TransitionScheduler, label_tweens, link_tweens, node_tweens,
	zoom_label_tweens,
};
use super::types::GraphData;
use super::visited::VisitedSet;

/// Most simulation steps taken in a single frame after a long gap.
pub const MAX_STEPS_PER_FRAME: usize = 4;

/// Everything one mounted graph needs between frames.
pub struct GraphState {
	pub data: GraphData,
	pub config: GraphConfig,
	pub focal: String,
	pub layout: LayoutEngine,
	pub scene: Scene,
	pub controller: InteractionController,
	pub transitions: TransitionScheduler,
	pub width: f64,
	pub height: f64,
	last_frame: Option<f64>,
	accumulator: f64,
}

impl GraphState {
	pub fn new(
		data: GraphData,
		config: GraphConfig,
		focal: &str,
		theme: &ThemeTokens,
		visited: &VisitedSet,
		width: f64,
		height: f64,
	) -> Self {
		let layout = LayoutEngine::new(&data, LayoutParams::from_config(&config, width, height));
		let mut scene = Scene::build(&data, focal, theme, visited, config.font_size);
		let controller = InteractionController::new(
			ViewTransform::centered(width, height, config.scale),
			config.drag,
			config.zoom,
		);
		scene.apply_zoom(controller.transform.k, config.opacity_scale);
		scene.sync(layout.positions(), width, height);

		Self {
			data,
			focal: focal.to_string(),
			layout,
			scene,
			controller,
			transitions: TransitionScheduler::new(),
			config,
			width,
			height,
			last_frame: None,
			accumulator: 0.0,
		}
	}

	/// Advance physics and transitions to `now` and refresh the scene.
	/// Returns whether another frame is wanted.
	pub fn frame(&mut self, now: f64) -> bool {
		let elapsed = match self.last_frame {
			Some(last) => (now - last).max(0.0),
			None => STEP_MS,
		};
		self.last_frame = Some(now);

		if self.layout.is_settled() {
			self.accumulator = 0.0;
		} else {
			self.accumulator =
				(self.accumulator + elapsed).min(STEP_MS * MAX_STEPS_PER_FRAME as f64);
			while self.accumulator >= STEP_MS {
				self.layout.tick();
				self.accumulator -= STEP_MS;
			}
		}
		self.scene.sync(self.layout.positions(), self.width, self.height);

		let transitions = self.transitions.tick(now, &mut self.scene);
		let running = transitions || !self.layout.is_settled() || self.controller.is_dragging();
		if !running {
			self.last_frame = None;
		}
		running
	}

	/// Node under the screen point, if any.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let at = self.controller.transform.screen_to_world(sx, sy);
		self.scene
			.nodes
			.iter()
			.filter_map(|record| {
				let p = record.position?;
				let d = (p.x - at.x).hypot(p.y - at.y);
				(d <= record.radius + HIT_SLOP).then_some((record.node, d))
			})
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(node, _)| node)
	}

	pub fn slug_of(&self, node: usize) -> Option<&str> {
		self.data.nodes.get(node).map(|n| n.id.as_str())
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	fn navigation(&self, node: usize) -> Option<NavigationRequest> {
		self.slug_of(node).map(|slug| NavigationRequest {
			slug: slug.to_string(),
		})
	}

	/// Restart all three transition kinds toward the current hover state.
	fn retarget(&mut self, now: f64) {
		let hovering = self.controller.hover.is_hovering();
		let links = link_tweens(&mut self.scene, hovering);
		self.transitions.start(TransitionKind::Link, links, now);
		let nodes = node_tweens(&self.scene, hovering, self.config.focus_on_hover);
		self.transitions.start(TransitionKind::Node, nodes, now);
		let labels = label_tweens(&self.scene, self.controller.hover.node);
		self.transitions.start(TransitionKind::Label, labels, now);
	}
}

impl GraphEvents for GraphState {
	fn on_hover_start(&mut self, node: usize, now: f64) {
		if node >= self.scene.nodes.len() || self.controller.hover.node == Some(node) {
			return;
		}
		let hover = HoverState::around(&self.data.links, node);
		self.scene.clear_active();
		for &i in &hover.nodes {
			self.scene.nodes[i].active = true;
		}
		for &i in &hover.links {
			self.scene.links[i].active = true;
		}
		self.controller.hover = hover;
		self.retarget(now);
	}

	fn on_hover_end(&mut self, now: f64) {
		if !self.controller.hover.is_hovering() {
			return;
		}
		self.controller.hover = HoverState::default();
		self.scene.clear_active();
		self.retarget(now);
	}

	fn on_drag_start(&mut self, node: usize, sx: f64, sy: f64, now: f64) {
		if !self.controller.drag_enabled {
			return;
		}
		let Some(at) = self.layout.position(node) else {
			return;
		};
		self.controller.begin_drag(node, sx, sy, at, now);
		self.layout.pin(node, at);
		self.layout.reheat(DRAG_ALPHA_TARGET);
	}

	fn on_drag_move(&mut self, sx: f64, sy: f64) {
		if let Some((node, at)) = self.controller.drag_to(sx, sy) {
			self.layout.pin(node, at);
		}
	}

	fn on_drag_end(&mut self, now: f64) -> Option<NavigationRequest> {
		let (node, was_click) = self.controller.end_drag(now)?;
		self.layout.unpin(node);
		self.layout.cool();
		if was_click {
			self.navigation(node)
		} else {
			None
		}
	}

	fn on_pan_start(&mut self, sx: f64, sy: f64) {
		if self.controller.zoom_enabled {
			self.controller.begin_pan(sx, sy);
		}
	}

	fn on_pan_move(&mut self, sx: f64, sy: f64) {
		self.controller.pan_to(sx, sy);
	}

	fn on_pan_end(&mut self) {
		self.controller.end_pan();
	}

	fn on_zoom(&mut self, sx: f64, sy: f64, delta_y: f64, now: f64) {
		if !self.controller.zoom_enabled {
			return;
		}
		self.controller
			.transform
			.zoom_about(sx, sy, wheel_zoom_factor(delta_y));
		self.scene
			.apply_zoom(self.controller.transform.k, self.config.opacity_scale);
		let labels =
			zoom_label_tweens(&self.scene, self.controller.hover.node, &self.transitions);
		self.transitions.start(TransitionKind::Label, labels, now);
	}

	fn on_click(&mut self, node: usize) -> Option<NavigationRequest> {
		if self.controller.drag_enabled {
			return None;
		}
		self.navigation(node)
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;
	use crate::components::graph::frame::FrameLoop;
	use crate::components::graph::interaction::ZOOM_EXTENT;
	use crate::components::graph::neighborhood::{NeighborhoodParams, build_graph};
	use crate::components::graph::scene::label_alpha_for_zoom;
	use crate::components::graph::testing::{ManualFrames, abc_index, empty_visited};
	use crate::components::graph::transition::{DIMMED_ALPHA, HOVER_LABEL_EMPHASIS};

	fn state_with(config: GraphConfig) -> GraphState {
		let data = build_graph(&abc_index(), "A", &NeighborhoodParams::from(&config));
		GraphState::new(
			data,
			config,
			"A",
			&ThemeTokens::default(),
			&empty_visited(),
			400.0,
			300.0,
		)
	}

	fn state() -> GraphState {
		state_with(GraphConfig {
			depth: -1,
			show_tags: false,
			..GraphConfig::local()
		})
	}

	fn settle(state: &mut GraphState, mut now: f64) -> f64 {
		while state.frame(now) {
			now += STEP_MS;
			assert!(now < 1e6, "state never went idle");
		}
		now
	}

	#[test]
	fn test_hover_highlights_neighbours_and_links() {
		let mut state = state();
		let now = settle(&mut state, 0.0);
		let (a, b, c) = (0, 1, 2);
		state.on_hover_start(a, now);
		settle(&mut state, now);

		assert!(state.scene.nodes[a].active && state.scene.nodes[b].active);
		assert!(!state.scene.nodes[c].active);
		for record in &state.scene.links {
			let touches = record.source == a || record.target == a;
			assert_eq!(record.active, touches);
			let alpha = if touches { 1.0 } else { DIMMED_ALPHA };
			assert_eq!(record.alpha, alpha);
		}
		assert_eq!(state.scene.nodes[a].label.alpha, 1.0);
		assert_eq!(state.scene.nodes[a].label.emphasis, HOVER_LABEL_EMPHASIS);
	}

	#[test]
	fn test_leave_restores_resting_state() {
		let mut state = state();
		let now = settle(&mut state, 0.0);
		let resting: Vec<_> = state
			.scene
			.nodes
			.iter()
			.map(|n| (n.alpha, n.label.alpha, n.label.emphasis))
			.collect();

		state.on_hover_start(1, now);
		let now = settle(&mut state, now);
		state.on_hover_end(now);
		settle(&mut state, now);

		assert!(state.scene.nodes.iter().all(|n| !n.active));
		assert!(state.scene.links.iter().all(|l| !l.active && l.alpha == 1.0));
		assert!(
			state
				.scene
				.links
				.iter()
				.all(|l| l.color == state.scene.link_color)
		);
		let after: Vec<_> = state
			.scene
			.nodes
			.iter()
			.map(|n| (n.alpha, n.label.alpha, n.label.emphasis))
			.collect();
		assert_eq!(after, resting);
	}

	#[test]
	fn test_focus_on_hover_dims_other_nodes() {
		let mut state = state_with(GraphConfig {
			show_tags: false,
			..GraphConfig::global()
		});
		let now = settle(&mut state, 0.0);
		// C only links to B
		state.on_hover_start(2, now);
		settle(&mut state, now);
		assert_eq!(state.scene.nodes[0].alpha, DIMMED_ALPHA);
		assert_eq!(state.scene.nodes[1].alpha, 1.0);
		assert_eq!(state.scene.nodes[2].alpha, 1.0);
	}

	#[test]
	fn test_quick_release_navigates() {
		let mut state = state();
		state.on_drag_start(1, 50.0, 50.0, 0.0);
		assert!(state.layout.is_pinned(1));
		state.on_drag_move(51.0, 51.0);
		let request = state.on_drag_end(120.0);
		assert_eq!(
			request,
			Some(NavigationRequest {
				slug: "B".to_string()
			})
		);
		assert!(!state.layout.is_pinned(1));
	}

	#[test]
	fn test_drag_moves_pinned_node_without_navigating() {
		let mut state = state();
		let start = state.layout.position(2).unwrap();
		state.on_drag_start(2, 50.0, 50.0, 0.0);
		state.on_drag_move(50.0 + 22.0, 50.0);
		for now in [16.0, 32.0, 48.0] {
			state.frame(now);
		}
		let k = state.controller.transform.k;
		let moved = state.layout.position(2).unwrap();
		assert!((moved.x - (start.x + 22.0 / k)).abs() < 1e-9);
		assert!(!state.layout.is_settled());
		assert_eq!(state.on_drag_end(60.0), None);
	}

	#[test]
	fn test_long_press_is_not_a_click() {
		let mut state = state();
		state.on_drag_start(0, 10.0, 10.0, 0.0);
		assert_eq!(state.on_drag_end(900.0), None);
	}

	#[test]
	fn test_click_without_drag() {
		let mut state = state_with(GraphConfig {
			drag: false,
			depth: -1,
			show_tags: false,
			..GraphConfig::local()
		});
		state.on_drag_start(0, 10.0, 10.0, 0.0);
		assert!(!state.controller.is_dragging());
		assert_eq!(state.on_click(2).map(|r| r.slug), Some("C".to_string()));

		let mut draggable = self::state();
		assert_eq!(draggable.on_click(2), None);
	}

	#[test]
	fn test_zoom_is_bounded_and_drives_labels() {
		let mut state = state();
		for _ in 0..50 {
			state.on_zoom(200.0, 150.0, -500.0, 0.0);
		}
		let k = state.controller.transform.k;
		assert_eq!(k, ZOOM_EXTENT.1);
		settle(&mut state, 0.0);
		let expected = label_alpha_for_zoom(k, 1.0);
		assert!(state.scene.nodes.iter().all(|n| n.label.alpha == expected));
		assert!(state.scene.nodes.iter().all(|n| n.label.scale() == 1.0 / k));

		for _ in 0..50 {
			state.on_zoom(200.0, 150.0, 500.0, 0.0);
		}
		assert_eq!(state.controller.transform.k, ZOOM_EXTENT.0);
	}

	#[test]
	fn test_zoom_keeps_highlighted_labels() {
		let mut state = state();
		for _ in 0..50 {
			state.on_zoom(200.0, 150.0, -500.0, 0.0);
		}
		let now = settle(&mut state, 0.0);
		// hovering A highlights B
		state.on_hover_start(0, now);
		let now = settle(&mut state, now);
		let neighbour = state.scene.nodes[1].label.alpha;
		assert!(neighbour > 0.0);

		for _ in 0..10 {
			state.on_zoom(200.0, 150.0, 500.0, now);
		}
		settle(&mut state, now);
		let k = state.controller.transform.k;
		let faded = label_alpha_for_zoom(k, state.config.opacity_scale);
		assert_eq!(state.scene.nodes[1].label.alpha, neighbour);
		assert_eq!(state.scene.nodes[0].label.alpha, 1.0);
		assert_eq!(state.scene.nodes[2].label.alpha, faded);
	}

	#[test]
	fn test_zoom_disabled_ignores_wheel() {
		let mut state = state_with(GraphConfig {
			zoom: false,
			..GraphConfig::local()
		});
		let before = state.controller.transform.clone();
		state.on_zoom(10.0, 10.0, -300.0, 0.0);
		state.on_pan_start(0.0, 0.0);
		state.on_pan_move(40.0, 40.0);
		assert_eq!(state.controller.transform, before);
	}

	#[test]
	fn test_hit_test_uses_viewport() {
		let mut state = state();
		settle(&mut state, 0.0);
		let p = state.scene.nodes[2].position.unwrap();
		let (sx, sy) = state.controller.transform.world_to_screen(p);
		assert_eq!(state.node_at_position(sx, sy), Some(2));
		assert_eq!(state.node_at_position(-5000.0, -5000.0), None);
	}

	#[test]
	fn test_frame_loop_idles_then_restarts_once_on_hover() {
		let frames = ManualFrames::default();
		let shared = Rc::new(RefCell::new(state()));
		let stepped = shared.clone();
		let frame_loop = FrameLoop::new(Box::new(frames.clone()), move |now| {
			stepped.borrow_mut().frame(now)
		});

		frame_loop.kick();
		frames.run_until_idle(0.0, STEP_MS);
		assert!(!frame_loop.is_running());
		assert!(shared.borrow().layout.is_settled());

		shared.borrow_mut().on_hover_start(0, 10_000.0);
		assert!(frame_loop.kick());
		assert!(!frame_loop.kick());
		assert_eq!(frames.pending(), 1);

		let count = frames.run_until_idle(10_000.0, STEP_MS);
		assert!(count > 1);
		assert!(!shared.borrow().transitions.is_active());
	}
}
