use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::config::GraphConfig;
use super::types::{GraphData, Point};

/// Virtual time advanced by one simulation step, in milliseconds.
pub const STEP_MS: f64 = 16.0;
/// Below this energy (and with no drag in progress) the layout counts as settled.
pub const ALPHA_MIN: f64 = 0.001;
/// Energy lost per step; cools from 1 to `ALPHA_MIN` in about 300 steps.
pub const ALPHA_DECAY: f64 = 0.0228;
/// Energy held while a node is being dragged.
pub const DRAG_ALPHA_TARGET: f64 = 0.3;
/// Radius of a node with no links.
pub const NODE_BASE_RADIUS: f64 = 2.0;

const CHARGE_SCALE: f64 = 300.0;
const COLLIDE_STRENGTH: f64 = 0.7;
const RADIAL_STRENGTH: f64 = 0.2;

/// `base + sqrt(incident links)`.
pub fn node_radius(degree: usize) -> f64 {
	NODE_BASE_RADIUS + (degree as f64).sqrt()
}

/// Collision passes per step, fewer on larger graphs.
pub fn collide_iterations(node_count: usize) -> usize {
	match node_count {
		0..=200 => 3,
		201..=1000 => 2,
		_ => 1,
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutParams {
	pub repel_force: f64,
	pub center_force: f64,
	pub link_distance: f64,
	/// Ring the radial force pulls every node toward, if enabled.
	pub radial_radius: Option<f64>,
}

impl LayoutParams {
	pub fn from_config(config: &GraphConfig, width: f64, height: f64) -> Self {
		Self {
			repel_force: config.repel_force,
			center_force: config.center_force,
			link_distance: config.link_distance,
			radial_radius: config
				.enable_radial
				.then(|| 0.8 * (width.min(height) / 2.0 - 40.0).max(0.0)),
		}
	}
}

/// Force-directed layout over one neighbourhood.
///
/// Charge repulsion and velocity integration run inside `force_graph`; the
/// centering, link-distance, collision and radial passes are applied to the
/// positions after every integration step, scaled by the current energy.
pub struct LayoutEngine {
	graph: ForceGraph<usize, ()>,
	handles: Vec<DefaultNodeIdx>,
	links: Vec<(usize, usize)>,
	degrees: Vec<usize>,
	radii: Vec<f64>,
	positions: Vec<Point>,
	pinned: Vec<bool>,
	params: LayoutParams,
	iterations: usize,
	alpha: f64,
	alpha_target: f64,
}

impl LayoutEngine {
	pub fn new(data: &GraphData, params: LayoutParams) -> Self {
		let mut graph = ForceGraph::new(SimulationParameters {
			force_charge: (params.repel_force * CHARGE_SCALE) as f32,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});

		let degrees = data.degrees();
		let radii = degrees.iter().map(|&d| node_radius(d)).collect();
		let mut handles = Vec::with_capacity(data.nodes.len());
		let mut positions = Vec::with_capacity(data.nodes.len());

		for i in 0..data.nodes.len() {
			// phyllotaxis seed: distinct, deterministic and roughly round
			let radius = 10.0 * (0.5 + i as f64).sqrt();
			let angle = i as f64 * PI * (3.0 - 5f64.sqrt());
			let seed = Point::new(radius * angle.cos(), radius * angle.sin());
			handles.push(graph.add_node(NodeData {
				x: seed.x as f32,
				y: seed.y as f32,
				mass: 10.0,
				is_anchor: false,
				user_data: i,
			}));
			positions.push(seed);
		}

		let mut links = Vec::with_capacity(data.links.len());
		for link in &data.links {
			if link.source == link.target {
				continue;
			}
			graph.add_edge(
				handles[link.source],
				handles[link.target],
				EdgeData::default(),
			);
			links.push((link.source, link.target));
		}

		Self {
			graph,
			handles,
			links,
			degrees,
			radii,
			pinned: vec![false; positions.len()],
			positions,
			iterations: collide_iterations(data.nodes.len()),
			params,
			alpha: 1.0,
			alpha_target: 0.0,
		}
	}

	pub fn positions(&self) -> &[Point] {
		&self.positions
	}

	pub fn position(&self, node: usize) -> Option<Point> {
		self.positions.get(node).copied()
	}

	pub fn radius(&self, node: usize) -> f64 {
		self.radii.get(node).copied().unwrap_or(NODE_BASE_RADIUS)
	}

	pub fn node_count(&self) -> usize {
		self.positions.len()
	}

	pub fn collide_iterations(&self) -> usize {
		self.iterations
	}

	/// Current energy of the simulation.
	pub fn energy(&self) -> f64 {
		self.alpha
	}

	pub fn is_settled(&self) -> bool {
		self.alpha < ALPHA_MIN && self.alpha_target < ALPHA_MIN
	}

	pub fn is_pinned(&self, node: usize) -> bool {
		self.pinned.get(node).copied().unwrap_or(false)
	}

	/// Hold the energy at `target` until [`LayoutEngine::cool`] is called.
	pub fn reheat(&mut self, target: f64) {
		self.alpha_target = target;
		self.alpha = self.alpha.max(target);
	}

	pub fn cool(&mut self) {
		self.alpha_target = 0.0;
	}

	/// Fix `node` at `at`; physics leaves it alone until unpinned.
	pub fn pin(&mut self, node: usize, at: Point) {
		let Some(&handle) = self.handles.get(node) else {
			return;
		};
		self.pinned[node] = true;
		self.positions[node] = at;
		self.graph.visit_nodes_mut(|n| {
			if n.index() == handle {
				n.data.x = at.x as f32;
				n.data.y = at.y as f32;
				n.data.is_anchor = true;
			}
		});
	}

	pub fn unpin(&mut self, node: usize) {
		let Some(&handle) = self.handles.get(node) else {
			return;
		};
		self.pinned[node] = false;
		self.graph.visit_nodes_mut(|n| {
			if n.index() == handle {
				n.data.is_anchor = false;
			}
		});
	}

	/// Advance the simulation by one fixed step.
	pub fn tick(&mut self) {
		if self.positions.is_empty() {
			self.alpha += (self.alpha_target - self.alpha) * ALPHA_DECAY;
			return;
		}
		let alpha = self.alpha;
		self.graph.update((STEP_MS / 1000.0 * alpha) as f32);
		self.read_positions();

		self.apply_center();
		self.apply_links(alpha);
		for _ in 0..self.iterations {
			self.apply_collisions();
		}
		if let Some(radius) = self.params.radial_radius {
			self.apply_radial(radius, alpha);
		}

		self.write_positions();
		self.alpha += (self.alpha_target - self.alpha) * ALPHA_DECAY;
	}

	fn read_positions(&mut self) {
		let (positions, pinned) = (&mut self.positions, &self.pinned);
		self.graph.visit_nodes(|n| {
			let i = n.data.user_data;
			if !pinned[i] {
				positions[i] = Point::new(n.x() as f64, n.y() as f64);
			}
		});
	}

	fn write_positions(&mut self) {
		let (positions, pinned) = (&self.positions, &self.pinned);
		self.graph.visit_nodes_mut(|n| {
			let i = n.data.user_data;
			if !pinned[i] && positions[i].is_finite() {
				n.data.x = positions[i].x as f32;
				n.data.y = positions[i].y as f32;
			}
		});
	}

	fn apply_center(&mut self) {
		let free: Vec<usize> = (0..self.positions.len())
			.filter(|&i| !self.pinned[i])
			.collect();
		if free.is_empty() {
			return;
		}
		let n = self.positions.len() as f64;
		let (sx, sy) = self
			.positions
			.iter()
			.fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
		let (shift_x, shift_y) = (
			sx / n * self.params.center_force,
			sy / n * self.params.center_force,
		);
		for i in free {
			self.positions[i].x -= shift_x;
			self.positions[i].y -= shift_y;
		}
	}

	fn apply_links(&mut self, alpha: f64) {
		for &(s, t) in &self.links {
			let (ps, pt) = (self.positions[s], self.positions[t]);
			let (mut dx, mut dy) = (pt.x - ps.x, pt.y - ps.y);
			if dx.abs() < 1e-9 && dy.abs() < 1e-9 {
				dx = jiggle(s + t);
				dy = jiggle(s * 31 + t);
			}
			let distance = dx.hypot(dy);
			let strength = 1.0 / self.degrees[s].min(self.degrees[t]).max(1) as f64;
			let k = (distance - self.params.link_distance) / distance * alpha * strength;
			let (mx, my) = (dx * k, dy * k);
			let bias = self.degrees[s] as f64 / (self.degrees[s] + self.degrees[t]) as f64;

			if !self.pinned[t] {
				self.positions[t].x -= mx * bias;
				self.positions[t].y -= my * bias;
			}
			if !self.pinned[s] {
				self.positions[s].x += mx * (1.0 - bias);
				self.positions[s].y += my * (1.0 - bias);
			}
		}
	}

	fn apply_collisions(&mut self) {
		let n = self.positions.len();
		for i in 0..n {
			for j in (i + 1)..n {
				let reach = self.radii[i] + self.radii[j];
				let (mut dx, mut dy) = (
					self.positions[j].x - self.positions[i].x,
					self.positions[j].y - self.positions[i].y,
				);
				let mut d2 = dx * dx + dy * dy;
				if d2 >= reach * reach {
					continue;
				}
				if d2 < 1e-12 {
					dx = jiggle(i + j);
					dy = jiggle(i * 17 + j);
					d2 = dx * dx + dy * dy;
				}
				let distance = d2.sqrt();
				let push = (reach - distance) / distance * COLLIDE_STRENGTH;
				let (px, py) = (dx * push, dy * push);
				let share = match (self.pinned[i], self.pinned[j]) {
					(true, true) => continue,
					(true, false) => (0.0, 1.0),
					(false, true) => (1.0, 0.0),
					(false, false) => (0.5, 0.5),
				};
				self.positions[i].x -= px * share.0;
				self.positions[i].y -= py * share.0;
				self.positions[j].x += px * share.1;
				self.positions[j].y += py * share.1;
			}
		}
	}

	fn apply_radial(&mut self, radius: f64, alpha: f64) {
		for (i, p) in self.positions.iter_mut().enumerate() {
			if self.pinned[i] {
				continue;
			}
			let r = p.length();
			if r < 1e-9 {
				continue;
			}
			let k = (radius - r) / r * RADIAL_STRENGTH * alpha;
			p.x += p.x * k;
			p.y += p.y * k;
		}
	}
}

/// Tiny deterministic offset used to separate coincident points.
fn jiggle(seed: usize) -> f64 {
	((seed as f64 * 12.9898).sin() * 43758.5453).fract().abs().max(0.1) * 1e-3
}
