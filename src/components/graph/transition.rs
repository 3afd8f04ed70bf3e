use super::scene::Scene;

/// Length of every hover/zoom transition, in milliseconds.
pub const TRANSITION_MS: f64 = 200.0;
/// Alpha of links and nodes pushed to the background by a hover.
pub const DIMMED_ALPHA: f64 = 0.2;
/// Label emphasis of the hovered node.
pub const HOVER_LABEL_EMPHASIS: f64 = 1.1;

/// Independent groups of transitions; starting one cancels only its own kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionKind {
	Link,
	Node,
	Label,
}

impl TransitionKind {
	const ALL: [TransitionKind; 3] = [
		TransitionKind::Link,
		TransitionKind::Node,
		TransitionKind::Label,
	];

	fn slot(self) -> usize {
		match self {
			TransitionKind::Link => 0,
			TransitionKind::Node => 1,
			TransitionKind::Label => 2,
		}
	}
}

/// A record property that can be interpolated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Property {
	LinkAlpha(usize),
	NodeAlpha(usize),
	LabelAlpha(usize),
	LabelEmphasis(usize),
}

impl Property {
	fn read(self, scene: &Scene) -> f64 {
		match self {
			Property::LinkAlpha(i) => scene.links[i].alpha,
			Property::NodeAlpha(i) => scene.nodes[i].alpha,
			Property::LabelAlpha(i) => scene.nodes[i].label.alpha,
			Property::LabelEmphasis(i) => scene.nodes[i].label.emphasis,
		}
	}

	fn write(self, scene: &mut Scene, value: f64) {
		match self {
			Property::LinkAlpha(i) => scene.links[i].alpha = value,
			Property::NodeAlpha(i) => scene.nodes[i].alpha = value,
			Property::LabelAlpha(i) => scene.nodes[i].label.alpha = value,
			Property::LabelEmphasis(i) => scene.nodes[i].label.emphasis = value,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
	pub property: Property,
	pub from: f64,
	pub to: f64,
}

impl Tween {
	/// Tween from the property's current value in `scene`.
	pub fn toward(scene: &Scene, property: Property, to: f64) -> Self {
		Self {
			property,
			from: property.read(scene),
			to,
		}
	}
}

#[derive(Clone, Debug)]
struct Transition {
	started_at: f64,
	duration: f64,
	tweens: Vec<Tween>,
}

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Short interpolations layered on top of the frame loop.
#[derive(Debug, Default)]
pub struct TransitionScheduler {
	active: [Option<Transition>; 3],
}

impl TransitionScheduler {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replace whatever `kind` transition is running with `tweens`.
	pub fn start(&mut self, kind: TransitionKind, tweens: Vec<Tween>, now: f64) {
		self.active[kind.slot()] = Some(Transition {
			started_at: now,
			duration: TRANSITION_MS,
			tweens,
		});
	}

	pub fn cancel(&mut self, kind: TransitionKind) {
		self.active[kind.slot()] = None;
	}

	pub fn is_running(&self, kind: TransitionKind) -> bool {
		self.active[kind.slot()].is_some()
	}

	pub fn is_active(&self) -> bool {
		self.active.iter().any(Option::is_some)
	}

	/// Where the running `kind` transition is taking `property`, if anywhere.
	pub fn target(&self, kind: TransitionKind, property: Property) -> Option<f64> {
		self.active[kind.slot()]
			.as_ref()?
			.tweens
			.iter()
			.find(|tween| tween.property == property)
			.map(|tween| tween.to)
	}

	/// Write interpolated values for `now` into `scene`, retiring finished
	/// transitions. Returns whether anything is still running.
	pub fn tick(&mut self, now: f64, scene: &mut Scene) -> bool {
		for kind in TransitionKind::ALL {
			let slot = &mut self.active[kind.slot()];
			let Some(transition) = slot.as_mut() else {
				continue;
			};
			let t = ((now - transition.started_at) / transition.duration).clamp(0.0, 1.0);
			let eased = ease_out_cubic(t);
			for tween in &transition.tweens {
				let value = if t >= 1.0 {
					tween.to
				} else {
					tween.from + (tween.to - tween.from) * eased
				};
				tween.property.write(scene, value);
			}
			if t >= 1.0 {
				*slot = None;
			}
		}
		self.is_active()
	}
}

/// Link targets after a hover change. Colours switch immediately; alpha is
/// tweened.
pub fn link_tweens(scene: &mut Scene, hovering: bool) -> Vec<Tween> {
	let (color, active_color) = (scene.link_color.clone(), scene.link_active_color.clone());
	let mut tweens = Vec::with_capacity(scene.links.len());
	for i in 0..scene.links.len() {
		let active = scene.links[i].active;
		scene.links[i].color = if active {
			active_color.clone()
		} else {
			color.clone()
		};
		let to = if active || !hovering { 1.0 } else { DIMMED_ALPHA };
		tweens.push(Tween::toward(scene, Property::LinkAlpha(i), to));
	}
	tweens
}

/// Node alpha targets; non-neighbours dim only in focus-on-hover mode.
pub fn node_tweens(scene: &Scene, hovering: bool, focus_on_hover: bool) -> Vec<Tween> {
	scene
		.nodes
		.iter()
		.enumerate()
		.map(|(i, record)| {
			let to = if focus_on_hover && hovering && !record.active {
				DIMMED_ALPHA
			} else {
				1.0
			};
			Tween::toward(scene, Property::NodeAlpha(i), to)
		})
		.collect()
}

/// Label targets: the hovered label grows and becomes opaque, the rest go
/// back to their zoom-derived alpha.
pub fn label_tweens(scene: &Scene, hovered: Option<usize>) -> Vec<Tween> {
	let mut tweens = Vec::with_capacity(scene.nodes.len() * 2);
	for (i, record) in scene.nodes.iter().enumerate() {
		let (alpha, emphasis) = if hovered == Some(i) {
			(1.0, HOVER_LABEL_EMPHASIS)
		} else {
			(record.label.base_alpha, 1.0)
		};
		tweens.push(Tween::toward(scene, Property::LabelAlpha(i), alpha));
		tweens.push(Tween::toward(scene, Property::LabelEmphasis(i), emphasis));
	}
	tweens
}

/// Label targets after a zoom change. Highlighted labels keep heading where
/// `running` was taking them (or stay put); the rest follow the new zoom.
pub fn zoom_label_tweens(
	scene: &Scene,
	hovered: Option<usize>,
	running: &TransitionScheduler,
) -> Vec<Tween> {
	let mut tweens = label_tweens(scene, hovered);
	for tween in &mut tweens {
		let i = match tween.property {
			Property::LabelAlpha(i) | Property::LabelEmphasis(i) => i,
			_ => continue,
		};
		if scene.nodes[i].active && hovered != Some(i) {
			tween.to = running
				.target(TransitionKind::Label, tween.property)
				.unwrap_or(tween.from);
		}
	}
	tweens
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph::testing::abc_scene;

	#[test]
	fn test_transition_reaches_target_and_retires() {
		let mut scene = abc_scene();
		let mut scheduler = TransitionScheduler::new();
		let tweens = vec![Tween::toward(&scene, Property::NodeAlpha(0), 0.2)];
		scheduler.start(TransitionKind::Node, tweens, 1000.0);

		assert!(scheduler.tick(1100.0, &mut scene));
		let midway = scene.nodes[0].alpha;
		assert!(midway < 1.0 && midway > 0.2);

		assert!(!scheduler.tick(1200.0, &mut scene));
		assert_eq!(scene.nodes[0].alpha, 0.2);
		assert!(!scheduler.is_active());
	}

	#[test]
	fn test_restart_cancels_same_kind_only() {
		let mut scene = abc_scene();
		let mut scheduler = TransitionScheduler::new();
		scheduler.start(
			TransitionKind::Node,
			vec![Tween::toward(&scene, Property::NodeAlpha(0), 0.2)],
			0.0,
		);
		scheduler.start(
			TransitionKind::Link,
			vec![Tween::toward(&scene, Property::LinkAlpha(0), 0.2)],
			0.0,
		);
		scheduler.tick(100.0, &mut scene);

		// interrupt the node transition halfway and head back up
		let tweens = vec![Tween::toward(&scene, Property::NodeAlpha(0), 1.0)];
		assert!(tweens[0].from < 1.0);
		scheduler.start(TransitionKind::Node, tweens, 100.0);

		scheduler.tick(200.0, &mut scene);
		assert_eq!(scene.links[0].alpha, 0.2);
		assert!(!scheduler.is_running(TransitionKind::Link));
		assert!(scheduler.is_running(TransitionKind::Node));
		assert!(scene.nodes[0].alpha < 1.0);

		scheduler.tick(300.0, &mut scene);
		assert_eq!(scene.nodes[0].alpha, 1.0);
		assert!(!scheduler.is_active());
	}

	#[test]
	fn test_link_targets_dim_only_while_hovering() {
		let mut scene = abc_scene();
		scene.links[0].active = true;
		let hovering = link_tweens(&mut scene, true);
		assert_eq!(hovering[0].to, 1.0);
		assert!(hovering[1..].iter().all(|t| t.to == DIMMED_ALPHA));
		assert_eq!(scene.links[0].color, scene.link_active_color);
		assert_eq!(scene.links[1].color, scene.link_color);

		scene.clear_active();
		let idle = link_tweens(&mut scene, false);
		assert!(idle.iter().all(|t| t.to == 1.0));
	}

	#[test]
	fn test_node_targets_respect_focus_mode() {
		let mut scene = abc_scene();
		scene.nodes[0].active = true;
		assert!(node_tweens(&scene, true, false).iter().all(|t| t.to == 1.0));
		let focused = node_tweens(&scene, true, true);
		assert_eq!(focused[0].to, 1.0);
		assert_eq!(focused[1].to, DIMMED_ALPHA);
	}

	#[test]
	fn test_label_targets_restore_base_alpha() {
		let mut scene = abc_scene();
		scene.apply_zoom(2.0, 1.0);
		let base = scene.nodes[1].label.base_alpha;
		let tweens = label_tweens(&scene, Some(0));
		assert_eq!(tweens[0].to, 1.0);
		assert_eq!(tweens[1].to, HOVER_LABEL_EMPHASIS);
		assert_eq!(tweens[2].to, base);
		assert_eq!(tweens[3].to, 1.0);
	}

	#[test]
	fn test_zoom_targets_hold_highlighted_labels() {
		let mut scene = abc_scene();
		scene.apply_zoom(4.0, 1.0);
		scene.nodes[0].active = true;
		scene.nodes[1].active = true;
		let mut scheduler = TransitionScheduler::new();
		scheduler.start(TransitionKind::Label, label_tweens(&scene, Some(0)), 0.0);
		let held = scene.nodes[1].label.base_alpha;

		scene.apply_zoom(0.25, 1.0);
		let tweens = zoom_label_tweens(&scene, Some(0), &scheduler);
		assert_eq!(tweens[0].to, 1.0);
		assert_eq!(tweens[1].to, HOVER_LABEL_EMPHASIS);
		assert_eq!(tweens[2].to, held);
		assert_eq!(tweens[4].to, 0.0);

		// nothing running: the label stays where it is
		let tweens = zoom_label_tweens(&scene, Some(0), &TransitionScheduler::new());
		assert_eq!(tweens[2].to, scene.nodes[1].label.alpha);
	}
}
