use super::category::NodeCategory;
use super::layout::node_radius;
use super::theme::ThemeTokens;
use super::types::{GraphData, GraphNode, Point};
use super::visited::VisitedSet;

/// Canvas pixels per unit of the configured `fontSize`.
pub const FONT_SCALE: f64 = 15.0;
/// Gap between a node and its label, in layout units.
pub const LABEL_OFFSET: f64 = 4.0;

#[derive(Clone, Debug, PartialEq)]
pub struct LabelRecord {
	pub text: String,
	pub position: Point,
	pub alpha: f64,
	/// Alpha the label returns to once it stops being hovered.
	pub base_alpha: f64,
	/// 1.0 normally, larger while hovered.
	pub emphasis: f64,
	/// Counteracts the viewport zoom so text keeps its on-screen size.
	pub zoom_scale: f64,
}

impl LabelRecord {
	pub fn scale(&self) -> f64 {
		self.emphasis * self.zoom_scale
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeRecord {
	pub node: usize,
	pub fill: String,
	pub stroke: Option<String>,
	pub radius: f64,
	pub alpha: f64,
	pub active: bool,
	pub position: Option<Point>,
	pub label: LabelRecord,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkRecord {
	pub link: usize,
	pub source: usize,
	pub target: usize,
	pub color: String,
	pub alpha: f64,
	pub active: bool,
	pub from: Option<Point>,
	pub to: Option<Point>,
}

/// Fill resolution: focal, tag, visited, structural category, fallback.
pub fn resolve_fill<'a>(
	node: &GraphNode,
	focal: &str,
	visited: &VisitedSet,
	theme: &'a ThemeTokens,
) -> &'a str {
	if node.id == focal {
		theme.focal.as_str()
	} else if node.category == NodeCategory::Tag {
		theme.tag.as_str()
	} else if visited.contains(&node.id) {
		theme.visited.as_str()
	} else {
		theme
			.category_fill(node.category)
			.unwrap_or(theme.fallback.as_str())
	}
}

pub fn resolve_stroke(node: &GraphNode, theme: &ThemeTokens) -> Option<String> {
	match node.category {
		NodeCategory::Tag => Some(theme.tag_stroke.clone()),
		NodeCategory::Content => Some(theme.content_stroke.clone()),
		_ => None,
	}
}

/// Retained drawing records for one mount: one per node and one per link,
/// created once and updated in place every frame.
pub struct Scene {
	pub nodes: Vec<NodeRecord>,
	pub links: Vec<LinkRecord>,
	pub font_size: f64,
	pub font_family: String,
	pub label_color: String,
	pub background: String,
	pub link_color: String,
	pub link_active_color: String,
}

impl Scene {
	pub fn build(
		data: &GraphData,
		focal: &str,
		theme: &ThemeTokens,
		visited: &VisitedSet,
		font_size: f64,
	) -> Self {
		let degrees = data.degrees();
		let nodes = data
			.nodes
			.iter()
			.enumerate()
			.map(|(i, node)| NodeRecord {
				node: i,
				fill: resolve_fill(node, focal, visited, theme).to_string(),
				stroke: resolve_stroke(node, theme),
				radius: node_radius(degrees[i]),
				alpha: 1.0,
				active: false,
				position: None,
				label: LabelRecord {
					text: node.text.clone(),
					position: Point::default(),
					alpha: 0.0,
					base_alpha: 0.0,
					emphasis: 1.0,
					zoom_scale: 1.0,
				},
			})
			.collect();

		let links = data
			.links
			.iter()
			.enumerate()
			.map(|(i, link)| LinkRecord {
				link: i,
				source: link.source,
				target: link.target,
				color: theme.link.clone(),
				alpha: 1.0,
				active: false,
				from: None,
				to: None,
			})
			.collect();

		Self {
			nodes,
			links,
			font_size: font_size * FONT_SCALE,
			font_family: theme.font_family.clone(),
			label_color: theme.label.clone(),
			background: theme.background.clone(),
			link_color: theme.link.clone(),
			link_active_color: theme.link_active.clone(),
		}
	}

	/// Number of drawing primitives; fixed for the lifetime of the scene.
	pub fn primitive_count(&self) -> usize {
		self.nodes.len() + self.links.len()
	}

	/// Copy simulation positions into the records, centred in a
	/// `width` × `height` viewport.
	pub fn sync(&mut self, positions: &[Point], width: f64, height: f64) {
		let (half_w, half_h) = (width / 2.0, height / 2.0);
		for record in &mut self.nodes {
			let Some(p) = positions.get(record.node).filter(|p| p.is_finite()) else {
				continue;
			};
			let at = Point::new(p.x + half_w, p.y + half_h);
			record.position = Some(at);
			record.label.position = Point::new(at.x, at.y + record.radius + LABEL_OFFSET);
		}
		for record in &mut self.links {
			record.from = self.nodes[record.source].position;
			record.to = self.nodes[record.target].position;
		}
	}

	/// Apply a new zoom factor: label size compensation for every label and
	/// the zoom-driven alpha for labels not currently highlighted.
	pub fn apply_zoom(&mut self, k: f64, opacity_scale: f64) {
		let alpha = label_alpha_for_zoom(k, opacity_scale);
		for record in &mut self.nodes {
			record.label.zoom_scale = 1.0 / k;
			record.label.base_alpha = alpha;
			if !record.active {
				record.label.alpha = alpha;
			}
		}
	}

	pub fn clear_active(&mut self) {
		for record in &mut self.nodes {
			record.active = false;
		}
		for record in &mut self.links {
			record.active = false;
		}
	}
}

/// Labels fade in as the view zooms in, clamped to `[0, 1]`.
pub fn label_alpha_for_zoom(k: f64, opacity_scale: f64) -> f64 {
	((k * opacity_scale - 1.0) / 3.75).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph::neighborhood::{NeighborhoodParams, build_graph};
	use crate::components::graph::testing::{MemoryStore, record};
	use crate::components::graph::types::ContentIndex;

	fn graph() -> GraphData {
		let index: ContentIndex = [
			("A", record("A", &["B", "Model/m"], &["rust"])),
			("B", record("B", &[], &[])),
			("Model/m", record("Model/m", &[], &[])),
			("Orphan", record("Orphan", &[], &[])),
		]
		.into_iter()
		.collect();
		build_graph(
			&index,
			"A",
			&NeighborhoodParams {
				depth: -1,
				show_tags: true,
				remove_tags: Vec::new(),
			},
		)
	}

	fn visited(slugs: &[&str]) -> VisitedSet {
		let set = VisitedSet::load(Box::new(MemoryStore::default()));
		for slug in slugs {
			set.add(slug);
		}
		set
	}

	#[test]
	fn test_one_record_per_node_and_link() {
		let data = graph();
		let scene = Scene::build(&data, "A", &ThemeTokens::default(), &visited(&[]), 0.6);
		assert_eq!(scene.nodes.len(), data.nodes.len());
		assert_eq!(scene.links.len(), data.links.len());
		assert_eq!(scene.primitive_count(), data.nodes.len() + data.links.len());
	}

	#[test]
	fn test_fill_resolution_order() {
		let data = graph();
		let theme = ThemeTokens::default();
		// focal beats visited
		let seen = visited(&["A", "B", "tags/rust"]);
		let scene = Scene::build(&data, "A", &theme, &seen, 0.6);
		let fill = |id: &str| {
			let i = data.position_of(id).unwrap();
			scene.nodes[i].fill.clone()
		};
		assert_eq!(fill("A"), theme.focal);
		assert_eq!(fill("tags/rust"), theme.tag);
		assert_eq!(fill("B"), theme.visited);
		assert_eq!(fill("Model/m"), theme.model);
		assert_eq!(fill("Orphan"), theme.content);
	}

	#[test]
	fn test_tag_and_content_nodes_are_stroked() {
		let data = graph();
		let theme = ThemeTokens::default();
		let scene = Scene::build(&data, "A", &theme, &visited(&[]), 0.6);
		let tag = data.position_of("tags/rust").unwrap();
		let model = data.position_of("Model/m").unwrap();
		let b = data.position_of("B").unwrap();
		assert_eq!(scene.nodes[tag].stroke.as_deref(), Some(theme.tag_stroke.as_str()));
		assert_eq!(scene.nodes[b].stroke.as_deref(), Some(theme.content_stroke.as_str()));
		assert_eq!(scene.nodes[model].stroke, None);
	}

	#[test]
	fn test_sync_centres_layout_in_viewport() {
		let data = graph();
		let mut scene = Scene::build(&data, "A", &ThemeTokens::default(), &visited(&[]), 0.6);
		let mut positions = vec![Point::default(); data.nodes.len()];
		positions[0] = Point::new(10.0, -5.0);
		positions[1] = Point::new(f64::NAN, 0.0);
		scene.sync(&positions, 400.0, 300.0);

		assert_eq!(scene.nodes[0].position, Some(Point::new(210.0, 145.0)));
		assert_eq!(scene.nodes[1].position, None);
		let link = scene.links.iter().find(|l| l.source == 0).unwrap();
		assert_eq!(link.from, Some(Point::new(210.0, 145.0)));
	}

	#[test]
	fn test_label_scale_inverse_to_zoom() {
		let data = graph();
		let mut scene = Scene::build(&data, "A", &ThemeTokens::default(), &visited(&[]), 0.6);
		scene.apply_zoom(2.0, 1.0);
		assert_eq!(scene.nodes[0].label.scale(), 0.5);
		scene.apply_zoom(4.0, 1.0);
		assert_eq!(scene.nodes[0].label.scale(), 0.25);
	}

	#[test]
	fn test_label_alpha_rule() {
		assert_eq!(label_alpha_for_zoom(1.0, 1.0), 0.0);
		assert_eq!(label_alpha_for_zoom(4.75, 1.0), 1.0);
		assert_eq!(label_alpha_for_zoom(100.0, 1.0), 1.0);
		assert!(label_alpha_for_zoom(2.0, 1.0) > label_alpha_for_zoom(1.5, 1.0));
	}

	#[test]
	fn test_zoom_leaves_active_labels_alone() {
		let data = graph();
		let mut scene = Scene::build(&data, "A", &ThemeTokens::default(), &visited(&[]), 0.6);
		scene.nodes[0].active = true;
		scene.nodes[0].label.alpha = 1.0;
		scene.apply_zoom(1.0, 1.0);
		assert_eq!(scene.nodes[0].label.alpha, 1.0);
		assert_eq!(scene.nodes[1].label.alpha, 0.0);
	}
}
