use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::scene::{LinkRecord, NodeRecord};
use super::state::GraphState;

const LINK_WIDTH: f64 = 1.0;
const STROKE_WIDTH: f64 = 1.0;

/// Paint the current scene: background, then links, nodes and labels in the
/// viewport transform.
pub fn render(state: &GraphState, ctx: &CanvasRenderingContext2d) {
	let scene = &state.scene;
	let transform = &state.controller.transform;

	ctx.set_global_alpha(1.0);
	ctx.set_fill_style_str(&scene.background);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);

	ctx.save();
	let _ = ctx.translate(transform.x, transform.y);
	let _ = ctx.scale(transform.k, transform.k);
	for link in &scene.links {
		draw_link(link, ctx);
	}
	for node in &scene.nodes {
		draw_node(node, ctx);
	}
	ctx.set_font(&format!("{}px {}", scene.font_size, scene.font_family));
	ctx.set_text_align("center");
	ctx.set_text_baseline("top");
	ctx.set_fill_style_str(&scene.label_color);
	for node in &scene.nodes {
		draw_label(node, ctx);
	}
	ctx.restore();
	ctx.set_global_alpha(1.0);
}

fn draw_link(link: &LinkRecord, ctx: &CanvasRenderingContext2d) {
	let (Some(from), Some(to)) = (link.from, link.to) else {
		return;
	};
	if link.alpha <= 0.0 {
		return;
	}
	ctx.set_global_alpha(link.alpha);
	ctx.set_stroke_style_str(&link.color);
	ctx.set_line_width(LINK_WIDTH);
	ctx.begin_path();
	ctx.move_to(from.x, from.y);
	ctx.line_to(to.x, to.y);
	ctx.stroke();
}

fn draw_node(node: &NodeRecord, ctx: &CanvasRenderingContext2d) {
	let Some(at) = node.position else {
		return;
	};
	ctx.set_global_alpha(node.alpha);
	ctx.begin_path();
	let _ = ctx.arc(at.x, at.y, node.radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(&node.fill);
	ctx.fill();
	if let Some(stroke) = &node.stroke {
		ctx.set_stroke_style_str(stroke);
		ctx.set_line_width(STROKE_WIDTH);
		ctx.stroke();
	}
}

fn draw_label(node: &NodeRecord, ctx: &CanvasRenderingContext2d) {
	let label = &node.label;
	if node.position.is_none() || label.alpha <= 0.0 {
		return;
	}
	// scale about the anchor so the text keeps its size on screen
	let scale = label.scale();
	ctx.save();
	ctx.set_global_alpha(label.alpha);
	let _ = ctx.translate(label.position.x, label.position.y);
	let _ = ctx.scale(scale, scale);
	let _ = ctx.fill_text(&label.text, 0.0, 0.0);
	ctx.restore();
}
