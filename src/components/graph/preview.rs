use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::task::spawn_local;
use log::debug;
use wasm_bindgen::prelude::*;
use web_sys::{Document, DomParser, Element, SupportedType, Url};

use super::dom::{fetch_response, response_text};
use super::error::GraphError;
use super::popover::{
	PopoverHost, PreviewKind, namespaced_id, place_popover, popover_element_id, preview_kind,
};

const ACTIVE_CLASS: &str = "active-popover";
const HINT_SELECTOR: &str = ".popover-hint";

/// In-document target of a `#fragment` link once ids are namespaced.
pub fn internal_anchor(href: &str) -> Option<String> {
	let fragment = href.strip_prefix('#')?;
	if fragment.is_empty() {
		return None;
	}
	Some(format!("#{}", namespaced_id(fragment)))
}

/// Inline style of a popover: hidden, or fixed at `at` in viewport pixels.
fn popover_style(at: Option<(f64, f64)>) -> String {
	match at {
		Some((left, top)) => format!(
			"position: fixed; display: block; z-index: 999; left: {left}px; top: {top}px;"
		),
		None => "position: fixed; display: none;".to_string(),
	}
}

/// Counts shows and hides so a fetch can tell whether it is still wanted.
#[derive(Default)]
struct Generation(Cell<u64>);

impl Generation {
	fn bump(&self) -> u64 {
		let next = self.0.get() + 1;
		self.0.set(next);
		next
	}

	fn is_current(&self, generation: u64) -> bool {
		self.0.get() == generation
	}
}

struct Layer {
	root: Element,
	generation: Generation,
	shown: RefCell<Option<Element>>,
}

impl Layer {
	fn find(&self, id: &str) -> Option<Element> {
		self.root.query_selector(&format!("#{id}")).ok().flatten()
	}

	fn reveal(&self, popover: &Element, cursor: (f64, f64)) {
		self.conceal();
		// laid out at the cursor first so it can be measured
		let _ = popover.set_attribute("style", &popover_style(Some(cursor)));
		let rect = popover.get_bounding_client_rect();
		let viewport = web_sys::window()
			.map(|w| {
				(
					w.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0),
					w.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0),
				)
			})
			.unwrap_or_default();
		let placed = place_popover(cursor, (rect.width(), rect.height()), viewport);
		let _ = popover.set_attribute("style", &popover_style(Some(placed)));
		let _ = popover.class_list().add_1(ACTIVE_CLASS);
		*self.shown.borrow_mut() = Some(popover.clone());
	}

	fn conceal(&self) {
		if let Some(popover) = self.shown.borrow_mut().take() {
			let _ = popover.set_attribute("style", &popover_style(None));
			let _ = popover.class_list().remove_1(ACTIVE_CLASS);
		}
	}
}

/// Shows link previews inside a layer element owned by one graph mount.
///
/// Every show and hide bumps a generation counter; a fetch that completes
/// after a newer show or a hide is dropped.
#[derive(Clone)]
pub struct DomPopoverHost {
	layer: Rc<Layer>,
}

impl DomPopoverHost {
	pub fn new(root: Element) -> Self {
		Self {
			layer: Rc::new(Layer {
				root,
				generation: Generation::default(),
				shown: RefCell::new(None),
			}),
		}
	}
}

impl PopoverHost for DomPopoverHost {
	fn show(&self, address: &str, cursor: (f64, f64)) {
		let generation = self.layer.generation.bump();
		let id = popover_element_id(address);
		if let Some(existing) = self.layer.find(&id) {
			self.layer.reveal(&existing, cursor);
			return;
		}

		let layer = self.layer.clone();
		let address = address.to_string();
		spawn_local(async move {
			let popover = match build_popover(&address, &id).await {
				Ok(Some(popover)) => popover,
				Ok(None) => {
					debug!("nothing to preview at {address}");
					return;
				}
				Err(e) => {
					debug!("preview of {address} failed: {e}");
					return;
				}
			};
			if !layer.generation.is_current(generation) {
				debug!("dropping stale preview of {address}");
				return;
			}
			if layer.root.append_child(&popover).is_ok() {
				layer.reveal(&popover, cursor);
			}
		});
	}

	fn hide(&self) {
		self.layer.generation.bump();
		self.layer.conceal();
	}
}

async fn build_popover(address: &str, id: &str) -> Result<Option<Element>, GraphError> {
	let response = fetch_response(address).await?;
	let content_type = response.headers().get("Content-Type")?.unwrap_or_default();
	let Some(kind) = preview_kind(&content_type) else {
		return Ok(None);
	};

	let document = web_sys::window()
		.and_then(|w| w.document())
		.ok_or(GraphError::NoWindow)?;
	let popover = document.create_element("div")?;
	popover.set_id(id);
	popover.set_class_name("popover");
	popover.set_attribute("style", &popover_style(None))?;
	let inner = document.create_element("div")?;
	inner.set_class_name("popover-inner");
	inner.set_attribute("data-content-type", &content_type)?;
	popover.append_child(&inner)?;

	match kind {
		PreviewKind::Image => {
			let img = document.create_element("img")?;
			img.set_attribute("src", address)?;
			img.set_attribute("alt", address)?;
			inner.append_child(&img)?;
		}
		PreviewKind::Pdf => {
			let frame = document.create_element("iframe")?;
			frame.set_attribute("src", address)?;
			inner.append_child(&frame)?;
		}
		PreviewKind::Html => {
			let text = response_text(&response).await?;
			let parsed = DomParser::new()?.parse_from_string(&text, SupportedType::TextHtml)?;
			rewrite_for_embedding(&parsed, address)?;
			let Some(hint) = parsed.query_selector(HINT_SELECTOR)? else {
				return Ok(None);
			};
			inner.append_child(&hint)?;
		}
	}
	Ok(Some(popover))
}

fn each_element(
	document: &Document,
	selector: &str,
	mut apply: impl FnMut(&Element) -> Result<(), JsValue>,
) -> Result<(), GraphError> {
	let found = document.query_selector_all(selector)?;
	for i in 0..found.length() {
		if let Some(element) = found.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
			apply(&element)?;
		}
	}
	Ok(())
}

/// New value for an `href` or `src` attribute, or `None` to leave it as is.
fn rewrite_reference(value: &str, resolve: impl Fn(&str) -> Option<String>) -> Option<String> {
	match internal_anchor(value) {
		Some(anchor) => Some(anchor),
		None if value.starts_with('#') => None,
		None => resolve(value),
	}
}

/// Namespace ids and same-page anchors, and resolve relative references
/// against the page the preview came from.
fn rewrite_for_embedding(document: &Document, base: &str) -> Result<(), GraphError> {
	each_element(document, "[id]", |element| {
		element.set_id(&namespaced_id(&element.id()));
		Ok(())
	})?;
	each_element(document, "[href], [src]", |element| {
		for attribute in ["href", "src"] {
			let Some(value) = element.get_attribute(attribute) else {
				continue;
			};
			let rewritten = match internal_anchor(&value) {
				Some(anchor) => anchor,
				None if value.starts_with('#') => continue,
				None => Url::new_with_base(&value, base)?.href(),
			};
			element.set_attribute(attribute, &rewritten)?;
		}
		Ok(())
	})
}
