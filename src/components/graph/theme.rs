use log::debug;

use super::category::NodeCategory;

/// Colours and font resolved from the active theme when a graph is built.
#[derive(Clone, Debug, PartialEq)]
pub struct ThemeTokens {
	pub focal: String,
	pub tag: String,
	pub tag_stroke: String,
	pub visited: String,
	pub content: String,
	pub content_stroke: String,
	pub concept: String,
	pub dataset: String,
	pub library: String,
	pub model: String,
	pub platform: String,
	pub tool: String,
	pub fallback: String,
	pub link: String,
	pub link_active: String,
	pub label: String,
	pub background: String,
	pub font_family: String,
}

impl Default for ThemeTokens {
	fn default() -> Self {
		Self {
			focal: "#284b63".into(),
			tag: "#faf8f8".into(),
			tag_stroke: "#84a59d".into(),
			visited: "#84a59d".into(),
			content: "#b8b8b8".into(),
			content_stroke: "#e5e5e5".into(),
			concept: "#4e79a7".into(),
			dataset: "#f28e2b".into(),
			library: "#59a14f".into(),
			model: "#e15759".into(),
			platform: "#b07aa1".into(),
			tool: "#edc948".into(),
			fallback: "#b8b8b8".into(),
			link: "#e5e5e5".into(),
			link_active: "#b8b8b8".into(),
			label: "#2b2b2b".into(),
			background: "#faf8f8".into(),
			font_family: "sans-serif".into(),
		}
	}
}

impl ThemeTokens {
	/// Fill for a structural category, `None` where the category has no colour
	/// of its own.
	pub fn category_fill(&self, category: NodeCategory) -> Option<&str> {
		match category {
			NodeCategory::Content => Some(&self.content),
			NodeCategory::Tag => Some(&self.tag),
			NodeCategory::ConceptTopic => Some(&self.concept),
			NodeCategory::DatasetTopic => Some(&self.dataset),
			NodeCategory::LibraryTopic => Some(&self.library),
			NodeCategory::ModelTopic => Some(&self.model),
			NodeCategory::PlatformTopic => Some(&self.platform),
			NodeCategory::ToolTopic => Some(&self.tool),
			NodeCategory::Other => None,
		}
	}

	fn slots(&mut self) -> [(&'static str, &mut String); 18] {
		[
			("--secondary", &mut self.focal),
			("--light", &mut self.tag),
			("--tertiary", &mut self.tag_stroke),
			("--graph-visited", &mut self.visited),
			("--graph-content", &mut self.content),
			("--lightgray", &mut self.content_stroke),
			("--graph-concept", &mut self.concept),
			("--graph-dataset", &mut self.dataset),
			("--graph-library", &mut self.library),
			("--graph-model", &mut self.model),
			("--graph-platform", &mut self.platform),
			("--graph-tool", &mut self.tool),
			("--gray", &mut self.fallback),
			("--graph-link", &mut self.link),
			("--graph-link-active", &mut self.link_active),
			("--dark", &mut self.label),
			("--light", &mut self.background),
			("--bodyFont", &mut self.font_family),
		]
	}

	/// Overlay the non-empty values returned by `lookup` (a CSS custom
	/// property reader) on top of the defaults.
	pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Self {
		let mut tokens = Self::default();
		for (name, slot) in tokens.slots() {
			let Some(value) = lookup(name) else {
				continue;
			};
			let value = value.trim();
			if !value.is_empty() {
				*slot = value.to_string();
			}
		}
		tokens
	}

	/// Read the custom properties of the document root.
	pub fn from_document() -> Self {
		let style = web_sys::window().and_then(|window| {
			let root = window.document()?.document_element()?;
			window.get_computed_style(&root).ok().flatten()
		});
		let Some(style) = style else {
			debug!("no computed style available, using default graph colours");
			return Self::default();
		};
		Self::resolve(|name| style.get_property_value(name).ok())
	}
}
