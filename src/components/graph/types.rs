use std::collections::BTreeMap;

use serde::Deserialize;

use super::category::NodeCategory;
use super::error::GraphError;

/// Prefix shared by every tag node identifier.
pub const TAG_PREFIX: &str = "tags/";

/// Per-page metadata produced by the content index builder.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ContentRecord {
	pub title: String,
	#[serde(default)]
	pub links: Vec<String>,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default, rename = "filePath")]
	pub file_path: Option<String>,
}

/// Every page of the site keyed by its simplified slug.
///
/// Backed by a `BTreeMap` so iteration order (and therefore every graph built
/// from it) is reproducible.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContentIndex {
	records: BTreeMap<String, ContentRecord>,
}

impl ContentIndex {
	pub fn new() -> Self {
		Self::default()
	}

	/// Parse the emitted `contentIndex.json`, simplifying keys and link targets.
	pub fn from_json(raw: &str) -> Result<Self, GraphError> {
		let parsed: BTreeMap<String, ContentRecord> = serde_json::from_str(raw)?;
		Ok(parsed.into_iter().collect())
	}

	pub fn insert(&mut self, slug: impl AsRef<str>, mut record: ContentRecord) {
		for link in &mut record.links {
			*link = simplify_slug(link);
		}
		self.records.insert(simplify_slug(slug.as_ref()), record);
	}

	pub fn get(&self, slug: &str) -> Option<&ContentRecord> {
		self.records.get(slug)
	}

	pub fn contains(&self, slug: &str) -> bool {
		self.records.contains_key(slug)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &ContentRecord)> {
		self.records.iter()
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}
}

impl<S: AsRef<str>> FromIterator<(S, ContentRecord)> for ContentIndex {
	fn from_iter<I: IntoIterator<Item = (S, ContentRecord)>>(iter: I) -> Self {
		let mut index = ContentIndex::new();
		for (slug, record) in iter {
			index.insert(slug, record);
		}
		index
	}
}

/// Drop a trailing `index` segment and surrounding slashes; the root becomes `/`.
pub fn simplify_slug(slug: &str) -> String {
	let trimmed = if slug == "index" {
		""
	} else {
		slug.strip_suffix("/index").unwrap_or(slug)
	};
	let trimmed = trimmed.trim_matches('/');
	if trimmed.is_empty() {
		"/".to_string()
	} else {
		trimmed.to_string()
	}
}

/// Map a location pathname (`/notes/foo.html`) to a simplified slug.
pub fn slug_from_path(pathname: &str) -> String {
	let path = pathname.trim_start_matches('/');
	let path = path.strip_suffix(".html").unwrap_or(path);
	simplify_slug(path)
}

/// In-app address for a slug.
pub fn slug_href(slug: &str) -> String {
	if slug == "/" {
		"/".to_string()
	} else {
		format!("/{}", slug)
	}
}

pub fn tag_node_id(tag: &str) -> String {
	format!("{TAG_PREFIX}{tag}")
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	pub id: String,
	pub text: String,
	pub tags: Vec<String>,
	pub source_path: Option<String>,
	pub category: NodeCategory,
}

/// Edge between two entries of [`GraphData::nodes`], stored by position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GraphLink {
	pub source: usize,
	pub target: usize,
}

impl GraphLink {
	pub fn touches(&self, node: usize) -> bool {
		self.source == node || self.target == node
	}

	/// The endpoint opposite `node`, if `node` is an endpoint at all.
	pub fn other(&self, node: usize) -> Option<usize> {
		if self.source == node {
			Some(self.target)
		} else if self.target == node {
			Some(self.source)
		} else {
			None
		}
	}
}

/// The neighbourhood selected for display: nodes in discovery order and the
/// links whose endpoints are both members.
#[derive(Clone, Debug, Default)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	pub links: Vec<GraphLink>,
}

impl GraphData {
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn position_of(&self, id: &str) -> Option<usize> {
		self.nodes.iter().position(|node| node.id == id)
	}

	/// Number of links touching each node, indexed like `nodes`.
	pub fn degrees(&self) -> Vec<usize> {
		let mut degrees = vec![0; self.nodes.len()];
		for link in &self.links {
			degrees[link.source] += 1;
			degrees[link.target] += 1;
		}
		degrees
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn length(&self) -> f64 {
		self.x.hypot(self.y)
	}

	pub fn is_finite(&self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_simplify_slug() {
		assert_eq!(simplify_slug("index"), "/");
		assert_eq!(simplify_slug("notes/index"), "notes");
		assert_eq!(simplify_slug("notes/graph"), "notes/graph");
		assert_eq!(slug_from_path("/"), "/");
		assert_eq!(slug_from_path("/notes/graph.html"), "notes/graph");
		assert_eq!(slug_href("/"), "/");
		assert_eq!(slug_href("notes/graph"), "/notes/graph");
	}

	#[test]
	fn test_index_from_json_simplifies_keys_and_links() {
		let raw = r#"{
			"index": {"title": "Home", "links": ["notes/index"], "tags": [], "content": "ignored"},
			"notes/index": {"title": "Notes", "links": [], "filePath": "notes/index.md"}
		}"#;
		let index = ContentIndex::from_json(raw).unwrap();
		assert_eq!(index.len(), 2);
		assert_eq!(index.get("/").unwrap().links, vec!["notes".to_string()]);
		assert_eq!(
			index.get("notes").unwrap().file_path.as_deref(),
			Some("notes/index.md")
		);
	}

	#[test]
	fn test_index_from_json_rejects_garbage() {
		assert!(ContentIndex::from_json("[1, 2]").is_err());
	}
}
