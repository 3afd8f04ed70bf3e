use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use log::debug;

use super::category::categorize;
use super::config::GraphConfig;
use super::types::{ContentIndex, GraphData, GraphLink, GraphNode, TAG_PREFIX, tag_node_id};

/// Inputs of a neighbourhood build.
#[derive(Clone, Debug)]
pub struct NeighborhoodParams {
	pub depth: i32,
	pub show_tags: bool,
	pub remove_tags: Vec<String>,
}

impl From<&GraphConfig> for NeighborhoodParams {
	fn from(config: &GraphConfig) -> Self {
		Self {
			depth: config.depth,
			show_tags: config.show_tags,
			remove_tags: config.remove_tags.clone(),
		}
	}
}

/// Every link of the site plus the tag nodes it mentions, in index order.
struct LinkIndex {
	links: Vec<(String, String)>,
	tags: Vec<String>,
}

impl LinkIndex {
	fn build(index: &ContentIndex, params: &NeighborhoodParams) -> Self {
		let mut links = Vec::new();
		let mut seen = HashSet::new();
		let mut tags = Vec::new();
		let mut seen_tags = HashSet::new();

		for (source, record) in index.iter() {
			for target in &record.links {
				if target == source || !index.contains(target) {
					continue;
				}
				if seen.insert((source.clone(), target.clone())) {
					links.push((source.clone(), target.clone()));
				}
			}

			if !params.show_tags {
				continue;
			}
			for tag in record
				.tags
				.iter()
				.filter(|tag| !params.remove_tags.contains(tag))
			{
				let tag_id = tag_node_id(tag);
				if seen_tags.insert(tag_id.clone()) {
					tags.push(tag_id.clone());
				}
				if seen.insert((source.clone(), tag_id.clone())) {
					links.push((source.clone(), tag_id));
				}
			}
		}

		Self { links, tags }
	}

	/// Undirected adjacency, neighbours listed in link order.
	fn adjacency(&self) -> HashMap<&str, Vec<&str>> {
		let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
		for (source, target) in &self.links {
			adjacency.entry(source).or_default().push(target);
			adjacency.entry(target).or_default().push(source);
		}
		adjacency
	}
}

/// Ids selected for display, in discovery order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Neighborhood {
	pub ids: Vec<String>,
}

impl Neighborhood {
	pub fn contains(&self, id: &str) -> bool {
		self.ids.iter().any(|member| member == id)
	}

	pub fn len(&self) -> usize {
		self.ids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}
}

fn focal_exists(index: &ContentIndex, link_index: &LinkIndex, focal: &str) -> bool {
	index.contains(focal)
		|| (focal.starts_with(TAG_PREFIX) && link_index.tags.iter().any(|tag| tag == focal))
}

fn select(
	index: &ContentIndex,
	link_index: &LinkIndex,
	focal: &str,
	params: &NeighborhoodParams,
) -> Neighborhood {
	if !focal_exists(index, link_index, focal) {
		return Neighborhood::default();
	}

	if params.depth < 0 {
		let mut ids: Vec<String> = index.iter().map(|(slug, _)| slug.clone()).collect();
		ids.extend(link_index.tags.iter().cloned());
		return Neighborhood { ids };
	}

	let adjacency = link_index.adjacency();
	let mut members = HashSet::new();
	let mut ids = Vec::new();
	let mut remaining = params.depth;
	// `None` marks the end of a frontier layer
	let mut queue: VecDeque<Option<&str>> = VecDeque::from([Some(focal), None]);

	while remaining >= 0 {
		let Some(entry) = queue.pop_front() else {
			break;
		};
		match entry {
			None => {
				remaining -= 1;
				if !queue.is_empty() {
					queue.push_back(None);
				}
			}
			Some(current) => {
				if !members.insert(current) {
					continue;
				}
				ids.push(current.to_string());
				if let Some(neighbors) = adjacency.get(current) {
					queue.extend(neighbors.iter().map(|&n| Some(n)));
				}
			}
		}
	}

	Neighborhood { ids }
}

/// Compute the neighbourhood of `focal` without materialising nodes.
pub fn neighborhood(
	index: &ContentIndex,
	focal: &str,
	params: &NeighborhoodParams,
) -> Neighborhood {
	let link_index = LinkIndex::build(index, params);
	select(index, &link_index, focal, params)
}

/// Build the graph shown around `focal`: categorised nodes in discovery
/// order and only those links whose endpoints were both selected.
pub fn build_graph(index: &ContentIndex, focal: &str, params: &NeighborhoodParams) -> GraphData {
	let link_index = LinkIndex::build(index, params);
	let selected = select(index, &link_index, focal, params);

	let positions: BTreeMap<&str, usize> = selected
		.ids
		.iter()
		.enumerate()
		.map(|(i, id)| (id.as_str(), i))
		.collect();

	let nodes = selected
		.ids
		.iter()
		.map(|id| match index.get(id) {
			Some(record) => GraphNode {
				id: id.clone(),
				text: if record.title.is_empty() {
					id.clone()
				} else {
					record.title.clone()
				},
				tags: record.tags.clone(),
				source_path: record.file_path.clone(),
				category: categorize(id, record.file_path.as_deref()),
			},
			None => GraphNode {
				id: id.clone(),
				text: format!("#{}", id.strip_prefix(TAG_PREFIX).unwrap_or(id)),
				tags: Vec::new(),
				source_path: None,
				category: categorize(id, None),
			},
		})
		.collect();

	let links: Vec<GraphLink> = link_index
		.links
		.iter()
		.filter_map(|(source, target)| {
			Some(GraphLink {
				source: *positions.get(source.as_str())?,
				target: *positions.get(target.as_str())?,
			})
		})
		.collect();

	debug!(
		"graph around {focal} at depth {}: {} nodes, {} links",
		params.depth,
		selected.len(),
		links.len()
	);

	GraphData { nodes, links }
}
