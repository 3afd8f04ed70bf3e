use super::types::TAG_PREFIX;

/// Structural classification of a node, fixed when the graph is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeCategory {
	Content,
	Tag,
	ConceptTopic,
	DatasetTopic,
	LibraryTopic,
	ModelTopic,
	PlatformTopic,
	ToolTopic,
	Other,
}

impl NodeCategory {
	pub fn is_topic(self) -> bool {
		matches!(
			self,
			NodeCategory::ConceptTopic
				| NodeCategory::DatasetTopic
				| NodeCategory::LibraryTopic
				| NodeCategory::ModelTopic
				| NodeCategory::PlatformTopic
				| NodeCategory::ToolTopic
		)
	}
}

enum Matcher {
	TagPrefix,
	Folder(&'static str),
	HasPath,
}

impl Matcher {
	fn applies(&self, id: &str, path: Option<&str>) -> bool {
		match self {
			Matcher::TagPrefix => id.starts_with(TAG_PREFIX),
			Matcher::Folder(folder) => in_folder(path.unwrap_or(id), folder),
			Matcher::HasPath => path.is_some(),
		}
	}
}

fn in_folder(path: &str, folder: &str) -> bool {
	let mut segments: Vec<&str> = path.split('/').collect();
	// last segment is the file itself
	segments.pop();
	segments.contains(&folder)
}

/// First matching rule wins.
const RULES: &[(Matcher, NodeCategory)] = &[
	(Matcher::TagPrefix, NodeCategory::Tag),
	(Matcher::Folder("Concept"), NodeCategory::ConceptTopic),
	(Matcher::Folder("Dataset"), NodeCategory::DatasetTopic),
	(Matcher::Folder("Library"), NodeCategory::LibraryTopic),
	(Matcher::Folder("Model"), NodeCategory::ModelTopic),
	(Matcher::Folder("Platform"), NodeCategory::PlatformTopic),
	(Matcher::Folder("Tool"), NodeCategory::ToolTopic),
	(Matcher::HasPath, NodeCategory::Content),
];

pub fn categorize(id: &str, source_path: Option<&str>) -> NodeCategory {
	RULES
		.iter()
		.find(|(matcher, _)| matcher.applies(id, source_path))
		.map(|(_, category)| *category)
		.unwrap_or(NodeCategory::Other)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_model_folder_is_model_topic_only() {
		let category = categorize("Model/gpt", Some("content/Model/gpt.md"));
		assert_eq!(category, NodeCategory::ModelTopic);
		assert!(category.is_topic());
	}

	#[test]
	fn test_tag_prefix_wins_over_path() {
		assert_eq!(categorize("tags/Model", None), NodeCategory::Tag);
		assert_eq!(
			categorize("tags/rust", Some("content/Tool/rust.md")),
			NodeCategory::Tag
		);
	}

	#[test]
	fn test_folder_must_be_a_whole_segment() {
		assert_eq!(
			categorize("notes/Modeling", Some("notes/Modeling.md")),
			NodeCategory::Content
		);
		assert_eq!(
			categorize("SuperModel/x", Some("SuperModel/x.md")),
			NodeCategory::Content
		);
	}

	#[test]
	fn test_fallbacks() {
		assert_eq!(categorize("notes/a", Some("notes/a.md")), NodeCategory::Content);
		assert_eq!(categorize("orphan", None), NodeCategory::Other);
		assert_eq!(categorize("Dataset/mnist", None), NodeCategory::DatasetTopic);
	}
}
