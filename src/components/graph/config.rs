use serde::{Deserialize, Serialize};

use super::error::GraphError;

/// Options attached to a graph container as JSON in its `data-cfg` attribute.
///
/// Every field is required. A blob that does not match this shape fails the
/// mount instead of being patched up with defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphConfig {
	pub drag: bool,
	pub zoom: bool,
	/// Hop radius around the focal page; negative shows everything.
	pub depth: i32,
	pub scale: f64,
	pub repel_force: f64,
	pub center_force: f64,
	pub link_distance: f64,
	pub font_size: f64,
	pub opacity_scale: f64,
	pub remove_tags: Vec<String>,
	pub show_tags: bool,
	pub focus_on_hover: bool,
	pub enable_radial: bool,
}

impl GraphConfig {
	/// Settings for the in-page graph.
	pub fn local() -> Self {
		Self {
			drag: true,
			zoom: true,
			depth: 1,
			scale: 1.1,
			repel_force: 0.5,
			center_force: 0.3,
			link_distance: 30.0,
			font_size: 0.6,
			opacity_scale: 1.0,
			remove_tags: Vec::new(),
			show_tags: true,
			focus_on_hover: false,
			enable_radial: false,
		}
	}

	/// Settings for the full-site overlay graph.
	pub fn global() -> Self {
		Self {
			depth: -1,
			scale: 0.9,
			focus_on_hover: true,
			enable_radial: true,
			..Self::local()
		}
	}

	pub fn from_json(raw: &str) -> Result<Self, GraphError> {
		let config: GraphConfig = serde_json::from_str(raw)?;
		config.validate()?;
		Ok(config)
	}

	pub fn to_json(&self) -> String {
		serde_json::to_string(self).unwrap_or_default()
	}

	pub fn validate(&self) -> Result<(), GraphError> {
		let numbers = [
			("scale", self.scale),
			("repelForce", self.repel_force),
			("centerForce", self.center_force),
			("linkDistance", self.link_distance),
			("fontSize", self.font_size),
			("opacityScale", self.opacity_scale),
		];
		if let Some((name, _)) = numbers.iter().find(|(_, v)| !v.is_finite()) {
			return Err(GraphError::InvalidConfig(format!("{name} is not a finite number")));
		}
		if self.scale <= 0.0 {
			return Err(GraphError::InvalidConfig("scale must be positive".into()));
		}
		if self.font_size <= 0.0 {
			return Err(GraphError::InvalidConfig("fontSize must be positive".into()));
		}
		if self.link_distance < 0.0 {
			return Err(GraphError::InvalidConfig(
				"linkDistance must not be negative".into(),
			));
		}
		Ok(())
	}
}
