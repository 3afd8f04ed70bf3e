use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failures that abort a mount or a background request.
#[derive(Debug, Error)]
pub enum GraphError {
	#[error("graph container has no data-cfg attribute")]
	MissingConfig,
	#[error("malformed graph configuration: {0}")]
	Config(#[from] serde_json::Error),
	#[error("invalid graph configuration: {0}")]
	InvalidConfig(String),
	#[error("rendering surface unavailable: {0}")]
	Surface(String),
	#[error("dom operation failed: {0}")]
	Dom(String),
	#[error("request failed with status {status}")]
	Fetch { status: u16 },
	#[error("no browser window")]
	NoWindow,
}

impl From<JsValue> for GraphError {
	fn from(value: JsValue) -> Self {
		GraphError::Dom(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
	}
}
