use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiagramError {
	#[error("link `{link}` references missing node `{node}`")]
	DanglingLink { link: String, node: String },

	#[error("duplicate node id `{0}`")]
	DuplicateNode(String),

	#[error("duplicate link id `{0}`")]
	DuplicateLink(String),

	#[error("layout link references unknown node `{0}`")]
	UnknownLayoutNode(String),

	#[error("drawing surface unavailable: {0}")]
	Surface(String),
}
