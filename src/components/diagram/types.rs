use std::collections::HashMap;

/// Stable identifier of a node.
pub type NodeId = String;
/// Stable identifier of a link.
pub type LinkId = String;

#[derive(Clone, Debug, Default)]
pub struct DiagramNode {
	pub id: NodeId,
	pub color: String,
	pub metrics: HashMap<String, f64>,
}

#[derive(Clone, Debug, Default)]
pub struct DiagramLink {
	pub id: LinkId,
	pub source: NodeId,
	pub target: NodeId,
	pub metrics: HashMap<String, f64>,
}

#[derive(Clone, Debug, Default)]
pub struct DiagramData {
	pub nodes: Vec<DiagramNode>,
	pub links: Vec<DiagramLink>,
}

/// Projection used for the lifetime of a diagram.
///
/// Perspective encodes the metric as depth, orthographic encodes it as size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CameraMode {
	Orthographic,
	#[default]
	Perspective,
}

/// Width and height of the output surface in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
}

impl Viewport {
	pub fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	pub fn aspect(&self) -> f64 {
		self.width / self.height
	}
}

/// Tunables for a diagram. Camera mode and metric key are usually overridden by
/// the component props.
#[derive(Clone, Debug)]
pub struct DiagramConfig {
	pub camera_mode: CameraMode,
	pub metric_key: String,
	pub node_radius: f32,
	pub background: String,
	pub link_color: String,
	pub hover_color: String,
	pub selected_color: String,
	/// Clicking the selected node again clears the selection.
	pub click_toggles_selection: bool,
	pub frustum_size: f32,
	pub fov_degrees: f32,
	pub standoff: f32,
	pub damping: f32,
	pub layout_interval_ms: i32,
}

impl Default for DiagramConfig {
	fn default() -> Self {
		Self {
			camera_mode: CameraMode::Perspective,
			metric_key: "count".into(),
			node_radius: 10.0,
			background: "#e9eae3".into(),
			link_color: "#8a8d80".into(),
			hover_color: "#ff7f0e".into(),
			selected_color: "#d62728".into(),
			click_toggles_selection: false,
			frustum_size: 1000.0,
			fov_degrees: 45.0,
			standoff: 250.0,
			damping: 0.1,
			layout_interval_ms: 16,
		}
	}
}
