use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::f32::consts::PI;

use glam::Vec3;

use super::error::DiagramError;
use super::types::{DiagramData, LinkId, NodeId};

const INITIAL_RADIUS: f32 = 10.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionState {
	#[default]
	None,
	Hovered,
	Selected,
}

#[derive(Clone, Debug)]
pub struct Node {
	pub id: NodeId,
	pub position: Vec3,
	pub metrics: HashMap<String, f64>,
	pub size_bracket: u32,
	pub visual_scale: f32,
	pub visual_depth: f32,
	/// Base color from the input data.
	pub color: String,
	/// Color shown when the node is not focused.
	pub current_color: String,
	pub selection: SelectionState,
}

impl Node {
	pub fn metric(&self, key: &str) -> Option<f64> {
		self.metrics.get(key).copied()
	}
}

#[derive(Clone, Debug)]
pub struct Link {
	pub id: LinkId,
	pub source: NodeId,
	pub target: NodeId,
	pub metrics: HashMap<String, f64>,
	pub width_bracket: Option<u32>,
}

impl Link {
	pub fn metric(&self, key: &str) -> Option<f64> {
		self.metrics.get(key).copied()
	}
}

/// Owns node and link values. Drawables are kept by the renderer under the same ids.
#[derive(Clone, Debug, Default)]
pub struct Graph {
	nodes: HashMap<NodeId, Node>,
	links: HashMap<LinkId, Link>,
}

impl Graph {
	/// Builds the graph, checking link endpoints once. A dangling endpoint fails the
	/// whole construction.
	pub fn new(data: &DiagramData) -> Result<Self, DiagramError> {
		let mut nodes = HashMap::with_capacity(data.nodes.len());
		for (i, node) in data.nodes.iter().enumerate() {
			// phyllotaxis seed, so the first layout tick never starts from a pile
			let radius = INITIAL_RADIUS * (0.5 + i as f32).sqrt();
			let angle = i as f32 * PI * (3.0 - 5f32.sqrt());
			let entry = Node {
				id: node.id.clone(),
				position: Vec3::new(radius * angle.cos(), radius * angle.sin(), 0.0),
				metrics: node.metrics.clone(),
				size_bracket: 0,
				visual_scale: 1.0,
				visual_depth: 0.0,
				color: node.color.clone(),
				current_color: node.color.clone(),
				selection: SelectionState::None,
			};
			match nodes.entry(node.id.clone()) {
				Entry::Occupied(_) => return Err(DiagramError::DuplicateNode(node.id.clone())),
				Entry::Vacant(slot) => {
					slot.insert(entry);
				}
			}
		}

		let mut links = HashMap::with_capacity(data.links.len());
		for link in &data.links {
			for endpoint in [&link.source, &link.target] {
				if !nodes.contains_key(endpoint) {
					return Err(DiagramError::DanglingLink {
						link: link.id.clone(),
						node: endpoint.clone(),
					});
				}
			}
			let entry = Link {
				id: link.id.clone(),
				source: link.source.clone(),
				target: link.target.clone(),
				metrics: link.metrics.clone(),
				width_bracket: None,
			};
			if links.insert(link.id.clone(), entry).is_some() {
				return Err(DiagramError::DuplicateLink(link.id.clone()));
			}
		}

		Ok(Self { nodes, links })
	}

	#[cfg(test)]
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.get(id)
	}

	pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
		self.nodes.get_mut(id)
	}

	pub fn nodes(&self) -> impl Iterator<Item = &Node> {
		self.nodes.values()
	}

	pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
		self.nodes.values_mut()
	}

	pub fn links(&self) -> impl Iterator<Item = &Link> {
		self.links.values()
	}

	pub fn links_mut(&mut self) -> impl Iterator<Item = &mut Link> {
		self.links.values_mut()
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn link_count(&self) -> usize {
		self.links.len()
	}

	/// Current endpoints of a link, read from the node positions.
	pub fn link_points(&self, link: &Link) -> Option<(Vec3, Vec3)> {
		Some((
			self.nodes.get(&link.source)?.position,
			self.nodes.get(&link.target)?.position,
		))
	}

	#[cfg(test)]
	pub fn count_in_state(&self, state: SelectionState) -> usize {
		self.nodes.values().filter(|n| n.selection == state).count()
	}
}
