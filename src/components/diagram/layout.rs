use std::collections::HashMap;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use glam::Vec2;
use log::debug;

use super::error::DiagramError;
use super::types::NodeId;

const TICK_DT: f32 = 0.016;
const ALPHA_MIN: f32 = 0.001;
const CENTER_STRENGTH: f32 = 0.1;

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutNode {
	pub id: NodeId,
	pub x: f32,
	pub y: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutLink {
	pub source: NodeId,
	pub target: NodeId,
}

/// Latest layout positions. `version` grows by one per tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionSnapshot {
	pub version: u64,
	pub positions: HashMap<NodeId, Vec2>,
}

pub type TickCallback = Box<dyn FnMut(&PositionSnapshot)>;

/// An iterative force layout that reports after every step.
pub trait PhysicsEngine {
	/// Loads nodes and links and resets the cooling schedule.
	fn simulate(
		&mut self,
		nodes: &[LayoutNode],
		links: &[LayoutLink],
		on_tick: TickCallback,
	) -> Result<(), DiagramError>;

	/// Runs one step immediately, regardless of cooling.
	fn tick(&mut self);

	/// Runs one step if the layout is still hot. Returns `false` once it has stopped.
	fn step(&mut self) -> bool;

	fn is_running(&self) -> bool;
}

#[derive(Clone, Debug, Default)]
struct LayoutInfo {
	id: NodeId,
	last: Vec2,
}

/// Repulsion and springs from `force_graph`, plus a pull towards the origin on
/// both axes. Each step moves nodes by `alpha` times the net displacement, so the
/// layout freezes at its force balance as alpha cools.
pub struct ForceLayout {
	graph: ForceGraph<LayoutInfo, ()>,
	alpha: f32,
	alpha_decay: f32,
	snapshot: PositionSnapshot,
	on_tick: Option<TickCallback>,
}

impl Default for ForceLayout {
	fn default() -> Self {
		Self::new()
	}
}

impl ForceLayout {
	pub fn new() -> Self {
		Self {
			graph: Self::empty_graph(),
			alpha: 1.0,
			alpha_decay: 1.0 - ALPHA_MIN.powf(1.0 / 300.0),
			snapshot: PositionSnapshot::default(),
			on_tick: None,
		}
	}

	fn empty_graph() -> ForceGraph<LayoutInfo, ()> {
		ForceGraph::new(SimulationParameters {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		})
	}

	#[cfg(test)]
	pub fn snapshot(&self) -> &PositionSnapshot {
		&self.snapshot
	}

	fn advance(&mut self) {
		self.graph.visit_nodes_mut(|node| {
			node.data.user_data.last = Vec2::new(node.data.x, node.data.y);
		});
		self.graph.update(TICK_DT);
		let alpha = self.alpha;
		self.graph.visit_nodes_mut(|node| {
			let last = node.data.user_data.last;
			let moved = Vec2::new(node.data.x, node.data.y) - last;
			let next = last + (moved - last * CENTER_STRENGTH) * alpha;
			node.data.x = next.x;
			node.data.y = next.y;
		});
		self.alpha += (0.0 - self.alpha) * self.alpha_decay;

		let positions = &mut self.snapshot.positions;
		self.graph.visit_nodes(|node| {
			positions.insert(node.data.user_data.id.clone(), Vec2::new(node.x(), node.y()));
		});
		self.snapshot.version += 1;

		if let Some(on_tick) = self.on_tick.as_mut() {
			on_tick(&self.snapshot);
		}
	}
}

impl PhysicsEngine for ForceLayout {
	fn simulate(
		&mut self,
		nodes: &[LayoutNode],
		links: &[LayoutLink],
		on_tick: TickCallback,
	) -> Result<(), DiagramError> {
		let mut graph = Self::empty_graph();
		let mut id_to_idx: HashMap<&str, DefaultNodeIdx> = HashMap::with_capacity(nodes.len());
		for node in nodes {
			let idx = graph.add_node(NodeData {
				x: node.x,
				y: node.y,
				mass: 10.0,
				is_anchor: false,
				user_data: LayoutInfo {
					id: node.id.clone(),
					last: Vec2::new(node.x, node.y),
				},
			});
			id_to_idx.insert(&node.id, idx);
		}
		for link in links {
			let resolve = |id: &str| {
				id_to_idx
					.get(id)
					.copied()
					.ok_or_else(|| DiagramError::UnknownLayoutNode(id.to_owned()))
			};
			let (src, tgt) = (resolve(&link.source)?, resolve(&link.target)?);
			graph.add_edge(src, tgt, EdgeData::default());
		}

		debug!("layout loaded {} nodes, {} links", nodes.len(), links.len());
		self.graph = graph;
		self.alpha = 1.0;
		self.snapshot = PositionSnapshot::default();
		self.on_tick = Some(on_tick);
		Ok(())
	}

	fn tick(&mut self) {
		self.advance();
	}

	fn step(&mut self) -> bool {
		if !self.is_running() {
			return false;
		}
		self.advance();
		true
	}

	fn is_running(&self) -> bool {
		self.alpha >= ALPHA_MIN
	}
}
