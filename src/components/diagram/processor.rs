use super::graph::Graph;
use super::types::CameraMode;

pub const NUM_BRACKETS: u32 = 10;
/// Lower bound for the metric maximum, so sparse datasets still get small sizes.
pub const METRIC_FLOOR: f64 = 1000.0;

/// Quantizes raw metrics into brackets and derives scale and depth from them.
#[derive(Clone, Copy, Debug)]
pub struct DataProcessor {
	pub num_brackets: u32,
	pub floor: f64,
}

impl Default for DataProcessor {
	fn default() -> Self {
		Self {
			num_brackets: NUM_BRACKETS,
			floor: METRIC_FLOOR,
		}
	}
}

impl DataProcessor {
	pub fn bracket(&self, value: Option<f64>, max: f64) -> u32 {
		let Some(value) = value.filter(|v| v.is_finite() && *v > 0.0) else {
			return 0;
		};
		let raw = (value * self.num_brackets as f64 / max).ceil();
		raw.clamp(0.0, self.num_brackets as f64) as u32
	}

	/// Returns `(scale, depth)` for a bracket in the given projection.
	pub fn encode(&self, bracket: u32, mode: CameraMode) -> (f32, f32) {
		let b = bracket as f32;
		match mode {
			CameraMode::Perspective => (1.0, -(50.0 * b * 0.8 + 100.0)),
			CameraMode::Orthographic => (0.2 + b * 0.08, 0.0),
		}
	}

	/// Recomputes brackets, scale and depth for every node, and width brackets for
	/// links carrying the metric. Nothing is pushed to the renderer here.
	pub fn process(&self, graph: &mut Graph, metric_key: &str, mode: CameraMode) {
		let node_max = graph
			.nodes()
			.filter_map(|n| n.metric(metric_key))
			.filter(|v| v.is_finite())
			.fold(self.floor, f64::max);

		for node in graph.nodes_mut() {
			let bracket = self.bracket(node.metric(metric_key), node_max);
			let (scale, depth) = self.encode(bracket, mode);
			node.size_bracket = bracket;
			node.visual_scale = scale;
			node.visual_depth = depth;
			node.position.z = depth;
		}

		let link_max = graph
			.links()
			.filter_map(|l| l.metric(metric_key))
			.filter(|v| v.is_finite())
			.fold(self.floor, f64::max);

		for link in graph.links_mut() {
			link.width_bracket = link
				.metric(metric_key)
				.map(|value| self.bracket(Some(value), link_max));
		}
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;
	use crate::components::diagram::types::{DiagramData, DiagramLink, DiagramNode};

	fn graph_with(values: &[(&str, Option<f64>)]) -> Graph {
		let nodes = values
			.iter()
			.map(|(id, v)| DiagramNode {
				id: (*id).into(),
				color: "#000".into(),
				metrics: v.map(|v| HashMap::from([("count".to_string(), v)])).unwrap_or_default(),
			})
			.collect();
		Graph::new(&DiagramData {
			nodes,
			links: vec![],
		})
		.unwrap()
	}

	fn bracket_of(graph: &Graph, id: &str) -> u32 {
		graph.node(id).unwrap().size_bracket
	}

	#[test]
	fn brackets_against_floor() {
		let mut graph = graph_with(&[("A", Some(200.0)), ("B", Some(800.0)), ("C", Some(1000.0))]);
		DataProcessor::default().process(&mut graph, "count", CameraMode::Orthographic);
		assert_eq!(bracket_of(&graph, "A"), 2);
		assert_eq!(bracket_of(&graph, "B"), 8);
		assert_eq!(bracket_of(&graph, "C"), 10);
	}

	#[test]
	fn orthographic_encodes_size() {
		let mut graph = graph_with(&[("B", Some(800.0))]);
		DataProcessor::default().process(&mut graph, "count", CameraMode::Orthographic);
		let b = graph.node("B").unwrap();
		assert!((b.visual_scale - 0.84).abs() < 1e-6);
		assert_eq!(b.visual_depth, 0.0);
		assert_eq!(b.position.z, 0.0);
	}

	#[test]
	fn perspective_encodes_depth() {
		let mut graph = graph_with(&[("A", Some(200.0)), ("C", Some(1000.0))]);
		DataProcessor::default().process(&mut graph, "count", CameraMode::Perspective);
		let a = graph.node("A").unwrap();
		let c = graph.node("C").unwrap();
		assert_eq!(a.visual_scale, 1.0);
		assert!((a.position.z - -180.0).abs() < 1e-4);
		assert!((c.position.z - -500.0).abs() < 1e-4);
		assert!(c.position.z < a.position.z);
	}

	#[test]
	fn missing_or_zero_metric_is_bracket_zero() {
		let mut graph = graph_with(&[("none", None), ("zero", Some(0.0)), ("neg", Some(-5.0))]);
		DataProcessor::default().process(&mut graph, "count", CameraMode::Orthographic);
		for id in ["none", "zero", "neg"] {
			let node = graph.node(id).unwrap();
			assert_eq!(node.size_bracket, 0);
			assert!((node.visual_scale - 0.2).abs() < 1e-6);
		}
	}

	#[test]
	fn brackets_stay_in_range_above_floor() {
		let values: Vec<(String, Option<f64>)> = (0..50)
			.map(|i| (i.to_string(), Some(i as f64 * 97.0)))
			.collect();
		let refs: Vec<(&str, Option<f64>)> = values.iter().map(|(k, v)| (k.as_str(), *v)).collect();
		let mut graph = graph_with(&refs);
		DataProcessor::default().process(&mut graph, "count", CameraMode::Perspective);
		for node in graph.nodes() {
			assert!(node.size_bracket <= NUM_BRACKETS);
		}
		assert_eq!(bracket_of(&graph, "49"), NUM_BRACKETS);
	}

	#[test]
	fn process_is_idempotent() {
		let mut graph = graph_with(&[("A", Some(321.0)), ("B", Some(999.0))]);
		let processor = DataProcessor::default();
		processor.process(&mut graph, "count", CameraMode::Perspective);
		let first: Vec<(String, u32, f32, f32)> = {
			let mut v: Vec<_> = graph
				.nodes()
				.map(|n| (n.id.clone(), n.size_bracket, n.visual_scale, n.position.z))
				.collect();
			v.sort_by(|a, b| a.0.cmp(&b.0));
			v
		};
		processor.process(&mut graph, "count", CameraMode::Perspective);
		let mut second: Vec<_> = graph
			.nodes()
			.map(|n| (n.id.clone(), n.size_bracket, n.visual_scale, n.position.z))
			.collect();
		second.sort_by(|a, b| a.0.cmp(&b.0));
		assert_eq!(first, second);
	}

	#[test]
	fn links_get_width_bracket_only_with_metric() {
		let data = DiagramData {
			nodes: vec![
				DiagramNode {
					id: "a".into(),
					..Default::default()
				},
				DiagramNode {
					id: "b".into(),
					..Default::default()
				},
			],
			links: vec![
				DiagramLink {
					id: "weighted".into(),
					source: "a".into(),
					target: "b".into(),
					metrics: HashMap::from([("count".to_string(), 500.0)]),
				},
				DiagramLink {
					id: "plain".into(),
					source: "b".into(),
					target: "a".into(),
					metrics: HashMap::new(),
				},
			],
		};
		let mut graph = Graph::new(&data).unwrap();
		DataProcessor::default().process(&mut graph, "count", CameraMode::Perspective);
		let by_id = |id: &str| graph.links().find(|l| l.id == id).unwrap().width_bracket;
		assert_eq!(by_id("weighted"), Some(5));
		assert_eq!(by_id("plain"), None);
	}
}
