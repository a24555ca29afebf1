use glam::{Vec2, Vec3};
use log::{debug, info, warn};

use super::camera::CameraRig;
use super::error::DiagramError;
use super::graph::Graph;
use super::interaction::{Cursor, InteractionTracker};
use super::layout::{LayoutLink, LayoutNode, PositionSnapshot};
use super::processor::DataProcessor;
use super::primitive::PrimitiveId;
use super::render::Renderer;
use super::types::{DiagramConfig, DiagramData, Viewport};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
	#[default]
	Uninitialized,
	Initialized,
	Running,
	TornDown,
}

fn link_width(bracket: Option<u32>) -> f32 {
	1.0 + bracket.unwrap_or(0) as f32 * 0.3
}

fn mean_depth(graph: &Graph) -> f32 {
	let count = graph.node_count();
	if count == 0 {
		return 0.0;
	}
	graph.nodes().map(|n| n.visual_depth).sum::<f32>() / count as f32
}

/// Owns the graph, camera and interaction state, and drives one frame at a time.
///
/// The layout engine and the frame scheduler live outside; they call
/// [`DiagramController::sync_positions`] and [`DiagramController::frame`] at their
/// own cadence.
pub struct DiagramController<R: Renderer> {
	config: DiagramConfig,
	phase: Phase,
	graph: Graph,
	renderer: R,
	camera: CameraRig,
	tracker: InteractionTracker,
	processor: DataProcessor,
	applied_version: u64,
}

impl<R: Renderer> DiagramController<R> {
	pub fn new(config: DiagramConfig, renderer: R) -> Self {
		Self {
			camera: CameraRig::new(&config, Viewport::new(1.0, 1.0)),
			tracker: InteractionTracker::new(&config),
			config,
			phase: Phase::Uninitialized,
			graph: Graph::default(),
			renderer,
			processor: DataProcessor::default(),
			applied_version: 0,
		}
	}

	#[cfg(test)]
	pub fn phase(&self) -> Phase {
		self.phase
	}

	#[cfg(test)]
	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	#[cfg(test)]
	pub fn renderer(&self) -> &R {
		&self.renderer
	}

	#[cfg(test)]
	pub fn camera(&self) -> &CameraRig {
		&self.camera
	}

	#[cfg(test)]
	pub fn tracker(&self) -> &InteractionTracker {
		&self.tracker
	}

	#[cfg(test)]
	pub fn metric_key(&self) -> &str {
		&self.config.metric_key
	}

	/// Builds the graph and a primitive for every node and link. Integrity errors
	/// abort before anything reaches the renderer.
	pub fn init(&mut self, data: &DiagramData, viewport: Viewport) -> Result<(), DiagramError> {
		if self.phase != Phase::Uninitialized {
			warn!("init called in phase {:?}", self.phase);
			return Ok(());
		}
		let mut graph = Graph::new(data)?;
		self.processor
			.process(&mut graph, &self.config.metric_key, self.config.camera_mode);

		self.camera = CameraRig::new(&self.config, viewport);
		self.camera.set_pan_depth(mean_depth(&graph));
		self.renderer.resize(viewport.width, viewport.height);

		let radius = self.config.node_radius;
		for node in graph.nodes() {
			self.renderer
				.create_node(&node.id, node.position, &node.color, radius, node.visual_scale);
		}
		for link in graph.links() {
			let Some((start, end)) = graph.link_points(link) else {
				continue;
			};
			self.renderer.create_link(
				&link.id,
				start,
				end,
				&self.config.link_color,
				link_width(link.width_bracket),
			);
		}

		info!(
			"diagram initialized: {} nodes, {} links, {:?}",
			graph.node_count(),
			graph.link_count(),
			self.config.camera_mode
		);
		self.graph = graph;
		self.phase = Phase::Initialized;
		Ok(())
	}

	/// Node and link arrays for the layout engine.
	pub fn layout_input(&self) -> (Vec<LayoutNode>, Vec<LayoutLink>) {
		let nodes = self
			.graph
			.nodes()
			.map(|n| LayoutNode {
				id: n.id.clone(),
				x: n.position.x,
				y: n.position.y,
			})
			.collect();
		let links = self
			.graph
			.links()
			.map(|l| LayoutLink {
				source: l.source.clone(),
				target: l.target.clone(),
			})
			.collect();
		(nodes, links)
	}

	/// Applies a layout snapshot to the graph and the primitives. Snapshots that are
	/// not newer than the last applied one are ignored.
	pub fn sync_positions(&mut self, snapshot: &PositionSnapshot) {
		if matches!(self.phase, Phase::Uninitialized | Phase::TornDown) {
			return;
		}
		if snapshot.version <= self.applied_version {
			return;
		}
		for (id, xy) in &snapshot.positions {
			let Some(node) = self.graph.node_mut(id) else {
				continue;
			};
			node.position = Vec3::new(xy.x, xy.y, node.visual_depth);
			self.renderer.set_position(id, node.position);
		}
		self.push_link_points();
		self.applied_version = snapshot.version;
	}

	fn push_link_points(&mut self) {
		for link in self.graph.links() {
			let (Some(start), Some(end)) = (
				self.renderer.get_position(&link.source),
				self.renderer.get_position(&link.target),
			) else {
				continue;
			};
			self.renderer.set_points(&link.id, start, end);
		}
	}

	pub fn start(&mut self) {
		match self.phase {
			Phase::Initialized => {
				self.phase = Phase::Running;
				debug!("diagram running");
			}
			phase => warn!("start called in phase {phase:?}"),
		}
	}

	/// One frame: camera controls, pick, schedule the next frame, render.
	pub fn frame(&mut self, schedule_next: impl FnOnce()) {
		if self.phase != Phase::Running {
			return;
		}
		self.camera.update();
		self.pick();
		schedule_next();
		self.renderer.render(&self.camera);
	}

	fn pick(&mut self) {
		// a drag owns the cursor; hover resumes once it ends
		if self.camera.is_dragging() {
			return;
		}
		let hit = self
			.tracker
			.pointer()
			.map(|p| self.camera.ray_from_screen(p))
			.and_then(|ray| self.renderer.pick(&ray));
		self.tracker.update(hit, &mut self.graph, &mut self.renderer);
	}

	pub fn pointer_move(&mut self, x: f64, y: f64) {
		self.tracker.set_pointer(Some(Vec2::new(x as f32, y as f32)));
		let was_dragging = self.camera.is_dragging();
		self.camera.drag_pan(x, y);
		if !was_dragging && self.camera.is_dragging() {
			self.renderer.set_cursor(Cursor::Grabbing);
		}
	}

	pub fn pointer_down(&mut self, x: f64, y: f64) {
		self.camera.begin_pan(x, y);
	}

	pub fn pointer_up(&mut self) {
		if self.camera.was_dragged() {
			self.renderer.set_cursor(self.tracker.cursor());
		}
		self.camera.end_pan();
	}

	pub fn pointer_leave(&mut self) {
		self.tracker.set_pointer(None);
		self.camera.end_pan();
	}

	pub fn click(&mut self) {
		if self.camera.was_dragged() {
			return;
		}
		self.tracker.queue_click();
	}

	pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) {
		self.camera.wheel(delta_y, Some(Vec2::new(x as f32, y as f32)));
	}

	/// Recomputes camera bounds and resizes the output surface. Degenerate viewports
	/// keep the previous projection.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.camera.resize(width, height);
		self.renderer.resize(width, height);
	}

	/// Re-buckets every node by another metric and pushes scale and depth to the
	/// existing primitives.
	pub fn update_sizing(&mut self, metric_key: &str) {
		if matches!(self.phase, Phase::Uninitialized | Phase::TornDown) {
			return;
		}
		self.config.metric_key = metric_key.to_owned();
		self.processor
			.process(&mut self.graph, metric_key, self.config.camera_mode);
		self.camera.set_pan_depth(mean_depth(&self.graph));
		for node in self.graph.nodes() {
			let key = PrimitiveId::Node(node.id.clone());
			self.renderer.set_scale(&key, node.visual_scale);
			self.renderer.set_position(&node.id, node.position);
		}
		for link in self.graph.links() {
			let key = PrimitiveId::Link(link.id.clone());
			self.renderer.set_scale(&key, link_width(link.width_bracket));
		}
		self.push_link_points();
		debug!("sizing updated to `{metric_key}`");
	}

	/// Releases every primitive. Nothing is drawn after this.
	pub fn teardown(&mut self) {
		if self.phase == Phase::TornDown {
			return;
		}
		self.renderer.release();
		self.tracker.reset();
		self.renderer.set_cursor(Cursor::Default);
		self.phase = Phase::TornDown;
		info!("diagram torn down");
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::collections::HashMap;
	use std::rc::Rc;

	use super::*;
	use crate::components::diagram::graph::SelectionState;
	use crate::components::diagram::layout::{ForceLayout, PhysicsEngine};
	use crate::components::diagram::primitive::{Primitive, Scalable};
	use crate::components::diagram::testing::RecordingRenderer;
	use crate::components::diagram::types::{CameraMode, DiagramLink, DiagramNode};

	fn sample() -> DiagramData {
		let node = |id: &str, count: f64, weight: f64| DiagramNode {
			id: id.into(),
			color: "#2ca02c".into(),
			metrics: HashMap::from([("count".to_string(), count), ("weight".to_string(), weight)]),
		};
		let link = |id: &str, s: &str, t: &str| DiagramLink {
			id: id.into(),
			source: s.into(),
			target: t.into(),
			metrics: HashMap::new(),
		};
		DiagramData {
			nodes: vec![node("a", 200.0, 900.0), node("b", 800.0, 100.0), node("c", 1000.0, 0.0)],
			links: vec![link("ab", "a", "b"), link("bc", "b", "c")],
		}
	}

	fn controller(mode: CameraMode) -> DiagramController<RecordingRenderer> {
		let config = DiagramConfig {
			camera_mode: mode,
			..Default::default()
		};
		DiagramController::new(config, RecordingRenderer::default())
	}

	fn running(mode: CameraMode) -> DiagramController<RecordingRenderer> {
		let mut c = controller(mode);
		c.init(&sample(), Viewport::new(800.0, 600.0)).unwrap();
		c.start();
		c
	}

	fn snapshot(version: u64, entries: &[(&str, f32, f32)]) -> PositionSnapshot {
		PositionSnapshot {
			version,
			positions: entries
				.iter()
				.map(|(id, x, y)| ((*id).to_string(), Vec2::new(*x, *y)))
				.collect(),
		}
	}

	fn node_scale(c: &DiagramController<RecordingRenderer>, id: &str) -> f32 {
		match c.renderer().scene().node(id) {
			Some(Primitive::Node { mesh, .. }) => mesh.scale(),
			_ => panic!("missing {id}"),
		}
	}

	#[test]
	fn init_creates_primitives() {
		let c = running(CameraMode::Perspective);
		assert_eq!(c.phase(), Phase::Running);
		assert_eq!(c.renderer().scene().len(), 5);
		assert_eq!(c.renderer().size, Some((800.0, 600.0)));
		let z = c.renderer().get_position("c").unwrap().z;
		assert!((z - -500.0).abs() < 1e-4);
	}

	#[test]
	fn dangling_link_aborts_init() {
		let mut data = sample();
		data.links.push(DiagramLink {
			id: "bad".into(),
			source: "a".into(),
			target: "ghost".into(),
			metrics: HashMap::new(),
		});
		let mut c = controller(CameraMode::Perspective);
		assert!(matches!(
			c.init(&data, Viewport::new(800.0, 600.0)),
			Err(DiagramError::DanglingLink { .. })
		));
		assert_eq!(c.phase(), Phase::Uninitialized);
		assert!(c.renderer().scene().is_empty());
		c.start();
		assert_eq!(c.phase(), Phase::Uninitialized);
	}

	#[test]
	fn sync_writes_positions_and_link_points() {
		let mut c = running(CameraMode::Perspective);
		c.sync_positions(&snapshot(1, &[("a", 10.0, 20.0), ("b", -5.0, 4.0)]));
		let a = c.renderer().get_position("a").unwrap();
		assert_eq!((a.x, a.y), (10.0, 20.0));
		assert_eq!(a.z, c.graph().node("a").unwrap().visual_depth);
		let Some(Primitive::Link { line, .. }) = c.renderer().scene().link("ab") else {
			panic!("missing link");
		};
		assert_eq!(line.start, a);
		assert_eq!(line.end, c.renderer().get_position("b").unwrap());
	}

	#[test]
	fn stale_snapshot_is_ignored() {
		let mut c = running(CameraMode::Orthographic);
		c.sync_positions(&snapshot(2, &[("a", 1.0, 1.0)]));
		c.sync_positions(&snapshot(1, &[("a", 99.0, 99.0)]));
		c.sync_positions(&snapshot(2, &[("a", 50.0, 50.0)]));
		assert_eq!(c.renderer().get_position("a").unwrap().x, 1.0);
	}

	#[test]
	fn frame_schedules_before_rendering() {
		let mut c = running(CameraMode::Perspective);
		let log = c.renderer().events.clone();
		let order = log.clone();
		c.frame(move || log.borrow_mut().push("schedule"));
		assert_eq!(*order.borrow(), vec!["schedule", "render"]);
		assert_eq!(c.renderer().frames, 1);
	}

	#[test]
	fn frame_is_inert_until_started() {
		let mut c = controller(CameraMode::Perspective);
		c.init(&sample(), Viewport::new(800.0, 600.0)).unwrap();
		let mut scheduled = false;
		c.frame(|| scheduled = true);
		assert!(!scheduled);
		assert_eq!(c.renderer().frames, 0);
	}

	#[test]
	fn pointer_over_node_highlights_on_next_frame() {
		let mut c = running(CameraMode::Orthographic);
		c.sync_positions(&snapshot(1, &[("a", 0.0, 0.0), ("b", 150.0, 0.0), ("c", -150.0, 0.0)]));
		let screen = c.camera().project(Vec3::ZERO).unwrap().screen;

		c.pointer_move(screen.x as f64, screen.y as f64);
		assert_eq!(c.tracker().focused(), None);
		c.frame(|| {});
		assert_eq!(c.tracker().focused(), Some("a"));
		assert_eq!(c.graph().node("a").unwrap().selection, SelectionState::Hovered);

		c.click();
		c.frame(|| {});
		assert_eq!(c.tracker().selected(), Some("a"));

		c.pointer_leave();
		for _ in 0..5 {
			c.frame(|| {});
		}
		assert_eq!(c.tracker().focused(), None);
		assert_eq!(c.graph().count_in_state(SelectionState::Selected), 1);
		assert_eq!(c.graph().count_in_state(SelectionState::Hovered), 0);
	}

	#[test]
	fn drag_suppresses_click() {
		let mut c = running(CameraMode::Orthographic);
		c.sync_positions(&snapshot(1, &[("a", 0.0, 0.0), ("b", 150.0, 0.0), ("c", -150.0, 0.0)]));
		let screen = c.camera().project(Vec3::ZERO).unwrap().screen;
		let (x, y) = (screen.x as f64, screen.y as f64);
		c.pointer_move(x, y);
		c.frame(|| {});
		c.pointer_down(x, y);
		c.pointer_move(x + 30.0, y);
		c.pointer_up();
		c.click();
		c.frame(|| {});
		assert_eq!(c.tracker().selected(), None);
	}

	#[test]
	fn press_without_drag_keeps_hover() {
		let mut c = running(CameraMode::Orthographic);
		c.sync_positions(&snapshot(1, &[("a", 0.0, 0.0), ("b", 150.0, 0.0), ("c", -150.0, 0.0)]));
		let screen = c.camera().project(Vec3::ZERO).unwrap().screen;
		let (x, y) = (screen.x as f64, screen.y as f64);
		c.pointer_move(x, y);
		c.frame(|| {});
		c.pointer_down(x, y);
		c.pointer_move(x + 1.0, y);
		c.frame(|| {});
		assert_eq!(c.tracker().focused(), Some("a"));
		assert_eq!(c.renderer().cursors.last(), Some(&Cursor::Pointer));

		c.pointer_move(x + 40.0, y);
		c.frame(|| {});
		assert_eq!(c.renderer().cursors.last(), Some(&Cursor::Grabbing));
		c.pointer_up();
		assert_eq!(c.renderer().cursors.last(), Some(&Cursor::Pointer));
	}

	#[test]
	fn pan_tracks_mean_node_depth() {
		let mut c = running(CameraMode::Perspective);
		c.pointer_down(100.0, 100.0);
		c.pointer_move(140.0, 100.0);
		c.pointer_up();
		for _ in 0..300 {
			c.frame(|| {});
		}
		// brackets 2, 8 and 10 sit at z = -180, -420, -500; the eye is 616.7 from their mean
		let expected = 2.0 * 616.667 * 22.5f32.to_radians().tan() / 600.0 * 40.0;
		assert!((c.camera().eye().x + expected).abs() < 0.1, "{}", c.camera().eye());
	}

	#[test]
	fn resize_twice_is_identical() {
		let mut c = running(CameraMode::Orthographic);
		c.resize(1024.0, 768.0);
		let first = (c.camera().bounds(), c.camera().projection());
		c.resize(1024.0, 768.0);
		assert_eq!((c.camera().bounds(), c.camera().projection()), first);
		c.resize(0.0, 0.0);
		assert_eq!(c.camera().bounds(), first.0);
	}

	#[test]
	fn update_sizing_rescales_in_place() {
		let mut c = running(CameraMode::Orthographic);
		assert!((node_scale(&c, "a") - (0.2 + 2.0 * 0.08)).abs() < 1e-6);
		let before = c.renderer().scene().len();

		c.update_sizing("weight");
		assert_eq!(c.metric_key(), "weight");
		assert_eq!(c.renderer().scene().len(), before);
		assert!((node_scale(&c, "a") - (0.2 + 9.0 * 0.08)).abs() < 1e-6);
		assert!((node_scale(&c, "c") - 0.2).abs() < 1e-6);
	}

	#[test]
	fn update_sizing_moves_depth_in_perspective() {
		let mut c = running(CameraMode::Perspective);
		c.update_sizing("weight");
		let z = c.renderer().get_position("a").unwrap().z;
		assert!((z - -(50.0 * 9.0 * 0.8 + 100.0)).abs() < 1e-3);
		let Some(Primitive::Link { line, .. }) = c.renderer().scene().link("ab") else {
			panic!("missing link");
		};
		assert_eq!(line.start.z, z);
	}

	#[test]
	fn layout_ticks_drive_sync() {
		let c = Rc::new(RefCell::new(running(CameraMode::Perspective)));
		let (nodes, links) = c.borrow().layout_input();
		let mut layout = ForceLayout::new();
		let sink = c.clone();
		layout
			.simulate(
				&nodes,
				&links,
				Box::new(move |snap: &PositionSnapshot| sink.borrow_mut().sync_positions(snap)),
			)
			.unwrap();
		layout.tick();
		let expected = layout.snapshot().positions["a"];
		let got = c.borrow().renderer().get_position("a").unwrap();
		assert_eq!((got.x, got.y), (expected.x, expected.y));
	}

	#[test]
	fn teardown_releases_everything() {
		let mut c = running(CameraMode::Perspective);
		c.teardown();
		assert_eq!(c.phase(), Phase::TornDown);
		assert!(c.renderer().scene().is_empty());
		let mut scheduled = false;
		c.frame(|| scheduled = true);
		assert!(!scheduled);
		c.sync_positions(&snapshot(10, &[("a", 1.0, 1.0)]));
		assert_eq!(c.renderer().get_position("a"), None);
	}
}
