//! DOM-free renderer used by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use super::camera::CameraRig;
use super::interaction::Cursor;
use super::primitive::Scene;
use super::render::Renderer;

#[derive(Debug, Default)]
pub struct RecordingRenderer {
	pub scene: Scene,
	pub cursors: Vec<Cursor>,
	pub frames: usize,
	pub size: Option<(f64, f64)>,
	/// Shared call log, so a test can interleave its own entries.
	pub events: Rc<RefCell<Vec<&'static str>>>,
}

impl Renderer for RecordingRenderer {
	fn scene(&self) -> &Scene {
		&self.scene
	}

	fn scene_mut(&mut self) -> &mut Scene {
		&mut self.scene
	}

	fn render(&mut self, _camera: &CameraRig) {
		self.frames += 1;
		self.events.borrow_mut().push("render");
	}

	fn resize(&mut self, width: f64, height: f64) {
		self.size = Some((width, height));
	}

	fn set_cursor(&mut self, cursor: Cursor) {
		self.cursors.push(cursor);
	}
}
