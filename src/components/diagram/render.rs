use std::cmp::Ordering;
use std::f64::consts::PI;

use glam::{Vec2, Vec3};
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::camera::{CameraRig, Ray};
use super::interaction::Cursor;
use super::primitive::{
	self, ColorHandle, Colorable, LineHandle, MeshHandle, Primitive, PrimitiveId, Scene,
};
use super::types::DiagramConfig;

/// Turns position, color and scale into drawables and draws them each frame.
///
/// Implementors only supply storage and drawing; the per-primitive accessors are
/// provided on top of [`Scene`].
pub trait Renderer {
	fn scene(&self) -> &Scene;
	fn scene_mut(&mut self) -> &mut Scene;
	fn render(&mut self, camera: &CameraRig);
	fn resize(&mut self, width: f64, height: f64);
	fn set_cursor(&mut self, cursor: Cursor);

	fn create_node(&mut self, id: &str, position: Vec3, color: &str, radius: f32, scale: f32) {
		self.scene_mut().insert(Primitive::Node {
			id: id.to_owned(),
			mesh: MeshHandle {
				position,
				radius,
				scale,
			},
			color: ColorHandle::new(color),
		});
	}

	fn create_link(&mut self, id: &str, start: Vec3, end: Vec3, color: &str, width: f32) {
		self.scene_mut().insert(Primitive::Link {
			id: id.to_owned(),
			line: LineHandle {
				start,
				end,
				width,
				color: ColorHandle::new(color),
			},
		});
	}

	fn get_position(&self, node_id: &str) -> Option<Vec3> {
		self.scene().node(node_id).and_then(primitive::get_position)
	}

	fn set_position(&mut self, node_id: &str, position: Vec3) {
		if let Some(p) = self.scene_mut().get_mut(&PrimitiveId::Node(node_id.to_owned())) {
			primitive::set_position(p, position);
		}
	}

	fn set_scale(&mut self, key: &PrimitiveId, scale: f32) {
		if let Some(p) = self.scene_mut().get_mut(key) {
			primitive::set_scale(p, scale);
		}
	}

	fn set_color(&mut self, key: &PrimitiveId, color: &str) {
		if let Some(p) = self.scene_mut().get_mut(key) {
			primitive::set_color(p, color);
		}
	}

	fn set_points(&mut self, link_id: &str, start: Vec3, end: Vec3) {
		if let Some(p) = self.scene_mut().get_mut(&PrimitiveId::Link(link_id.to_owned())) {
			primitive::set_points(p, start, end);
		}
	}

	fn pick(&self, ray: &Ray) -> Option<String> {
		self.scene().pick(ray)
	}

	fn release(&mut self) {
		self.scene_mut().clear();
	}
}

/// Draws the scene on a 2d canvas, projecting through the camera and painting
/// back to front.
pub struct CanvasRenderer {
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
	scene: Scene,
	background: String,
	selected_color: String,
	width: f64,
	height: f64,
}

impl CanvasRenderer {
	pub fn new(canvas: HtmlCanvasElement, ctx: CanvasRenderingContext2d, config: &DiagramConfig) -> Self {
		Self {
			width: canvas.width() as f64,
			height: canvas.height() as f64,
			canvas,
			ctx,
			scene: Scene::default(),
			background: config.background.clone(),
			selected_color: config.selected_color.clone(),
		}
	}

	fn draw_links(&self, camera: &CameraRig) {
		let ctx = &self.ctx;
		ctx.set_line_cap("round");
		for primitive in self.scene.iter() {
			let Primitive::Link { line, .. } = primitive else {
				continue;
			};
			let (Some(a), Some(b)) = (camera.project(line.start), camera.project(line.end)) else {
				continue;
			};
			ctx.set_stroke_style_str(line.color());
			ctx.set_line_width(line.width as f64);
			ctx.begin_path();
			ctx.move_to(a.screen.x as f64, a.screen.y as f64);
			ctx.line_to(b.screen.x as f64, b.screen.y as f64);
			ctx.stroke();
		}
	}

	fn draw_nodes(&self, camera: &CameraRig) {
		let mut visible: Vec<(f32, Vec2, f64, &str)> = self
			.scene
			.iter()
			.filter_map(|primitive| {
				let Primitive::Node { mesh, color, .. } = primitive else {
					return None;
				};
				let center = camera.project(mesh.position)?;
				// screen radius from the projected top of the sphere, valid for both projections
				let rim = camera.project(mesh.position + Vec3::Y * mesh.world_radius())?;
				let radius = center.screen.distance(rim.screen) as f64;
				Some((center.depth, center.screen, radius, color.color()))
			})
			.collect();
		visible.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

		let ctx = &self.ctx;
		for (_, center, radius, color) in visible {
			if radius < 0.25 {
				continue;
			}
			let (x, y) = (center.x as f64, center.y as f64);
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
			ctx.set_fill_style_str(color);
			ctx.fill();

			if let Ok(gradient) = ctx.create_radial_gradient(
				x - radius * 0.35,
				y - radius * 0.35,
				radius * 0.1,
				x,
				y,
				radius,
			) {
				let _ = gradient.add_color_stop(0.0, "rgba(255, 255, 255, 0.45)");
				let _ = gradient.add_color_stop(0.7, "rgba(255, 255, 255, 0)");
				let _ = gradient.add_color_stop(1.0, "rgba(0, 0, 0, 0.25)");
				ctx.begin_path();
				let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}

			if color == self.selected_color {
				ctx.set_stroke_style_str(color);
				ctx.set_line_width(1.5);
				let _ = ctx.set_line_dash(&js_sys::Array::of2(
					&JsValue::from_f64(4.0),
					&JsValue::from_f64(3.0),
				));
				ctx.begin_path();
				let _ = ctx.arc(x, y, radius + 4.0, 0.0, 2.0 * PI);
				ctx.stroke();
				let _ = ctx.set_line_dash(&js_sys::Array::new());
			}
		}
	}
}

impl Renderer for CanvasRenderer {
	fn scene(&self) -> &Scene {
		&self.scene
	}

	fn scene_mut(&mut self) -> &mut Scene {
		&mut self.scene
	}

	fn render(&mut self, camera: &CameraRig) {
		self.ctx.set_fill_style_str(&self.background);
		self.ctx.fill_rect(0.0, 0.0, self.width, self.height);
		self.draw_links(camera);
		self.draw_nodes(camera);
	}

	fn resize(&mut self, width: f64, height: f64) {
		self.width = width.max(0.0);
		self.height = height.max(0.0);
		self.canvas.set_width(self.width as u32);
		self.canvas.set_height(self.height as u32);
	}

	fn set_cursor(&mut self, cursor: Cursor) {
		let _ = self.canvas.style().set_property("cursor", cursor.as_css());
	}

	fn release(&mut self) {
		self.scene.clear();
		self.ctx.clear_rect(0.0, 0.0, self.width, self.height);
	}
}
