use glam::{Mat4, Vec2, Vec3};
use log::warn;

use super::types::{CameraMode, DiagramConfig, Viewport};

const NEAR: f32 = 1.0;
const FAR: f32 = 1000.0;
const MIN_ZOOM: f32 = 0.5;
const MAX_ZOOM: f32 = 5.0;
const ZOOM_STEP: f32 = 0.95;
/// Pointer travel in pixels after which a press counts as a drag, not a click.
const CLICK_SLOP: f64 = 3.0;

/// Orthographic frustum extents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionBounds {
	pub left: f32,
	pub right: f32,
	pub top: f32,
	pub bottom: f32,
}

impl ProjectionBounds {
	fn from_aspect(frustum_size: f32, aspect: f32) -> Self {
		Self {
			left: -frustum_size * aspect / 5.0,
			right: frustum_size * aspect / 5.0,
			top: frustum_size / 5.0,
			bottom: -frustum_size / 5.0,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
	pub origin: Vec3,
	pub direction: Vec3,
}

impl Ray {
	/// Distance along the ray to the first intersection with a sphere.
	pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
		let oc = self.origin - center;
		let b = oc.dot(self.direction);
		let c = oc.length_squared() - radius * radius;
		let disc = b * b - c;
		if disc < 0.0 {
			return None;
		}
		let sq = disc.sqrt();
		let t = if -b - sq >= 0.0 { -b - sq } else { -b + sq };
		(t >= 0.0).then_some(t)
	}
}

/// A world point mapped onto the output surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
	pub screen: Vec2,
	/// Normalized device depth, -1 at the near plane and 1 at the far plane.
	pub depth: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub last_x: f64,
	pub last_y: f64,
}

/// Damped pan and zoom. Rotation is not supported.
#[derive(Clone, Debug)]
pub struct CameraControls {
	pub pan: PanState,
	pending_pan: Vec3,
	pending_zoom: f32,
	/// Surface position that stays fixed while the pending zoom is applied.
	zoom_anchor: Option<Vec2>,
	damping: f32,
}

impl CameraControls {
	fn new(damping: f32) -> Self {
		Self {
			pan: PanState::default(),
			pending_pan: Vec3::ZERO,
			pending_zoom: 1.0,
			zoom_anchor: None,
			damping: damping.clamp(0.01, 1.0),
		}
	}

	pub fn is_settled(&self) -> bool {
		self.pending_pan.length_squared() < 1e-6 && (self.pending_zoom - 1.0).abs() < 1e-4
	}
}

/// Owns the projection and its viewport-dependent parameters.
#[derive(Clone, Debug)]
pub struct CameraRig {
	mode: CameraMode,
	frustum_size: f32,
	fov_degrees: f32,
	standoff: f32,
	viewport: Viewport,
	aspect: f32,
	bounds: ProjectionBounds,
	target: Vec3,
	/// Depth of the plane that pan and zoom track, normally the mean node depth.
	pan_depth: f32,
	zoom: f32,
	projection: Mat4,
	pub controls: CameraControls,
}

impl CameraRig {
	pub fn new(config: &DiagramConfig, viewport: Viewport) -> Self {
		let aspect = viewport.aspect() as f32;
		let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
		let mut rig = Self {
			mode: config.camera_mode,
			frustum_size: config.frustum_size,
			fov_degrees: config.fov_degrees,
			standoff: config.standoff,
			viewport,
			aspect,
			bounds: ProjectionBounds::from_aspect(config.frustum_size, aspect),
			target: Vec3::ZERO,
			pan_depth: 0.0,
			zoom: 1.0,
			projection: Mat4::IDENTITY,
			controls: CameraControls::new(config.damping),
		};
		rig.update_projection_matrix();
		rig
	}

	#[cfg(test)]
	pub fn aspect(&self) -> f32 {
		self.aspect
	}

	#[cfg(test)]
	pub fn bounds(&self) -> ProjectionBounds {
		self.bounds
	}

	#[cfg(test)]
	pub fn viewport(&self) -> Viewport {
		self.viewport
	}

	#[cfg(test)]
	pub fn zoom(&self) -> f32 {
		self.zoom
	}

	pub fn set_pan_depth(&mut self, depth: f32) {
		if depth.is_finite() {
			self.pan_depth = depth;
		}
	}

	/// Recomputes the projection for a new viewport. A degenerate viewport keeps
	/// the previous bounds and returns `false`.
	pub fn resize(&mut self, width: f64, height: f64) -> bool {
		let aspect = (width / height) as f32;
		if !aspect.is_finite() || aspect <= 0.0 {
			warn!("ignoring degenerate viewport {width}x{height}");
			return false;
		}
		self.viewport = Viewport::new(width, height);
		self.aspect = aspect;
		if self.mode == CameraMode::Orthographic {
			self.bounds = ProjectionBounds::from_aspect(self.frustum_size, aspect);
		}
		self.update_projection_matrix();
		true
	}

	pub fn update_projection_matrix(&mut self) {
		self.projection = match self.mode {
			CameraMode::Perspective => {
				Mat4::perspective_rh_gl(self.fov_degrees.to_radians(), self.aspect, NEAR, FAR)
			}
			CameraMode::Orthographic => {
				let b = self.bounds;
				Mat4::orthographic_rh_gl(
					b.left / self.zoom,
					b.right / self.zoom,
					b.bottom / self.zoom,
					b.top / self.zoom,
					NEAR,
					FAR,
				)
			}
		};
	}

	#[cfg(test)]
	pub fn projection(&self) -> Mat4 {
		self.projection
	}

	/// Camera position. Perspective zoom dollies along the view axis.
	pub fn eye(&self) -> Vec3 {
		let distance = match self.mode {
			CameraMode::Perspective => self.standoff / self.zoom,
			CameraMode::Orthographic => self.standoff,
		};
		self.target + Vec3::Z * distance
	}

	pub fn view(&self) -> Mat4 {
		Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
	}

	pub fn view_projection(&self) -> Mat4 {
		self.projection * self.view()
	}

	fn to_ndc(&self, screen: Vec2) -> Vec2 {
		Vec2::new(
			screen.x / self.viewport.width as f32 * 2.0 - 1.0,
			-(screen.y / self.viewport.height as f32) * 2.0 + 1.0,
		)
	}

	/// Ray from a pointer position (surface pixels) into the scene.
	pub fn ray_from_screen(&self, screen: Vec2) -> Ray {
		let ndc = self.to_ndc(screen);
		let inverse = self.view_projection().inverse();
		match self.mode {
			CameraMode::Perspective => {
				let eye = self.eye();
				let point = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 0.5));
				Ray {
					origin: eye,
					direction: (point - eye).normalize(),
				}
			}
			CameraMode::Orthographic => {
				let origin = inverse.project_point3(Vec3::new(ndc.x, ndc.y, -1.0));
				Ray {
					origin,
					direction: -Vec3::Z,
				}
			}
		}
	}

	/// Point under a surface position on the pan plane.
	fn pan_plane_point(&self, screen: Vec2) -> Vec3 {
		let ray = self.ray_from_screen(screen);
		if ray.direction.z.abs() < f32::EPSILON {
			return ray.origin;
		}
		let t = (self.pan_depth - ray.origin.z) / ray.direction.z;
		ray.origin + ray.direction * t
	}

	pub fn project(&self, world: Vec3) -> Option<Projected> {
		let clip = self.view_projection() * world.extend(1.0);
		if clip.w <= 0.0 {
			return None;
		}
		let ndc = clip.truncate() / clip.w;
		if !(-1.0..=1.0).contains(&ndc.z) {
			return None;
		}
		Some(Projected {
			screen: Vec2::new(
				(ndc.x + 1.0) * 0.5 * self.viewport.width as f32,
				(1.0 - ndc.y) * 0.5 * self.viewport.height as f32,
			),
			depth: ndc.z,
		})
	}

	/// World units covered by one surface pixel on the pan plane.
	fn world_per_pixel(&self) -> f32 {
		let height = self.viewport.height.max(1.0) as f32;
		match self.mode {
			CameraMode::Perspective => {
				let distance = (self.eye().z - self.pan_depth).max(NEAR);
				2.0 * distance * (self.fov_degrees.to_radians() / 2.0).tan() / height
			}
			CameraMode::Orthographic => (self.bounds.top - self.bounds.bottom) / self.zoom / height,
		}
	}

	pub fn begin_pan(&mut self, x: f64, y: f64) {
		self.controls.pan = PanState {
			active: true,
			moved: false,
			start_x: x,
			start_y: y,
			last_x: x,
			last_y: y,
		};
	}

	pub fn drag_pan(&mut self, x: f64, y: f64) {
		if !self.controls.pan.active {
			return;
		}
		let (dx, dy) = (x - self.controls.pan.last_x, y - self.controls.pan.last_y);
		let scale = self.world_per_pixel();
		// dragging right moves the scene right, so the camera moves left
		self.controls.pending_pan += Vec3::new(-dx as f32 * scale, dy as f32 * scale, 0.0);
		let pan = &mut self.controls.pan;
		pan.last_x = x;
		pan.last_y = y;
		if (x - pan.start_x).hypot(y - pan.start_y) > CLICK_SLOP {
			pan.moved = true;
		}
	}

	pub fn end_pan(&mut self) {
		self.controls.pan.active = false;
	}

	/// True when the last press travelled far enough to be a drag.
	pub fn was_dragged(&self) -> bool {
		self.controls.pan.moved
	}

	/// True while a press is held and has turned into a drag.
	pub fn is_dragging(&self) -> bool {
		self.controls.pan.active && self.controls.pan.moved
	}

	/// Queues a zoom step. With an anchor, the point under it stays put.
	pub fn wheel(&mut self, delta_y: f64, anchor: Option<Vec2>) {
		let factor = if delta_y > 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
		self.controls.pending_zoom *= factor;
		self.controls.zoom_anchor = anchor;
	}

	/// Applies a damped share of the pending pan and zoom. Called once per frame.
	pub fn update(&mut self) {
		if self.controls.is_settled() {
			return;
		}
		let damping = self.controls.damping;
		let step = self.controls.pending_pan * damping;
		self.target += step;
		self.controls.pending_pan -= step;

		let anchor = self
			.controls
			.zoom_anchor
			.map(|screen| (screen, self.pan_plane_point(screen)));
		let zoom_step = self.controls.pending_zoom.powf(damping);
		self.zoom = (self.zoom * zoom_step).clamp(MIN_ZOOM, MAX_ZOOM);
		self.controls.pending_zoom /= zoom_step;
		if self.zoom <= MIN_ZOOM || self.zoom >= MAX_ZOOM {
			self.controls.pending_zoom = 1.0;
		}
		self.update_projection_matrix();

		if let Some((screen, before)) = anchor {
			let after = self.pan_plane_point(screen);
			self.target += Vec3::new(before.x - after.x, before.y - after.y, 0.0);
		}
	}
}
