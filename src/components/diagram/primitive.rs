//! Drawable primitives and the id-keyed scene that owns them.
//!
//! Graph entities never hold their drawable. The renderer keeps a [`Scene`] keyed
//! by [`PrimitiveId`], and everything else looks primitives up by id.

use std::collections::HashMap;

use glam::Vec3;
use log::debug;

use super::camera::Ray;

pub trait Positionable {
	fn position(&self) -> Vec3;
	fn set_position(&mut self, position: Vec3);
}

pub trait Scalable {
	fn scale(&self) -> f32;
	fn set_scale(&mut self, scale: f32);
}

pub trait Colorable {
	fn color(&self) -> &str;
	fn set_color(&mut self, color: &str);
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColorHandle {
	css: String,
}

impl ColorHandle {
	pub fn new(css: impl Into<String>) -> Self {
		Self { css: css.into() }
	}
}

impl Colorable for ColorHandle {
	fn color(&self) -> &str {
		&self.css
	}

	fn set_color(&mut self, color: &str) {
		if self.css != color {
			self.css = color.to_owned();
		}
	}
}

/// A sphere of `radius * scale` world units.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshHandle {
	pub position: Vec3,
	pub radius: f32,
	pub scale: f32,
}

impl MeshHandle {
	pub fn world_radius(&self) -> f32 {
		self.radius * self.scale
	}
}

impl Positionable for MeshHandle {
	fn position(&self) -> Vec3 {
		self.position
	}

	fn set_position(&mut self, position: Vec3) {
		self.position = position;
	}
}

impl Scalable for MeshHandle {
	fn scale(&self) -> f32 {
		self.scale
	}

	fn set_scale(&mut self, scale: f32) {
		self.scale = scale;
	}
}

/// A straight segment. Its scale is the stroke width.
#[derive(Clone, Debug, PartialEq)]
pub struct LineHandle {
	pub start: Vec3,
	pub end: Vec3,
	pub width: f32,
	pub color: ColorHandle,
}

impl LineHandle {
	pub fn set_points(&mut self, start: Vec3, end: Vec3) {
		self.start = start;
		self.end = end;
	}
}

impl Scalable for LineHandle {
	fn scale(&self) -> f32 {
		self.width
	}

	fn set_scale(&mut self, scale: f32) {
		self.width = scale;
	}
}

impl Colorable for LineHandle {
	fn color(&self) -> &str {
		self.color.color()
	}

	fn set_color(&mut self, color: &str) {
		self.color.set_color(color);
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveId {
	Node(String),
	Link(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
	Node {
		id: String,
		mesh: MeshHandle,
		color: ColorHandle,
	},
	Link {
		id: String,
		line: LineHandle,
	},
}

impl Primitive {
	pub fn key(&self) -> PrimitiveId {
		match self {
			Primitive::Node { id, .. } => PrimitiveId::Node(id.clone()),
			Primitive::Link { id, .. } => PrimitiveId::Link(id.clone()),
		}
	}
}

pub fn get_position(primitive: &Primitive) -> Option<Vec3> {
	match primitive {
		Primitive::Node { mesh, .. } => Some(mesh.position()),
		Primitive::Link { .. } => None,
	}
}

pub fn set_position(primitive: &mut Primitive, position: Vec3) {
	match primitive {
		Primitive::Node { mesh, .. } => mesh.set_position(position),
		Primitive::Link { id, .. } => debug!("set_position ignored for link {id}"),
	}
}

pub fn set_scale(primitive: &mut Primitive, scale: f32) {
	match primitive {
		Primitive::Node { mesh, .. } => mesh.set_scale(scale),
		Primitive::Link { line, .. } => line.set_scale(scale),
	}
}

pub fn set_color(primitive: &mut Primitive, color: &str) {
	match primitive {
		Primitive::Node { color: handle, .. } => handle.set_color(color),
		Primitive::Link { line, .. } => line.set_color(color),
	}
}

pub fn set_points(primitive: &mut Primitive, start: Vec3, end: Vec3) {
	match primitive {
		Primitive::Link { line, .. } => line.set_points(start, end),
		Primitive::Node { id, .. } => debug!("set_points ignored for node {id}"),
	}
}

/// Primitives owned by a renderer, keyed by graph id.
#[derive(Clone, Debug, Default)]
pub struct Scene {
	primitives: HashMap<PrimitiveId, Primitive>,
}

impl Scene {
	pub fn insert(&mut self, primitive: Primitive) {
		self.primitives.insert(primitive.key(), primitive);
	}

	pub fn get(&self, key: &PrimitiveId) -> Option<&Primitive> {
		self.primitives.get(key)
	}

	pub fn get_mut(&mut self, key: &PrimitiveId) -> Option<&mut Primitive> {
		self.primitives.get_mut(key)
	}

	pub fn node(&self, id: &str) -> Option<&Primitive> {
		self.get(&PrimitiveId::Node(id.to_owned()))
	}

	#[cfg(test)]
	pub fn link(&self, id: &str) -> Option<&Primitive> {
		self.get(&PrimitiveId::Link(id.to_owned()))
	}

	#[cfg(test)]
	pub fn len(&self) -> usize {
		self.primitives.len()
	}

	#[cfg(test)]
	pub fn is_empty(&self) -> bool {
		self.primitives.is_empty()
	}

	pub fn clear(&mut self) {
		self.primitives.clear();
	}

	pub fn iter(&self) -> impl Iterator<Item = &Primitive> {
		self.primitives.values()
	}

	/// Nearest node sphere hit by the ray. Links are never picked.
	pub fn pick(&self, ray: &Ray) -> Option<String> {
		let mut nearest: Option<(f32, &str)> = None;
		for primitive in self.primitives.values() {
			let Primitive::Node { id, mesh, .. } = primitive else {
				continue;
			};
			let Some(t) = ray.intersect_sphere(mesh.position, mesh.world_radius()) else {
				continue;
			};
			if nearest.is_none_or(|(best, _)| t < best) {
				nearest = Some((t, id));
			}
		}
		nearest.map(|(_, id)| id.to_owned())
	}
}
