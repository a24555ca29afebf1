use glam::Vec2;
use log::debug;

use super::graph::{Graph, SelectionState};
use super::primitive::PrimitiveId;
use super::render::Renderer;
use super::types::{DiagramConfig, NodeId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cursor {
	#[default]
	Default,
	Pointer,
	Grabbing,
}

impl Cursor {
	pub fn as_css(&self) -> &'static str {
		match self {
			Cursor::Default => "default",
			Cursor::Pointer => "pointer",
			Cursor::Grabbing => "grabbing",
		}
	}
}

/// Hover and selection over graph nodes.
///
/// Input events only record a pending pointer position or click. Colors change in
/// [`InteractionTracker::update`], once per frame.
#[derive(Clone, Debug)]
pub struct InteractionTracker {
	pointer: Option<Vec2>,
	click_pending: bool,
	focused: Option<NodeId>,
	selected: Option<NodeId>,
	cursor: Cursor,
	hover_color: String,
	selected_color: String,
	click_toggles: bool,
}

impl InteractionTracker {
	pub fn new(config: &DiagramConfig) -> Self {
		Self {
			pointer: None,
			click_pending: false,
			focused: None,
			selected: None,
			cursor: Cursor::Default,
			hover_color: config.hover_color.clone(),
			selected_color: config.selected_color.clone(),
			click_toggles: config.click_toggles_selection,
		}
	}

	pub fn pointer(&self) -> Option<Vec2> {
		self.pointer
	}

	pub fn set_pointer(&mut self, pointer: Option<Vec2>) {
		self.pointer = pointer;
	}

	pub fn queue_click(&mut self) {
		self.click_pending = true;
	}

	#[cfg(test)]
	pub fn focused(&self) -> Option<&str> {
		self.focused.as_deref()
	}

	#[cfg(test)]
	pub fn selected(&self) -> Option<&str> {
		self.selected.as_deref()
	}

	pub fn cursor(&self) -> Cursor {
		self.cursor
	}

	/// Applies this frame's pick result and any pending click.
	pub fn update<R: Renderer + ?Sized>(
		&mut self,
		hit: Option<NodeId>,
		graph: &mut Graph,
		renderer: &mut R,
	) {
		if hit != self.focused {
			if let Some(prev) = self.focused.take() {
				self.restore(&prev, graph, renderer);
			}
			if let Some(id) = hit.as_deref()
				&& let Some(node) = graph.node_mut(id)
			{
				if node.selection == SelectionState::None {
					node.selection = SelectionState::Hovered;
				}
				renderer.set_color(&PrimitiveId::Node(node.id.clone()), &self.hover_color);
				self.focused = Some(node.id.clone());
			}
			self.set_cursor(
				if self.focused.is_some() {
					Cursor::Pointer
				} else {
					Cursor::Default
				},
				renderer,
			);
		}

		if std::mem::take(&mut self.click_pending) {
			self.handle_click(graph, renderer);
		}
	}

	fn set_cursor<R: Renderer + ?Sized>(&mut self, cursor: Cursor, renderer: &mut R) {
		if self.cursor != cursor {
			self.cursor = cursor;
			renderer.set_cursor(cursor);
		}
	}

	fn restore<R: Renderer + ?Sized>(&self, id: &str, graph: &mut Graph, renderer: &mut R) {
		let Some(node) = graph.node_mut(id) else {
			return;
		};
		if node.selection == SelectionState::Hovered {
			node.selection = SelectionState::None;
		}
		renderer.set_color(&PrimitiveId::Node(node.id.clone()), &node.current_color);
	}

	fn handle_click<R: Renderer + ?Sized>(&mut self, graph: &mut Graph, renderer: &mut R) {
		let Some(focused) = self.focused.clone() else {
			return;
		};
		if self.selected.as_deref() == Some(focused.as_str()) {
			if self.click_toggles {
				self.deselect(graph, renderer);
				// still under the pointer, so it goes back to hovered
				if let Some(node) = graph.node_mut(&focused) {
					node.selection = SelectionState::Hovered;
				}
				renderer.set_color(&PrimitiveId::Node(focused), &self.hover_color);
			}
			return;
		}

		self.deselect(graph, renderer);
		if let Some(node) = graph.node_mut(&focused) {
			node.current_color = self.selected_color.clone();
			node.selection = SelectionState::Selected;
			renderer.set_color(&PrimitiveId::Node(focused.clone()), &self.selected_color);
			debug!("selected node {focused}");
			self.selected = Some(focused);
		}
	}

	fn deselect<R: Renderer + ?Sized>(&mut self, graph: &mut Graph, renderer: &mut R) {
		let Some(prev) = self.selected.take() else {
			return;
		};
		if let Some(node) = graph.node_mut(&prev) {
			node.current_color = node.color.clone();
			node.selection = SelectionState::None;
			renderer.set_color(&PrimitiveId::Node(prev), &node.color);
		}
	}

	/// Forgets focus, selection and pending input.
	pub fn reset(&mut self) {
		self.pointer = None;
		self.click_pending = false;
		self.focused = None;
		self.selected = None;
		self.cursor = Cursor::Default;
	}
}
