use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{debug, error, info};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, Event, EventTarget, HtmlCanvasElement, MouseEvent, WheelEvent, Window,
};

use super::controller::DiagramController;
use super::error::DiagramError;
use super::layout::{ForceLayout, PhysicsEngine, PositionSnapshot};
use super::render::CanvasRenderer;
use super::types::{DiagramConfig, DiagramData, Viewport};

type Shared<T> = Rc<RefCell<T>>;

struct Listener {
	target: EventTarget,
	event: &'static str,
	callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
	fn attach(
		target: EventTarget,
		event: &'static str,
		handler: impl FnMut(Event) + 'static,
	) -> Option<Self> {
		let callback = Closure::<dyn FnMut(Event)>::new(handler);
		if let Err(err) =
			target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
		{
			error!("failed to listen for {event}: {err:?}");
			return None;
		}
		Some(Self {
			target,
			event,
			callback,
		})
	}

	fn detach(&self) {
		let _ = self
			.target
			.remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
	}
}

fn local_coords(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

/// Size of the window when fullscreen, otherwise of the canvas' container.
pub fn measure(window: &Window, canvas: &HtmlCanvasElement, fullscreen: bool) -> Viewport {
	if fullscreen {
		let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
		Viewport::new(dim(window.inner_width()), dim(window.inner_height()))
	} else {
		canvas
			.parent_element()
			.map(|p| Viewport::new(p.client_width() as f64, p.client_height() as f64))
			.unwrap_or(Viewport::new(800.0, 600.0))
	}
}

/// Binds a [`DiagramController`] to a canvas: DOM listeners, the layout interval and
/// the animation frame loop. Everything registered in [`DiagramHost::start`] is
/// released by [`DiagramHost::stop`].
pub struct DiagramHost {
	window: Window,
	canvas: HtmlCanvasElement,
	fullscreen: bool,
	layout_interval_ms: i32,
	controller: Shared<DiagramController<CanvasRenderer>>,
	layout: Shared<ForceLayout>,
	listeners: Vec<Listener>,
	running: Rc<Cell<bool>>,
	frame_cb: Shared<Option<Closure<dyn FnMut()>>>,
	frame_handle: Rc<Cell<Option<i32>>>,
	layout_cb: Option<Closure<dyn FnMut()>>,
	layout_handle: Rc<Cell<Option<i32>>>,
}

impl DiagramHost {
	pub fn new(
		canvas: HtmlCanvasElement,
		data: &DiagramData,
		config: DiagramConfig,
		fullscreen: bool,
	) -> Result<Self, DiagramError> {
		let window = web_sys::window().ok_or_else(|| DiagramError::Surface("no window".into()))?;
		let ctx: CanvasRenderingContext2d = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|ctx| ctx.dyn_into().ok())
			.ok_or_else(|| DiagramError::Surface("2d context unavailable".into()))?;

		let viewport = measure(&window, &canvas, fullscreen);
		let layout_interval_ms = config.layout_interval_ms;
		let renderer = CanvasRenderer::new(canvas.clone(), ctx, &config);
		let mut controller = DiagramController::new(config, renderer);
		controller.init(data, viewport)?;

		let (nodes, links) = controller.layout_input();
		let controller = Rc::new(RefCell::new(controller));
		let sink = Rc::downgrade(&controller);
		let mut layout = ForceLayout::new();
		layout.simulate(
			&nodes,
			&links,
			Box::new(move |snap: &PositionSnapshot| {
				if let Some(controller) = sink.upgrade() {
					controller.borrow_mut().sync_positions(snap);
				}
			}),
		)?;

		Ok(Self {
			window,
			canvas,
			fullscreen,
			layout_interval_ms,
			controller,
			layout: Rc::new(RefCell::new(layout)),
			listeners: Vec::new(),
			running: Rc::new(Cell::new(false)),
			frame_cb: Rc::new(RefCell::new(None)),
			frame_handle: Rc::new(Cell::new(None)),
			layout_cb: None,
			layout_handle: Rc::new(Cell::new(None)),
		})
	}

	pub fn start(&mut self) {
		if self.running.get() {
			return;
		}
		self.attach_listeners();
		// one synchronous step so the first frame is not the unsettled seed layout
		self.layout.borrow_mut().tick();
		self.controller.borrow_mut().start();
		self.running.set(true);
		self.start_layout();
		self.start_frames();
		info!("diagram host started");
	}

	pub fn stop(&mut self) {
		self.running.set(false);
		if let Some(handle) = self.frame_handle.take() {
			let _ = self.window.cancel_animation_frame(handle);
		}
		self.frame_cb.borrow_mut().take();
		if let Some(handle) = self.layout_handle.take() {
			self.window.clear_interval_with_handle(handle);
		}
		self.layout_cb = None;
		for listener in self.listeners.drain(..) {
			listener.detach();
		}
		self.controller.borrow_mut().teardown();
	}

	pub fn update_sizing(&self, metric_key: &str) {
		self.controller.borrow_mut().update_sizing(metric_key);
	}

	fn listen(&mut self, target: EventTarget, event: &'static str, handler: impl FnMut(Event) + 'static) {
		if let Some(listener) = Listener::attach(target, event, handler) {
			self.listeners.push(listener);
		}
	}

	fn attach_listeners(&mut self) {
		let canvas_target: EventTarget = self.canvas.clone().into();

		let (c, canvas) = (self.controller.clone(), self.canvas.clone());
		self.listen(canvas_target.clone(), "mousemove", move |ev| {
			if let Some(ev) = ev.dyn_ref::<MouseEvent>() {
				let (x, y) = local_coords(&canvas, ev);
				c.borrow_mut().pointer_move(x, y);
			}
		});

		let (c, canvas) = (self.controller.clone(), self.canvas.clone());
		self.listen(canvas_target.clone(), "mousedown", move |ev| {
			if let Some(ev) = ev.dyn_ref::<MouseEvent>()
				&& ev.button() == 0
			{
				let (x, y) = local_coords(&canvas, ev);
				c.borrow_mut().pointer_down(x, y);
			}
		});

		let c = self.controller.clone();
		self.listen(canvas_target.clone(), "mouseup", move |_| {
			c.borrow_mut().pointer_up();
		});

		let c = self.controller.clone();
		self.listen(canvas_target.clone(), "mouseleave", move |_| {
			c.borrow_mut().pointer_leave();
		});

		let c = self.controller.clone();
		self.listen(canvas_target.clone(), "click", move |_| {
			c.borrow_mut().click();
		});

		let (c, canvas) = (self.controller.clone(), self.canvas.clone());
		self.listen(canvas_target, "wheel", move |ev| {
			if let Some(ev) = ev.dyn_ref::<WheelEvent>() {
				ev.prevent_default();
				let (x, y) = local_coords(&canvas, ev);
				c.borrow_mut().wheel(x, y, ev.delta_y());
			}
		});

		let (c, window, canvas, fullscreen) = (
			self.controller.clone(),
			self.window.clone(),
			self.canvas.clone(),
			self.fullscreen,
		);
		self.listen(self.window.clone().into(), "resize", move |_| {
			let viewport = measure(&window, &canvas, fullscreen);
			c.borrow_mut().resize(viewport.width, viewport.height);
		});
		debug!("attached {} listeners", self.listeners.len());
	}

	fn start_layout(&mut self) {
		let (layout, handle, window) = (
			self.layout.clone(),
			self.layout_handle.clone(),
			self.window.clone(),
		);
		let cb = Closure::<dyn FnMut()>::new(move || {
			if !layout.borrow_mut().step()
				&& let Some(h) = handle.take()
			{
				window.clear_interval_with_handle(h);
				debug!("layout settled");
			}
		});
		match self.window.set_interval_with_callback_and_timeout_and_arguments_0(
			cb.as_ref().unchecked_ref(),
			self.layout_interval_ms,
		) {
			Ok(h) => self.layout_handle.set(Some(h)),
			Err(err) => error!("failed to schedule layout ticks: {err:?}"),
		}
		self.layout_cb = Some(cb);
	}

	fn start_frames(&mut self) {
		let (controller, frame_inner, handle, running, window) = (
			self.controller.clone(),
			self.frame_cb.clone(),
			self.frame_handle.clone(),
			self.running.clone(),
			self.window.clone(),
		);
		*self.frame_cb.borrow_mut() = Some(Closure::new(move || {
			if !running.get() {
				return;
			}
			controller.borrow_mut().frame(|| {
				if let Some(ref cb) = *frame_inner.borrow() {
					handle.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
				}
			});
		}));
		if let Some(ref cb) = *self.frame_cb.borrow() {
			self.frame_handle
				.set(self.window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}
	}
}

impl Drop for DiagramHost {
	fn drop(&mut self) {
		if self.running.get() {
			self.stop();
		}
	}
}
