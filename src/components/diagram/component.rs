use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::error;
use send_wrapper::SendWrapper;
use web_sys::HtmlCanvasElement;

use super::host::DiagramHost;
use super::types::{CameraMode, DiagramConfig, DiagramData};

#[component]
pub fn DiagramCanvas(
	#[prop(into)] data: Signal<DiagramData>,
	#[prop(into)] metric_key: Signal<String>,
	#[prop(default = CameraMode::Perspective)] camera_mode: CameraMode,
	#[prop(default = false)] fullscreen: bool,
	#[prop(optional)] config: Option<DiagramConfig>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let host: Rc<RefCell<Option<DiagramHost>>> = Rc::new(RefCell::new(None));
	let failure = RwSignal::new(None::<String>);
	let base = config.unwrap_or_default();

	let host_init = host.clone();
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let data = data.get();
		let config = DiagramConfig {
			camera_mode,
			metric_key: metric_key.get_untracked(),
			..base.clone()
		};

		if let Some(mut previous) = host_init.borrow_mut().take() {
			previous.stop();
		}
		match DiagramHost::new(canvas, &data, config, fullscreen) {
			Ok(mut diagram) => {
				diagram.start();
				failure.set(None);
				*host_init.borrow_mut() = Some(diagram);
			}
			Err(err) => {
				error!("diagram failed to initialize: {err}");
				failure.set(Some(err.to_string()));
			}
		}
	});

	let host_sizing = host.clone();
	Effect::new(move |_| {
		let key = metric_key.get();
		if let Some(ref diagram) = *host_sizing.borrow() {
			diagram.update_sizing(&key);
		}
	});

	let host_cleanup = SendWrapper::new(host);
	on_cleanup(move || {
		if let Some(mut diagram) = host_cleanup.borrow_mut().take() {
			diagram.stop();
		}
	});

	view! {
		<canvas node_ref=canvas_ref class="link-diagram-canvas" style="display: block;" />
		{move || failure.get().map(|msg| view! { <p class="diagram-error">{msg}</p> })}
	}
}
