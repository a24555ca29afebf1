use std::collections::HashMap;

use leptos::prelude::*;

use crate::components::diagram::{CameraMode, DiagramCanvas, DiagramData, DiagramLink, DiagramNode};

const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22",
	"#17becf",
];

/// Generate a random tree with two metrics per node and a traffic metric per link.
pub(crate) fn generate_sample_data(n: usize) -> DiagramData {
	let nodes: Vec<DiagramNode> = (0..n)
		.map(|i| DiagramNode {
			id: i.to_string(),
			color: COLORS[i % COLORS.len()].into(),
			metrics: HashMap::from([
				("count".to_string(), (rand_simple(i) * 1200.0).round()),
				("weight".to_string(), (rand_simple(i * 7 + 3) * 600.0).round()),
			]),
		})
		.collect();

	let links: Vec<DiagramLink> = (1..n)
		.map(|i| {
			let target = (rand_simple(i) * (i as f64)) as usize;
			DiagramLink {
				id: format!("{i}-{target}"),
				source: i.to_string(),
				target: target.to_string(),
				metrics: HashMap::from([("count".to_string(), (rand_simple(i + n) * 1000.0).round())]),
			}
		})
		.collect();

	DiagramData { nodes, links }
}

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

#[component]
fn DiagramPage(camera_mode: CameraMode, title: &'static str) -> impl IntoView {
	let graph_data = Signal::derive(move || generate_sample_data(100));
	let metric_key = RwSignal::new("count".to_string());
	let toggle_metric = move |_| {
		metric_key.update(|key| {
			*key = if key.as_str() == "count" { "weight".into() } else { "count".into() };
		})
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<DiagramCanvas
					data=graph_data
					metric_key=metric_key
					camera_mode=camera_mode
					fullscreen=true
				/>
				<div class="graph-overlay">
					<h1>{title}</h1>
					<p class="subtitle">"Hover to highlight, click to select. Drag to pan, scroll to zoom."</p>
					<button on:click=toggle_metric>
						"Sizing by: " {move || metric_key.get()}
					</button>
				</div>
			</div>
		</ErrorBoundary>
	}
}

/// Perspective diagram, metric encoded as depth
#[component]
pub fn Home() -> impl IntoView {
	view! { <DiagramPage camera_mode=CameraMode::Perspective title="Link Diagram" /> }
}

/// Orthographic diagram, metric encoded as size
#[component]
pub fn FlatHome() -> impl IntoView {
	view! { <DiagramPage camera_mode=CameraMode::Orthographic title="Link Diagram (flat)" /> }
}
