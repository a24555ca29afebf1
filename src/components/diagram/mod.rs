//! The link diagram: graph model, metric encoding, camera, picking and the frame
//! loop, plus the canvas renderer and Leptos component that host them.

mod camera;
mod component;
mod controller;
mod error;
mod graph;
mod host;
mod interaction;
mod layout;
mod primitive;
mod processor;
mod render;
#[cfg(test)]
mod testing;
mod types;

pub use component::DiagramCanvas;
pub use types::{CameraMode, DiagramData, DiagramLink, DiagramNode};
