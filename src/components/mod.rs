//! Reusable view components.

pub mod diagram;
