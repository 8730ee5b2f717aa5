pub mod centroid;
pub mod gcode;
pub mod layer;
pub mod render;

pub use glam;
