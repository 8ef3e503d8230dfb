//! Lumen math types.
//!
//! Thin layer over `glam`: the renderer works in `f32` world space with
//! `Vec3` for points, directions and linear RGB colors alike.

pub use glam::*;

mod interval;
mod ray;

pub use interval::Interval;
pub use ray::Ray;

/// Linear RGB color. Channels are unbounded above until tone mapping.
pub type Color = Vec3;
