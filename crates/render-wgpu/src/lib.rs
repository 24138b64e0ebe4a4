//! wgpu backend for the lit grid.
//!
//! Draw calls are tessellated on the CPU into one colored triangle list per
//! frame, then submitted in a single alpha-blended pass.
//!
//! # Invariants
//! - A full-viewport clear drops all geometry; nothing else does.
//! - Vertex positions are in clip space; pixel (0, 0) maps to (-1, 1).
//! - Presenting without new draw calls repeats the previous frame.

mod error;
mod gpu;
mod shaders;
mod tessellate;

pub use error::SurfaceError;
pub use gpu::{WgpuSurface, acquire_frame};
pub use tessellate::{ColorVertex, RADIAL_SEGMENTS, Tessellator, pixel_to_clip};

pub fn crate_info() -> &'static str {
    "gridglow-render-wgpu v0.1.0"
}
