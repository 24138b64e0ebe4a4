//! Software rendering target for the lit grid.
//!
//! # Invariants
//! - Pixels are stored premultiplied; every primitive blends source-over.
//! - Drawing is clipped to the surface. Non-finite geometry draws nothing.

mod export;
mod pixels;

pub use export::RasterError;
pub use pixels::PixelSurface;

pub fn crate_info() -> &'static str {
    "gridglow-raster v0.1.0"
}
