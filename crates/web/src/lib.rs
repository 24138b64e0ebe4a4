//! Browser host for the lit grid: a fixed full-window canvas behind the page,
//! redrawn on every animation frame while the overlay is running.
//!
//! # Invariants
//! - The canvas never receives pointer events; movement is read from `window`.
//! - After `dispose` no listener, frame request or canvas element remains.

mod canvas;
mod clock;
mod overlay;

pub use canvas::CanvasSurface;
pub use clock::RafClock;
pub use overlay::{CANVAS_ID, CANVAS_STYLE, GridOverlay, viewport_from_inner_size};

use wasm_bindgen::prelude::*;

/// Create the overlay, attach it to `<body>` and start animating.
#[wasm_bindgen(js_name = mountGridOverlay)]
pub fn mount_grid_overlay() -> Result<GridOverlay, JsValue> {
    GridOverlay::mount()
}

pub fn crate_info() -> &'static str {
    "gridglow-web v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("web"));
    }
}
