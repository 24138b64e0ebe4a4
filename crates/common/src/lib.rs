//! Shared types: viewport geometry, colors, and the grid configuration.
//!
//! # Invariants
//! - A [`GridConfig`] that passed [`GridConfig::validate`] has a spacing of
//!   at least [`MIN_GRID_SIZE`] and strictly positive radius and lift, so
//!   downstream math never divides by zero.

mod config;
mod types;

pub use config::{ConfigError, GridConfig, MIN_GRID_SIZE, POINTER_SENTINEL};
pub use types::{Rect, Rgba, Viewport};

pub fn crate_info() -> &'static str {
    "gridglow-common v0.1.0"
}
