use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::types::Rgba;

/// Where the pointer is assumed to be before the first pointer-move event.
/// Far enough off-screen that no vertex receives any lift.
pub const POINTER_SENTINEL: Vec2 = Vec2::new(-1000.0, -1000.0);

/// Smallest accepted grid spacing, in pixels. Keeps the vertex count of any
/// real viewport within `u32`.
pub const MIN_GRID_SIZE: f32 = 1.0;

/// Errors from loading or validating a [`GridConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tunables for the lit grid. Defaults reproduce the stock look.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Spacing between grid lines, in pixels.
    pub grid_size: f32,
    /// RGB of lines, glow and lit panels.
    pub primary_color: [u8; 3],
    /// Opacity of grid lines far from the pointer.
    pub base_opacity: f32,
    /// Distance from the pointer beyond which vertices stay flat.
    pub flashlight_radius: f32,
    /// Low-pass factor for the glow position, in (0, 1).
    pub smoothing: f32,
    /// Lift of a vertex directly under the pointer, in pixels.
    pub max_lift: f32,
    /// Alpha of the glow at its center.
    pub glow_alpha: f32,
    /// Glow outer radius as a multiple of `flashlight_radius`.
    pub glow_radius_scale: f32,
    /// Average corner lift a cell needs before it is filled.
    pub fill_threshold: f32,
    /// Fill opacity of a cell whose corners are all at `max_lift`.
    pub fill_max_opacity: f32,
    pub line_width: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            grid_size: 18.0,
            primary_color: [59, 130, 246],
            base_opacity: 0.15,
            flashlight_radius: 150.0,
            smoothing: 0.12,
            max_lift: 60.0,
            glow_alpha: 0.1,
            glow_radius_scale: 1.5,
            fill_threshold: 0.5,
            fill_max_opacity: 0.4,
            line_width: 1.0,
        }
    }
}

impl GridConfig {
    pub fn primary(&self) -> Rgba {
        Rgba::opaque(self.primary_color)
    }

    /// Outer radius of the pointer glow.
    pub fn glow_radius(&self) -> f32 {
        self.flashlight_radius * self.glow_radius_scale
    }

    /// Check every numeric field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.grid_size.is_finite() && self.grid_size >= MIN_GRID_SIZE) {
            return Err(invalid(
                "grid_size",
                format!("must be finite and at least {MIN_GRID_SIZE}, got {}", self.grid_size),
            ));
        }
        positive("flashlight_radius", self.flashlight_radius)?;
        positive("max_lift", self.max_lift)?;
        positive("glow_radius_scale", self.glow_radius_scale)?;
        positive("line_width", self.line_width)?;
        unit("base_opacity", self.base_opacity)?;
        unit("glow_alpha", self.glow_alpha)?;
        unit("fill_max_opacity", self.fill_max_opacity)?;

        if !(self.smoothing > 0.0 && self.smoothing < 1.0) {
            return Err(invalid(
                "smoothing",
                format!("must lie strictly between 0 and 1, got {}", self.smoothing),
            ));
        }
        if !(self.fill_threshold.is_finite() && self.fill_threshold >= 0.0) {
            return Err(invalid(
                "fill_threshold",
                format!("must be finite and non-negative, got {}", self.fill_threshold),
            ));
        }
        Ok(())
    }

    /// Parse YAML. Missing fields take their defaults.
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse JSON. Missing fields take their defaults.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file: `.json` is read as JSON, anything else as YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&source)?
        } else {
            Self::from_yaml_str(&source)?
        };
        tracing::debug!(path = %path.display(), "loaded grid config");
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite and positive, got {value}")))
    }
}

fn unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("must lie in [0, 1], got {value}")))
    }
}
