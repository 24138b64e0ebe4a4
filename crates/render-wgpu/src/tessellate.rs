use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use gridglow_common::{Rect, Rgba, Viewport};
use gridglow_render::{Paint, RadialGradient, Surface};

/// Triangles used to approximate one radial gradient disc.
pub const RADIAL_SEGMENTS: usize = 64;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

/// Pixel coordinates (origin top left, y down) to clip space.
pub fn pixel_to_clip(p: Vec2, viewport: Viewport) -> [f32; 2] {
    [
        p.x / viewport.width as f32 * 2.0 - 1.0,
        1.0 - p.y / viewport.height as f32 * 2.0,
    ]
}

/// [`Surface`] that turns draw calls into a triangle list.
///
/// Only a clear covering the whole viewport is honoured; partial clears
/// cannot be expressed with blended triangles and are skipped. Polygons are
/// fanned from their first point, which is exact for convex shapes.
#[derive(Debug, Default)]
pub struct Tessellator {
    viewport: Viewport,
    vertices: Vec<ColorVertex>,
}

impl Tessellator {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            vertices: Vec::new(),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn vertices(&self) -> &[ColorVertex] {
        &self.vertices
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    fn push(&mut self, p: Vec2, color: [f32; 4]) {
        self.vertices.push(ColorVertex {
            position: pixel_to_clip(p, self.viewport),
            color,
        });
    }

    fn triangle(&mut self, a: Vec2, b: Vec2, c: Vec2, color: [f32; 4]) {
        self.push(a, color);
        self.push(b, color);
        self.push(c, color);
    }

    fn quad(&mut self, corners: [Vec2; 4], color: [f32; 4]) {
        let [a, b, c, d] = corners;
        self.triangle(a, b, c, color);
        self.triangle(a, c, d, color);
    }

    fn drawable(&self) -> bool {
        !self.viewport.is_empty()
    }

    /// Fan from the center with the outer stop on the rim. Between the
    /// two radii the GPU interpolates linearly, matching a two-stop gradient.
    fn radial(&mut self, g: &RadialGradient) {
        let inner = g.inner.to_f32_array();
        let outer = g.outer.to_f32_array();
        let ring = |i: usize, r: f32| {
            let angle = i as f32 / RADIAL_SEGMENTS as f32 * TAU;
            g.center + Vec2::from_angle(angle) * r
        };

        for i in 0..RADIAL_SEGMENTS {
            if g.inner_radius > 0.0 {
                self.triangle(g.center, ring(i, g.inner_radius), ring(i + 1, g.inner_radius), inner);
                let (a, b) = (ring(i, g.inner_radius), ring(i + 1, g.inner_radius));
                let (c, d) = (ring(i + 1, g.outer_radius), ring(i, g.outer_radius));
                self.push(a, inner);
                self.push(b, inner);
                self.push(c, outer);
                self.push(a, inner);
                self.push(c, outer);
                self.push(d, outer);
            } else {
                self.push(g.center, inner);
                self.push(ring(i, g.outer_radius), outer);
                self.push(ring(i + 1, g.outer_radius), outer);
            }
        }
    }
}

impl Surface for Tessellator {
    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.vertices.clear();
    }

    fn clear_rect(&mut self, rect: Rect) {
        if rect.contains_rect(&self.viewport.rect()) {
            self.vertices.clear();
        } else {
            tracing::trace!(?rect, "partial clear skipped");
        }
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        if !self.drawable() {
            return;
        }
        match paint {
            Paint::Solid(color) => {
                let (min, max) = (rect.min(), rect.max());
                self.quad(
                    [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)],
                    color.to_f32_array(),
                );
            }
            Paint::Radial(g) => {
                if g.center.is_finite() && g.outer_radius.is_finite() {
                    self.radial(g);
                }
            }
        }
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba, width: f32) {
        if !self.drawable() || !from.is_finite() || !to.is_finite() {
            return;
        }
        let Some(dir) = (to - from).try_normalize() else {
            return;
        };
        let n = dir.perp() * (width.max(1.0) / 2.0);
        self.quad(
            [from + n, to + n, to - n, from - n],
            color.to_f32_array(),
        );
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Rgba) {
        if !self.drawable() || points.len() < 3 || points.iter().any(|p| !p.is_finite()) {
            return;
        }
        let color = color.to_f32_array();
        for pair in points[1..].windows(2) {
            self.triangle(points[0], pair[0], pair[1], color);
        }
    }
}
