use std::ops::Range;

use glam::Vec2;
use gridglow_common::{Rect, Rgba, Viewport};
use gridglow_render::{Paint, RadialGradient, Surface};

/// CPU framebuffer implementing [`Surface`].
///
/// Pixels are premultiplied RGBA floats. A pixel is covered when its center
/// `(x + 0.5, y + 0.5)` lies inside the shape, with no antialiasing.
#[derive(Debug, Clone)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    pub(crate) pixels: Vec<[f32; 4]>,
    scratch: Vec<f32>,
}

impl PixelSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            width: viewport.width,
            height: viewport.height,
            pixels: vec![[0.0; 4]; viewport.width as usize * viewport.height as usize],
            scratch: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    /// Premultiplied color of pixel `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        (x < self.width && y < self.height).then(|| self.pixels[self.index(x, y)])
    }

    /// Coverage of pixel `(x, y)`; 0 outside the surface.
    pub fn alpha(&self, x: u32, y: u32) -> f32 {
        self.pixel(x, y).map_or(0.0, |p| p[3])
    }

    /// Number of pixels with any coverage at all.
    pub fn covered_pixels(&self) -> usize {
        self.pixels.iter().filter(|p| p[3] > 0.0).count()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Source-over blend of a straight-alpha color onto one pixel.
    fn blend(&mut self, x: u32, y: u32, color: [f32; 4]) {
        let a = color[3];
        if !(a > 0.0) {
            return;
        }
        let a = a.min(1.0);
        let inv = 1.0 - a;
        let idx = self.index(x, y);
        let p = &mut self.pixels[idx];
        p[0] = color[0] * a + p[0] * inv;
        p[1] = color[1] * a + p[1] * inv;
        p[2] = color[2] * a + p[2] * inv;
        p[3] = a + p[3] * inv;
    }

    fn blend_signed(&mut self, x: i64, y: i64, color: [f32; 4]) {
        if x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64 {
            self.blend(x as u32, y as u32, color);
        }
    }

    fn fill_solid(&mut self, rect: Rect, color: [f32; 4]) {
        let xs = pixel_span(rect.x, rect.x + rect.width, self.width);
        for y in pixel_span(rect.y, rect.y + rect.height, self.height) {
            for x in xs.clone() {
                self.blend(x, y, color);
            }
        }
    }

    fn fill_radial(&mut self, rect: Rect, gradient: &RadialGradient) {
        let mut xs = pixel_span(rect.x, rect.x + rect.width, self.width);
        let mut ys = pixel_span(rect.y, rect.y + rect.height, self.height);

        // Nothing is drawn past a transparent outer stop, so only the
        // circle's bounding box needs visiting.
        let bounded = gradient.outer.a <= 0.0;
        if bounded {
            let (c, r) = (gradient.center, gradient.outer_radius);
            xs = intersect(xs, pixel_span(c.x - r, c.x + r, self.width));
            ys = intersect(ys, pixel_span(c.y - r, c.y + r, self.height));
        }

        for y in ys {
            for x in xs.clone() {
                let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let d = center.distance(gradient.center);
                if bounded && d >= gradient.outer_radius {
                    continue;
                }
                self.blend(x, y, gradient.sample(d));
            }
        }
    }

    /// One-pixel Bresenham line; both endpoint pixels are drawn.
    fn hairline(&mut self, from: Vec2, to: Vec2, color: [f32; 4]) {
        let bounds = Vec2::new(self.width as f32, self.height as f32);
        let Some((a, b)) = clip_segment(from, to, Vec2::ZERO, bounds) else {
            return;
        };

        let (mut x0, mut y0) = (a.x.floor() as i64, a.y.floor() as i64);
        let (x1, y1) = (b.x.floor() as i64, b.y.floor() as i64);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.blend_signed(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn fill_polygon_f32(&mut self, points: &[Vec2], color: [f32; 4]) {
        if points.len() < 3 || points.iter().any(|p| !p.is_finite()) {
            return;
        }
        let (min_y, max_y) = points
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.y), hi.max(p.y))
            });

        let mut crossings = std::mem::take(&mut self.scratch);
        for y in pixel_span(min_y, max_y, self.height) {
            let yc = y as f32 + 0.5;
            crossings.clear();
            for (i, &a) in points.iter().enumerate() {
                let b = points[(i + 1) % points.len()];
                if (a.y <= yc) != (b.y <= yc) {
                    crossings.push(a.x + (yc - a.y) * (b.x - a.x) / (b.y - a.y));
                }
            }
            crossings.sort_by(f32::total_cmp);
            for pair in crossings.chunks_exact(2) {
                for x in pixel_span(pair[0], pair[1], self.width) {
                    self.blend(x, y, color);
                }
            }
        }
        self.scratch = crossings;
    }
}

impl Surface for PixelSurface {
    fn resize(&mut self, viewport: Viewport) {
        tracing::debug!(
            width = viewport.width,
            height = viewport.height,
            "pixel surface resized"
        );
        *self = Self::new(viewport);
    }

    fn clear_rect(&mut self, rect: Rect) {
        let xs = pixel_span(rect.x, rect.x + rect.width, self.width);
        for y in pixel_span(rect.y, rect.y + rect.height, self.height) {
            let row = self.index(0, y);
            self.pixels[row + xs.start as usize..row + xs.end as usize].fill([0.0; 4]);
        }
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        match paint {
            Paint::Solid(color) => self.fill_solid(rect, color.to_f32_array()),
            Paint::Radial(gradient) => self.fill_radial(rect, gradient),
        }
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba, width: f32) {
        if !from.is_finite() || !to.is_finite() {
            return;
        }
        let color = color.to_f32_array();
        if width <= 1.0 {
            self.hairline(from, to, color);
            return;
        }
        let Some(dir) = (to - from).try_normalize() else {
            return;
        };
        let n = dir.perp() * (width / 2.0);
        self.fill_polygon_f32(&[from + n, to + n, to - n, from - n], color);
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Rgba) {
        self.fill_polygon_f32(points, color.to_f32_array());
    }
}

/// Pixels whose centers fall in `[lo, hi)`, clipped to `0..limit`.
fn pixel_span(lo: f32, hi: f32, limit: u32) -> Range<u32> {
    let start = (lo - 0.5).ceil().max(0.0);
    let end = (hi - 0.5).ceil().min(limit as f32);
    if start < end {
        start as u32..end as u32
    } else {
        0..0
    }
}

fn intersect(a: Range<u32>, b: Range<u32>) -> Range<u32> {
    let start = a.start.max(b.start);
    let end = a.end.min(b.end);
    if start < end { start..end } else { 0..0 }
}

/// Liang-Barsky clip of segment `a..b` against the box `min..max`.
fn clip_segment(a: Vec2, b: Vec2, min: Vec2, max: Vec2) -> Option<(Vec2, Vec2)> {
    let d = b - a;
    let (mut t0, mut t1) = (0.0_f32, 1.0_f32);
    for (p, q) in [
        (-d.x, a.x - min.x),
        (d.x, max.x - a.x),
        (-d.y, a.y - min.y),
        (d.y, max.y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((a + d * t0, a + d * t1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridglow_render::GridRenderer;

    const RED: Rgba = Rgba::new(255, 0, 0, 0.5);
    const BLUE: Rgba = Rgba::new(0, 0, 255, 0.5);

    fn surface(w: u32, h: u32) -> PixelSurface {
        PixelSurface::new(Viewport::new(w, h))
    }

    #[test]
    fn starts_transparent() {
        let s = surface(4, 3);
        assert_eq!(s.covered_pixels(), 0);
        assert_eq!(s.pixel(3, 2), Some([0.0; 4]));
        assert_eq!(s.pixel(4, 0), None);
    }

    #[test]
    fn solid_fills_blend_source_over() {
        let mut s = surface(4, 4);
        let all = Viewport::new(4, 4).rect();
        s.fill_rect(all, &Paint::Solid(RED));
        s.fill_rect(all, &Paint::Solid(BLUE));
        let p = s.pixel(1, 1).unwrap();
        assert!((p[0] - 0.25).abs() < 1e-6);
        assert_eq!(p[1], 0.0);
        assert!((p[2] - 0.5).abs() < 1e-6);
        assert!((p[3] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn clear_makes_pixels_transparent() {
        let mut s = surface(6, 6);
        s.fill_rect(Viewport::new(6, 6).rect(), &Paint::Solid(Rgba::opaque([9, 9, 9])));
        s.clear_rect(Rect::new(0.0, 0.0, 3.0, 6.0));
        assert_eq!(s.alpha(2, 5), 0.0);
        assert_eq!(s.alpha(3, 0), 1.0);

        s.clear_rect(Viewport::new(6, 6).rect());
        assert_eq!(s.covered_pixels(), 0);
    }

    #[test]
    fn radial_strongest_at_center_and_gone_past_radius() {
        let mut s = surface(40, 40);
        let g = RadialGradient {
            center: Vec2::new(20.0, 20.0),
            inner_radius: 0.0,
            outer_radius: 10.0,
            inner: Rgba::new(59, 130, 246, 0.8),
            outer: Rgba::new(59, 130, 246, 0.0),
        };
        s.fill_rect(Viewport::new(40, 40).rect(), &Paint::Radial(g));

        let center = s.alpha(19, 19);
        assert!(center > 0.7);
        assert!(s.alpha(24, 19) < center);
        assert!(s.alpha(24, 19) > 0.0);
        assert_eq!(s.alpha(31, 19), 0.0);
        assert_eq!(s.alpha(0, 0), 0.0);
    }

    #[test]
    fn radial_with_opaque_rim_covers_whole_rect() {
        let mut s = surface(8, 8);
        let g = RadialGradient {
            center: Vec2::ZERO,
            inner_radius: 0.0,
            outer_radius: 2.0,
            inner: Rgba::opaque([0, 0, 0]),
            outer: Rgba::opaque([255, 255, 255]),
        };
        s.fill_rect(Viewport::new(8, 8).rect(), &Paint::Radial(g));
        assert_eq!(s.covered_pixels(), 64);
        assert_eq!(s.pixel(7, 7).unwrap()[0], 1.0);
    }

    #[test]
    fn polygon_fills_interior_only() {
        let mut s = surface(10, 10);
        let square = [
            Vec2::new(2.0, 2.0),
            Vec2::new(6.0, 2.0),
            Vec2::new(6.0, 6.0),
            Vec2::new(2.0, 6.0),
        ];
        s.fill_polygon(&square, Rgba::opaque([255, 255, 255]));
        assert_eq!(s.covered_pixels(), 16);
        assert_eq!(s.alpha(3, 3), 1.0);
        assert_eq!(s.alpha(1, 1), 0.0);
        assert_eq!(s.alpha(6, 6), 0.0);
    }

    #[test]
    fn triangle_respects_edges() {
        let mut s = surface(10, 10);
        s.fill_polygon(
            &[Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(0.0, 10.0)],
            Rgba::opaque([1, 2, 3]),
        );
        assert_eq!(s.alpha(1, 1), 1.0);
        assert_eq!(s.alpha(8, 8), 0.0);
        assert_eq!(s.alpha(8, 0), 1.0);
        // Center (9.5, 0.5) sits exactly on the hypotenuse and is excluded.
        assert_eq!(s.alpha(9, 0), 0.0);
    }

    #[test]
    fn degenerate_polygons_draw_nothing() {
        let mut s = surface(10, 10);
        let c = Rgba::opaque([1, 2, 3]);
        s.fill_polygon(&[Vec2::ZERO, Vec2::ONE], c);
        s.fill_polygon(&[Vec2::ZERO, Vec2::new(f32::NAN, 1.0), Vec2::ONE], c);
        assert_eq!(s.covered_pixels(), 0);
    }

    #[test]
    fn hairline_touches_both_endpoints() {
        let mut s = surface(10, 10);
        s.stroke_line(
            Vec2::new(1.5, 1.5),
            Vec2::new(8.5, 5.5),
            Rgba::opaque([255, 0, 0]),
            1.0,
        );
        assert_eq!(s.alpha(1, 1), 1.0);
        assert_eq!(s.alpha(8, 5), 1.0);
        // One pixel per step along the major axis.
        assert_eq!(s.covered_pixels(), 8);
    }

    #[test]
    fn hairline_is_clipped() {
        let mut s = surface(10, 10);
        s.stroke_line(
            Vec2::new(-100.0, 5.5),
            Vec2::new(100.0, 5.5),
            Rgba::opaque([0, 255, 0]),
            1.0,
        );
        assert_eq!(s.covered_pixels(), 10);
        s.stroke_line(
            Vec2::new(-5.0, -5.0),
            Vec2::new(-1.0, -9.0),
            Rgba::opaque([0, 255, 0]),
            1.0,
        );
        assert_eq!(s.covered_pixels(), 10);
    }

    #[test]
    fn thick_line_is_a_quad() {
        let mut s = surface(10, 10);
        s.stroke_line(
            Vec2::new(0.0, 5.0),
            Vec2::new(10.0, 5.0),
            Rgba::opaque([0, 0, 255]),
            4.0,
        );
        assert_eq!(s.alpha(5, 3), 1.0);
        assert_eq!(s.alpha(5, 6), 1.0);
        assert_eq!(s.alpha(5, 1), 0.0);
        assert_eq!(s.alpha(5, 7), 0.0);
    }

    #[test]
    fn resize_reallocates_blank() {
        let mut s = surface(2, 2);
        s.fill_rect(Viewport::new(2, 2).rect(), &Paint::Solid(RED));
        s.resize(Viewport::new(5, 3));
        assert_eq!((s.width(), s.height()), (5, 3));
        assert_eq!(s.covered_pixels(), 0);
    }

    #[test]
    fn renders_grid_frame() {
        let vp = Viewport::new(400, 300);
        let mut s = PixelSurface::new(vp);
        let mut r = GridRenderer::new(vp);
        r.on_pointer_move(60.0, 45.0);
        for _ in 0..30 {
            r.render_frame(&mut s);
        }
        // Flat vertical line at x = 360, far outside the flashlight.
        assert!((s.alpha(360, 250) - 0.15).abs() < 1e-3);
        // Cell interiors away from the pointer stay empty.
        assert_eq!(s.alpha(370, 260), 0.0);
        // The glow trails toward the pointer.
        assert!(s.alpha(40, 25) > 0.05);
    }
}
