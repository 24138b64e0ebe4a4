use glam::Vec2;
use gridglow_common::{Rect, Rgba, Viewport};

/// Radial gradient with one color stop at each radius.
///
/// Inside `inner_radius` the inner color holds, beyond `outer_radius` the
/// outer color holds, and in between the two are interpolated linearly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialGradient {
    pub center: Vec2,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub inner: Rgba,
    pub outer: Rgba,
}

impl RadialGradient {
    /// Interpolation parameter in [0, 1] at `distance` from the center.
    pub fn offset_at(&self, distance: f32) -> f32 {
        let span = self.outer_radius - self.inner_radius;
        if span <= 0.0 {
            return if distance < self.outer_radius { 0.0 } else { 1.0 };
        }
        ((distance - self.inner_radius) / span).clamp(0.0, 1.0)
    }

    /// Straight-alpha color at `distance` from the center, channels in [0, 1].
    pub fn sample(&self, distance: f32) -> [f32; 4] {
        let t = self.offset_at(distance);
        let a = self.inner.to_f32_array();
        let b = self.outer.to_f32_array();
        [
            a[0] + (b[0] - a[0]) * t,
            a[1] + (b[1] - a[1]) * t,
            a[2] + (b[2] - a[2]) * t,
            a[3] + (b[3] - a[3]) * t,
        ]
    }
}

/// How a filled rectangle is colored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    Radial(RadialGradient),
}

/// Drawing primitives a backend must provide.
///
/// Coordinates are viewport pixels with the origin at the top left.
/// Implementations blend with source-over and clip to their own bounds.
pub trait Surface {
    /// Resize the backing store to match the viewport. Contents may be lost.
    fn resize(&mut self, viewport: Viewport);

    /// Reset every pixel inside `rect` to fully transparent.
    fn clear_rect(&mut self, rect: Rect);

    fn fill_rect(&mut self, rect: Rect, paint: &Paint);

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba, width: f32);

    /// Fill a closed polygon with the even-odd rule.
    fn fill_polygon(&mut self, points: &[Vec2], color: Rgba);
}

/// One recorded call on a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    ClearRect(Rect),
    FillRect {
        rect: Rect,
        paint: Paint,
    },
    StrokeLine {
        from: Vec2,
        to: Vec2,
        color: Rgba,
        width: f32,
    },
    FillPolygon {
        points: Vec<Vec2>,
        color: Rgba,
    },
}

impl DrawCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            DrawCommand::ClearRect(_) => "clear_rect",
            DrawCommand::FillRect { .. } => "fill_rect",
            DrawCommand::StrokeLine { .. } => "stroke_line",
            DrawCommand::FillPolygon { .. } => "fill_polygon",
        }
    }
}

/// Surface that records draw calls instead of producing pixels.
///
/// A clear covering the whole viewport discards everything recorded before
/// it, so the log always describes what is currently visible.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    viewport: Viewport,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            commands: Vec::new(),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of recorded commands of the given [`DrawCommand::kind`].
    pub fn count(&self, kind: &str) -> usize {
        self.commands.iter().filter(|c| c.kind() == kind).count()
    }

    pub fn lines(&self) -> impl Iterator<Item = (Vec2, Vec2, Rgba)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::StrokeLine {
                from, to, color, ..
            } => Some((*from, *to, *color)),
            _ => None,
        })
    }

    pub fn polygons(&self) -> impl Iterator<Item = (&[Vec2], Rgba)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::FillPolygon { points, color } => Some((points.as_slice(), *color)),
            _ => None,
        })
    }
}

impl Surface for RecordingSurface {
    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.commands.clear();
    }

    fn clear_rect(&mut self, rect: Rect) {
        if rect.contains_rect(&self.viewport.rect()) {
            self.commands.clear();
        }
        self.commands.push(DrawCommand::ClearRect(rect));
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        self.commands.push(DrawCommand::FillRect {
            rect,
            paint: *paint,
        });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba, width: f32) {
        self.commands.push(DrawCommand::StrokeLine {
            from,
            to,
            color,
            width,
        });
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Rgba) {
        self.commands.push(DrawCommand::FillPolygon {
            points: points.to_vec(),
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glow() -> RadialGradient {
        RadialGradient {
            center: Vec2::ZERO,
            inner_radius: 0.0,
            outer_radius: 100.0,
            inner: Rgba::new(255, 0, 0, 0.5),
            outer: Rgba::new(255, 0, 0, 0.0),
        }
    }

    #[test]
    fn gradient_offsets() {
        let g = glow();
        assert_eq!(g.offset_at(0.0), 0.0);
        assert_eq!(g.offset_at(50.0), 0.5);
        assert_eq!(g.offset_at(250.0), 1.0);
    }

    #[test]
    fn gradient_sample_fades_alpha() {
        let g = glow();
        assert_eq!(g.sample(0.0)[3], 0.5);
        assert!((g.sample(50.0)[3] - 0.25).abs() < 1e-6);
        assert_eq!(g.sample(100.0)[3], 0.0);
        assert_eq!(g.sample(0.0)[0], 1.0);
    }

    #[test]
    fn degenerate_gradient_is_a_step() {
        let g = RadialGradient {
            inner_radius: 10.0,
            outer_radius: 10.0,
            ..glow()
        };
        assert_eq!(g.offset_at(5.0), 0.0);
        assert_eq!(g.offset_at(10.0), 1.0);
    }

    #[test]
    fn full_clear_discards_history() {
        let mut s = RecordingSurface::new(Viewport::new(10, 10));
        s.stroke_line(Vec2::ZERO, Vec2::ONE, Rgba::opaque([1, 1, 1]), 1.0);
        s.clear_rect(Rect::new(0.0, 0.0, 5.0, 5.0));
        assert_eq!(s.commands().len(), 2);

        s.clear_rect(Viewport::new(10, 10).rect());
        assert_eq!(s.commands().len(), 1);
        assert_eq!(s.count("clear_rect"), 1);
    }

    #[test]
    fn records_in_call_order() {
        let mut s = RecordingSurface::new(Viewport::new(10, 10));
        let c = Rgba::opaque([9, 9, 9]);
        s.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), &Paint::Solid(c));
        s.fill_polygon(&[Vec2::ZERO, Vec2::X, Vec2::Y], c);
        s.stroke_line(Vec2::ZERO, Vec2::X, c, 2.0);

        let kinds: Vec<_> = s.commands().iter().map(DrawCommand::kind).collect();
        assert_eq!(kinds, ["fill_rect", "fill_polygon", "stroke_line"]);
        assert_eq!(s.polygons().next().map(|(p, _)| p.len()), Some(3));
        assert_eq!(s.lines().count(), 1);
    }

    #[test]
    fn resize_updates_viewport() {
        let mut s = RecordingSurface::new(Viewport::new(10, 10));
        s.resize(Viewport::new(20, 30));
        assert_eq!(s.viewport(), Viewport::new(20, 30));
        assert!(s.commands().is_empty());
    }
}
