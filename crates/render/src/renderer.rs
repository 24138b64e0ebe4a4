use glam::Vec2;
use gridglow_common::{ConfigError, GridConfig, POINTER_SENTINEL, Viewport};

use crate::lift::{self, GridLayout, HeightField};
use crate::smoothing::SmoothedPointer;
use crate::surface::{Paint, RadialGradient, Surface};

/// What one call to [`GridRenderer::render_frame`] drew.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    pub vertices: usize,
    pub segments: usize,
    /// Segments drawn brighter than the base opacity.
    pub lit_segments: usize,
    pub filled_quads: usize,
    pub peak_lift: f32,
    pub glow_center: Vec2,
}

/// Pointer-lit grid: owns the viewport, the raw pointer target and the
/// smoothed glow position, and draws one frame at a time onto a [`Surface`].
///
/// The renderer never touches a surface outside the calls made here; hosts
/// decide when frames happen (see [`AnimationLoop`](crate::AnimationLoop)).
#[derive(Debug, Clone)]
pub struct GridRenderer {
    config: GridConfig,
    viewport: Viewport,
    target: Vec2,
    glow: SmoothedPointer,
    field: HeightField,
}

impl GridRenderer {
    /// Renderer with the stock configuration.
    pub fn new(viewport: Viewport) -> Self {
        Self {
            config: GridConfig::default(),
            viewport,
            target: POINTER_SENTINEL,
            glow: SmoothedPointer::new(POINTER_SENTINEL),
            field: HeightField::new(),
        }
    }

    pub fn with_config(config: GridConfig, viewport: Viewport) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(viewport)
        })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Swap in a new configuration. An invalid one is rejected and the
    /// current configuration stays in effect.
    pub fn set_config(&mut self, config: GridConfig) -> Result<(), ConfigError> {
        config.validate()?;
        tracing::debug!(?config, "grid config updated");
        self.config = config;
        Ok(())
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn pointer_target(&self) -> Vec2 {
        self.target
    }

    pub fn smoothed_pointer(&self) -> Vec2 {
        self.glow.position()
    }

    /// Lattice for the current viewport and spacing.
    pub fn layout(&self) -> GridLayout {
        GridLayout::new(self.viewport, self.config.grid_size)
    }

    /// Lifts computed by the most recent frame.
    pub fn height_field(&self) -> &HeightField {
        &self.field
    }

    /// Adopt a new viewport size and resize the surface to match.
    pub fn on_resize<S: Surface + ?Sized>(&mut self, viewport: Viewport, surface: &mut S) {
        tracing::debug!(
            width = viewport.width,
            height = viewport.height,
            "viewport resized"
        );
        self.viewport = viewport;
        surface.resize(viewport);
    }

    /// Record the latest pointer position. Any coordinates are accepted.
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        self.target = Vec2::new(x, y);
    }

    /// Lift at pixel `(x, y)` for the current pointer target.
    pub fn compute_lift(&self, x: f32, y: f32) -> f32 {
        lift::lift_at(Vec2::new(x, y), self.target, &self.config)
    }

    /// Draw one frame: clear, glow, grid lines, lit panels.
    pub fn render_frame<S: Surface + ?Sized>(&mut self, surface: &mut S) -> FrameStats {
        let _span = tracing::info_span!("render_frame").entered();

        let bounds = self.viewport.rect();
        surface.clear_rect(bounds);

        let glow_center = self.glow.step(self.target, self.config.smoothing);
        let primary = self.config.primary();
        surface.fill_rect(
            bounds,
            &Paint::Radial(RadialGradient {
                center: glow_center,
                inner_radius: 0.0,
                outer_radius: self.config.glow_radius(),
                inner: primary.with_alpha(self.config.glow_alpha),
                outer: primary.with_alpha(0.0),
            }),
        );

        let layout = self.layout();
        let target = self.target;
        let config = &self.config;
        self.field
            .rebuild(layout, |p| lift::lift_at(p, target, config));
        let field = &self.field;

        let mut stats = FrameStats {
            vertices: layout.vertex_count(),
            peak_lift: field.peak(),
            glow_center,
            ..FrameStats::default()
        };

        let lifted = |col: u32, row: u32| -> (Vec2, f32) {
            let h = field.get(col, row);
            let p = layout.position(col, row);
            (Vec2::new(p.x, p.y - h), h)
        };

        for col in 0..layout.vertex_columns() {
            for row in 0..layout.vertex_rows() {
                let (here, h) = lifted(col, row);
                let has_right = col < layout.cells_x;
                let has_below = row < layout.cells_y;

                if has_right {
                    let (right, h_right) = lifted(col + 1, row);
                    let alpha = lift::segment_opacity(h, h_right, config);
                    surface.stroke_line(here, right, primary.with_alpha(alpha), config.line_width);
                    stats.segments += 1;
                    stats.lit_segments += usize::from(alpha > config.base_opacity);
                }

                if has_below {
                    let (below, h_below) = lifted(col, row + 1);
                    let alpha = lift::segment_opacity(h, h_below, config);
                    surface.stroke_line(here, below, primary.with_alpha(alpha), config.line_width);
                    stats.segments += 1;
                    stats.lit_segments += usize::from(alpha > config.base_opacity);
                }

                if has_right && has_below {
                    let (top_right, tr) = lifted(col + 1, row);
                    let (bottom_left, bl) = lifted(col, row + 1);
                    let (bottom_right, br) = lifted(col + 1, row + 1);
                    let avg = (h + tr + bl + br) / 4.0;
                    if let Some(opacity) = lift::quad_fill_opacity(avg, config) {
                        surface.fill_polygon(
                            &[here, top_right, bottom_right, bottom_left],
                            primary.with_alpha(opacity),
                        );
                        stats.filled_quads += 1;
                    }
                }
            }
        }

        tracing::trace!(
            segments = stats.segments,
            lit = stats.lit_segments,
            quads = stats.filled_quads,
            peak = stats.peak_lift,
            "frame rendered"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCommand, RecordingSurface};

    fn render_once(renderer: &mut GridRenderer) -> (RecordingSurface, FrameStats) {
        let mut surface = RecordingSurface::new(renderer.viewport());
        let stats = renderer.render_frame(&mut surface);
        (surface, stats)
    }

    #[test]
    fn starts_with_pointer_off_screen() {
        let r = GridRenderer::new(Viewport::new(100, 100));
        assert_eq!(r.pointer_target(), POINTER_SENTINEL);
        assert_eq!(r.smoothed_pointer(), POINTER_SENTINEL);
        assert_eq!(r.compute_lift(0.0, 0.0), 0.0);
    }

    #[test]
    fn sentinel_pointer_leaves_grid_flat() {
        let mut r = GridRenderer::new(Viewport::new(1000, 1000));
        let (surface, stats) = render_once(&mut r);

        assert!(r.height_field().lifts().iter().all(|&l| l == 0.0));
        assert_eq!(stats.filled_quads, 0);
        assert_eq!(stats.lit_segments, 0);
        assert_eq!(surface.count("fill_polygon"), 0);

        let base = r.config().base_opacity;
        assert_eq!(surface.lines().count(), r.layout().segment_count());
        assert!(surface.lines().all(|(_, _, c)| c.a == base));
    }

    #[test]
    fn pointer_at_center_lifts_nearest_vertex() {
        let mut r = GridRenderer::new(Viewport::new(1000, 1000));
        r.on_pointer_move(500.0, 500.0);
        let (_, stats) = render_once(&mut r);

        // 504 = 28 * 18 is the nearest lattice coordinate to 500.
        let nearest = r.height_field().get(28, 28);
        assert!((nearest - 60.0).abs() < 0.5, "nearest lift {nearest}");
        assert_eq!(stats.peak_lift, nearest);

        let layout = r.layout();
        for col in 0..layout.vertex_columns() {
            for row in 0..layout.vertex_rows() {
                let p = layout.position(col, row);
                if p.distance(Vec2::new(500.0, 500.0)) >= 150.0 {
                    assert_eq!(r.height_field().get(col, row), 0.0);
                }
            }
        }
        assert!(stats.filled_quads > 0);
    }

    #[test]
    fn draw_order_is_clear_then_glow_then_grid() {
        let mut r = GridRenderer::new(Viewport::new(90, 54));
        r.on_pointer_move(45.0, 27.0);
        let (surface, _) = render_once(&mut r);
        let cmds = surface.commands();

        assert_eq!(cmds[0], DrawCommand::ClearRect(Viewport::new(90, 54).rect()));
        match &cmds[1] {
            DrawCommand::FillRect {
                rect,
                paint: Paint::Radial(g),
            } => {
                assert_eq!(*rect, Viewport::new(90, 54).rect());
                assert_eq!(g.inner_radius, 0.0);
                assert_eq!(g.outer_radius, 225.0);
                assert_eq!(g.center, r.smoothed_pointer());
                assert_eq!(g.inner.a, 0.1);
                assert_eq!(g.outer.a, 0.0);
            }
            other => panic!("expected glow fill, got {other:?}"),
        }
        assert!(
            cmds[2..]
                .iter()
                .all(|c| matches!(c, DrawCommand::StrokeLine { .. } | DrawCommand::FillPolygon { .. }))
        );
    }

    #[test]
    fn glow_trails_the_pointer() {
        let mut r = GridRenderer::new(Viewport::new(100, 100));
        r.on_pointer_move(0.0, 0.0);
        let (_, stats) = render_once(&mut r);
        // -1000 + 1000 * 0.12
        assert_eq!(stats.glow_center, Vec2::new(-880.0, -880.0));
        assert_eq!(r.pointer_target(), Vec2::ZERO);
    }

    #[test]
    fn lifted_vertices_move_up() {
        let mut r = GridRenderer::new(Viewport::new(36, 36));
        r.on_pointer_move(18.0, 18.0);
        let (surface, _) = render_once(&mut r);
        let layout = r.layout();
        let center_lift = r.height_field().get(1, 1);
        assert_eq!(center_lift, 60.0);

        // The segment leaving (1,1) rightwards starts at the lifted position.
        let start = Vec2::new(18.0, 18.0 - 60.0);
        assert!(surface.lines().any(|(from, _, _)| from == start));
        assert_eq!(layout.vertex_columns(), 3);
    }

    #[test]
    fn quads_use_individual_corner_lifts() {
        let mut r = GridRenderer::new(Viewport::new(36, 36));
        r.on_pointer_move(18.0, 18.0);
        let (surface, stats) = render_once(&mut r);
        assert_eq!(stats.filled_quads, 4);

        let field = r.height_field();
        let (points, color) = surface.polygons().next().unwrap();
        assert_eq!(points[0], Vec2::new(0.0, -field.get(0, 0)));
        assert_eq!(points[1], Vec2::new(18.0, -field.get(1, 0)));
        assert_eq!(points[2], Vec2::new(18.0, 18.0 - field.get(1, 1)));
        assert_eq!(points[3], Vec2::new(0.0, 18.0 - field.get(0, 1)));
        assert!(color.a > 0.0 && color.a <= 0.4);
    }

    #[test]
    fn opacities_stay_in_range_for_many_pointers() {
        let mut r = GridRenderer::new(Viewport::new(200, 150));
        for (x, y) in [(0.0, 0.0), (100.0, 75.0), (-40.0, 10.0), (250.0, 160.0), (99.0, 3.0)] {
            r.on_pointer_move(x, y);
            let (surface, _) = render_once(&mut r);
            let base = r.config().base_opacity;
            assert!(surface.lines().all(|(_, _, c)| c.a >= base && c.a <= 1.0));
            assert!(surface.polygons().all(|(_, c)| c.a > 0.0 && c.a <= 0.4));
        }
    }

    #[test]
    fn resize_recomputes_lattice() {
        let mut r = GridRenderer::new(Viewport::new(800, 600));
        let mut surface = RecordingSurface::new(r.viewport());
        r.render_frame(&mut surface);
        assert_eq!(r.height_field().layout().vertex_columns(), 46);

        r.on_resize(Viewport::new(1920, 1080), &mut surface);
        assert_eq!(surface.viewport(), Viewport::new(1920, 1080));
        let stats = r.render_frame(&mut surface);

        let layout = r.height_field().layout();
        assert_eq!(layout.vertex_columns(), 108);
        assert_eq!(layout.vertex_rows(), 61);
        assert_eq!(stats.vertices, 108 * 61);
        assert_eq!(surface.lines().count(), layout.segment_count());
        assert!(
            surface
                .lines()
                .all(|(from, to, _)| from.x <= 1944.0 && to.x <= 1944.0 && to.y <= 1080.0)
        );
    }

    #[test]
    fn resize_before_first_frame() {
        let mut r = GridRenderer::new(Viewport::default());
        let mut surface = RecordingSurface::default();
        r.on_resize(Viewport::new(10, 10), &mut surface);
        assert_eq!(r.viewport(), Viewport::new(10, 10));
    }

    #[test]
    fn empty_viewport_draws_only_background() {
        let mut r = GridRenderer::new(Viewport::new(0, 0));
        let (surface, stats) = render_once(&mut r);
        assert_eq!(stats.segments, 0);
        assert_eq!(surface.commands().len(), 2);
    }

    #[test]
    fn extreme_pointer_values_do_not_panic() {
        let mut r = GridRenderer::new(Viewport::new(50, 50));
        for (x, y) in [
            (f32::MAX, f32::MIN),
            (f32::INFINITY, 0.0),
            (f32::NAN, f32::NAN),
            (-1e9, 1e9),
        ] {
            r.on_pointer_move(x, y);
            let (_, stats) = render_once(&mut r);
            assert_eq!(stats.filled_quads, 0);
        }
    }

    #[test]
    fn glow_recovers_after_nan_pointer() {
        let mut r = GridRenderer::new(Viewport::new(100, 100));
        r.on_pointer_move(f32::NAN, f32::NAN);
        let (_, stats) = render_once(&mut r);
        assert!(stats.glow_center.is_finite());

        r.on_pointer_move(50.0, 50.0);
        let mut surface = RecordingSurface::new(r.viewport());
        for _ in 0..200 {
            r.render_frame(&mut surface);
        }
        let glow = r.smoothed_pointer();
        assert!(glow.is_finite());
        assert!(glow.distance(Vec2::new(50.0, 50.0)) < 0.01, "glow at {glow}");
    }

    #[test]
    fn set_config_rejects_invalid_and_keeps_previous() {
        let mut r = GridRenderer::new(Viewport::new(10, 10));
        let bad = GridConfig {
            grid_size: 0.0,
            ..GridConfig::default()
        };
        assert!(r.set_config(bad).is_err());
        assert_eq!(r.config().grid_size, 18.0);

        let good = GridConfig {
            grid_size: 5.0,
            ..GridConfig::default()
        };
        r.set_config(good).unwrap();
        assert_eq!(r.layout().vertex_columns(), 3);
    }

    #[test]
    fn with_config_validates() {
        let bad = GridConfig {
            smoothing: 1.0,
            ..GridConfig::default()
        };
        assert!(GridRenderer::with_config(bad, Viewport::new(1, 1)).is_err());
    }
}
