use std::f32::consts::PI;

use glam::Vec2;
use gridglow_common::{GridConfig, Viewport};

/// Raised-cosine falloff: `max_lift` at distance 0, exactly 0 at and beyond
/// `radius`, with zero slope at both ends so the bump has no visible seam.
pub fn lift_at_distance(distance: f32, radius: f32, max_lift: f32) -> f32 {
    if distance.is_nan() || distance >= radius {
        return 0.0;
    }
    let influence = (1.0 + (distance / radius * PI).cos()) / 2.0;
    max_lift * influence
}

/// Lift of the grid point `point` when the pointer is at `pointer`.
pub fn lift_at(point: Vec2, pointer: Vec2, config: &GridConfig) -> f32 {
    let distance = (point.x - pointer.x).hypot(point.y - pointer.y);
    lift_at_distance(distance, config.flashlight_radius, config.max_lift)
}

/// Opacity of the segment joining two vertices with the given lifts.
/// Never below `base_opacity`, never above 1.
pub fn segment_opacity(lift_a: f32, lift_b: f32, config: &GridConfig) -> f32 {
    ((lift_a + lift_b) / (2.0 * config.max_lift))
        .max(config.base_opacity)
        .min(1.0)
}

/// Fill opacity of a cell whose corners average `avg_lift`, or `None` when
/// the cell is too flat to be drawn at all.
pub fn quad_fill_opacity(avg_lift: f32, config: &GridConfig) -> Option<f32> {
    (avg_lift > config.fill_threshold).then(|| {
        (avg_lift / config.max_lift).clamp(0.0, 1.0) * config.fill_max_opacity
    })
}

/// Dimensions of the vertex lattice covering a viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    /// Cells across; the lattice has one more vertex column than this.
    pub cells_x: u32,
    pub cells_y: u32,
    pub spacing: f32,
}

impl GridLayout {
    pub fn new(viewport: Viewport, spacing: f32) -> Self {
        Self {
            cells_x: (viewport.width as f32 / spacing).ceil() as u32,
            cells_y: (viewport.height as f32 / spacing).ceil() as u32,
            spacing,
        }
    }

    pub fn vertex_columns(&self) -> u32 {
        self.cells_x.saturating_add(1)
    }

    pub fn vertex_rows(&self) -> u32 {
        self.cells_y.saturating_add(1)
    }

    pub fn vertex_count(&self) -> usize {
        (self.vertex_columns() as usize).saturating_mul(self.vertex_rows() as usize)
    }

    /// Horizontal plus vertical segments.
    pub fn segment_count(&self) -> usize {
        let (cx, cy) = (self.cells_x as usize, self.cells_y as usize);
        cx.saturating_mul(cy)
            .saturating_mul(2)
            .saturating_add(cx)
            .saturating_add(cy)
    }

    pub fn quad_count(&self) -> usize {
        (self.cells_x as usize).saturating_mul(self.cells_y as usize)
    }

    /// Resting (unlifted) pixel position of vertex `(col, row)`.
    pub fn position(&self, col: u32, row: u32) -> Vec2 {
        Vec2::new(col as f32 * self.spacing, row as f32 * self.spacing)
    }
}

/// Lift of every lattice vertex for one frame, stored row-major.
#[derive(Debug, Clone)]
pub struct HeightField {
    layout: GridLayout,
    lifts: Vec<f32>,
}

impl HeightField {
    pub fn new() -> Self {
        Self {
            layout: GridLayout {
                cells_x: 0,
                cells_y: 0,
                spacing: 1.0,
            },
            lifts: vec![0.0],
        }
    }

    /// Recompute every vertex for `layout`, reusing the existing allocation.
    pub fn rebuild(&mut self, layout: GridLayout, mut lift: impl FnMut(Vec2) -> f32) {
        self.layout = layout;
        self.lifts.clear();
        self.lifts.reserve(layout.vertex_count());
        for row in 0..layout.vertex_rows() {
            for col in 0..layout.vertex_columns() {
                self.lifts.push(lift(layout.position(col, row)));
            }
        }
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    /// Lift of vertex `(col, row)`. Out-of-range vertices are flat.
    pub fn get(&self, col: u32, row: u32) -> f32 {
        if col >= self.layout.vertex_columns() || row >= self.layout.vertex_rows() {
            return 0.0;
        }
        let idx = row as usize * self.layout.vertex_columns() as usize + col as usize;
        self.lifts[idx]
    }

    pub fn lifts(&self) -> &[f32] {
        &self.lifts
    }

    pub fn peak(&self) -> f32 {
        self.lifts.iter().copied().fold(0.0, f32::max)
    }
}

impl Default for HeightField {
    fn default() -> Self {
        Self::new()
    }
}
