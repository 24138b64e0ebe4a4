use glam::Vec2;

/// First-order low-pass filter chasing a target point.
///
/// Each [`step`](Self::step) moves the position a fixed fraction of the
/// remaining distance toward the target, so with a factor in (0, 1) it
/// approaches monotonically and never overshoots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedPointer {
    position: Vec2,
}

impl SmoothedPointer {
    pub fn new(position: Vec2) -> Self {
        Self { position }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Advance one frame toward `target` and return the new position.
    ///
    /// A non-finite target is skipped. A non-finite position snaps to the
    /// next finite target, so one bad sample never poisons the filter.
    pub fn step(&mut self, target: Vec2, factor: f32) -> Vec2 {
        if !target.is_finite() {
            return self.position;
        }
        if !self.position.is_finite() {
            self.position = target;
        } else {
            self.position += (target - self.position) * factor;
        }
        self.position
    }
}
