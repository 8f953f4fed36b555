//! Geometry
//!
//! Positions, velocities and forces use glam's [`Vec2`]. [`VecExt`] adds the
//! few arena-specific operations glam has no direct equivalent for.

pub use glam::Vec2;

/// Arena helpers on top of [`Vec2`]
pub trait VecExt {
    /// Clamps each component into `[-limit, limit]`.
    fn clamp_components(self, limit: f32) -> Vec2;

    /// The vector turned by `angle` radians.
    fn rotated(self, angle: f32) -> Vec2;
}

impl VecExt for Vec2 {
    fn clamp_components(self, limit: f32) -> Vec2 {
        Vec2::new(self.x.max(-limit).min(limit), self.y.max(-limit).min(limit))
    }

    fn rotated(self, angle: f32) -> Vec2 {
        Vec2::from_angle(angle).rotate(self)
    }
}
