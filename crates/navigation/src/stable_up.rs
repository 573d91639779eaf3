use glam::{Quat, Vec3};

/// Rate at which the tracked up vector converges, per second.
pub const DEFAULT_RATE: f32 = 5.0;
/// Squared length below which the projected up is considered degenerate.
const DEGENERATE_SQ: f32 = 1e-4;

/// An up vector that follows a moving look direction without snapping.
///
/// Each update projects the current up onto the plane perpendicular to the
/// new forward direction and rotates towards it by `rate * dt`. When forward
/// runs almost parallel to the current up, `forward × world X` stands in for
/// the projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StableUp {
    up: Vec3,
    rate: f32,
}

impl Default for StableUp {
    fn default() -> Self {
        Self::new(DEFAULT_RATE)
    }
}

impl StableUp {
    #[must_use]
    pub fn new(rate: f32) -> Self {
        Self { up: Vec3::Y, rate }
    }

    pub fn reset(&mut self) {
        self.up = Vec3::Y;
    }

    #[must_use]
    pub fn current(&self) -> Vec3 {
        self.up
    }

    /// Advances the tracked up towards `forward`'s perpendicular plane and
    /// returns it.
    pub fn update(&mut self, forward: Vec3, dt: f32) -> Vec3 {
        let Some(f) = forward.try_normalize() else {
            return self.up;
        };
        let mut projected = self.up - f * f.dot(self.up);
        if projected.length_squared() < DEGENERATE_SQ {
            projected = f.cross(Vec3::X);
        }
        let Some(target) = projected.try_normalize() else {
            return self.up;
        };

        let amount = (self.rate * dt).clamp(0.0, 1.0);
        let arc = Quat::from_rotation_arc(self.up, target);
        self.up = (Quat::IDENTITY.slerp(arc, amount) * self.up).normalize();
        self.up
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_to_perpendicular_up() {
        let mut stable = StableUp::default();
        let forward = Vec3::new(0.0, 0.6, -0.8);
        for _ in 0..200 {
            stable.update(forward, 1.0 / 60.0);
        }
        assert!(stable.current().dot(forward).abs() < 1e-3);
        assert!(stable.current().y > 0.0);
    }

    #[test]
    fn degenerate_projection_uses_fallback() {
        let mut stable = StableUp::default();
        let up = stable.update(Vec3::Y, 1.0);
        assert!(up.is_finite());
        assert!(up.dot(Vec3::Y).abs() < 1e-4);
    }

    #[test]
    fn zero_dt_keeps_up() {
        let mut stable = StableUp::default();
        let up = stable.update(Vec3::new(1.0, 1.0, 0.0), 0.0);
        assert!((up - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn reset_restores_world_up() {
        let mut stable = StableUp::default();
        stable.update(Vec3::Y, 1.0);
        stable.reset();
        assert_eq!(stable.current(), Vec3::Y);
    }
}
