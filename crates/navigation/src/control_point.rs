use glam::{EulerRot, Quat, Vec3};
use serde::Deserialize;

/// One authored waypoint of a camera path.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "ControlPointDesc")]
pub struct ControlPoint {
    pub position: Vec3,
    pub rotation: Quat,
    /// Seconds spent travelling into this point under keyframed timing.
    pub duration: f32,
}

impl ControlPoint {
    #[must_use]
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            duration: 1.0,
        }
    }

    /// A point oriented by Euler angles in degrees, applied Z first, then X,
    /// then Y, followed by `roll_degrees` about the local forward axis.
    #[must_use]
    pub fn from_euler_degrees(position: Vec3, euler: Vec3, roll_degrees: f32) -> Self {
        let base = Quat::from_euler(
            EulerRot::YXZ,
            euler.y.to_radians(),
            euler.x.to_radians(),
            euler.z.to_radians(),
        );
        let roll = Quat::from_axis_angle(Vec3::NEG_Z, roll_degrees.to_radians());
        Self::new(position, (base * roll).normalize())
    }

    #[must_use]
    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.duration = seconds;
        self
    }
}

fn default_duration() -> f32 {
    1.0
}

/// Scene-file form of a control point.
#[derive(Debug, Clone, Deserialize)]
struct ControlPointDesc {
    position: Vec3,
    #[serde(default)]
    euler: Vec3,
    #[serde(default)]
    roll: f32,
    #[serde(default = "default_duration")]
    duration: f32,
}

impl From<ControlPointDesc> for ControlPoint {
    fn from(desc: ControlPointDesc) -> Self {
        ControlPoint::from_euler_degrees(desc.position, desc.euler, desc.roll)
            .with_duration(desc.duration)
    }
}
