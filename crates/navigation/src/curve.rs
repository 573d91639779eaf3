//! Closed-form evaluation of the supported camera curves.
//!
//! A [`Curve`] is split into segments, each parameterized by a local
//! `t ∈ [0, 1]`. Spline and great-circle paths have one segment per pair of
//! consecutive points. The spiral is a single analytic segment whose `t` is
//! global.

use crate::{ControlPoint, NavigationError, Pose};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Step used for the great-circle tangent.
const ARC_TANGENT_STEP: f32 = 1e-3;
/// Step used for the spiral's forward and backward tangents.
const SPIRAL_TANGENT_STEP: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    CatmullRom,
    GreatCircle,
    Spiral,
}

impl CurveKind {
    /// Fewest control points that make a playable path of this kind.
    #[must_use]
    pub const fn min_points(self) -> usize {
        match self {
            CurveKind::CatmullRom => 4,
            CurveKind::GreatCircle => 2,
            CurveKind::Spiral => 0,
        }
    }

    /// Samples per segment used when building arc-length tables.
    #[must_use]
    pub const fn default_samples(self) -> usize {
        match self {
            CurveKind::CatmullRom => 10,
            CurveKind::GreatCircle => 20,
            CurveKind::Spiral => 256,
        }
    }
}

/// A logarithmic spiral in the YZ plane, tilted about +Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiralParams {
    pub start_radius: f32,
    pub decay_rate: f32,
    pub total_turns: f32,
    pub tilt_degrees: f32,
}

impl Default for SpiralParams {
    fn default() -> Self {
        Self {
            start_radius: 20.0,
            decay_rate: 0.5,
            total_turns: 5.0,
            tilt_degrees: 0.0,
        }
    }
}

impl SpiralParams {
    #[must_use]
    pub fn position(&self, t: f32) -> Vec3 {
        let angle = t * self.total_turns * TAU;
        let radius = self.start_radius * (-self.decay_rate * t).exp();
        let (sin, cos) = angle.sin_cos();
        let flat = Vec3::new(0.0, sin * radius, cos * radius);
        Quat::from_rotation_z(self.tilt_degrees.to_radians()) * flat
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Curve {
    CatmullRom {
        points: Vec<ControlPoint>,
    },
    GreatCircle {
        points: Vec<Vec3>,
        #[serde(default)]
        center: Vec3,
    },
    Spiral(SpiralParams),
}

impl Curve {
    #[must_use]
    pub fn kind(&self) -> CurveKind {
        match self {
            Curve::CatmullRom { .. } => CurveKind::CatmullRom,
            Curve::GreatCircle { .. } => CurveKind::GreatCircle,
            Curve::Spiral(_) => CurveKind::Spiral,
        }
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        match self {
            Curve::CatmullRom { points } => points.len(),
            Curve::GreatCircle { points, .. } => points.len(),
            Curve::Spiral(_) => 0,
        }
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        match self {
            Curve::Spiral(_) => 1,
            _ => self.point_count().saturating_sub(1),
        }
    }

    /// Checks that the curve has enough points to be played.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::InvalidPath`] naming the shortfall.
    pub fn validate(&self) -> Result<(), NavigationError> {
        let kind = self.kind();
        let actual = self.point_count();
        if actual < kind.min_points() {
            return Err(NavigationError::InvalidPath {
                kind,
                required: kind.min_points(),
                actual,
            });
        }
        Ok(())
    }

    /// Position on `segment` at local parameter `t`. Out-of-range segments
    /// are clamped to the last one.
    #[must_use]
    pub fn position(&self, segment: usize, t: f32) -> Vec3 {
        match self {
            Curve::CatmullRom { points } => catmull_rom(points, segment, t),
            Curve::GreatCircle { points, center } => great_circle(points, *center, segment, t),
            Curve::Spiral(spiral) => spiral.position(t),
        }
    }

    /// Position and orientation on `segment` at local parameter `t`.
    #[must_use]
    pub fn evaluate(&self, segment: usize, t: f32) -> Pose {
        let position = self.position(segment, t);
        let rotation = match self {
            Curve::CatmullRom { points } => spline_rotation(points, segment, t),
            Curve::GreatCircle { center, .. } => {
                let tangent = if t + ARC_TANGENT_STEP <= 1.0 {
                    self.position(segment, t + ARC_TANGENT_STEP) - position
                } else {
                    position - self.position(segment, t - ARC_TANGENT_STEP)
                };
                let up = (position - *center).try_normalize().unwrap_or(Vec3::Y);
                let forward = tangent.try_normalize().unwrap_or_else(|| {
                    (Vec3::NEG_Z - up * up.dot(Vec3::NEG_Z))
                        .try_normalize()
                        .unwrap_or_else(|| up.any_orthonormal_vector())
                });
                Pose::look_rotation(forward, up)
            }
            Curve::Spiral(spiral) => {
                let ahead = spiral.position(t + SPIRAL_TANGENT_STEP);
                let behind = spiral.position(t - SPIRAL_TANGENT_STEP);
                let forward = (ahead - position).normalize_or_zero();
                let backward = (position - behind).normalize_or_zero();
                let up = forward
                    .cross(backward)
                    .try_normalize()
                    .and_then(|right| right.cross(forward).try_normalize())
                    .unwrap_or(Vec3::Y);
                Pose::look_rotation(forward, up)
            }
        };
        Pose::new(position, rotation)
    }
}

fn catmull_rom(points: &[ControlPoint], segment: usize, t: f32) -> Vec3 {
    let Some(last) = points.len().checked_sub(1) else {
        return Vec3::ZERO;
    };
    let at = |i: isize| points[i.clamp(0, last as isize) as usize].position;
    let i = segment.min(last.saturating_sub(1)) as isize;
    let (p0, p1, p2, p3) = (at(i - 1), at(i), at(i + 1), at(i + 2));

    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * (2.0 * p1
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

/// Slerps the bracketing control rotations by the raw segment `t`, not the
/// arc-length position, so rotation speed is not constant along the segment.
fn spline_rotation(points: &[ControlPoint], segment: usize, t: f32) -> Quat {
    let Some(last) = points.len().checked_sub(1) else {
        return Quat::IDENTITY;
    };
    let i = segment.min(last.saturating_sub(1));
    let a = points[i].rotation;
    let b = points[(i + 1).min(last)].rotation;
    a.slerp(b, t.clamp(0.0, 1.0))
}

/// Unit direction `t` of the way along the great circle from `a` to `b`.
pub(crate) fn arc_direction(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    let dot = a.dot(b).clamp(-1.0, 1.0);
    let theta = dot.acos() * t;
    let perp = (b - a * dot)
        .try_normalize()
        .unwrap_or_else(|| a.any_orthonormal_vector());
    let (sin, cos) = theta.sin_cos();
    a * cos + perp * sin
}

fn great_circle(points: &[Vec3], center: Vec3, segment: usize, t: f32) -> Vec3 {
    let Some(last) = points.len().checked_sub(1) else {
        return center;
    };
    let i = segment.min(last.saturating_sub(1));
    let start = points[i] - center;
    let end = points[(i + 1).min(last)] - center;
    let radius = start.length();
    let a = start.try_normalize().unwrap_or(Vec3::Y);
    let b = end.try_normalize().unwrap_or(a);
    center + arc_direction(a, b, t) * radius
}
