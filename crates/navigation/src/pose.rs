use glam::{Mat3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Camera position and orientation. The camera looks along its local -Z axis
/// with local +Y up, matching `Mat4::look_at_rh`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Pose {
    #[must_use]
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// World-to-view matrix for the rendering collaborator.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), self.up())
    }

    /// Rotation whose forward axis is `forward` and whose up axis is as close
    /// to `up` as the forward constraint allows.
    ///
    /// A zero `forward` yields the identity. When `up` is parallel to
    /// `forward` an arbitrary perpendicular up is chosen.
    #[must_use]
    pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
        let Some(f) = forward.try_normalize() else {
            return Quat::IDENTITY;
        };
        let right = f
            .cross(up)
            .try_normalize()
            .unwrap_or_else(|| f.any_orthonormal_vector());
        let true_up = right.cross(f);
        Quat::from_mat3(&Mat3::from_cols(right, true_up, -f)).normalize()
    }
}
