//! Hand-off of built volumes to the renderer.

use crate::{VolumeError, VolumeTexture};
use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Slot sampled by the black-hole accretion disk shader.
pub const DISK_NOISE_SLOT: &str = "_DiskNoise";
/// Slot sampled by the cloud shader.
pub const CLOUD_NOISE_SLOT: &str = "_CloudNoise";
pub const BOUNDS_MIN: &str = "_BoundsMin";
pub const BOUNDS_MAX: &str = "_BoundsMax";

/// World-space box the volume is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl VolumeBounds {
    /// Box centred on `position` with edge lengths `scale`.
    #[must_use]
    pub fn from_container(position: Vec3, scale: Vec3) -> Self {
        let half = scale.abs() * 0.5;
        Self {
            min: position - half,
            max: position + half,
        }
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// The shader/material boundary. Implemented by the rendering collaborator.
pub trait ParameterBindingSink {
    fn set_float(&mut self, name: &str, value: f32);
    fn set_int(&mut self, name: &str, value: i32);
    fn set_vector(&mut self, name: &str, value: Vec4);
    /// Binds a finished volume. Only called after its build returned.
    fn bind_volume(&mut self, slot: &str, volume: &VolumeTexture, bounds: VolumeBounds);
    fn unbind_volume(&mut self, slot: &str);
}

/// Writes the bounds as the `_BoundsMin` and `_BoundsMax` vectors.
pub fn publish_bounds<S: ParameterBindingSink + ?Sized>(sink: &mut S, bounds: VolumeBounds) {
    sink.set_vector(BOUNDS_MIN, bounds.min.extend(1.0));
    sink.set_vector(BOUNDS_MAX, bounds.max.extend(1.0));
}

/// Binds the outcome of a volume build to `slot`.
///
/// A failed build unbinds the slot so the renderer draws without a volume.
/// Returns whether a volume was bound.
pub fn publish_volume<S: ParameterBindingSink + ?Sized>(
    sink: &mut S,
    slot: &str,
    volume: Result<&VolumeTexture, VolumeError>,
    bounds: VolumeBounds,
) -> bool {
    match volume {
        Ok(texture) => {
            sink.bind_volume(slot, texture, bounds);
            publish_bounds(sink, bounds);
            true
        }
        Err(err) => {
            tracing::warn!(slot, "no volume bound: {err}");
            sink.unbind_volume(slot);
            false
        }
    }
}
