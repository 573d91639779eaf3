use compute::VolumeHandle;
use glam::Vec4;
use std::collections::HashMap;
use tracing::{debug, info};
use volume::{ParameterBindingSink, VolumeBounds, VolumeTexture};

/// A volume as seen by the sink at bind time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundVolume {
    pub handle: VolumeHandle,
    pub resolution: [u32; 3],
    pub mip_level_count: u32,
    pub bounds: VolumeBounds,
}

/// Headless sink that logs every write and keeps the latest value per name.
#[derive(Debug, Default)]
pub struct LoggingSink {
    floats: HashMap<String, f32>,
    ints: HashMap<String, i32>,
    vectors: HashMap<String, Vec4>,
    volumes: HashMap<String, BoundVolume>,
    binds: u64,
    unbinds: u64,
}

impl LoggingSink {
    #[must_use]
    pub fn float(&self, name: &str) -> Option<f32> {
        self.floats.get(name).copied()
    }

    #[must_use]
    pub fn int(&self, name: &str) -> Option<i32> {
        self.ints.get(name).copied()
    }

    #[must_use]
    pub fn vector(&self, name: &str) -> Option<Vec4> {
        self.vectors.get(name).copied()
    }

    #[must_use]
    pub fn volume(&self, slot: &str) -> Option<&BoundVolume> {
        self.volumes.get(slot)
    }

    /// Number of `bind_volume` calls so far.
    #[must_use]
    pub fn binds(&self) -> u64 {
        self.binds
    }

    #[must_use]
    pub fn unbinds(&self) -> u64 {
        self.unbinds
    }
}

impl ParameterBindingSink for LoggingSink {
    fn set_float(&mut self, name: &str, value: f32) {
        debug!(name, value, "set float");
        self.floats.insert(name.to_string(), value);
    }

    fn set_int(&mut self, name: &str, value: i32) {
        debug!(name, value, "set int");
        self.ints.insert(name.to_string(), value);
    }

    fn set_vector(&mut self, name: &str, value: Vec4) {
        debug!(name, ?value, "set vector");
        self.vectors.insert(name.to_string(), value);
    }

    fn bind_volume(&mut self, slot: &str, volume: &VolumeTexture, bounds: VolumeBounds) {
        info!(slot, handle = ?volume.handle(), resolution = ?volume.resolution(), "volume bound");
        self.binds += 1;
        self.volumes.insert(
            slot.to_string(),
            BoundVolume {
                handle: volume.handle(),
                resolution: volume.resolution(),
                mip_level_count: volume.mip_level_count(),
                bounds,
            },
        );
    }

    fn unbind_volume(&mut self, slot: &str) {
        info!(slot, "volume unbound");
        self.unbinds += 1;
        self.volumes.remove(slot);
    }
}
