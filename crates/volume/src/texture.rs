use compute::{ComputeDevice, ComputeError, VolumeDescriptor, VolumeFormat, VolumeHandle};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressMode {
    Repeat,
    ClampToEdge,
}

/// How the renderer should sample a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SamplerSettings {
    pub filter: FilterMode,
    pub mip_filter: FilterMode,
    pub address: AddressMode,
}

impl SamplerSettings {
    /// Linear within and between mip levels, wrapping at the edges.
    #[must_use]
    pub const fn trilinear_repeat() -> Self {
        Self {
            filter: FilterMode::Linear,
            mip_filter: FilterMode::Linear,
            address: AddressMode::Repeat,
        }
    }

    #[must_use]
    pub const fn bilinear_repeat() -> Self {
        Self {
            filter: FilterMode::Linear,
            mip_filter: FilterMode::Nearest,
            address: AddressMode::Repeat,
        }
    }

    #[must_use]
    pub const fn nearest_repeat() -> Self {
        Self {
            filter: FilterMode::Nearest,
            mip_filter: FilterMode::Nearest,
            address: AddressMode::Repeat,
        }
    }
}

/// A noise volume resident on a compute device.
///
/// The texture is owned exclusively and freed by [`VolumeTexture::release`].
/// Dropping a live texture frees it as well but logs a warning, since every
/// texture is expected to be released explicitly.
pub struct VolumeTexture {
    device: Arc<dyn ComputeDevice>,
    handle: VolumeHandle,
    desc: VolumeDescriptor,
    sampler: SamplerSettings,
    live: bool,
}

impl std::fmt::Debug for VolumeTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolumeTexture")
            .field("handle", &self.handle)
            .field("size", &self.desc.size)
            .field("mip_level_count", &self.desc.mip_level_count)
            .field("sampler", &self.sampler)
            .finish_non_exhaustive()
    }
}

impl VolumeTexture {
    pub(crate) fn new(
        device: Arc<dyn ComputeDevice>,
        handle: VolumeHandle,
        desc: VolumeDescriptor,
        sampler: SamplerSettings,
    ) -> Self {
        Self {
            device,
            handle,
            desc,
            sampler,
            live: true,
        }
    }

    /// Device identity of the texture. Distinct builds never share a handle.
    #[must_use]
    pub fn handle(&self) -> VolumeHandle {
        self.handle
    }

    #[must_use]
    pub fn resolution(&self) -> [u32; 3] {
        self.desc.size
    }

    #[must_use]
    pub fn mip_level_count(&self) -> u32 {
        self.desc.mip_level_count
    }

    #[must_use]
    pub fn format(&self) -> VolumeFormat {
        self.desc.format
    }

    #[must_use]
    pub fn sampler(&self) -> SamplerSettings {
        self.sampler
    }

    #[must_use]
    pub fn device(&self) -> &Arc<dyn ComputeDevice> {
        &self.device
    }

    /// Copies mip `level` back to the host, x fastest.
    ///
    /// # Errors
    ///
    /// Propagates device errors, including an out-of-range level.
    pub fn read_back(&self, level: u32) -> Result<Vec<f32>, ComputeError> {
        self.device.read_back(self.handle, level)
    }

    /// Frees the device texture.
    ///
    /// # Errors
    ///
    /// Returns the device's error if it no longer knows the texture. The
    /// texture counts as released either way.
    pub fn release(mut self) -> Result<(), ComputeError> {
        self.live = false;
        tracing::debug!(handle = ?self.handle, "releasing noise volume");
        self.device.release_volume(self.handle)
    }
}

impl Drop for VolumeTexture {
    fn drop(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;
        tracing::warn!(handle = ?self.handle, "noise volume dropped without release");
        if let Err(e) = self.device.release_volume(self.handle) {
            tracing::error!(handle = ?self.handle, "failed to free dropped noise volume: {e}");
        }
    }
}
