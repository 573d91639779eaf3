#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
//! # Compute devices for procedural volumes
//!
//! A thin abstraction over the devices that run the noise-volume kernels. The
//! [`ComputeDevice`] trait owns 3D textures on behalf of its callers and
//! dispatches [`Kernel`]s against them. Two implementations exist:
//!
//! -   [`CpuDevice`]: a reference device that runs the kernels on the CPU. It
//!     keeps resource counters so tests can check lifecycle invariants.
//! -   `WgpuDevice` (feature `gpu`): runs the WGSL kernels from `shaders/` on
//!     the system GPU.
//!
//! [`default_device`] picks the GPU when asked and available and falls back to
//! the CPU device otherwise.

use std::sync::Arc;
use thiserror::Error;

pub mod backend;
pub mod cpu_backend;
pub mod kernels;
pub mod layout;
#[cfg(feature = "gpu")]
pub mod wgpu_backend;

pub use backend::ComputeDevice;
pub use cpu_backend::{CpuDevice, DeviceStats};
pub use kernels::{MipUniforms, NoiseUniforms};
#[cfg(feature = "gpu")]
pub use wgpu_backend::WgpuDevice;

/// Threads per workgroup along each axis for every volume kernel.
pub const WORKGROUP_SIZE: u32 = 8;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputeError {
    #[error("device capability missing: {0}")]
    Capability(String),
    #[error("backend not available")]
    BackendUnavailable,
    #[error("unknown volume {0:?}")]
    UnknownVolume(VolumeHandle),
    #[error("buffer shape mismatch: {0}")]
    ShapeMismatch(&'static str),
    #[error("device error: {0}")]
    Device(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    /// Fills mip level 0 of a volume with fractal noise density.
    NoiseVolume,
    /// Box-filters mip level `n - 1` into mip level `n`.
    DownsampleMip,
}

impl Kernel {
    #[must_use]
    pub const fn binding_count(&self) -> u32 {
        layout::binding_count(self)
    }

    /// WGSL source of the kernel, compiled at runtime by GPU devices.
    #[must_use]
    pub const fn shader_source(&self) -> &'static str {
        match self {
            Kernel::NoiseVolume => include_str!("../../../shaders/noise_volume.wgsl"),
            Kernel::DownsampleMip => include_str!("../../../shaders/downsample_mip.wgsl"),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Kernel::NoiseVolume => "noise_volume",
            Kernel::DownsampleMip => "downsample_mip",
        }
    }
}

/// Opaque identity of a device-resident volume. Ids are never reused by a
/// device, so two handles compare equal only for the same allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VolumeHandle(pub u64);

/// Storage format of volume texels. Only single-channel float density is
/// produced today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VolumeFormat {
    #[default]
    R32Float,
}

impl VolumeFormat {
    #[must_use]
    pub const fn bytes_per_texel(self) -> usize {
        match self {
            VolumeFormat::R32Float => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeDescriptor {
    pub label: &'static str,
    pub size: [u32; 3],
    pub mip_level_count: u32,
    pub format: VolumeFormat,
}

impl VolumeDescriptor {
    /// Extent of `level`, halving each axis and clamping at one texel.
    #[must_use]
    pub fn mip_size(&self, level: u32) -> [u32; 3] {
        mip_size(self.size, level)
    }
}

/// Extent of mip `level` of a volume whose base level is `size`.
#[must_use]
pub fn mip_size(size: [u32; 3], level: u32) -> [u32; 3] {
    size.map(|axis| (axis >> level).max(1))
}

/// Number of levels in a full mip chain down to a single texel.
#[must_use]
pub fn full_mip_count(size: [u32; 3]) -> u32 {
    let largest = size.iter().copied().max().unwrap_or(1).max(1);
    32 - largest.leading_zeros()
}

/// Addresses one mip level of a volume as a kernel's write target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeTarget {
    pub handle: VolumeHandle,
    pub mip_level: u32,
}

/// Features of a device that matter for volume generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilities {
    pub compute_shaders: bool,
    pub storage_textures_3d: bool,
    pub max_texture_dimension_3d: u32,
    /// Largest base level, in texels, the device agrees to allocate.
    pub max_volume_texels: u64,
    /// Whether `R32Float` volumes can be sampled with linear filtering.
    pub filterable_r32float: bool,
}

impl DeviceCapabilities {
    /// Everything a volume build needs, with a generous dimension limit and
    /// a base level of at most 512^3 texels (512 MiB of `f32`).
    #[must_use]
    pub const fn full() -> Self {
        Self {
            compute_shaders: true,
            storage_textures_3d: true,
            max_texture_dimension_3d: 2048,
            max_volume_texels: 512 * 512 * 512,
            filterable_r32float: true,
        }
    }

    /// Checks that a volume of `size` can be generated on this device.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::Capability`] naming the first missing feature.
    pub fn check_volume(&self, size: [u32; 3]) -> Result<(), ComputeError> {
        if !self.compute_shaders {
            return Err(ComputeError::Capability(
                "compute dispatch is not supported".to_string(),
            ));
        }
        if !self.storage_textures_3d {
            return Err(ComputeError::Capability(
                "3D storage textures are not supported".to_string(),
            ));
        }
        if let Some(axis) = size.iter().find(|&&a| a > self.max_texture_dimension_3d) {
            return Err(ComputeError::Capability(format!(
                "volume axis {axis} exceeds the 3D texture limit of {}",
                self.max_texture_dimension_3d
            )));
        }
        let texels: u64 = size.iter().map(|&a| u64::from(a)).product();
        if texels > self.max_volume_texels {
            return Err(ComputeError::Capability(format!(
                "volume of {texels} texels exceeds the budget of {}",
                self.max_volume_texels
            )));
        }
        Ok(())
    }
}

/// Returns a compute device, preferring the GPU when `prefer_gpu` is set.
///
/// With the `gpu` feature enabled this attempts to create a [`WgpuDevice`].
/// If GPU initialization fails, or the feature is disabled, a [`CpuDevice`]
/// is returned.
#[must_use]
pub fn default_device(prefer_gpu: bool) -> Arc<dyn ComputeDevice> {
    #[cfg(feature = "gpu")]
    {
        if prefer_gpu {
            match WgpuDevice::try_new() {
                Ok(gpu) => {
                    tracing::info!("Using WgpuDevice for volume generation.");
                    return Arc::new(gpu);
                }
                Err(e) => {
                    tracing::warn!("WgpuDevice initialization failed ({e}), falling back...");
                }
            }
        }
    }

    #[cfg(not(feature = "gpu"))]
    {
        if prefer_gpu {
            tracing::warn!("Built without the `gpu` feature, falling back...");
        }
    }

    tracing::info!("Using CpuDevice for volume generation.");
    Arc::new(CpuDevice::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_chain_reaches_single_texel() {
        assert_eq!(full_mip_count([1, 1, 1]), 1);
        assert_eq!(full_mip_count([8, 8, 8]), 4);
        assert_eq!(full_mip_count([10, 4, 1]), 4);
        assert_eq!(full_mip_count([512, 512, 512]), 10);
        assert_eq!(mip_size([10, 4, 1], 3), [1, 1, 1]);
        assert_eq!(mip_size([10, 4, 1], 1), [5, 2, 1]);
    }

    #[test]
    fn capability_check_names_missing_feature() {
        let mut caps = DeviceCapabilities::full();
        assert!(caps.check_volume([64, 64, 64]).is_ok());

        caps.max_texture_dimension_3d = 32;
        let err = caps.check_volume([64, 16, 16]).unwrap_err();
        assert!(matches!(err, ComputeError::Capability(ref msg) if msg.contains("64")));

        caps.max_texture_dimension_3d = 2048;
        assert!(caps.check_volume([512, 512, 512]).is_ok());
        let err = caps.check_volume([2048, 2048, 2048]).unwrap_err();
        assert!(matches!(err, ComputeError::Capability(ref msg) if msg.contains("budget")));

        caps.storage_textures_3d = false;
        assert!(matches!(
            caps.check_volume([8, 8, 8]),
            Err(ComputeError::Capability(_))
        ));
    }

    #[test]
    fn kernel_binding_counts() {
        assert_eq!(Kernel::NoiseVolume.binding_count(), 2);
        assert_eq!(Kernel::DownsampleMip.binding_count(), 3);
    }

    #[test]
    fn default_device_falls_back_to_cpu() {
        let device = default_device(false);
        assert!(device.capabilities().compute_shaders);
    }
}
