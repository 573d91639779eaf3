use crate::{
    kernels, layout, ComputeDevice, ComputeError, DeviceCapabilities, Kernel, VolumeDescriptor,
    VolumeHandle, VolumeTarget,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Resource and work counters kept by [`CpuDevice`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStats {
    pub volumes_created: u64,
    pub volumes_released: u64,
    pub dispatches: u64,
}

struct CpuVolume {
    desc: VolumeDescriptor,
    levels: Vec<Vec<f32>>,
}

/// Runs the volume kernels on the host. Used as the fallback device and as the
/// reference the GPU device is tested against.
pub struct CpuDevice {
    capabilities: DeviceCapabilities,
    volumes: Mutex<HashMap<VolumeHandle, CpuVolume>>,
    stats: Mutex<DeviceStats>,
    next_id: AtomicU64,
}

impl Default for CpuDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuDevice {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capabilities(DeviceCapabilities::full())
    }

    /// A device reporting `capabilities`, for exercising degraded hardware.
    #[must_use]
    pub fn with_capabilities(capabilities: DeviceCapabilities) -> Self {
        Self {
            capabilities,
            volumes: Mutex::new(HashMap::new()),
            stats: Mutex::new(DeviceStats::default()),
            next_id: AtomicU64::new(1),
        }
    }

    #[must_use]
    pub fn stats(&self) -> DeviceStats {
        *self.stats.lock()
    }
}

impl ComputeDevice for CpuDevice {
    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn create_volume(&self, desc: &VolumeDescriptor) -> Result<VolumeHandle, ComputeError> {
        self.capabilities.check_volume(desc.size)?;
        if desc.mip_level_count == 0 || desc.mip_level_count > crate::full_mip_count(desc.size) {
            return Err(ComputeError::ShapeMismatch(
                "mip level count outside the chain of the volume",
            ));
        }

        let levels = (0..desc.mip_level_count)
            .map(|level| vec![0.0; kernels::texel_count(desc.mip_size(level))])
            .collect();
        let handle = VolumeHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.volumes.lock().insert(
            handle,
            CpuVolume {
                desc: desc.clone(),
                levels,
            },
        );
        self.stats.lock().volumes_created += 1;
        tracing::debug!(?handle, size = ?desc.size, mips = desc.mip_level_count, "cpu volume created");
        Ok(handle)
    }

    fn dispatch(
        &self,
        kernel: &Kernel,
        target: VolumeTarget,
        uniforms: &[u8],
        workgroups: [u32; 3],
    ) -> Result<(), ComputeError> {
        if uniforms.len() != layout::uniform_size(kernel) {
            return Err(ComputeError::ShapeMismatch(
                "uniform block size does not match the kernel",
            ));
        }

        let mut volumes = self.volumes.lock();
        let volume = volumes
            .get_mut(&target.handle)
            .ok_or(ComputeError::UnknownVolume(target.handle))?;
        let level = target.mip_level as usize;
        if level >= volume.levels.len() {
            return Err(ComputeError::ShapeMismatch("mip level out of range"));
        }

        match kernel {
            Kernel::NoiseVolume => {
                let size = volume.desc.mip_size(target.mip_level);
                kernels::handle_noise_volume(uniforms, size, &mut volume.levels[level], workgroups)?;
            }
            Kernel::DownsampleMip => {
                if level == 0 {
                    return Err(ComputeError::ShapeMismatch(
                        "DownsampleMip cannot target the base level",
                    ));
                }
                let params: kernels::MipUniforms = bytemuck::pod_read_unaligned(uniforms);
                if params.src_size != volume.desc.mip_size(target.mip_level - 1)
                    || params.dst_size != volume.desc.mip_size(target.mip_level)
                {
                    return Err(ComputeError::ShapeMismatch(
                        "DownsampleMip sizes do not match the target levels",
                    ));
                }
                let (lower, upper) = volume.levels.split_at_mut(level);
                kernels::handle_downsample_mip(uniforms, &lower[level - 1], &mut upper[0], workgroups)?;
            }
        }

        self.stats.lock().dispatches += 1;
        Ok(())
    }

    fn read_back(&self, handle: VolumeHandle, mip_level: u32) -> Result<Vec<f32>, ComputeError> {
        let volumes = self.volumes.lock();
        let volume = volumes
            .get(&handle)
            .ok_or(ComputeError::UnknownVolume(handle))?;
        volume
            .levels
            .get(mip_level as usize)
            .cloned()
            .ok_or(ComputeError::ShapeMismatch("mip level out of range"))
    }

    fn release_volume(&self, handle: VolumeHandle) -> Result<(), ComputeError> {
        self.volumes
            .lock()
            .remove(&handle)
            .ok_or(ComputeError::UnknownVolume(handle))?;
        self.stats.lock().volumes_released += 1;
        tracing::debug!(?handle, "cpu volume released");
        Ok(())
    }

    fn live_volumes(&self) -> usize {
        self.volumes.lock().len()
    }
}
