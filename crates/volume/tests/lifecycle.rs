use compute::{
    ComputeDevice, ComputeError, CpuDevice, DeviceCapabilities, Kernel, VolumeDescriptor,
    VolumeHandle, VolumeTarget,
};
use glam::{Vec3, Vec4};
use std::sync::Arc;
use volume::{
    publish_volume, NoiseFieldBuilder, NoiseFieldCache, NoiseParams, ParameterBindingSink,
    VolumeBounds, VolumeTexture, DISK_NOISE_SLOT,
};

fn params(resolution: [u32; 3]) -> NoiseParams {
    NoiseParams {
        resolution,
        ..NoiseParams::default()
    }
}

/// Passes everything through to a CPU device but fails mip generation.
struct FailingMips {
    inner: CpuDevice,
}

impl ComputeDevice for FailingMips {
    fn capabilities(&self) -> DeviceCapabilities {
        self.inner.capabilities()
    }

    fn create_volume(&self, desc: &VolumeDescriptor) -> Result<VolumeHandle, ComputeError> {
        self.inner.create_volume(desc)
    }

    fn dispatch(
        &self,
        kernel: &Kernel,
        target: VolumeTarget,
        uniforms: &[u8],
        workgroups: [u32; 3],
    ) -> Result<(), ComputeError> {
        if *kernel == Kernel::DownsampleMip {
            return Err(ComputeError::Device("device lost".to_string()));
        }
        self.inner.dispatch(kernel, target, uniforms, workgroups)
    }

    fn read_back(&self, handle: VolumeHandle, mip_level: u32) -> Result<Vec<f32>, ComputeError> {
        self.inner.read_back(handle, mip_level)
    }

    fn release_volume(&self, handle: VolumeHandle) -> Result<(), ComputeError> {
        self.inner.release_volume(handle)
    }

    fn live_volumes(&self) -> usize {
        self.inner.live_volumes()
    }
}

#[derive(Default)]
struct RecordingSink {
    bound: Option<(String, VolumeHandle, VolumeBounds)>,
    vectors: Vec<(String, Vec4)>,
    unbinds: usize,
}

impl ParameterBindingSink for RecordingSink {
    fn set_float(&mut self, _name: &str, _value: f32) {}

    fn set_int(&mut self, _name: &str, _value: i32) {}

    fn set_vector(&mut self, name: &str, value: Vec4) {
        self.vectors.push((name.to_string(), value));
    }

    fn bind_volume(&mut self, slot: &str, volume: &VolumeTexture, bounds: VolumeBounds) {
        self.bound = Some((slot.to_string(), volume.handle(), bounds));
    }

    fn unbind_volume(&mut self, _slot: &str) {
        self.bound = None;
        self.unbinds += 1;
    }
}

#[test]
fn resolution_change_releases_old_volume_exactly_once() {
    let cpu = Arc::new(CpuDevice::new());
    let mut cache = NoiseFieldCache::new(NoiseFieldBuilder::new(cpu.clone()).with_mips(true));

    let a = cache.ensure_current(&params([16, 16, 16])).unwrap().handle();
    let a_again = cache.ensure_current(&params([16, 16, 16])).unwrap().handle();
    assert_eq!(a, a_again);
    assert_eq!(cpu.stats().volumes_created, 1);

    let b = cache.ensure_current(&params([24, 16, 16])).unwrap().handle();
    assert_ne!(a, b);
    assert_eq!(cpu.stats().volumes_created, 2);
    assert_eq!(cpu.stats().volumes_released, 1);
    assert_eq!(cpu.live_volumes(), 1);
    assert_eq!(
        cpu.release_volume(a),
        Err(ComputeError::UnknownVolume(a)),
        "old volume should already be gone"
    );

    cache.release().unwrap();
    assert_eq!(cpu.live_volumes(), 0);
    assert_eq!(cpu.stats().volumes_released, 2);
}

#[test]
fn parameter_change_rebuilds() {
    let cpu = Arc::new(CpuDevice::new());
    let mut cache = NoiseFieldCache::new(NoiseFieldBuilder::new(cpu.clone()));
    let base = params([8, 8, 8]);
    let a = cache.ensure_current(&base).unwrap().handle();
    let swirled = NoiseParams {
        swirl_strength: base.swirl_strength + 1.0,
        ..base
    };
    let b = cache.ensure_current(&swirled).unwrap().handle();
    assert_ne!(a, b);
    assert_eq!(cache.params(), Some(&swirled));
    assert_eq!(cpu.live_volumes(), 1);
}

#[test]
fn failed_mip_generation_frees_the_volume() {
    let device = Arc::new(FailingMips {
        inner: CpuDevice::new(),
    });
    let builder = NoiseFieldBuilder::new(device.clone()).with_mips(true);
    let err = builder.build(&params([8, 8, 8])).unwrap_err();
    assert!(!err.is_capability());
    assert_eq!(device.live_volumes(), 0);
    assert_eq!(device.inner.stats().volumes_created, 1);
    assert_eq!(device.inner.stats().volumes_released, 1);
}

#[test]
fn failed_rebuild_leaves_cache_empty() {
    let cpu = Arc::new(CpuDevice::new());
    let mut cache = NoiseFieldCache::new(NoiseFieldBuilder::new(cpu.clone()));
    cache.ensure_current(&params([8, 8, 8])).unwrap();

    let bad = NoiseParams {
        octaves: 42,
        ..params([8, 8, 8])
    };
    assert!(cache.ensure_current(&bad).is_err());
    assert!(cache.current().is_none());
    assert_eq!(cpu.live_volumes(), 0);

    cache.ensure_current(&params([8, 8, 8])).unwrap();
    assert_eq!(cpu.live_volumes(), 1);
}

#[test]
fn built_volume_is_published_with_bounds() {
    let cpu = Arc::new(CpuDevice::new());
    let mut cache = NoiseFieldCache::new(NoiseFieldBuilder::new(cpu));
    let mut sink = RecordingSink::default();
    let bounds = VolumeBounds::from_container(Vec3::new(0.0, 1.0, 0.0), Vec3::new(10.0, 2.0, 10.0));

    let result = cache.ensure_current(&params([8, 8, 8]));
    let handle = result.as_ref().map(|t| t.handle()).ok();
    assert!(publish_volume(&mut sink, DISK_NOISE_SLOT, result, bounds));

    let (slot, bound, got) = sink.bound.clone().unwrap();
    assert_eq!(slot, DISK_NOISE_SLOT);
    assert_eq!(Some(bound), handle);
    assert_eq!(got, bounds);
    assert!(sink
        .vectors
        .iter()
        .any(|(name, v)| name == "_BoundsMin" && *v == Vec4::new(-5.0, 0.0, -5.0, 1.0)));
}

#[test]
fn missing_capability_degrades_to_no_volume() {
    let caps = DeviceCapabilities {
        storage_textures_3d: false,
        ..DeviceCapabilities::full()
    };
    let cpu = Arc::new(CpuDevice::with_capabilities(caps));
    let mut cache = NoiseFieldCache::new(NoiseFieldBuilder::new(cpu.clone()));
    let mut sink = RecordingSink::default();

    let result = cache.ensure_current(&params([8, 8, 8]));
    assert!(result.as_ref().is_err_and(|e| e.is_capability()));
    let bounds = VolumeBounds::from_container(Vec3::ZERO, Vec3::ONE);
    assert!(!publish_volume(&mut sink, DISK_NOISE_SLOT, result, bounds));
    assert_eq!(sink.unbinds, 1);
    assert!(sink.bound.is_none());
    assert_eq!(cpu.stats().volumes_created, 0);
}
