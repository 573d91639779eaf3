// Golden-master tests: the WGSL kernels must reproduce the CPU reference.

#[cfg(feature = "gpu")]
mod wgpu_tests {
    use compute::{
        ComputeDevice, CpuDevice, Kernel, MipUniforms, NoiseUniforms, VolumeDescriptor,
        VolumeFormat, VolumeTarget, WgpuDevice,
    };

    const TOLERANCE: f32 = 1e-4;

    fn build_on(device: &dyn ComputeDevice, size: [u32; 3]) -> Vec<Vec<f32>> {
        let mips = compute::full_mip_count(size);
        let handle = device
            .create_volume(&VolumeDescriptor {
                label: "golden",
                size,
                mip_level_count: mips,
                format: VolumeFormat::R32Float,
            })
            .unwrap();
        let uniforms = NoiseUniforms {
            resolution: size,
            octaves: 5,
            scale: 0.55,
            boost: 1.4,
            tile_size: 3.0,
            swirl_strength: 2.0,
            vertical_scale: 0.8,
            max_radius: 0.9,
            _pad: [0.0; 2],
        };
        let groups = size.map(|a| a.div_ceil(compute::WORKGROUP_SIZE));
        device
            .dispatch(
                &Kernel::NoiseVolume,
                VolumeTarget { handle, mip_level: 0 },
                bytemuck::bytes_of(&uniforms),
                groups,
            )
            .unwrap();
        for level in 1..mips {
            let src = compute::mip_size(size, level - 1);
            let dst = compute::mip_size(size, level);
            let u = MipUniforms::new(src, dst);
            device
                .dispatch(
                    &Kernel::DownsampleMip,
                    VolumeTarget { handle, mip_level: level },
                    bytemuck::bytes_of(&u),
                    dst.map(|a| a.div_ceil(compute::WORKGROUP_SIZE)),
                )
                .unwrap();
        }
        let levels = (0..mips)
            .map(|level| device.read_back(handle, level).unwrap())
            .collect();
        device.release_volume(handle).unwrap();
        levels
    }

    fn compare(size: [u32; 3]) {
        let Ok(gpu) = WgpuDevice::try_new() else {
            eprintln!("no GPU adapter, skipping");
            return;
        };
        let cpu = CpuDevice::new();
        let expected = build_on(&cpu, size);
        let actual = build_on(&gpu, size);
        assert_eq!(expected.len(), actual.len(), "Mismatched mip count");
        for (level, (e, a)) in expected.iter().zip(&actual).enumerate() {
            assert_eq!(e.len(), a.len(), "Mismatched texel count at mip {level}");
            for (i, (x, y)) in e.iter().zip(a).enumerate() {
                assert!(
                    (x - y).abs() < TOLERANCE,
                    "mip {level} texel {i}: cpu {x} gpu {y}"
                );
            }
        }
        assert_eq!(gpu.live_volumes(), 0);
    }

    #[test]
    fn test_noise_volume_matches_cpu() {
        compare([16, 16, 16]);
    }

    #[test]
    fn test_non_multiple_of_workgroup_matches_cpu() {
        compare([10, 6, 12]);
    }
}
