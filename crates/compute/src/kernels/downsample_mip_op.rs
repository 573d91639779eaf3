use crate::{ComputeError, WORKGROUP_SIZE};

use super::{texel_count, texel_index};

/// Uniform block of `shaders/downsample_mip.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MipUniforms {
    pub src_size: [u32; 3],
    pub _pad0: u32,
    pub dst_size: [u32; 3],
    pub _pad1: u32,
}

impl MipUniforms {
    #[must_use]
    pub const fn new(src_size: [u32; 3], dst_size: [u32; 3]) -> Self {
        Self {
            src_size,
            _pad0: 0,
            dst_size,
            _pad1: 0,
        }
    }
}

/// Averages each 2x2x2 block of `src` into one texel of `dst`. Blocks that
/// hang over an odd edge reuse the last source texel.
///
/// # Errors
///
/// Returns `ComputeError::ShapeMismatch` if the slices do not match the sizes
/// in the uniform block.
pub fn handle_downsample_mip(
    uniforms: &[u8],
    src: &[f32],
    dst: &mut [f32],
    workgroups: [u32; 3],
) -> Result<(), ComputeError> {
    if uniforms.len() != std::mem::size_of::<MipUniforms>() {
        return Err(ComputeError::ShapeMismatch(
            "DownsampleMip expects a 32-byte uniform block",
        ));
    }
    let params: MipUniforms = bytemuck::pod_read_unaligned(uniforms);
    if src.len() != texel_count(params.src_size) || dst.len() != texel_count(params.dst_size) {
        return Err(ComputeError::ShapeMismatch(
            "DownsampleMip level sizes do not match the uniform block",
        ));
    }

    let src_max = params.src_size.map(|a| a.saturating_sub(1));
    let threads = workgroups.map(|g| g.saturating_mul(WORKGROUP_SIZE));
    for z in 0..threads[2].min(params.dst_size[2]) {
        for y in 0..threads[1].min(params.dst_size[1]) {
            for x in 0..threads[0].min(params.dst_size[0]) {
                let mut sum = 0.0;
                for corner in 0..8u32 {
                    let sx = (2 * x + (corner & 1)).min(src_max[0]);
                    let sy = (2 * y + ((corner >> 1) & 1)).min(src_max[1]);
                    let sz = (2 * z + ((corner >> 2) & 1)).min(src_max[2]);
                    sum += src[texel_index(params.src_size, [sx, sy, sz])];
                }
                dst[texel_index(params.dst_size, [x, y, z])] = sum / 8.0;
            }
        }
    }
    Ok(())
}
