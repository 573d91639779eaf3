// CPU reference implementations of the WGSL kernels in `shaders/`.

pub mod noise_volume_op;
pub use noise_volume_op::{handle_noise_volume, NoiseUniforms, MAX_OCTAVES, MAX_TILE_SIZE};
pub mod downsample_mip_op;
pub use downsample_mip_op::{handle_downsample_mip, MipUniforms};

/// Linear index of texel `id` in a volume of `size`, x fastest.
#[must_use]
pub fn texel_index(size: [u32; 3], id: [u32; 3]) -> usize {
    let [w, h, _] = size.map(|a| a as usize);
    id[0] as usize + id[1] as usize * w + id[2] as usize * w * h
}

/// Number of texels in a volume of `size`.
#[must_use]
pub fn texel_count(size: [u32; 3]) -> usize {
    size.iter().map(|&a| a as usize).product()
}
