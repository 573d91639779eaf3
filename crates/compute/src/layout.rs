use crate::kernels::{MipUniforms, NoiseUniforms};

pub const UNIFORM_PARAMS: u32 = 0;
pub const TEXTURE_OUT: u32 = 1; // storage texture written by every kernel
pub const TEXTURE_IN: u32 = 2; // previous mip level, downsample only

const _: () = assert!(TEXTURE_OUT == 1);
const _: () = assert!(std::mem::size_of::<NoiseUniforms>() % 16 == 0);
const _: () = assert!(std::mem::size_of::<MipUniforms>() % 16 == 0);

/// Return expected number of bindings for each kernel.
pub const fn binding_count(kernel: &crate::Kernel) -> u32 {
    match kernel {
        crate::Kernel::NoiseVolume => 2,
        crate::Kernel::DownsampleMip => 3,
    }
}

/// Size in bytes of the uniform block bound at [`UNIFORM_PARAMS`].
pub const fn uniform_size(kernel: &crate::Kernel) -> usize {
    match kernel {
        crate::Kernel::NoiseVolume => std::mem::size_of::<NoiseUniforms>(),
        crate::Kernel::DownsampleMip => std::mem::size_of::<MipUniforms>(),
    }
}
