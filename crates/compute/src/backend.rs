use crate::{ComputeError, DeviceCapabilities, Kernel, VolumeDescriptor, VolumeHandle, VolumeTarget};

pub trait ComputeDevice: Send + Sync + 'static {
    /// Reports what the device can do. Callers check this before allocating.
    fn capabilities(&self) -> DeviceCapabilities;

    /// Allocates a 3D texture with every mip level zero-initialized.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::Capability`] if the device cannot hold a
    /// volume of the requested size.
    fn create_volume(&self, desc: &VolumeDescriptor) -> Result<VolumeHandle, ComputeError>;

    /// Dispatches a compute kernel writing into `target`.
    ///
    /// # Arguments
    /// * `kernel`: The kernel to dispatch.
    /// * `target`: Volume and mip level the kernel writes. Kernels that read
    ///             a source level (`DownsampleMip`) read `target.mip_level - 1`.
    /// * `uniforms`: Raw bytes of the kernel's uniform block.
    /// * `workgroups`: The number of workgroups to dispatch. Grids that
    ///                 overshoot the target extent are allowed; kernels skip
    ///                 out-of-range invocations.
    ///
    /// Submission is fire-and-forget from the caller's viewpoint. Later reads
    /// of the volume are ordered after the dispatch by the device.
    ///
    /// # Errors
    ///
    /// Returns `ComputeError::UnknownVolume` for a released or foreign handle
    /// and `ComputeError::ShapeMismatch` for malformed uniforms.
    fn dispatch(
        &self,
        kernel: &Kernel,
        target: VolumeTarget,
        uniforms: &[u8],
        workgroups: [u32; 3],
    ) -> Result<(), ComputeError>;

    /// Copies one mip level back to the host, x-fastest then y then z.
    ///
    /// # Errors
    ///
    /// Returns `ComputeError::UnknownVolume` for a released handle.
    fn read_back(&self, handle: VolumeHandle, mip_level: u32) -> Result<Vec<f32>, ComputeError>;

    /// Frees the texture behind `handle`. Releasing twice is an error.
    ///
    /// # Errors
    ///
    /// Returns `ComputeError::UnknownVolume` if the handle is not live.
    fn release_volume(&self, handle: VolumeHandle) -> Result<(), ComputeError>;

    /// Number of volumes currently allocated on the device.
    fn live_volumes(&self) -> usize;
}
