use crate::dispatch::dispatch_grid;
use crate::{NoiseParams, SamplerSettings, VolumeError, VolumeTexture};
use compute::{
    full_mip_count, mip_size, ComputeDevice, Kernel, MipUniforms, VolumeDescriptor, VolumeFormat,
    VolumeTarget,
};
use std::sync::Arc;

/// Builds noise volumes on a compute device.
///
/// A build validates the parameters and the device, allocates the texture,
/// fills mip 0 with the `NoiseVolume` kernel and, when mips are enabled,
/// box-filters the rest of the chain. A failed build frees whatever it
/// allocated before returning.
pub struct NoiseFieldBuilder {
    device: Arc<dyn ComputeDevice>,
    generate_mips: bool,
    label: &'static str,
}

impl NoiseFieldBuilder {
    #[must_use]
    pub fn new(device: Arc<dyn ComputeDevice>) -> Self {
        Self {
            device,
            generate_mips: false,
            label: "noise volume",
        }
    }

    /// Generate a full mip chain for trilinear sampling.
    #[must_use]
    pub fn with_mips(mut self, generate_mips: bool) -> Self {
        self.generate_mips = generate_mips;
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    #[must_use]
    pub fn device(&self) -> &Arc<dyn ComputeDevice> {
        &self.device
    }

    #[must_use]
    pub fn generates_mips(&self) -> bool {
        self.generate_mips
    }

    /// # Errors
    ///
    /// Returns [`VolumeError::InvalidParams`] for unusable parameters and
    /// [`VolumeError::Compute`] when the device cannot hold or fill the
    /// volume. Capability errors are not retried.
    pub fn build(&self, params: &NoiseParams) -> Result<VolumeTexture, VolumeError> {
        params.validate()?;
        let capabilities = self.device.capabilities();
        capabilities.check_volume(params.resolution)?;

        let mip_level_count = if self.generate_mips {
            full_mip_count(params.resolution)
        } else {
            1
        };
        let sampler = if !capabilities.filterable_r32float {
            tracing::warn!("device cannot filter R32Float volumes, sampling nearest");
            SamplerSettings::nearest_repeat()
        } else if self.generate_mips {
            SamplerSettings::trilinear_repeat()
        } else {
            SamplerSettings::bilinear_repeat()
        };

        let desc = VolumeDescriptor {
            label: self.label,
            size: params.resolution,
            mip_level_count,
            format: VolumeFormat::R32Float,
        };
        let handle = self.device.create_volume(&desc)?;
        let texture = VolumeTexture::new(Arc::clone(&self.device), handle, desc, sampler);

        if let Err(err) = self.fill(&texture, params) {
            tracing::error!(?handle, "noise volume build failed: {err}");
            if let Err(release_err) = texture.release() {
                tracing::error!(?handle, "could not free failed noise volume: {release_err}");
            }
            return Err(err);
        }

        tracing::info!(
            ?handle,
            resolution = ?params.resolution,
            mips = mip_level_count,
            "noise volume built"
        );
        Ok(texture)
    }

    fn fill(&self, texture: &VolumeTexture, params: &NoiseParams) -> Result<(), VolumeError> {
        let handle = texture.handle();
        let uniforms = params.to_uniforms();
        self.device.dispatch(
            &Kernel::NoiseVolume,
            VolumeTarget {
                handle,
                mip_level: 0,
            },
            bytemuck::bytes_of(&uniforms),
            dispatch_grid(params.resolution),
        )?;

        for level in 1..texture.mip_level_count() {
            let src = mip_size(params.resolution, level - 1);
            let dst = mip_size(params.resolution, level);
            let uniforms = MipUniforms::new(src, dst);
            self.device.dispatch(
                &Kernel::DownsampleMip,
                VolumeTarget {
                    handle,
                    mip_level: level,
                },
                bytemuck::bytes_of(&uniforms),
                dispatch_grid(dst),
            )?;
        }
        Ok(())
    }
}
