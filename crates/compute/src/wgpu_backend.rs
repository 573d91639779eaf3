//! GPU implementation of [`ComputeDevice`] built on [`wgpu`].
//!
//! Volumes live as 3D `R32Float` textures with storage and sampling usage.
//! Kernels are compiled once per device from the WGSL in `shaders/` and kept
//! in a pipeline cache. Initialization fails if no adapter is found.

use crate::{
    layout, ComputeDevice, ComputeError, DeviceCapabilities, Kernel, VolumeDescriptor,
    VolumeHandle, VolumeTarget,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use wgpu::util::DeviceExt;

struct GpuVolume {
    desc: VolumeDescriptor,
    texture: wgpu::Texture,
}

struct CachedPipeline {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
}

pub struct WgpuDevice {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    capabilities: DeviceCapabilities,
    pipelines: Mutex<HashMap<Kernel, Arc<CachedPipeline>>>,
    volumes: Mutex<HashMap<VolumeHandle, GpuVolume>>,
    next_id: AtomicU64,
}

impl WgpuDevice {
    /// Creates a device on the system's default high-performance adapter.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::BackendUnavailable`] when no adapter or device
    /// can be acquired.
    pub fn try_new() -> Result<Self, ComputeError> {
        let instance = wgpu::Instance::default();
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        }))
        .ok_or(ComputeError::BackendUnavailable)?;

        let filterable = adapter
            .features()
            .contains(wgpu::Features::FLOAT32_FILTERABLE);
        let required_features = if filterable {
            wgpu::Features::FLOAT32_FILTERABLE
        } else {
            wgpu::Features::empty()
        };

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("volume device"),
                required_features,
                required_limits: adapter.limits(),
            },
            None,
        ))
        .map_err(|err| {
            tracing::warn!("wgpu device request failed: {err:?}");
            ComputeError::BackendUnavailable
        })?;

        let limits = device.limits();
        let downlevel = adapter.get_downlevel_capabilities();
        let capabilities = DeviceCapabilities {
            compute_shaders: downlevel
                .flags
                .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS),
            storage_textures_3d: limits.max_storage_textures_per_shader_stage > 0,
            max_texture_dimension_3d: limits.max_texture_dimension_3d,
            // Read back stages a whole level through one buffer.
            max_volume_texels: limits.max_buffer_size / 4,
            filterable_r32float: filterable,
        };
        tracing::info!(adapter = ?adapter.get_info().name, ?capabilities, "wgpu device ready");

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            capabilities,
            pipelines: Mutex::new(HashMap::new()),
            volumes: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        })
    }

    /// The underlying `wgpu` device, for renderers sharing the volumes.
    #[must_use]
    pub fn device(&self) -> Arc<wgpu::Device> {
        Arc::clone(&self.device)
    }

    /// A full-chain 3D view of a live volume, for binding to a raymarcher.
    ///
    /// # Errors
    ///
    /// Returns `ComputeError::UnknownVolume` if the handle is not live.
    pub fn volume_view(&self, handle: VolumeHandle) -> Result<wgpu::TextureView, ComputeError> {
        let volumes = self.volumes.lock();
        let volume = volumes
            .get(&handle)
            .ok_or(ComputeError::UnknownVolume(handle))?;
        Ok(volume.texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(volume.desc.label),
            dimension: Some(wgpu::TextureViewDimension::D3),
            ..Default::default()
        }))
    }

    fn pipeline(&self, kernel: &Kernel) -> Arc<CachedPipeline> {
        let mut cache = self.pipelines.lock();
        if let Some(cached) = cache.get(kernel) {
            return Arc::clone(cached);
        }

        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(kernel.name()),
                source: wgpu::ShaderSource::Wgsl(kernel.shader_source().into()),
            });

        let mut entries = vec![
            wgpu::BindGroupLayoutEntry {
                binding: layout::UNIFORM_PARAMS,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: layout::TEXTURE_OUT,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::StorageTexture {
                    access: wgpu::StorageTextureAccess::WriteOnly,
                    format: wgpu::TextureFormat::R32Float,
                    view_dimension: wgpu::TextureViewDimension::D3,
                },
                count: None,
            },
        ];
        if layout::binding_count(kernel) > 2 {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: layout::TEXTURE_IN,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D3,
                    multisampled: false,
                },
                count: None,
            });
        }

        let bind_group_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(kernel.name()),
                    entries: &entries,
                });
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(kernel.name()),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });
        let pipeline = self
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(kernel.name()),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: "main",
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            });

        tracing::debug!(kernel = kernel.name(), "compiled compute pipeline");
        let cached = Arc::new(CachedPipeline {
            pipeline,
            layout: bind_group_layout,
        });
        cache.insert(*kernel, Arc::clone(&cached));
        cached
    }
}

fn mip_view(texture: &wgpu::Texture, level: u32) -> wgpu::TextureView {
    texture.create_view(&wgpu::TextureViewDescriptor {
        label: None,
        dimension: Some(wgpu::TextureViewDimension::D3),
        base_mip_level: level,
        mip_level_count: Some(1),
        ..Default::default()
    })
}

impl ComputeDevice for WgpuDevice {
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

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label),
            size: wgpu::Extent3d {
                width: desc.size[0],
                height: desc.size[1],
                depth_or_array_layers: desc.size[2],
            },
            mip_level_count: desc.mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D3,
            format: wgpu::TextureFormat::R32Float,
            usage: wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let handle = VolumeHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.volumes.lock().insert(
            handle,
            GpuVolume {
                desc: desc.clone(),
                texture,
            },
        );
        tracing::debug!(?handle, size = ?desc.size, mips = desc.mip_level_count, "gpu volume created");
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
        if *kernel == Kernel::DownsampleMip && target.mip_level == 0 {
            return Err(ComputeError::ShapeMismatch(
                "DownsampleMip cannot target the base level",
            ));
        }

        let cached = self.pipeline(kernel);
        let volumes = self.volumes.lock();
        let volume = volumes
            .get(&target.handle)
            .ok_or(ComputeError::UnknownVolume(target.handle))?;
        if target.mip_level >= volume.desc.mip_level_count {
            return Err(ComputeError::ShapeMismatch("mip level out of range"));
        }

        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("volume uniforms"),
                contents: uniforms,
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let out_view = mip_view(&volume.texture, target.mip_level);
        let in_view = match kernel {
            Kernel::DownsampleMip => Some(mip_view(&volume.texture, target.mip_level - 1)),
            Kernel::NoiseVolume => None,
        };

        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: layout::UNIFORM_PARAMS,
                resource: uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: layout::TEXTURE_OUT,
                resource: wgpu::BindingResource::TextureView(&out_view),
            },
        ];
        if let Some(view) = in_view.as_ref() {
            entries.push(wgpu::BindGroupEntry {
                binding: layout::TEXTURE_IN,
                resource: wgpu::BindingResource::TextureView(view),
            });
        }
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(kernel.name()),
            layout: &cached.layout,
            entries: &entries,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(kernel.name()),
            });
        {
            let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(kernel.name()),
                timestamp_writes: None,
            });
            cpass.set_pipeline(&cached.pipeline);
            cpass.set_bind_group(0, &bind_group, &[]);
            cpass.dispatch_workgroups(workgroups[0], workgroups[1], workgroups[2]);
        }
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    fn read_back(&self, handle: VolumeHandle, mip_level: u32) -> Result<Vec<f32>, ComputeError> {
        let volumes = self.volumes.lock();
        let volume = volumes
            .get(&handle)
            .ok_or(ComputeError::UnknownVolume(handle))?;
        if mip_level >= volume.desc.mip_level_count {
            return Err(ComputeError::ShapeMismatch("mip level out of range"));
        }

        let size = volume.desc.mip_size(mip_level);
        let texel = volume.desc.format.bytes_per_texel() as u32;
        let unpadded_row = size[0] * texel;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_row = unpadded_row.div_ceil(align) * align;
        let buffer_size = u64::from(padded_row) * u64::from(size[1]) * u64::from(size[2]);

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("volume readback"),
            size: buffer_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("volume readback"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &volume.texture,
                mip_level,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(size[1]),
                },
            },
            wgpu::Extent3d {
                width: size[0],
                height: size[1],
                depth_or_array_layers: size[2],
            },
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| ComputeError::Device(e.to_string()))?
            .map_err(|e| ComputeError::Device(e.to_string()))?;

        let mapped = slice.get_mapped_range();
        let mut texels = Vec::with_capacity(crate::kernels::texel_count(size));
        for row in mapped.chunks_exact(padded_row as usize) {
            texels.extend(bytemuck::pod_collect_to_vec::<u8, f32>(
                &row[..unpadded_row as usize],
            ));
        }
        drop(mapped);
        staging.unmap();
        Ok(texels)
    }

    fn release_volume(&self, handle: VolumeHandle) -> Result<(), ComputeError> {
        let volume = self
            .volumes
            .lock()
            .remove(&handle)
            .ok_or(ComputeError::UnknownVolume(handle))?;
        volume.texture.destroy();
        tracing::debug!(?handle, "gpu volume released");
        Ok(())
    }

    fn live_volumes(&self) -> usize {
        self.volumes.lock().len()
    }
}
