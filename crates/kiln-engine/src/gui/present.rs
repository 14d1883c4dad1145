use super::pipeline::straight_alpha_blend;

/// Offscreen target the GUI is rendered into before presentation.
pub(super) struct FrameBuffer {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

impl FrameBuffer {
    pub(super) fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub(super) fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

/// Copies the frame buffer onto the surface with a fullscreen triangle.
pub(super) struct PresentPipeline {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl PresentPipeline {
    pub(super) fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("kiln present shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/present.wgsl").into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kiln present bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("kiln present pipeline layout"),
            bind_group_layouts: &[&layout],
            immediate_size: 0,
        });

        let fragment_entry = present_entry_point(surface_format);
        log::debug!("present pipeline: surface={surface_format:?} fragment={fragment_entry}");

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("kiln present pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(straight_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("kiln present sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            pipeline,
            layout,
            sampler,
        }
    }

    /// Creates a frame buffer of `size` texels, both dimensions at least 1.
    pub(super) fn create_frame_buffer(
        &self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: (u32, u32),
    ) -> FrameBuffer {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("kiln gui frame buffer"),
            size: wgpu::Extent3d {
                width: size.0.max(1),
                height: size.1.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("kiln present bind group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        FrameBuffer {
            texture,
            view,
            bind_group,
        }
    }

    /// Records the present pass. The surface is cleared first so pixels the
    /// GUI left transparent do not show stale content.
    pub(super) fn draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &wgpu::TextureView,
        frame: &FrameBuffer,
    ) {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("kiln present pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface_view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &frame.bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }
}

/// Fragment entry point for a surface format: sRGB surfaces encode on write,
/// others need the shader to encode.
pub(super) fn present_entry_point(surface_format: wgpu::TextureFormat) -> &'static str {
    if surface_format.is_srgb() {
        "fs_main"
    } else {
        "fs_encode_srgb"
    }
}

/// Supersample factor usable for a `size` surface on a device whose textures
/// are at most `max_dim` texels wide.
///
/// Non-finite or non-positive factors fall back to 1.
pub(super) fn effective_supersample(size: (u32, u32), supersample: f32, max_dim: u32) -> f32 {
    let ss = if supersample.is_finite() && supersample > 0.0 {
        supersample
    } else {
        1.0
    };

    let largest = size.0.max(size.1).max(1) as f32;
    ss.min(max_dim as f32 / largest)
}

/// Frame buffer size for a physical surface `size`; `None` when either
/// dimension is zero.
pub(super) fn frame_buffer_size(size: (u32, u32), supersample: f32) -> Option<(u32, u32)> {
    if size.0 == 0 || size.1 == 0 {
        return None;
    }
    let w = ((size.0 as f32 * supersample).round() as u32).max(1);
    let h = ((size.1 as f32 * supersample).round() as u32).max(1);
    Some((w, h))
}
