use anyhow::{bail, Result};
use imgui::{BackendFlags, DrawData, TextureId};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::device::Gpu;
use crate::input::InputEvent;

use super::pipeline::GuiPipeline;
use super::present::{self, FrameBuffer, PresentPipeline};
use super::texture::create_rgba8;
use super::{
    feed_event, plan_commands, FrameGeometry, GuiTexture, GuiTextureConfig, GuiVertex,
    ImguiAdapterConfig, ListPlan, PlannedCmd, RenderError, TextureRegistry,
};

/// Counters for the last rendered frame.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    pub draw_lists: usize,
    pub draw_calls: usize,
    pub vertices: usize,
    pub indices: usize,
}

/// Renders ImGui draw data through wgpu.
///
/// One adapter serves one `imgui::Context` and one window surface. The
/// application owns both; the adapter owns the pipelines, the offscreen frame
/// buffer and every registered texture (including the font atlas).
pub struct ImguiAdapter {
    config: ImguiAdapterConfig,
    gui: GuiPipeline,
    present: PresentPipeline,

    /// `None` while the window has a zero-area client size.
    frame: Option<FrameBuffer>,
    /// Supersample factor after clamping to device limits.
    supersample: f32,

    textures: TextureRegistry<GuiTexture>,
    font_texture: Option<TextureId>,

    warned_callbacks: bool,
    last_frame: FrameStats,
}

impl ImguiAdapter {
    /// Creates the adapter and claims `imgui` as its renderer.
    ///
    /// Fails when another renderer already set up the context.
    pub fn new(
        gpu: &Gpu<'_>,
        imgui: &mut imgui::Context,
        scale_factor: f32,
        config: ImguiAdapterConfig,
    ) -> Result<Self> {
        claim_renderer(imgui)?;

        let device = gpu.device();
        let gui = GuiPipeline::new(device, config.frame_format);
        let present = PresentPipeline::new(device, gpu.surface_format());

        let mut adapter = Self {
            config,
            gui,
            present,
            frame: None,
            supersample: 1.0,
            textures: TextureRegistry::new(),
            font_texture: None,
            warned_callbacks: false,
            last_frame: FrameStats::default(),
        };

        adapter.refresh_font_texture(gpu, imgui);
        adapter.sync_frame_buffer(gpu, imgui.io_mut(), gpu.size(), scale_factor);

        log::info!(
            "imgui adapter ready: frame={:?} supersample={}",
            adapter.config.frame_format,
            adapter.supersample
        );

        Ok(adapter)
    }

    /// Releases the context claimed by [`new`](Self::new) and drops every
    /// registered texture, including the font atlas.
    ///
    /// Afterwards a new adapter can be created on the same context, e.g. after
    /// the window or device was recreated.
    pub fn shutdown(self, imgui: &mut imgui::Context) {
        release_renderer(imgui);
        log::info!("imgui adapter shut down ({} textures released)", self.textures.len());
    }

    pub fn config(&self) -> &ImguiAdapterConfig {
        &self.config
    }

    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.config.clear_color = color;
    }

    /// Counters of the most recent `render` call.
    pub fn stats(&self) -> FrameStats {
        self.last_frame
    }

    pub fn textures(&self) -> &TextureRegistry<GuiTexture> {
        &self.textures
    }

    pub fn font_texture(&self) -> Option<TextureId> {
        self.font_texture
    }

    // ── textures ──────────────────────────────────────────────────────────

    /// Registers an application texture. The texture must have
    /// `TEXTURE_BINDING` usage and a filterable float format.
    pub fn register_texture(
        &mut self,
        gpu: &Gpu<'_>,
        texture: wgpu::Texture,
        config: &GuiTextureConfig,
    ) -> TextureId {
        let texture = GuiTexture::new(gpu.device(), self.gui.texture_layout(), texture, config);
        let id = self.textures.insert(texture);
        log::debug!("registered texture {} ({:?})", id.id(), config.label);
        id
    }

    /// Uploads tightly packed sRGB RGBA8 texels and registers the result.
    pub fn register_rgba8(
        &mut self,
        gpu: &Gpu<'_>,
        width: u32,
        height: u32,
        texels: &[u8],
        config: &GuiTextureConfig,
    ) -> TextureId {
        let texture = create_rgba8(
            gpu.device(),
            gpu.queue(),
            width,
            height,
            texels,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            config.label.as_deref(),
        );
        self.register_texture(gpu, texture, config)
    }

    /// Points `id` at a new texture, returning the previous one.
    pub fn replace_texture(
        &mut self,
        gpu: &Gpu<'_>,
        id: TextureId,
        texture: wgpu::Texture,
        config: &GuiTextureConfig,
    ) -> Option<GuiTexture> {
        let texture = GuiTexture::new(gpu.device(), self.gui.texture_layout(), texture, config);
        self.textures.replace(id, texture)
    }

    /// Drops the texture registered under `id`. Unknown ids are ignored.
    pub fn unregister_texture(&mut self, id: TextureId) -> Option<GuiTexture> {
        let removed = self.textures.remove(id);
        if removed.is_some() {
            log::debug!("unregistered texture {}", id.id());
        }
        removed
    }

    /// Rebuilds the font atlas texture from the context's current fonts.
    ///
    /// Call after adding fonts or changing their sizes.
    pub fn refresh_font_texture(&mut self, gpu: &Gpu<'_>, imgui: &mut imgui::Context) {
        let fonts = imgui.fonts();

        let texture = {
            let atlas = fonts.build_rgba32_texture();
            create_rgba8(
                gpu.device(),
                gpu.queue(),
                atlas.width,
                atlas.height,
                atlas.data,
                wgpu::TextureFormat::Rgba8Unorm,
                Some("kiln imgui font atlas"),
            )
        };

        if let Some(old) = self.font_texture.take() {
            self.textures.remove(old);
        }

        let id = self.register_texture(gpu, texture, &GuiTextureConfig::labeled("kiln imgui font atlas"));
        fonts.tex_id = id;
        fonts.clear_tex_data();
        self.font_texture = Some(id);
    }

    // ── events ────────────────────────────────────────────────────────────

    /// Forwards one runtime input event to ImGui.
    pub fn handle_input(&self, io: &mut imgui::Io, event: &InputEvent) {
        feed_event(io, event, self.config.wheel_scale);
    }

    /// Applies a new drawable size.
    ///
    /// Waits for the device to go idle before touching the surface and the
    /// frame buffer. A zero dimension leaves the surface unconfigured and
    /// drops the frame buffer until the next non-zero resize.
    pub fn resize(
        &mut self,
        gpu: &mut Gpu<'_>,
        io: &mut imgui::Io,
        size: PhysicalSize<u32>,
        scale_factor: f32,
    ) {
        gpu.wait_idle();
        gpu.resize(size);
        self.sync_frame_buffer(gpu, io, size, scale_factor);
    }

    fn sync_frame_buffer(
        &mut self,
        gpu: &Gpu<'_>,
        io: &mut imgui::Io,
        size: PhysicalSize<u32>,
        scale_factor: f32,
    ) {
        let physical = (size.width, size.height);
        let max_dim = gpu.device().limits().max_texture_dimension_2d;
        self.supersample = present::effective_supersample(physical, self.config.supersample, max_dim);

        let (display_size, framebuffer_scale) =
            display_metrics(physical, scale_factor, self.supersample);
        io.display_size = display_size;
        io.display_framebuffer_scale = framebuffer_scale;

        self.frame = frame_buffer_target(physical, self.supersample, gpu.is_configured()).map(
            |fb_size| {
                self.present
                    .create_frame_buffer(gpu.device(), self.config.frame_format, fb_size)
            },
        );

        log::debug!(
            "imgui display {:?} scale {:?} frame buffer {:?}",
            io.display_size,
            io.display_framebuffer_scale,
            self.frame.as_ref().map(FrameBuffer::size)
        );
    }

    // ── rendering ─────────────────────────────────────────────────────────

    /// Renders one frame of draw data and presents it.
    ///
    /// Does nothing while the surface is unconfigured. Texture ids are
    /// checked before the surface texture is acquired, so an
    /// `UnregisteredTexture` error leaves the surface untouched.
    pub fn render(&mut self, gpu: &Gpu<'_>, draw_data: &DrawData) -> Result<(), RenderError> {
        let geometry = FrameGeometry::from_draw_data(draw_data);
        if let Some(reason) = skip_reason(gpu.is_configured(), self.frame.is_some(), &geometry) {
            log::trace!("skipping frame: {reason}");
            // Nothing was drawn; do not report the previous frame's counts.
            self.last_frame = FrameStats::default();
            return Ok(());
        }
        let Some(frame_buffer) = self.frame.as_ref() else {
            return Ok(());
        };
        let target = frame_buffer.size();

        let mut plans: Vec<(&imgui::DrawList, ListPlan)> = Vec::new();
        let mut skipped_callbacks = 0;
        for list in draw_data.draw_lists() {
            let plan = plan_commands(list.commands(), &geometry, target, &self.textures)?;
            skipped_callbacks += plan.skipped_callbacks;
            plans.push((list, plan));
        }

        if skipped_callbacks > 0 && !self.warned_callbacks {
            log::warn!("imgui draw data contains user callbacks; they are not executed");
            self.warned_callbacks = true;
        }

        let mut frame = gpu.begin_frame()?;
        self.gui.write_projection(gpu.queue(), geometry.projection());

        {
            let _clear = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("kiln imgui clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: frame_buffer.view(),
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.config.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        let mut stats = FrameStats {
            draw_lists: plans.len(),
            ..FrameStats::default()
        };

        for (list, plan) in &plans {
            let vtx = list.vtx_buffer();
            let idx = list.idx_buffer();
            if vtx.is_empty() || idx.is_empty() || !plan.has_draws() {
                continue;
            }

            let vertices: Vec<GuiVertex> = vtx.iter().map(GuiVertex::from).collect();
            let vertex_buffer = gpu
                .device()
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("kiln imgui vertex buffer"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
            let index_buffer = gpu
                .device()
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("kiln imgui index buffer"),
                    contents: bytemuck::cast_slice(idx),
                    usage: wgpu::BufferUsages::INDEX,
                });

            stats.vertices += vtx.len();
            stats.indices += idx.len();

            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("kiln imgui pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: frame_buffer.view(),
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let bind_fixed_state = |rpass: &mut wgpu::RenderPass<'_>| {
                self.gui.bind(rpass);
                rpass.set_vertex_buffer(0, vertex_buffer.slice(..));
                rpass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                rpass.set_viewport(0.0, 0.0, target.0 as f32, target.1 as f32, 0.0, 1.0);
            };
            bind_fixed_state(&mut rpass);

            for cmd in &plan.cmds {
                match cmd {
                    PlannedCmd::Draw(call) => {
                        let Some(texture) = self.textures.get(call.texture_id) else {
                            continue;
                        };
                        let s = call.scissor;
                        rpass.set_scissor_rect(s.x, s.y, s.width, s.height);
                        rpass.set_bind_group(1, texture.bind_group(), &[]);
                        rpass.draw_indexed(call.indices.clone(), call.base_vertex, 0..1);
                        stats.draw_calls += 1;
                    }
                    PlannedCmd::ResetRenderState => bind_fixed_state(&mut rpass),
                }
            }
        }

        self.present.draw(&mut frame.encoder, &frame.view, frame_buffer);
        gpu.submit(frame);

        self.last_frame = stats;
        Ok(())
    }
}

/// Marks `imgui` as driven by this renderer. Fails if a renderer already
/// claimed it.
fn claim_renderer(imgui: &mut imgui::Context) -> Result<()> {
    if imgui
        .io()
        .backend_flags
        .contains(BackendFlags::RENDERER_HAS_VTX_OFFSET)
    {
        bail!("imgui context already has a renderer");
    }

    let io = imgui.io_mut();
    io.backend_flags.insert(BackendFlags::RENDERER_HAS_VTX_OFFSET);
    io.backend_flags.insert(BackendFlags::HAS_MOUSE_CURSORS);
    imgui.set_renderer_name(Some(format!(
        "kiln-engine {}",
        env!("CARGO_PKG_VERSION")
    )));
    Ok(())
}

fn release_renderer(imgui: &mut imgui::Context) {
    let io = imgui.io_mut();
    io.backend_flags.remove(BackendFlags::RENDERER_HAS_VTX_OFFSET);
    io.backend_flags.remove(BackendFlags::HAS_MOUSE_CURSORS);
    imgui.set_renderer_name(None::<String>);
    // The atlas texture id belongs to the released registry.
    imgui.fonts().tex_id = TextureId::new(0);
}

/// ImGui display size (logical pixels) and frame buffer scale for a physical
/// surface `size`.
///
/// Non-positive or non-finite scale factors count as 1.
fn display_metrics(size: (u32, u32), scale_factor: f32, supersample: f32) -> ([f32; 2], [f32; 2]) {
    let scale = if scale_factor.is_finite() && scale_factor > 0.0 {
        scale_factor
    } else {
        1.0
    };
    let display = [size.0 as f32 / scale, size.1 as f32 / scale];
    let fb_scale = scale * supersample;
    (display, [fb_scale, fb_scale])
}

/// Why a frame cannot be rendered, `None` when it can.
fn skip_reason(configured: bool, has_frame_buffer: bool, geometry: &FrameGeometry) -> Option<&'static str> {
    if !configured {
        Some("surface unconfigured")
    } else if !has_frame_buffer {
        Some("no frame buffer")
    } else if geometry.framebuffer_size().is_none() {
        Some("empty display")
    } else {
        None
    }
}

/// Frame buffer size to allocate, `None` while the surface cannot be drawn to.
fn frame_buffer_target(size: (u32, u32), supersample: f32, configured: bool) -> Option<(u32, u32)> {
    if !configured {
        return None;
    }
    present::frame_buffer_size(size, supersample)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> imgui::Context {
        let mut ctx = imgui::Context::create();
        ctx.set_ini_filename(None);
        ctx
    }

    #[test]
    fn renderer_claim_is_exclusive_until_released() {
        let mut ctx = context();

        claim_renderer(&mut ctx).unwrap();
        assert!(ctx.io().backend_flags.contains(BackendFlags::HAS_MOUSE_CURSORS));
        assert!(claim_renderer(&mut ctx).is_err());

        release_renderer(&mut ctx);
        assert!(!ctx.io().backend_flags.contains(BackendFlags::RENDERER_HAS_VTX_OFFSET));
        assert!(!ctx.io().backend_flags.contains(BackendFlags::HAS_MOUSE_CURSORS));
        assert_eq!(ctx.fonts().tex_id.id(), 0);

        claim_renderer(&mut ctx).unwrap();
    }

    #[test]
    fn display_metrics_at_unit_scale() {
        let (display, fb_scale) = display_metrics((960, 540), 1.0, 1.0);
        assert_eq!(display, [960.0, 540.0]);
        assert_eq!(fb_scale, [1.0, 1.0]);
    }

    #[test]
    fn hidpi_display_is_logical() {
        let (display, fb_scale) = display_metrics((1920, 1080), 2.0, 1.0);
        assert_eq!(display, [960.0, 540.0]);
        assert_eq!(fb_scale, [2.0, 2.0]);
    }

    #[test]
    fn supersample_only_scales_the_frame_buffer() {
        let (display, fb_scale) = display_metrics((1920, 1080), 2.0, 1.5);
        assert_eq!(display, [960.0, 540.0]);
        assert_eq!(fb_scale, [3.0, 3.0]);
    }

    #[test]
    fn invalid_scale_factor_counts_as_one() {
        for scale in [0.0, -2.0, f32::NAN] {
            let (display, fb_scale) = display_metrics((800, 600), scale, 1.0);
            assert_eq!(display, [800.0, 600.0]);
            assert_eq!(fb_scale, [1.0, 1.0]);
        }
    }

    #[test]
    fn zero_size_has_empty_display_and_no_frame_buffer() {
        let (display, _) = display_metrics((0, 600), 1.0, 1.0);
        assert_eq!(display, [0.0, 600.0]);
        assert_eq!(frame_buffer_target((0, 600), 1.0, true), None);
        assert_eq!(frame_buffer_target((800, 0), 2.0, true), None);
    }

    fn geometry(size: [f32; 2]) -> FrameGeometry {
        FrameGeometry {
            display_pos: [0.0, 0.0],
            display_size: size,
            framebuffer_scale: [1.0, 1.0],
        }
    }

    #[test]
    fn frames_are_skipped_without_a_drawable_target() {
        let visible = geometry([800.0, 600.0]);
        assert_eq!(skip_reason(true, true, &visible), None);
        assert_eq!(skip_reason(false, true, &visible), Some("surface unconfigured"));
        assert_eq!(skip_reason(true, false, &visible), Some("no frame buffer"));
        assert_eq!(skip_reason(true, true, &geometry([0.0, 600.0])), Some("empty display"));
    }

    #[test]
    fn unconfigured_surface_has_no_frame_buffer() {
        assert_eq!(frame_buffer_target((800, 600), 1.0, false), None);
        assert_eq!(frame_buffer_target((800, 600), 2.0, true), Some((1600, 1200)));
    }
}
