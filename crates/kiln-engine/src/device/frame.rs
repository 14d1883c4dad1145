/// Represents a single acquired frame.
///
/// This object is short-lived and must be handed back to [`Gpu::submit`](super::Gpu::submit)
/// promptly. Holding the surface texture prevents acquisition of subsequent frames,
/// and dropping it without submitting discards the frame.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
