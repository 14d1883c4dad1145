/// Adapter configuration.
#[derive(Debug, Clone)]
pub struct ImguiAdapterConfig {
    /// Format of the offscreen frame buffer GUI geometry is rendered into.
    ///
    /// Must be renderable and filterable; it is sampled when presenting.
    pub frame_format: wgpu::TextureFormat,

    /// Frame buffer resolution relative to the surface.
    ///
    /// Values above 1 supersample the GUI and filter it down on present.
    /// Clamped to the device's maximum texture dimension.
    pub supersample: f32,

    /// Color the frame buffer is cleared to at the start of each frame.
    pub clear_color: wgpu::Color,

    /// Multiplier applied to mouse wheel deltas before they reach ImGui.
    pub wheel_scale: f32,
}

impl Default for ImguiAdapterConfig {
    fn default() -> Self {
        Self {
            frame_format: wgpu::TextureFormat::Rgba16Float,
            supersample: 1.0,
            clear_color: wgpu::Color::TRANSPARENT,
            wheel_scale: 1.0,
        }
    }
}
