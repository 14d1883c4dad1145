use thiserror::Error;

/// Failure of a single `ImguiAdapter::render` call.
///
/// Either variant aborts the frame: nothing is submitted or presented.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A draw command referenced a texture id that is not registered.
    #[error("texture id {} is not registered with the imgui adapter", .0.id())]
    UnregisteredTexture(imgui::TextureId),

    /// The next surface texture could not be acquired.
    #[error("failed to acquire surface texture: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
