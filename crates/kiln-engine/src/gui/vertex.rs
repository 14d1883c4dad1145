use bytemuck::{Pod, Zeroable};

/// GPU-side copy of `imgui::DrawVert`.
///
/// Same layout as ImGui's vertex (20-byte stride): position and uv as two
/// floats each, color as four normalized bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GuiVertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    pub col: [u8; 4],
}

impl GuiVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Float32x2, // uv
        2 => Unorm8x4   // col
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GuiVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

impl From<&imgui::DrawVert> for GuiVertex {
    #[inline]
    fn from(v: &imgui::DrawVert) -> Self {
        Self {
            pos: v.pos,
            uv: v.uv,
            col: v.col,
        }
    }
}
