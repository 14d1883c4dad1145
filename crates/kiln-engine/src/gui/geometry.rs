use imgui::DrawData;

/// Scissor rectangle in frame buffer pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ScissorRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Display-space placement of one frame's draw data.
///
/// `display_pos`/`display_size` are in logical pixels; multiplying by
/// `framebuffer_scale` yields frame buffer pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameGeometry {
    pub display_pos: [f32; 2],
    pub display_size: [f32; 2],
    pub framebuffer_scale: [f32; 2],
}

impl FrameGeometry {
    pub fn from_draw_data(draw_data: &DrawData) -> Self {
        Self {
            display_pos: draw_data.display_pos,
            display_size: draw_data.display_size,
            framebuffer_scale: draw_data.framebuffer_scale,
        }
    }

    /// Frame buffer size implied by the draw data, `None` when either
    /// dimension rounds to zero (minimized window).
    pub fn framebuffer_size(&self) -> Option<(u32, u32)> {
        let w = self.display_size[0] * self.framebuffer_scale[0];
        let h = self.display_size[1] * self.framebuffer_scale[1];
        if !(w >= 1.0 && h >= 1.0 && w.is_finite() && h.is_finite()) {
            return None;
        }
        Some((w as u32, h as u32))
    }

    /// Orthographic projection mapping the display rectangle onto clip space.
    ///
    /// Column-major (WGSL `mat4x4` layout). The top-left display corner maps
    /// to (-1, 1), the bottom-right to (1, -1).
    pub fn projection(&self) -> [[f32; 4]; 4] {
        let l = self.display_pos[0];
        let r = self.display_pos[0] + self.display_size[0];
        let t = self.display_pos[1];
        let b = self.display_pos[1] + self.display_size[1];

        [
            [2.0 / (r - l), 0.0, 0.0, 0.0],
            [0.0, 2.0 / (t - b), 0.0, 0.0],
            [0.0, 0.0, -1.0, 0.0],
            [(r + l) / (l - r), (t + b) / (b - t), 0.0, 1.0],
        ]
    }

    /// Converts an ImGui clip rectangle `[min_x, min_y, max_x, max_y]` in
    /// display coordinates into a scissor rectangle on a `target`-sized frame
    /// buffer.
    ///
    /// Edges are rounded outwards and clamped to the target. Returns `None`
    /// when nothing of the rectangle remains.
    pub fn scissor(&self, clip_rect: [f32; 4], target: (u32, u32)) -> Option<ScissorRect> {
        let [ox, oy] = self.display_pos;
        let [sx, sy] = self.framebuffer_scale;
        let (tw, th) = (target.0 as f32, target.1 as f32);

        let min_x = ((clip_rect[0] - ox) * sx).floor().clamp(0.0, tw);
        let min_y = ((clip_rect[1] - oy) * sy).floor().clamp(0.0, th);
        let max_x = ((clip_rect[2] - ox) * sx).ceil().clamp(0.0, tw);
        let max_y = ((clip_rect[3] - oy) * sy).ceil().clamp(0.0, th);

        // NaN fails both comparisons and is dropped here as well.
        if !(max_x > min_x && max_y > min_y) {
            return None;
        }

        Some(ScissorRect {
            x: min_x as u32,
            y: min_y as u32,
            width: (max_x - min_x) as u32,
            height: (max_y - min_y) as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(pos: [f32; 2], size: [f32; 2], scale: f32) -> FrameGeometry {
        FrameGeometry {
            display_pos: pos,
            display_size: size,
            framebuffer_scale: [scale, scale],
        }
    }

    fn transform(m: [[f32; 4]; 4], p: [f32; 2]) -> [f32; 2] {
        let v = [p[0], p[1], 0.0, 1.0];
        let mut out = [0.0f32; 4];
        for (col, &component) in m.iter().zip(v.iter()) {
            for row in 0..4 {
                out[row] += col[row] * component;
            }
        }
        [out[0] / out[3], out[1] / out[3]]
    }

    fn approx(a: [f32; 2], b: [f32; 2]) -> bool {
        (a[0] - b[0]).abs() < 1e-5 && (a[1] - b[1]).abs() < 1e-5
    }

    // ── projection ────────────────────────────────────────────────────────

    #[test]
    fn projection_maps_display_corners_to_clip_corners() {
        let g = geometry([0.0, 0.0], [800.0, 600.0], 1.0);
        let m = g.projection();
        assert!(approx(transform(m, [0.0, 0.0]), [-1.0, 1.0]));
        assert!(approx(transform(m, [800.0, 600.0]), [1.0, -1.0]));
        assert!(approx(transform(m, [400.0, 300.0]), [0.0, 0.0]));
    }

    #[test]
    fn projection_honours_display_offset() {
        let g = geometry([100.0, 50.0], [200.0, 100.0], 2.0);
        let m = g.projection();
        assert!(approx(transform(m, [100.0, 50.0]), [-1.0, 1.0]));
        assert!(approx(transform(m, [300.0, 150.0]), [1.0, -1.0]));
    }

    // ── framebuffer size ──────────────────────────────────────────────────

    #[test]
    fn framebuffer_size_applies_scale() {
        let g = geometry([0.0, 0.0], [960.0, 540.0], 2.0);
        assert_eq!(g.framebuffer_size(), Some((1920, 1080)));
    }

    #[test]
    fn zero_display_has_no_framebuffer() {
        assert_eq!(geometry([0.0, 0.0], [0.0, 540.0], 1.0).framebuffer_size(), None);
        assert_eq!(geometry([0.0, 0.0], [960.0, 0.0], 1.0).framebuffer_size(), None);
        assert_eq!(geometry([0.0, 0.0], [960.0, 540.0], 0.0).framebuffer_size(), None);
    }

    // ── scissor ───────────────────────────────────────────────────────────

    #[test]
    fn scissor_scales_clip_rect() {
        let g = geometry([0.0, 0.0], [100.0, 100.0], 2.0);
        let s = g.scissor([10.0, 20.0, 30.0, 60.0], (200, 200)).unwrap();
        assert_eq!(s, ScissorRect { x: 20, y: 40, width: 40, height: 80 });
    }

    #[test]
    fn scissor_subtracts_display_origin() {
        let g = geometry([50.0, 50.0], [100.0, 100.0], 1.0);
        let s = g.scissor([60.0, 70.0, 80.0, 90.0], (100, 100)).unwrap();
        assert_eq!(s, ScissorRect { x: 10, y: 20, width: 20, height: 20 });
    }

    #[test]
    fn scissor_is_clamped_to_target() {
        let g = geometry([0.0, 0.0], [100.0, 100.0], 1.0);
        let s = g.scissor([-20.0, -5.0, 500.0, 80.0], (100, 100)).unwrap();
        assert_eq!(s, ScissorRect { x: 0, y: 0, width: 100, height: 80 });
    }

    #[test]
    fn scissor_rounds_fractional_edges_outwards() {
        let g = geometry([0.0, 0.0], [100.0, 100.0], 1.0);
        let s = g.scissor([10.5, 10.5, 20.2, 20.2], (100, 100)).unwrap();
        assert_eq!(s, ScissorRect { x: 10, y: 10, width: 11, height: 11 });
    }

    #[test]
    fn empty_or_offscreen_clip_yields_none() {
        let g = geometry([0.0, 0.0], [100.0, 100.0], 1.0);
        assert_eq!(g.scissor([10.0, 10.0, 10.0, 50.0], (100, 100)), None);
        assert_eq!(g.scissor([150.0, 10.0, 180.0, 50.0], (100, 100)), None);
        assert_eq!(g.scissor([40.0, 40.0, 20.0, 20.0], (100, 100)), None);
        assert_eq!(g.scissor([f32::NAN, 0.0, 10.0, 10.0], (100, 100)), None);
    }
}
