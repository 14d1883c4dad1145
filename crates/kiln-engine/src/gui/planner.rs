//! Draw-list translation.
//!
//! Turns the commands of one ImGui draw list into GPU-ready draw calls. This
//! is the only place texture ids are resolved, so a frame fails here before
//! any buffer is created or any pass is recorded.

use std::ops::Range;

use imgui::{DrawCmd, DrawCmdParams, TextureId};

use super::{FrameGeometry, RenderError, ScissorRect, TextureRegistry};

/// One indexed draw within a draw list's buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub texture_id: TextureId,
    pub scissor: ScissorRect,
    /// Range into the list's index buffer.
    pub indices: Range<u32>,
    /// Added to every index before fetching a vertex.
    pub base_vertex: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlannedCmd {
    Draw(DrawCall),
    /// Re-apply pipeline, buffers and viewport.
    ResetRenderState,
}

/// Translated commands of one draw list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPlan {
    pub cmds: Vec<PlannedCmd>,
    /// User callbacks found in the list; these are not executed.
    pub skipped_callbacks: usize,
}

impl ListPlan {
    pub fn has_draws(&self) -> bool {
        self.cmds.iter().any(|c| matches!(c, PlannedCmd::Draw(_)))
    }

    pub fn draw_calls(&self) -> impl Iterator<Item = &DrawCall> {
        self.cmds.iter().filter_map(|c| match c {
            PlannedCmd::Draw(call) => Some(call),
            PlannedCmd::ResetRenderState => None,
        })
    }
}

/// Plans the commands of one draw list against a `target`-sized frame buffer.
///
/// Every element command must reference a registered texture, including
/// commands that end up fully clipped. Commands with no elements or an empty
/// scissor produce no draw call.
pub fn plan_commands<T, I>(
    commands: I,
    geometry: &FrameGeometry,
    target: (u32, u32),
    textures: &TextureRegistry<T>,
) -> Result<ListPlan, RenderError>
where
    I: IntoIterator<Item = DrawCmd>,
{
    let mut plan = ListPlan::default();

    for cmd in commands {
        match cmd {
            DrawCmd::Elements {
                count,
                cmd_params:
                    DrawCmdParams {
                        clip_rect,
                        texture_id,
                        vtx_offset,
                        idx_offset,
                    },
            } => {
                textures.resolve(texture_id)?;

                if count == 0 {
                    continue;
                }
                let Some(scissor) = geometry.scissor(clip_rect, target) else {
                    continue;
                };

                let start = idx_offset as u32;
                plan.cmds.push(PlannedCmd::Draw(DrawCall {
                    texture_id,
                    scissor,
                    indices: start..start + count as u32,
                    base_vertex: vtx_offset as i32,
                }));
            }
            DrawCmd::ResetRenderState => plan.cmds.push(PlannedCmd::ResetRenderState),
            DrawCmd::RawCallback { .. } => plan.skipped_callbacks += 1,
        }
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> FrameGeometry {
        FrameGeometry {
            display_pos: [0.0, 0.0],
            display_size: [100.0, 100.0],
            framebuffer_scale: [1.0, 1.0],
        }
    }

    fn elements(count: usize, clip_rect: [f32; 4], texture_id: TextureId, vtx_offset: usize, idx_offset: usize) -> DrawCmd {
        DrawCmd::Elements {
            count,
            cmd_params: DrawCmdParams {
                clip_rect,
                texture_id,
                vtx_offset,
                idx_offset,
            },
        }
    }

    const FULL: [f32; 4] = [0.0, 0.0, 100.0, 100.0];

    #[test]
    fn consecutive_commands_keep_their_offsets() {
        let mut reg = TextureRegistry::new();
        let font = reg.insert(());

        let cmds = vec![
            elements(6, FULL, font, 0, 0),
            elements(12, [10.0, 10.0, 50.0, 50.0], font, 0, 6),
            elements(3, FULL, font, 40, 18),
        ];

        let plan = plan_commands(cmds, &geometry(), (100, 100), &reg).unwrap();
        let calls: Vec<&DrawCall> = plan.draw_calls().collect();

        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].indices, 0..6);
        assert_eq!(calls[1].indices, 6..18);
        assert_eq!(calls[1].scissor, ScissorRect { x: 10, y: 10, width: 40, height: 40 });
        assert_eq!(calls[2].indices, 18..21);
        assert_eq!(calls[2].base_vertex, 40);
    }

    #[test]
    fn unregistered_texture_fails_the_list() {
        let mut reg = TextureRegistry::new();
        let font = reg.insert(());
        let stale = TextureId::new(99);

        let cmds = vec![elements(6, FULL, font, 0, 0), elements(6, FULL, stale, 0, 6)];

        let err = plan_commands(cmds, &geometry(), (100, 100), &reg).unwrap_err();
        assert!(matches!(err, RenderError::UnregisteredTexture(id) if id == stale));
    }

    #[test]
    fn clipped_command_still_validates_texture() {
        let reg: TextureRegistry<()> = TextureRegistry::new();
        let cmds = vec![elements(6, [0.0, 0.0, 0.0, 0.0], TextureId::new(1), 0, 0)];
        assert!(plan_commands(cmds, &geometry(), (100, 100), &reg).is_err());
    }

    #[test]
    fn empty_and_clipped_commands_are_dropped() {
        let mut reg = TextureRegistry::new();
        let font = reg.insert(());

        let cmds = vec![
            elements(0, FULL, font, 0, 0),
            elements(6, [200.0, 200.0, 300.0, 300.0], font, 0, 0),
        ];

        let plan = plan_commands(cmds, &geometry(), (100, 100), &reg).unwrap();
        assert!(plan.cmds.is_empty());
        assert!(!plan.has_draws());
    }

    #[test]
    fn reset_render_state_is_kept_in_order() {
        let mut reg = TextureRegistry::new();
        let font = reg.insert(());

        let cmds = vec![
            elements(3, FULL, font, 0, 0),
            DrawCmd::ResetRenderState,
            elements(3, FULL, font, 0, 3),
        ];

        let plan = plan_commands(cmds, &geometry(), (100, 100), &reg).unwrap();
        assert_eq!(plan.cmds.len(), 3);
        assert_eq!(plan.cmds[1], PlannedCmd::ResetRenderState);
        assert!(plan.has_draws());
    }

    #[test]
    fn texture_id_is_carried_to_the_draw_call() {
        let mut reg = TextureRegistry::new();
        let font = reg.insert("font");
        let image = reg.insert("image");

        let cmds = vec![elements(6, FULL, image, 0, 0), elements(6, FULL, font, 0, 6)];

        let plan = plan_commands(cmds, &geometry(), (100, 100), &reg).unwrap();
        let ids: Vec<TextureId> = plan.draw_calls().map(|c| c.texture_id).collect();
        assert_eq!(ids, vec![image, font]);
    }
}
