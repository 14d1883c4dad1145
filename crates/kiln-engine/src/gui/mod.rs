//! Dear ImGui render adapter.
//!
//! Translates `imgui::DrawData` into wgpu work once per frame:
//! - each draw list is uploaded into fresh vertex/index buffers
//! - each draw command becomes one scissored indexed draw
//! - the result accumulates in an offscreen frame buffer that is presented
//!   onto the surface at the end of the frame
//!
//! Texture ids in draw commands resolve through the adapter's
//! [`TextureRegistry`]; an unregistered id aborts the frame before any GPU
//! work is recorded.
//!
//! Convention: display coordinates are logical pixels (top-left origin,
//! +Y down); frame buffer coordinates are physical pixels times the
//! supersample factor.

mod adapter;
mod clipboard;
mod config;
mod error;
mod geometry;
mod input;
mod pipeline;
mod planner;
mod present;
mod registry;
mod texture;
mod vertex;

pub use adapter::{FrameStats, ImguiAdapter};
pub use clipboard::ArboardClipboard;
pub use config::ImguiAdapterConfig;
pub use error::RenderError;
pub use geometry::{FrameGeometry, ScissorRect};
pub use input::{feed_event, map_cursor, map_key, map_mouse_button, wheel_lines};
pub use planner::{plan_commands, DrawCall, ListPlan, PlannedCmd};
pub use registry::TextureRegistry;
pub use texture::{GuiTexture, GuiTextureConfig};
pub use vertex::GuiVertex;
