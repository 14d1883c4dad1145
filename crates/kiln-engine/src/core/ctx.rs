use winit::dpi::PhysicalSize;
use winit::window::{CursorIcon, Window};

use crate::device::Gpu;
use crate::input::{InputFrame, InputState};
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

/// Window handle plus size queries.
pub struct WindowCtx<'a> {
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Returns the logical window size as `(width, height)`.
    pub fn logical_size(&self) -> (f32, f32) {
        let logi: winit::dpi::LogicalSize<f64> =
            self.window.inner_size().to_logical(self.window.scale_factor());
        (logi.width as f32, logi.height as f32)
    }

    pub fn physical_size(&self) -> PhysicalSize<u32> {
        self.window.inner_size()
    }

    pub fn scale_factor(&self) -> f32 {
        self.window.scale_factor() as f32
    }

    /// Sets the mouse cursor shape for this window. `None` hides it.
    pub fn set_cursor(&self, cursor: Option<CursorIcon>) {
        match cursor {
            Some(icon) => {
                self.window.set_cursor_visible(true);
                self.window.set_cursor(icon);
            }
            None => self.window.set_cursor_visible(false),
        }
    }
}

/// Context passed to `core::App::on_resize`.
///
/// `size` is the new drawable size in physical pixels and may be zero while
/// the window is minimized.
pub struct ResizeCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub size: PhysicalSize<u32>,
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub input: &'a InputState,
    pub input_frame: &'a InputFrame,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl FrameCtx<'_, '_> {
    /// Notifies the platform that a frame is about to be presented.
    pub fn pre_present(&self) {
        self.window.window.pre_present_notify();
    }
}
