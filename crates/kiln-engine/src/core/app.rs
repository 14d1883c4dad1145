use winit::event::WindowEvent;

use super::ctx::{FrameCtx, ResizeCtx};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by binaries built on the runtime.
pub trait App {
    /// Called for every window event, before the runtime handles it.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called when the drawable size or scale factor changed.
    ///
    /// The default only reconfigures the surface. Applications that own
    /// size-dependent GPU resources override this and resize them too.
    fn on_resize(&mut self, ctx: &mut ResizeCtx<'_, '_>) {
        ctx.gpu.resize(ctx.size);
    }

    /// Called once per redraw.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
