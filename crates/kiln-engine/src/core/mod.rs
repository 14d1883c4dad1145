//! Core engine-facing contracts.
//!
//! The stable interface between the runtime (platform loop) and applications.
//! Applications never touch the event loop; they receive a context per
//! window event, per resize and per frame.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, ResizeCtx, WindowCtx};
