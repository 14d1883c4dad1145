//! Frame timing.
//!
//! One `FrameClock` per window; `tick()` once per rendered frame. The GUI
//! layer takes its delta time from the resulting `FrameTime`.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
