//! Kiln engine crate.
//!
//! A winit + wgpu runtime with a Dear ImGui render adapter on top. The
//! runtime owns the window and the GPU; applications implement
//! [`core::App`] and drive ImGui through [`gui::ImguiAdapter`].

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod gui;
