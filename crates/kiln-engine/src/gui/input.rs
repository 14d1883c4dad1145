//! Input forwarding from runtime events to ImGui's `Io` queue.

use imgui::{Io, Key as K, MouseCursor};
use winit::window::CursorIcon;

use crate::input::{
    InputEvent, Key, KeyState, Modifiers, MouseButton, MouseButtonState, MouseWheelDelta,
};

/// Logical pixels per wheel line for pixel-precise (touchpad) scrolling.
const PIXELS_PER_LINE: f32 = 20.0;

/// Runtime keys and the ImGui keys they drive.
const KEY_MAP: &[(Key, K)] = &[
    (Key::Escape, K::Escape),
    (Key::Enter, K::Enter),
    (Key::Tab, K::Tab),
    (Key::Backspace, K::Backspace),
    (Key::Space, K::Space),
    (Key::Insert, K::Insert),
    (Key::Delete, K::Delete),
    (Key::Home, K::Home),
    (Key::End, K::End),
    (Key::PageUp, K::PageUp),
    (Key::PageDown, K::PageDown),
    (Key::ArrowUp, K::UpArrow),
    (Key::ArrowDown, K::DownArrow),
    (Key::ArrowLeft, K::LeftArrow),
    (Key::ArrowRight, K::RightArrow),
    (Key::Shift, K::LeftShift),
    (Key::Control, K::LeftCtrl),
    (Key::Alt, K::LeftAlt),
    (Key::Meta, K::LeftSuper),
    (Key::A, K::A),
    (Key::B, K::B),
    (Key::C, K::C),
    (Key::D, K::D),
    (Key::E, K::E),
    (Key::F, K::F),
    (Key::G, K::G),
    (Key::H, K::H),
    (Key::I, K::I),
    (Key::J, K::J),
    (Key::K, K::K),
    (Key::L, K::L),
    (Key::M, K::M),
    (Key::N, K::N),
    (Key::O, K::O),
    (Key::P, K::P),
    (Key::Q, K::Q),
    (Key::R, K::R),
    (Key::S, K::S),
    (Key::T, K::T),
    (Key::U, K::U),
    (Key::V, K::V),
    (Key::W, K::W),
    (Key::X, K::X),
    (Key::Y, K::Y),
    (Key::Z, K::Z),
    (Key::Digit0, K::Alpha0),
    (Key::Digit1, K::Alpha1),
    (Key::Digit2, K::Alpha2),
    (Key::Digit3, K::Alpha3),
    (Key::Digit4, K::Alpha4),
    (Key::Digit5, K::Alpha5),
    (Key::Digit6, K::Alpha6),
    (Key::Digit7, K::Alpha7),
    (Key::Digit8, K::Alpha8),
    (Key::Digit9, K::Alpha9),
    (Key::F1, K::F1),
    (Key::F2, K::F2),
    (Key::F3, K::F3),
    (Key::F4, K::F4),
    (Key::F5, K::F5),
    (Key::F6, K::F6),
    (Key::F7, K::F7),
    (Key::F8, K::F8),
    (Key::F9, K::F9),
    (Key::F10, K::F10),
    (Key::F11, K::F11),
    (Key::F12, K::F12),
];

const MOUSE_BUTTONS: [imgui::MouseButton; 5] = [
    imgui::MouseButton::Left,
    imgui::MouseButton::Right,
    imgui::MouseButton::Middle,
    imgui::MouseButton::Extra1,
    imgui::MouseButton::Extra2,
];

/// Maps a runtime key to the ImGui key it drives, if any.
pub fn map_key(key: Key) -> Option<imgui::Key> {
    KEY_MAP
        .iter()
        .find(|(k, _)| *k == key)
        .map(|&(_, imgui_key)| imgui_key)
}

pub fn map_mouse_button(button: MouseButton) -> Option<imgui::MouseButton> {
    Some(match button {
        MouseButton::Left => imgui::MouseButton::Left,
        MouseButton::Right => imgui::MouseButton::Right,
        MouseButton::Middle => imgui::MouseButton::Middle,
        MouseButton::Back => imgui::MouseButton::Extra1,
        MouseButton::Forward => imgui::MouseButton::Extra2,
        MouseButton::Other(_) => return None,
    })
}

/// Wheel delta in ImGui units (`[horizontal, vertical]`, lines).
pub fn wheel_lines(delta: MouseWheelDelta, scale: f32) -> [f32; 2] {
    let [x, y] = match delta {
        MouseWheelDelta::Line { x, y } => [x, y],
        MouseWheelDelta::Pixel { x, y } => [x / PIXELS_PER_LINE, y / PIXELS_PER_LINE],
    };
    [x * scale, y * scale]
}

/// Window cursor for the shape ImGui requests. `None` means hide the cursor.
pub fn map_cursor(cursor: Option<MouseCursor>) -> Option<CursorIcon> {
    Some(match cursor? {
        MouseCursor::Arrow => CursorIcon::Default,
        MouseCursor::TextInput => CursorIcon::Text,
        MouseCursor::ResizeAll => CursorIcon::Move,
        MouseCursor::ResizeNS => CursorIcon::NsResize,
        MouseCursor::ResizeEW => CursorIcon::EwResize,
        MouseCursor::ResizeNESW => CursorIcon::NeswResize,
        MouseCursor::ResizeNWSE => CursorIcon::NwseResize,
        MouseCursor::Hand => CursorIcon::Pointer,
        MouseCursor::NotAllowed => CursorIcon::NotAllowed,
    })
}

/// Releases every key and button ImGui may consider held.
///
/// Releases that happen while the window is unfocused are never delivered,
/// so ImGui would otherwise keep them down (and keep repeating them).
fn release_all(io: &mut Io) {
    feed_modifiers(io, Modifiers::default());
    // Keys before buttons: ImGui's input queue defers key events that
    // follow a button change to the next frame.
    for &(_, key) in KEY_MAP {
        io.add_key_event(key, false);
    }
    for button in MOUSE_BUTTONS {
        io.add_mouse_button_event(button, false);
    }
}

fn feed_modifiers(io: &mut Io, m: Modifiers) {
    io.add_key_event(imgui::Key::ModCtrl, m.ctrl);
    io.add_key_event(imgui::Key::ModShift, m.shift);
    io.add_key_event(imgui::Key::ModAlt, m.alt);
    io.add_key_event(imgui::Key::ModSuper, m.meta);
}

/// Queues one runtime event on ImGui's input queue.
///
/// `wheel_scale` multiplies wheel deltas. Events ImGui has no use for are
/// ignored.
pub fn feed_event(io: &mut Io, event: &InputEvent, wheel_scale: f32) {
    match event {
        InputEvent::ModifiersChanged(m) => feed_modifiers(io, *m),

        InputEvent::Key { key, state, .. } => {
            if let Some(k) = map_key(*key) {
                io.add_key_event(k, *state == KeyState::Pressed);
            }
        }

        InputEvent::Text(text) => {
            for c in text.text.chars().filter(|c| !c.is_control()) {
                io.add_input_character(c);
            }
        }

        InputEvent::PointerMoved(p) => io.add_mouse_pos_event([p.x, p.y]),

        InputEvent::PointerButton(b) => {
            if let Some(button) = map_mouse_button(b.button) {
                if let Some((x, y)) = b.pos {
                    io.add_mouse_pos_event([x, y]);
                }
                io.add_mouse_button_event(button, b.state == MouseButtonState::Pressed);
            }
        }

        InputEvent::MouseWheel { delta, .. } => {
            io.add_mouse_wheel_event(wheel_lines(*delta, wheel_scale));
        }

        // ImGui treats -FLT_MAX as "no mouse".
        InputEvent::PointerLeft => io.add_mouse_pos_event([-f32::MAX, -f32::MAX]),

        InputEvent::Focused(false) => release_all(io),
        InputEvent::Focused(true) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_keys_map() {
        assert_eq!(map_key(Key::ArrowLeft), Some(imgui::Key::LeftArrow));
        assert_eq!(map_key(Key::Enter), Some(imgui::Key::Enter));
        assert_eq!(map_key(Key::Digit7), Some(imgui::Key::Alpha7));
        assert_eq!(map_key(Key::Control), Some(imgui::Key::LeftCtrl));
    }

    #[test]
    fn unknown_key_is_dropped() {
        assert_eq!(map_key(Key::Unknown(0x1234)), None);
    }

    #[test]
    fn extra_mouse_buttons_map() {
        assert_eq!(map_mouse_button(MouseButton::Back), Some(imgui::MouseButton::Extra1));
        assert_eq!(map_mouse_button(MouseButton::Forward), Some(imgui::MouseButton::Extra2));
        assert_eq!(map_mouse_button(MouseButton::Other(9)), None);
    }

    #[test]
    fn line_wheel_is_scaled() {
        assert_eq!(wheel_lines(MouseWheelDelta::Line { x: 0.0, y: 1.0 }, 1.0), [0.0, 1.0]);
        assert_eq!(wheel_lines(MouseWheelDelta::Line { x: 1.0, y: -2.0 }, 0.5), [0.5, -1.0]);
    }

    #[test]
    fn pixel_wheel_converts_to_lines() {
        assert_eq!(wheel_lines(MouseWheelDelta::Pixel { x: 40.0, y: -20.0 }, 1.0), [2.0, -1.0]);
    }

    #[test]
    fn cursor_shapes_map() {
        assert_eq!(map_cursor(Some(MouseCursor::TextInput)), Some(CursorIcon::Text));
        assert_eq!(map_cursor(Some(MouseCursor::Hand)), Some(CursorIcon::Pointer));
        assert_eq!(map_cursor(Some(MouseCursor::ResizeNWSE)), Some(CursorIcon::NwseResize));
        assert_eq!(map_cursor(None), None);
    }

    fn frame_context() -> imgui::Context {
        let mut ctx = imgui::Context::create();
        ctx.set_ini_filename(None);
        ctx.io_mut().display_size = [800.0, 600.0];
        let _ = ctx.fonts().build_rgba32_texture();
        ctx
    }

    fn run_frame(ctx: &mut imgui::Context, events: &[InputEvent]) {
        for event in events {
            feed_event(ctx.io_mut(), event, 1.0);
        }
        ctx.new_frame();
        ctx.render();
    }

    fn left(state: MouseButtonState, pos: Option<(f32, f32)>) -> InputEvent {
        InputEvent::PointerButton(crate::input::PointerButtonEvent {
            button: MouseButton::Left,
            state,
            pos,
            modifiers: Modifiers::default(),
        })
    }

    #[test]
    fn focus_loss_releases_held_keys_and_buttons() {
        let mut ctx = frame_context();

        let press_a = InputEvent::Key {
            key: Key::A,
            state: KeyState::Pressed,
            modifiers: Modifiers::default(),
            repeat: false,
        };
        run_frame(&mut ctx, &[press_a, left(MouseButtonState::Pressed, Some((10.0, 10.0)))]);
        {
            let ui = ctx.new_frame();
            assert!(ui.is_key_down(K::A));
            assert!(ui.is_mouse_down(imgui::MouseButton::Left));
        }
        ctx.render();

        for _ in 0..3 {
            run_frame(&mut ctx, &[]);
        }
        feed_event(ctx.io_mut(), &InputEvent::Focused(false), 1.0);
        for _ in 0..2 {
            let ui = ctx.new_frame();
            assert!(!ui.is_key_down(K::A));
            assert!(!ui.is_mouse_down(imgui::MouseButton::Left));
            ctx.render();
        }
    }

    #[test]
    fn release_outside_window_does_not_move_mouse() {
        let mut ctx = frame_context();

        run_frame(
            &mut ctx,
            &[
                InputEvent::PointerMoved(crate::input::PointerMoveEvent { x: 300.0, y: 200.0 }),
                left(MouseButtonState::Pressed, Some((300.0, 200.0))),
                InputEvent::PointerLeft,
                left(MouseButtonState::Released, None),
            ],
        );
        for _ in 0..3 {
            run_frame(&mut ctx, &[]);
        }

        let io = ctx.io();
        assert_ne!(io.mouse_pos, [0.0, 0.0]);
        assert!(!io.mouse_down[0]);
    }

    #[test]
    fn feed_event_accepts_every_variant() {
        let mut ctx = imgui::Context::create();
        ctx.set_ini_filename(None);
        let io = ctx.io_mut();

        let events = [
            InputEvent::ModifiersChanged(Modifiers { ctrl: true, ..Modifiers::default() }),
            InputEvent::Key {
                key: Key::A,
                state: KeyState::Pressed,
                modifiers: Modifiers::default(),
                repeat: false,
            },
            InputEvent::Text(crate::input::TextEvent { text: "a\u{8}".into() }),
            InputEvent::PointerMoved(crate::input::PointerMoveEvent { x: 4.0, y: 5.0 }),
            InputEvent::MouseWheel {
                delta: MouseWheelDelta::Line { x: 0.0, y: 1.0 },
                modifiers: Modifiers::default(),
            },
            InputEvent::PointerLeft,
            InputEvent::Focused(false),
        ];

        for event in &events {
            feed_event(io, event, 1.0);
        }
    }
}
