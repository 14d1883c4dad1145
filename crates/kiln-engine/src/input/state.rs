use std::collections::HashSet;

use super::frame::InputFrame;
use super::types::{
    InputEvent,
    Key,
    KeyState,
    Modifiers,
    MouseButton,
    MouseButtonState,
    PointerButtonEvent,
    PointerMoveEvent,
};

/// Current input state for the window.
///
/// The platform translation reads `modifiers` and `pointer_pos` from here to
/// complete button and wheel events, which winit delivers without them.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,
    pub focused: bool,

    /// Pointer position in logical pixels; `None` while outside the window.
    pub pointer_pos: Option<(f32, f32)>,

    pub keys_down: HashSet<Key>,
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies an event to the current state and records it in `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match &ev {
            InputEvent::ModifiersChanged(m) => self.modifiers = *m,

            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // Releases are not delivered while unfocused.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved(PointerMoveEvent { x, y }) => {
                self.pointer_pos = Some((*x, *y));
            }

            InputEvent::PointerLeft => self.pointer_pos = None,

            InputEvent::Key { key, state, modifiers, .. } => {
                self.modifiers = *modifiers;
                match state {
                    KeyState::Pressed => {
                        self.keys_down.insert(*key);
                    }
                    KeyState::Released => {
                        self.keys_down.remove(key);
                    }
                }
            }

            InputEvent::PointerButton(PointerButtonEvent { button, state, pos, modifiers }) => {
                if pos.is_some() {
                    self.pointer_pos = *pos;
                }
                self.modifiers = *modifiers;
                match state {
                    MouseButtonState::Pressed => {
                        self.buttons_down.insert(*button);
                    }
                    MouseButtonState::Released => {
                        self.buttons_down.remove(button);
                    }
                }
            }

            InputEvent::MouseWheel { modifiers, .. } => self.modifiers = *modifiers,

            InputEvent::Text(_) => {}
        }

        frame.push_event(ev);
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::TextEvent;

    fn press(key: Key) -> InputEvent {
        InputEvent::Key {
            key,
            state: KeyState::Pressed,
            modifiers: Modifiers::default(),
            repeat: false,
        }
    }

    #[test]
    fn key_press_and_release_track_held_set() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, press(Key::A));
        assert!(state.key_down(Key::A));

        state.apply_event(
            &mut frame,
            InputEvent::Key {
                key: Key::A,
                state: KeyState::Released,
                modifiers: Modifiers::default(),
                repeat: false,
            },
        );
        assert!(!state.key_down(Key::A));
        assert_eq!(frame.events.len(), 2);
    }

    #[test]
    fn focus_loss_clears_held_keys_and_buttons() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, press(Key::Shift));
        state.apply_event(
            &mut frame,
            InputEvent::PointerButton(PointerButtonEvent {
                button: MouseButton::Left,
                state: MouseButtonState::Pressed,
                pos: Some((4.0, 8.0)),
                modifiers: Modifiers::default(),
            }),
        );
        assert!(state.button_down(MouseButton::Left));

        state.apply_event(&mut frame, InputEvent::Focused(false));
        assert!(!state.key_down(Key::Shift));
        assert!(!state.button_down(MouseButton::Left));
    }

    #[test]
    fn pointer_position_follows_moves_and_leave() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, InputEvent::PointerMoved(PointerMoveEvent { x: 10.0, y: 20.0 }));
        assert_eq!(state.pointer_pos, Some((10.0, 20.0)));

        state.apply_event(&mut frame, InputEvent::PointerLeft);
        assert_eq!(state.pointer_pos, None);
    }

    #[test]
    fn release_outside_window_keeps_pointer_unknown() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, InputEvent::PointerMoved(PointerMoveEvent { x: 300.0, y: 200.0 }));
        state.apply_event(&mut frame, InputEvent::PointerLeft);
        state.apply_event(
            &mut frame,
            InputEvent::PointerButton(PointerButtonEvent {
                button: MouseButton::Left,
                state: MouseButtonState::Released,
                pos: None,
                modifiers: Modifiers::default(),
            }),
        );

        assert_eq!(state.pointer_pos, None);
        assert!(!state.button_down(MouseButton::Left));
    }

    #[test]
    fn events_are_recorded_in_arrival_order() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, press(Key::B));
        state.apply_event(&mut frame, InputEvent::Text(TextEvent { text: "b".into() }));

        assert_eq!(frame.events[0], press(Key::B));
        assert!(matches!(frame.events[1], InputEvent::Text(_)));

        frame.clear();
        assert!(frame.is_empty());
    }
}
