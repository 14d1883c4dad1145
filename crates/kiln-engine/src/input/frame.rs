use super::types::InputEvent;

/// Per-frame input deltas.
///
/// `InputState` holds the current state; `InputFrame` holds the events that
/// arrived since the last rendered frame, in arrival order. The runtime
/// clears it after each `on_frame` call.
#[derive(Debug, Default)]
pub struct InputFrame {
    pub events: Vec<InputEvent>,
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn push_event(&mut self, ev: InputEvent) {
        self.events.push(ev);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
