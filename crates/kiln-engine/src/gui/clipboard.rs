use imgui::ClipboardBackend;

/// System clipboard backend for ImGui text widgets.
pub struct ArboardClipboard {
    clipboard: arboard::Clipboard,
}

impl ArboardClipboard {
    /// Opens the system clipboard. Returns `None` where none is available
    /// (headless sessions, missing display server).
    pub fn new() -> Option<Self> {
        match arboard::Clipboard::new() {
            Ok(clipboard) => Some(Self { clipboard }),
            Err(e) => {
                log::warn!("system clipboard unavailable: {e}");
                None
            }
        }
    }

    /// Installs the system clipboard on `ctx`. Returns whether one was found;
    /// without it ImGui keeps its process-local clipboard.
    pub fn install(ctx: &mut imgui::Context) -> bool {
        match Self::new() {
            Some(backend) => {
                ctx.set_clipboard_backend(backend);
                true
            }
            None => false,
        }
    }
}

impl ClipboardBackend for ArboardClipboard {
    fn get(&mut self) -> Option<String> {
        self.clipboard.get_text().ok()
    }

    fn set(&mut self, value: &str) {
        if let Err(e) = self.clipboard.set_text(value) {
            log::warn!("clipboard write failed: {e}");
        }
    }
}
