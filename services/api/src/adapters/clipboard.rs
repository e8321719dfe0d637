//! services/api/src/adapters/clipboard.rs
//!
//! The system clipboard behind the `ClipboardService` port.

use lookup_core::ports::{ClipboardError, ClipboardService};

pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        arboard::Clipboard::new()
            .map(|inner| Self { inner })
            .map_err(|e| ClipboardError::Copy(e.to_string()))
    }
}

impl ClipboardService for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.inner
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::Copy(e.to_string()))
    }

    fn read_text(&mut self) -> Result<String, ClipboardError> {
        self.inner
            .get_text()
            .map_err(|e| ClipboardError::Paste(e.to_string()))
    }
}
