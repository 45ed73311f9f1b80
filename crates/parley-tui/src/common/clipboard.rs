//! Clipboard access.
//!
//! Tries the OSC 52 escape sequence first, which also works over SSH, then
//! the system clipboard through `arboard`.

use std::io::Write;

use base64::Engine;

/// Clipboard operation errors.
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("OSC 52 clipboard failed: {0}")]
    Osc52(String),
    #[error("System clipboard failed: {0}")]
    System(String),
}

/// Clipboard with transport fallbacks.
pub struct Clipboard;

impl Clipboard {
    /// Copies text, returning `Ok` if any transport succeeded.
    ///
    /// # Errors
    /// Returns the system clipboard error when both transports fail.
    pub fn copy(text: &str) -> Result<(), ClipboardError> {
        match Self::copy_osc52(text) {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::debug!("{e}; falling back to system clipboard");
                Self::copy_system(text)
            }
        }
    }

    fn copy_osc52(text: &str) -> Result<(), ClipboardError> {
        let mut stdout = std::io::stdout();
        stdout
            .write_all(osc52_sequence(text).as_bytes())
            .and_then(|()| stdout.flush())
            .map_err(|e| ClipboardError::Osc52(e.to_string()))
    }

    fn copy_system(text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError::System(e.to_string()))?;
        clipboard
            .set_text(text)
            .map_err(|e| ClipboardError::System(e.to_string()))
    }
}

/// `ESC ] 52 ; c ; <base64> ESC \`, targeting the system clipboard.
fn osc52_sequence(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text);
    format!("\x1b]52;c;{encoded}\x1b\\")
}
