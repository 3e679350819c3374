use copypasta::{ClipboardContext, ClipboardProvider};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("nothing to copy")]
    Empty,
    #[error("{0}")]
    Backend(String),
}

pub trait Clipboard {
    fn write_all(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The desktop clipboard. A fresh context is opened per copy.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn write_all(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut ctx =
            ClipboardContext::new().map_err(|err| ClipboardError::Backend(err.to_string()))?;
        ctx.set_contents(text.to_string())
            .map_err(|err| ClipboardError::Backend(err.to_string()))
    }
}
