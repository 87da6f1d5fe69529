// Single-slot clipboard
// Copy overwrites, paste hands out a deep clone and keeps the content

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClipboardError {
    #[error("Nothing to paste!")]
    Empty,
}

#[derive(Debug, Clone)]
pub struct Clipboard<T: Clone> {
    content: Option<T>,
}

impl<T: Clone> Default for Clipboard<T> {
    fn default() -> Self {
        Self { content: None }
    }
}

impl<T: Clone> Clipboard<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copy(&mut self, value: T) {
        self.content = Some(value);
    }

    pub fn paste(&self) -> Result<T, ClipboardError> {
        self.content.clone().ok_or(ClipboardError::Empty)
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_clipboard() {
        let clipboard: Clipboard<Vec<u8>> = Clipboard::new();
        assert!(clipboard.is_empty());
        assert_eq!(clipboard.paste(), Err(ClipboardError::Empty));
        assert_eq!(ClipboardError::Empty.to_string(), "Nothing to paste!");
    }

    #[test]
    fn test_copy_overwrites_and_paste_keeps() {
        let mut clipboard = Clipboard::new();
        clipboard.copy(vec![1, 2]);
        clipboard.copy(vec![3]);
        assert_eq!(clipboard.paste(), Ok(vec![3]));
        assert_eq!(clipboard.paste(), Ok(vec![3]));
    }
}
