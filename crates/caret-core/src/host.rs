//! Interfaces to the host application: clipboard and file loading.
//!
//! The engine never touches the file system or a platform clipboard. Hosts hand it loaded bytes
//! and implement [`Clipboard`] over whatever backend they have.

use parking_lot::Mutex;

/// Clipboard collaborator used by copy, cut and paste.
pub trait Clipboard: Send + Sync {
    /// Current clipboard text (empty if unavailable).
    fn get(&self) -> String;

    /// Replace the clipboard text.
    fn set(&self, text: String);
}

/// In-process clipboard.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<String>,
}

impl MemoryClipboard {
    /// Create an empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for MemoryClipboard {
    fn get(&self) -> String {
        self.contents.lock().clone()
    }

    fn set(&self, text: String) {
        *self.contents.lock() = text;
    }
}

/// Result of a successful load by the file-I/O collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    /// Raw file bytes.
    pub content: Vec<u8>,
    /// Language key, usually from [`caret_lang::language_key_for_path`].
    pub language_key: String,
}

impl LoadedFile {
    /// Create a loaded file.
    pub fn new(content: impl Into<Vec<u8>>, language_key: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            language_key: language_key.into(),
        }
    }

    /// Create a loaded file, deriving the language key from `path`.
    pub fn from_path(path: &str, content: impl Into<Vec<u8>>) -> Self {
        Self::new(content, caret_lang::language_key_for_path(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_clipboard_round_trip() {
        let clipboard = MemoryClipboard::new();
        assert_eq!(clipboard.get(), "");
        clipboard.set("ell".to_string());
        assert_eq!(clipboard.get(), "ell");
    }

    #[test]
    fn test_loaded_file_from_path() {
        let file = LoadedFile::from_path("src/main.rs", b"fn main() {}".to_vec());
        assert_eq!(file.language_key, "rust");
    }
}
