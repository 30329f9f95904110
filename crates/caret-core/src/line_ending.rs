//! Line ending helpers.
//!
//! The document stores text internally using LF (`'\n'`) newlines. When a file that uses CRLF
//! (`"\r\n"`) is loaded, the content is normalized, and the detected line ending is re-applied
//! when the content is handed back for saving.

/// The preferred newline sequence used when saving a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// Unix-style LF (`'\n'`).
    #[default]
    Lf,
    /// Windows-style CRLF (`"\r\n"`).
    Crlf,
}

impl LineEnding {
    /// Detect the dominant line ending from raw content.
    ///
    /// Policy: if the input contains any CRLF, returns [`LineEnding::Crlf`], otherwise
    /// [`LineEnding::Lf`].
    pub fn detect(content: &[u8]) -> Self {
        if content.windows(2).any(|pair| pair == b"\r\n") {
            Self::Crlf
        } else {
            Self::Lf
        }
    }

    /// Replace every CRLF by LF. Lone `'\r'` bytes are kept.
    pub fn normalize(content: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(content.len());
        let mut i = 0;
        while i < content.len() {
            if content[i] == b'\r' && content.get(i + 1) == Some(&b'\n') {
                i += 1;
                continue;
            }
            out.push(content[i]);
            i += 1;
        }
        out
    }

    /// Convert LF-normalized content to this line ending for saving.
    pub fn apply(self, content: &[u8]) -> Vec<u8> {
        match self {
            Self::Lf => content.to_vec(),
            Self::Crlf => {
                let newlines = content.iter().filter(|&&b| b == b'\n').count();
                let mut out = Vec::with_capacity(content.len() + newlines);
                for &b in content {
                    if b == b'\n' {
                        out.push(b'\r');
                    }
                    out.push(b);
                }
                out
            }
        }
    }
}
