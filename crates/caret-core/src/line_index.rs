//! Logical line index.
//!
//! Maps between byte offsets and line numbers using the sorted list of line-start offsets.
//! The index is rebuilt from the full text after every committed edit: documents are bounded
//! by the load-time truncation limit, so an O(n) rescan stays cheap next to editing latency.

/// Line-start offsets of a byte buffer.
///
/// Invariant: `line_starts` is strictly increasing and `line_starts[0] == 0`. A text with `N`
/// newline bytes has `N + 1` lines (a trailing `\n` yields an empty last line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    text_len: usize,
}

impl LineIndex {
    /// Create the index of an empty document (one empty line).
    pub fn new() -> Self {
        Self {
            line_starts: vec![0],
            text_len: 0,
        }
    }

    /// Build the index from text.
    pub fn from_bytes(text: &[u8]) -> Self {
        let mut index = Self::new();
        index.rebuild(text);
        index
    }

    /// Rescan `text` for line terminators.
    pub fn rebuild(&mut self, text: &[u8]) {
        self.line_starts.clear();
        self.line_starts.push(0);
        self.line_starts.extend(
            text.iter()
                .enumerate()
                .filter(|&(_, &b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        self.text_len = text.len();
    }

    /// Line-start offsets.
    pub fn line_starts(&self) -> &[usize] {
        &self.line_starts
    }

    /// Total line count (always at least 1).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte length of the text this index was built from.
    pub fn text_len(&self) -> usize {
        self.text_len
    }

    /// Index of the last line.
    pub fn last_line(&self) -> usize {
        self.line_starts.len() - 1
    }

    /// Line containing `offset` (upper bound minus one). Offsets past the end map to the last line.
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1)
    }

    /// Start offset of `line`, clamped to the last line.
    pub fn line_start(&self, line: usize) -> usize {
        self.line_starts[line.min(self.last_line())]
    }

    /// End offset of `line`, excluding its `\n` terminator.
    pub fn line_end(&self, line: usize) -> usize {
        let line = line.min(self.last_line());
        match self.line_starts.get(line + 1) {
            Some(&next_start) => next_start - 1,
            None => self.text_len,
        }
    }

    /// Byte length of `line`, excluding its terminator.
    pub fn line_len(&self, line: usize) -> usize {
        self.line_end(line) - self.line_start(line)
    }

    /// Convert an offset to `(line, byte column)`.
    pub fn position_of(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.text_len);
        let line = self.line_of(offset);
        (line, offset - self.line_starts[line])
    }

    /// Convert `(line, byte column)` to an offset, clamping both to valid bounds.
    ///
    /// The result is not snapped to a UTF-8 boundary; callers holding the text should apply
    /// [`crate::utf8::snap_to_char_boundary`].
    pub fn offset_of(&self, line: usize, column: usize) -> usize {
        let line = line.min(self.last_line());
        self.line_start(line) + column.min(self.line_len(line))
    }
}

impl Default for LineIndex {
    fn default() -> Self {
        Self::new()
    }
}
