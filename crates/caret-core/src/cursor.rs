//! Cursor and selection state machine.
//!
//! [`CursorState`] holds a caret and an anchor/head selection over a [`TextDocument`]. Movement
//! operations only touch the state; editing operations mutate the document and return the
//! touched byte range (in post-edit coordinates) so that the caller can rebuild the line index,
//! record an undo snapshot and request highlighting.
//!
//! Every offset stored here sits on a UTF-8 code-point boundary.

use std::ops::Range;

use tracing::debug;

use crate::config::IndentUnit;
use crate::document::TextDocument;
use crate::line_index::LineIndex;
use crate::utf8::{
    CharClass, char_class_at, next_char_boundary, next_grapheme_boundary, prev_char_boundary,
    prev_grapheme_boundary, snap_to_char_boundary,
};

/// Spaces removed by unindent when the unit is a tab and the line is space-indented.
const TAB_UNINDENT_SPACES: usize = 4;

/// Caret movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// One grapheme left.
    Left,
    /// One grapheme right.
    Right,
    /// One line up, keeping the byte column.
    Up,
    /// One line down, keeping the byte column.
    Down,
    /// To the start of the previous word.
    WordLeft,
    /// To the end of the next word.
    WordRight,
    /// Start of the current line.
    LineStart,
    /// End of the current line.
    LineEnd,
    /// Offset 0.
    DocumentStart,
    /// End of the document.
    DocumentEnd,
}

/// Caret position plus anchor/head selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorState {
    /// Caret offset.
    pub cursor_pos: usize,
    /// Selection anchor.
    pub selection_start: usize,
    /// Selection head (follows the caret while extending).
    pub selection_end: usize,
    /// Whether a selection is active.
    pub is_selecting: bool,
}

impl CursorState {
    /// A caret at `offset` with no selection.
    pub fn at(offset: usize) -> Self {
        Self {
            cursor_pos: offset,
            selection_start: offset,
            selection_end: offset,
            is_selecting: false,
        }
    }

    /// Returns `true` if a non-empty selection is active.
    pub fn has_selection(&self) -> bool {
        self.is_selecting && self.selection_start != self.selection_end
    }

    /// Normalized selection range, or `None` if nothing is selected.
    pub fn selection_range(&self) -> Option<Range<usize>> {
        self.has_selection().then(|| {
            self.selection_start.min(self.selection_end)..self.selection_start.max(self.selection_end)
        })
    }

    /// Drop the selection, keeping the caret.
    pub fn clear_selection(&mut self) {
        self.selection_start = self.cursor_pos;
        self.selection_end = self.cursor_pos;
        self.is_selecting = false;
    }

    /// Place the caret at `offset` (clamped and snapped) and drop the selection.
    pub fn set_position(&mut self, text: &[u8], offset: usize) {
        *self = Self::at(snap_to_char_boundary(text, offset));
    }

    fn place(&mut self, target: usize, extend: bool) {
        if extend {
            if !self.is_selecting {
                self.selection_start = self.cursor_pos;
                self.is_selecting = true;
            }
            self.selection_end = target;
            self.cursor_pos = target;
            if self.selection_start == self.selection_end {
                self.is_selecting = false;
            }
        } else {
            *self = Self::at(target);
        }
    }

    /// Move the caret.
    ///
    /// With `extend` the anchor stays and the head moves. Without it an active selection
    /// collapses: `Left` to its start, `Right` to its end, any other direction moves from the
    /// caret.
    pub fn move_cursor(
        &mut self,
        document: &TextDocument,
        index: &LineIndex,
        direction: Direction,
        extend: bool,
    ) {
        let text = document.text();
        let pos = snap_to_char_boundary(text, self.cursor_pos);

        if !extend && let Some(selection) = self.selection_range() {
            match direction {
                Direction::Left => return self.place(selection.start, false),
                Direction::Right => return self.place(selection.end, false),
                _ => {}
            }
        }

        let target = match direction {
            Direction::Left => step_left(text, pos),
            Direction::Right => step_right(text, pos),
            Direction::Up => {
                let (line, column) = index.position_of(pos);
                if line == 0 {
                    0
                } else {
                    snap_to_char_boundary(text, index.offset_of(line - 1, column))
                }
            }
            Direction::Down => {
                let (line, column) = index.position_of(pos);
                if line >= index.last_line() {
                    text.len()
                } else {
                    snap_to_char_boundary(text, index.offset_of(line + 1, column))
                }
            }
            Direction::WordLeft => word_left(text, pos),
            Direction::WordRight => word_right(text, pos),
            Direction::LineStart => index.line_start(index.line_of(pos)),
            Direction::LineEnd => snap_to_char_boundary(text, index.line_end(index.line_of(pos))),
            Direction::DocumentStart => 0,
            Direction::DocumentEnd => text.len(),
        };
        self.place(target.min(text.len()), extend);
    }

    /// Move the caret to an externally computed offset (e.g. a mouse click).
    pub fn move_to(&mut self, text: &[u8], offset: usize, extend: bool) {
        self.place(snap_to_char_boundary(text, offset), extend);
    }

    /// Select `anchor..head` (both snapped); the caret goes to `head`.
    pub fn select_range(&mut self, text: &[u8], anchor: usize, head: usize) {
        let anchor = snap_to_char_boundary(text, anchor);
        let head = snap_to_char_boundary(text, head);
        self.selection_start = anchor;
        self.selection_end = head;
        self.cursor_pos = head;
        self.is_selecting = anchor != head;
    }

    /// Select the run of same-class characters around `offset`.
    pub fn select_word_at(&mut self, text: &[u8], offset: usize) {
        let offset = snap_to_char_boundary(text, offset);
        if text.is_empty() {
            return self.set_position(text, 0);
        }
        let pivot = if offset == text.len() {
            prev_char_boundary(text, offset)
        } else {
            offset
        };
        let class = char_class_at(text, pivot);

        let mut start = pivot;
        while start > 0 {
            let prev = prev_char_boundary(text, start);
            if char_class_at(text, prev) != class {
                break;
            }
            start = prev;
        }
        let mut end = pivot;
        while end < text.len() && char_class_at(text, end) == class {
            end = next_char_boundary(text, end);
        }
        self.select_range(text, start, end);
    }

    /// Select from 0 to `min(len, max_bytes)`, snapped.
    pub fn select_all(&mut self, text: &[u8], max_bytes: usize) {
        let end = snap_to_char_boundary(text, text.len().min(max_bytes));
        if end < text.len() {
            debug!(len = text.len(), max_bytes, "select-all truncated");
        }
        self.select_range(text, 0, end);
    }

    /// Selected bytes, if any.
    pub fn copy_selection(&self, document: &TextDocument) -> Option<Vec<u8>> {
        self.selection_range()
            .map(|range| document.slice(range).to_vec())
    }

    /// Remove the selected range. Returns the touched range (empty, at the removal point).
    pub fn delete_selection(&mut self, document: &mut TextDocument) -> Option<Range<usize>> {
        let selection = self.selection_range()?;
        let removed = document.erase(selection.start, selection.end);
        *self = Self::at(removed.start);
        Some(removed.start..removed.start)
    }

    /// Backspace: removes the selection, or the character before the caret.
    pub fn delete_backward(&mut self, document: &mut TextDocument) -> Option<Range<usize>> {
        if self.has_selection() {
            return self.delete_selection(document);
        }
        let pos = snap_to_char_boundary(document.text(), self.cursor_pos);
        if pos == 0 {
            self.clear_selection();
            return None;
        }
        let prev = prev_char_boundary(document.text(), pos);
        let removed = document.erase(prev, pos);
        *self = Self::at(removed.start);
        Some(removed.start..removed.start)
    }

    /// Delete: removes the selection, or the character after the caret. The caret stays.
    pub fn delete_forward(&mut self, document: &mut TextDocument) -> Option<Range<usize>> {
        if self.has_selection() {
            return self.delete_selection(document);
        }
        let pos = snap_to_char_boundary(document.text(), self.cursor_pos);
        if pos >= document.len() {
            self.clear_selection();
            return None;
        }
        let next = next_char_boundary(document.text(), pos);
        let removed = document.erase(pos, next);
        *self = Self::at(removed.start);
        Some(removed.start..removed.start)
    }

    /// Replace the selection (if any) with `bytes` and put the caret after them.
    pub fn insert_text(&mut self, document: &mut TextDocument, bytes: &[u8]) -> Option<Range<usize>> {
        let deleted = self.delete_selection(document);
        if bytes.is_empty() {
            return deleted;
        }
        let inserted = document.insert(self.cursor_pos, bytes);
        *self = Self::at(inserted.end);
        Some(inserted)
    }

    /// Paste clipboard text. Same as [`CursorState::insert_text`].
    pub fn paste_text(&mut self, document: &mut TextDocument, content: &str) -> Option<Range<usize>> {
        self.insert_text(document, content.as_bytes())
    }

    /// Lines covered by the selection (or the caret line).
    ///
    /// A multi-line selection that ends exactly at a line start does not cover that line.
    fn covered_lines(&self, index: &LineIndex) -> Range<usize> {
        let range = self
            .selection_range()
            .unwrap_or(self.cursor_pos..self.cursor_pos);
        let first = index.line_of(range.start);
        let mut last = index.line_of(range.end);
        if last > first && index.line_start(last) == range.end {
            last -= 1;
        }
        first..last + 1
    }

    /// Indent.
    ///
    /// Without a selection one unit is inserted at the caret. With one, a unit is inserted at
    /// the start of every covered line; each stored offset `p` becomes `p + unit * k` where `k`
    /// is the number of edit points strictly before `p`.
    pub fn indent(
        &mut self,
        document: &mut TextDocument,
        index: &LineIndex,
        unit: IndentUnit,
    ) -> Option<Range<usize>> {
        let bytes = unit.bytes();
        if !self.has_selection() {
            let inserted = document.insert(self.cursor_pos, &bytes);
            *self = Self::at(inserted.end);
            return Some(inserted);
        }

        let lines = self.covered_lines(index);
        let points: Vec<usize> = lines.clone().map(|line| index.line_start(line)).collect();
        let region_end = index.line_end(lines.end - 1);

        for &point in points.iter().rev() {
            document.insert(point, &bytes);
        }

        let shift = |p: usize| p + bytes.len() * points.iter().filter(|&&point| point < p).count();
        self.cursor_pos = shift(self.cursor_pos);
        self.selection_start = shift(self.selection_start);
        self.selection_end = shift(self.selection_end);

        Some(points[0]..region_end + bytes.len() * points.len())
    }

    /// Unindent every covered line: a leading tab, or up to one unit of leading spaces.
    ///
    /// Offsets inside removed indentation clamp to the line start.
    pub fn unindent(
        &mut self,
        document: &mut TextDocument,
        index: &LineIndex,
        unit: IndentUnit,
    ) -> Option<Range<usize>> {
        let max_spaces = match unit {
            IndentUnit::Tab => TAB_UNINDENT_SPACES,
            IndentUnit::Spaces(_) => unit.len(),
        };

        let lines = self.covered_lines(index);
        let region_end = index.line_end(lines.end - 1);
        let removals: Vec<Range<usize>> = {
            let text = document.text();
            lines
                .clone()
                .filter_map(|line| {
                    let start = index.line_start(line);
                    let end = index.line_end(line);
                    let removed = match text.get(start) {
                        Some(b'\t') => 1,
                        _ => text[start..end]
                            .iter()
                            .take(max_spaces)
                            .take_while(|&&b| b == b' ')
                            .count(),
                    };
                    (removed > 0).then_some(start..start + removed)
                })
                .collect()
        };
        if removals.is_empty() {
            return None;
        }

        for removal in removals.iter().rev() {
            document.erase(removal.start, removal.end);
        }

        let total: usize = removals.iter().map(|r| r.len()).sum();
        let shift = |p: usize| {
            let mut removed_before = 0;
            for removal in &removals {
                if p >= removal.end {
                    removed_before += removal.len();
                } else if p > removal.start {
                    removed_before += p - removal.start;
                }
            }
            p - removed_before
        };
        self.cursor_pos = shift(self.cursor_pos);
        self.selection_start = shift(self.selection_start);
        self.selection_end = shift(self.selection_end);
        if self.selection_start == self.selection_end {
            self.is_selecting = false;
        }

        let start = index.line_start(lines.start);
        Some(start..region_end - total)
    }
}

fn line_start_before(text: &[u8], pos: usize) -> usize {
    text[..pos]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |newline| newline + 1)
}

fn step_left(text: &[u8], pos: usize) -> usize {
    if pos == 0 {
        return 0;
    }
    let line_start = line_start_before(text, pos);
    if pos == line_start {
        // Step over the newline ending the previous line.
        return pos - 1;
    }
    prev_grapheme_boundary(text, line_start, pos)
}

fn step_right(text: &[u8], pos: usize) -> usize {
    if pos >= text.len() {
        return text.len();
    }
    if text[pos] == b'\n' {
        return pos + 1;
    }
    next_grapheme_boundary(text, line_start_before(text, pos), pos)
}

fn word_left(text: &[u8], pos: usize) -> usize {
    let mut pos = pos;
    while pos > 0 && char_class_at(text, prev_char_boundary(text, pos)) == CharClass::Whitespace {
        pos = prev_char_boundary(text, pos);
    }
    if pos > 0 {
        let class = char_class_at(text, prev_char_boundary(text, pos));
        while pos > 0 && char_class_at(text, prev_char_boundary(text, pos)) == class {
            pos = prev_char_boundary(text, pos);
        }
    }
    pos
}

fn word_right(text: &[u8], pos: usize) -> usize {
    let mut pos = pos;
    while pos < text.len() && char_class_at(text, pos) == CharClass::Whitespace {
        pos = next_char_boundary(text, pos);
    }
    if pos < text.len() {
        let class = char_class_at(text, pos);
        while pos < text.len() && char_class_at(text, pos) == class {
            pos = next_char_boundary(text, pos);
        }
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn setup(text: &str) -> (TextDocument, LineIndex) {
        let doc = TextDocument::from_bytes(text.as_bytes().to_vec());
        let index = LineIndex::from_bytes(doc.text());
        (doc, index)
    }

    fn text_of(doc: &TextDocument) -> &str {
        std::str::from_utf8(doc.text()).unwrap()
    }

    #[test]
    fn test_insert_into_empty_document() {
        let (mut doc, _) = setup("");
        let mut cursor = CursorState::default();
        assert_eq!(cursor.insert_text(&mut doc, b"ab\ncd"), Some(0..5));
        assert_eq!(cursor.cursor_pos, 5);
        assert_eq!(LineIndex::from_bytes(doc.text()).line_starts(), &[0, 3]);
    }

    #[test]
    fn test_insert_replaces_selection() {
        let (mut doc, _) = setup("hello world");
        let mut cursor = CursorState::default();
        cursor.select_range(doc.text(), 6, 11);
        cursor.insert_text(&mut doc, b"there");
        assert_eq!(text_of(&doc), "hello there");
        assert_eq!(cursor, CursorState::at(11));
        assert_eq!(doc.colors().len(), doc.len());
    }

    #[test]
    fn test_cut_scenario_pieces() {
        let (mut doc, _) = setup("hello");
        let mut cursor = CursorState::default();
        cursor.select_range(doc.text(), 1, 4);
        assert_eq!(cursor.copy_selection(&doc), Some(b"ell".to_vec()));
        assert_eq!(cursor.delete_selection(&mut doc), Some(1..1));
        assert_eq!(text_of(&doc), "ho");
        assert_eq!(cursor.cursor_pos, 1);
    }

    #[test]
    fn test_delete_backward_and_forward() {
        let (mut doc, _) = setup("a你b");
        let mut cursor = CursorState::at(4);
        cursor.delete_backward(&mut doc);
        assert_eq!(text_of(&doc), "ab");
        assert_eq!(cursor.cursor_pos, 1);

        cursor.delete_forward(&mut doc);
        assert_eq!(text_of(&doc), "a");
        assert_eq!(cursor.cursor_pos, 1);
        assert_eq!(cursor.delete_forward(&mut doc), None);

        let mut start = CursorState::at(0);
        assert_eq!(start.delete_backward(&mut doc), None);
    }

    #[test]
    fn test_horizontal_movement_by_grapheme() {
        let (doc, index) = setup("xe\u{301}y\nz");
        let mut cursor = CursorState::at(1);
        cursor.move_cursor(&doc, &index, Direction::Right, false);
        assert_eq!(cursor.cursor_pos, 4);
        cursor.move_cursor(&doc, &index, Direction::Right, false);
        cursor.move_cursor(&doc, &index, Direction::Right, false);
        assert_eq!(cursor.cursor_pos, 6);
        cursor.move_cursor(&doc, &index, Direction::Left, false);
        assert_eq!(cursor.cursor_pos, 5);
        cursor.move_cursor(&doc, &index, Direction::Left, false);
        assert_eq!(cursor.cursor_pos, 4);
        cursor.move_cursor(&doc, &index, Direction::Left, false);
        assert_eq!(cursor.cursor_pos, 1);
    }

    #[test]
    fn test_vertical_movement_keeps_column_and_clamps() {
        let (doc, index) = setup("abcdef\nab\nabcd");
        let mut cursor = CursorState::at(5);
        cursor.move_cursor(&doc, &index, Direction::Down, false);
        assert_eq!(cursor.cursor_pos, 9);
        cursor.move_cursor(&doc, &index, Direction::Down, false);
        assert_eq!(cursor.cursor_pos, 12);
        cursor.move_cursor(&doc, &index, Direction::Down, false);
        assert_eq!(cursor.cursor_pos, doc.len());

        let mut top = CursorState::at(3);
        top.move_cursor(&doc, &index, Direction::Up, false);
        assert_eq!(top.cursor_pos, 0);
    }

    #[test]
    fn test_vertical_movement_snaps_into_multibyte_line() {
        let (doc, index) = setup("abcd\n你好");
        let mut cursor = CursorState::at(2);
        cursor.move_cursor(&doc, &index, Direction::Down, false);
        assert_eq!(cursor.cursor_pos, 5);
    }

    #[test]
    fn test_extend_then_collapse() {
        let (doc, index) = setup("hello world");
        let mut cursor = CursorState::at(2);
        cursor.move_cursor(&doc, &index, Direction::WordRight, true);
        assert_eq!(cursor.selection_range(), Some(2..5));
        cursor.move_cursor(&doc, &index, Direction::Left, false);
        assert_eq!(cursor, CursorState::at(2));

        cursor.move_cursor(&doc, &index, Direction::LineEnd, true);
        cursor.move_cursor(&doc, &index, Direction::Right, false);
        assert_eq!(cursor, CursorState::at(11));
    }

    #[test]
    fn test_word_movement() {
        let (doc, index) = setup("foo  bar.baz");
        let mut cursor = CursorState::at(0);
        cursor.move_cursor(&doc, &index, Direction::WordRight, false);
        assert_eq!(cursor.cursor_pos, 3);
        cursor.move_cursor(&doc, &index, Direction::WordRight, false);
        assert_eq!(cursor.cursor_pos, 8);
        cursor.move_cursor(&doc, &index, Direction::WordLeft, false);
        assert_eq!(cursor.cursor_pos, 5);
    }

    #[test]
    fn test_select_word_and_select_all_cap() {
        let (doc, _) = setup("let value = 1;");
        let mut cursor = CursorState::default();
        cursor.select_word_at(doc.text(), 6);
        assert_eq!(cursor.selection_range(), Some(4..9));

        let (doc, _) = setup("ab你");
        cursor.select_all(doc.text(), 3);
        assert_eq!(cursor.selection_range(), Some(0..2));
        cursor.select_all(doc.text(), usize::MAX);
        assert_eq!(cursor.selection_range(), Some(0..5));
    }

    #[test]
    fn test_move_to_snaps() {
        let (doc, _) = setup("你好");
        let mut cursor = CursorState::default();
        cursor.move_to(doc.text(), 4, false);
        assert_eq!(cursor.cursor_pos, 3);
        cursor.move_to(doc.text(), 100, true);
        assert_eq!(cursor.selection_range(), Some(3..6));
    }

    #[test]
    fn test_indent_without_selection_inserts_at_caret() {
        let (mut doc, index) = setup("ab");
        let mut cursor = CursorState::at(1);
        assert_eq!(
            cursor.indent(&mut doc, &index, IndentUnit::Spaces(2)),
            Some(1..3)
        );
        assert_eq!(text_of(&doc), "a  b");
        assert_eq!(cursor.cursor_pos, 3);
    }

    #[test]
    fn test_indent_multi_line_shift_rule() {
        let (mut doc, index) = setup("one\ntwo\nthree\n");
        let mut cursor = CursorState::default();
        // Anchor at the start of line 0, head inside line 1.
        cursor.select_range(doc.text(), 0, 5);
        let touched = cursor.indent(&mut doc, &index, IndentUnit::Tab);
        assert_eq!(text_of(&doc), "\tone\n\ttwo\nthree\n");
        assert_eq!(touched, Some(0..9));
        // 0 is at an edit point: no shift. 5 has two edit points before it.
        assert_eq!(cursor.selection_start, 0);
        assert_eq!(cursor.selection_end, 7);
        assert_eq!(cursor.cursor_pos, 7);
        assert_eq!(doc.colors().len(), doc.len());
    }

    #[test]
    fn test_indent_excludes_line_starting_at_selection_end() {
        let (mut doc, index) = setup("a\nb\nc");
        let mut cursor = CursorState::default();
        cursor.select_range(doc.text(), 0, 4);
        cursor.indent(&mut doc, &index, IndentUnit::Spaces(2));
        assert_eq!(text_of(&doc), "  a\n  b\nc");
        assert_eq!(cursor.selection_range(), Some(0..8));
    }

    #[test]
    fn test_unindent_clamps_positions_inside_indentation() {
        let (mut doc, index) = setup("    a\n\tb\nc");
        let mut cursor = CursorState::default();
        cursor.select_range(doc.text(), 2, 8);
        let touched = cursor.unindent(&mut doc, &index, IndentUnit::Spaces(4));
        assert_eq!(text_of(&doc), "a\nb\nc");
        assert_eq!(touched, Some(0..3));
        assert_eq!(cursor.selection_start, 0);
        assert_eq!(cursor.selection_end, 3);
    }

    #[test]
    fn test_unindent_without_indentation_is_noop() {
        let (mut doc, index) = setup("abc");
        let mut cursor = CursorState::at(1);
        assert_eq!(cursor.unindent(&mut doc, &index, IndentUnit::Tab), None);
        assert_eq!(text_of(&doc), "abc");
    }
}
