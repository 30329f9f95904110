//! UTF-8 boundary helpers over raw byte buffers.
//!
//! The document stores bytes, not `String`s: files are not guaranteed to be valid UTF-8. These
//! helpers keep every externally visible offset on a code-point boundary regardless.

use unicode_segmentation::GraphemeCursor;

/// Returns `true` for UTF-8 continuation bytes (`0b10xx_xxxx`).
#[inline]
pub fn is_continuation_byte(byte: u8) -> bool {
    byte & 0b1100_0000 == 0b1000_0000
}

/// Length of the sequence a lead byte announces. Stray continuation and invalid bytes count as
/// one-byte code points.
#[inline]
fn sequence_len(lead: u8) -> usize {
    match lead {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}

/// Snap `offset` to the nearest code-point boundary at or before it.
///
/// Only walks back into a sequence whose lead byte actually covers `offset`, so a stray
/// continuation byte is its own boundary and a line start never snaps into the previous line.
/// Offsets past the end clamp to `text.len()`.
pub fn snap_to_char_boundary(text: &[u8], offset: usize) -> usize {
    let offset = offset.min(text.len());
    if offset == text.len() || !is_continuation_byte(text[offset]) {
        return offset;
    }
    for back in 1..=3 {
        let Some(candidate) = offset.checked_sub(back) else {
            break;
        };
        let byte = text[candidate];
        if !is_continuation_byte(byte) {
            return if sequence_len(byte) > back { candidate } else { offset };
        }
    }
    offset
}

/// Offset of the code point that ends at `offset` (i.e. one character to the left).
pub fn prev_char_boundary(text: &[u8], offset: usize) -> usize {
    let offset = snap_to_char_boundary(text, offset);
    if offset == 0 {
        return 0;
    }
    snap_to_char_boundary(text, offset - 1)
}

/// Offset right after the code point that starts at `offset`.
pub fn next_char_boundary(text: &[u8], offset: usize) -> usize {
    let offset = snap_to_char_boundary(text, offset);
    if offset >= text.len() {
        return text.len();
    }
    let limit = (offset + sequence_len(text[offset])).min(text.len());
    let mut next = offset + 1;
    while next < limit && is_continuation_byte(text[next]) {
        next += 1;
    }
    next
}

/// Previous grapheme boundary inside `line` (which starts at document offset `line_start`).
///
/// Falls back to [`prev_char_boundary`] when the line is not valid UTF-8.
pub(crate) fn prev_grapheme_boundary(text: &[u8], line_start: usize, offset: usize) -> usize {
    let line_end = line_end_from(text, offset);
    if let Ok(line) = std::str::from_utf8(&text[line_start..line_end]) {
        let rel = offset - line_start;
        if rel > 0 && line.is_char_boundary(rel) {
            let mut cursor = GraphemeCursor::new(rel, line.len(), true);
            if let Ok(Some(prev)) = cursor.prev_boundary(line, 0) {
                return line_start + prev;
            }
        }
    }
    prev_char_boundary(text, offset)
}

/// Next grapheme boundary inside the line containing `offset`.
pub(crate) fn next_grapheme_boundary(text: &[u8], line_start: usize, offset: usize) -> usize {
    let line_end = line_end_from(text, offset);
    if let Ok(line) = std::str::from_utf8(&text[line_start..line_end]) {
        let rel = offset - line_start;
        if rel < line.len() && line.is_char_boundary(rel) {
            let mut cursor = GraphemeCursor::new(rel, line.len(), true);
            if let Ok(Some(next)) = cursor.next_boundary(line, 0) {
                return line_start + next;
            }
        }
    }
    next_char_boundary(text, offset)
}

fn line_end_from(text: &[u8], offset: usize) -> usize {
    text[offset..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(text.len(), |rel| offset + rel)
}

/// Character class used by word-wise movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CharClass {
    Whitespace,
    Word,
    Punctuation,
}

/// Classify the code point starting at `offset`.
pub(crate) fn char_class_at(text: &[u8], offset: usize) -> CharClass {
    let end = next_char_boundary(text, offset);
    match std::str::from_utf8(&text[offset..end])
        .ok()
        .and_then(|s| s.chars().next())
    {
        Some(ch) if ch.is_whitespace() => CharClass::Whitespace,
        Some(ch) if ch.is_alphanumeric() || ch == '_' => CharClass::Word,
        Some(_) => CharClass::Punctuation,
        // Invalid sequences are treated as part of a word so they move with their neighbours.
        None => CharClass::Word,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_walks_back_over_continuation_bytes() {
        let text = "a你b".as_bytes(); // 'a' 0, '你' 1..4, 'b' 4
        assert_eq!(snap_to_char_boundary(text, 0), 0);
        assert_eq!(snap_to_char_boundary(text, 2), 1);
        assert_eq!(snap_to_char_boundary(text, 3), 1);
        assert_eq!(snap_to_char_boundary(text, 4), 4);
        assert_eq!(snap_to_char_boundary(text, 99), text.len());
    }

    #[test]
    fn test_prev_next_char_boundary() {
        let text = "a你b".as_bytes();
        assert_eq!(next_char_boundary(text, 1), 4);
        assert_eq!(prev_char_boundary(text, 4), 1);
        assert_eq!(prev_char_boundary(text, 0), 0);
        assert_eq!(next_char_boundary(text, 5), 5);
    }

    #[test]
    fn test_stray_continuation_byte_is_its_own_boundary() {
        // 'a' '\n' 0x80 'b': the stray byte starts line 1.
        let text = [b'a', b'\n', 0x80, b'b'];
        assert_eq!(snap_to_char_boundary(&text, 2), 2);
        assert_eq!(next_char_boundary(&text, 1), 2);
        assert_eq!(next_char_boundary(&text, 2), 3);
        assert_eq!(prev_char_boundary(&text, 3), 2);
        assert_eq!(prev_char_boundary(&text, 2), 1);
    }

    #[test]
    fn test_truncated_and_overlong_runs() {
        // A two-byte lead followed by two continuation bytes: the second one stands alone.
        let text = [0xC3, 0xA9, 0xA9, b'x'];
        assert_eq!(snap_to_char_boundary(&text, 1), 0);
        assert_eq!(snap_to_char_boundary(&text, 2), 2);
        assert_eq!(next_char_boundary(&text, 0), 2);
        assert_eq!(next_char_boundary(&text, 2), 3);

        let run = [0x80, 0x80, 0x80, 0x80, 0x80];
        assert_eq!(snap_to_char_boundary(&run, 3), 3);
        assert_eq!(next_char_boundary(&run, 0), 1);
    }

    #[test]
    fn test_grapheme_movement_keeps_combining_marks() {
        // "e" + COMBINING ACUTE ACCENT is one grapheme of 3 bytes.
        let text = "xe\u{301}y".as_bytes();
        assert_eq!(next_grapheme_boundary(text, 0, 1), 4);
        assert_eq!(prev_grapheme_boundary(text, 0, 4), 1);
    }

    #[test]
    fn test_grapheme_movement_on_invalid_utf8_falls_back() {
        let text = [b'a', 0xFF, b'b'];
        assert_eq!(next_grapheme_boundary(&text, 0, 0), 1);
        assert_eq!(prev_grapheme_boundary(&text, 0, 2), 1);
    }

    #[test]
    fn test_char_class() {
        let text = b"a _;";
        assert_eq!(char_class_at(text, 0), CharClass::Word);
        assert_eq!(char_class_at(text, 1), CharClass::Whitespace);
        assert_eq!(char_class_at(text, 2), CharClass::Word);
        assert_eq!(char_class_at(text, 3), CharClass::Punctuation);
    }
}
