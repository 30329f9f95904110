//! Text document: a byte buffer plus its parallel per-byte color annotation.
//!
//! # Invariant
//!
//! `colors.len() == text.len()` holds whenever a public method returns. Every mutation touches
//! both buffers in lockstep while the color lock is held, and bumps the buffer's edit epoch so
//! that a highlight job computed against older content can never publish over it.

use std::ops::Range;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::utf8::{next_char_boundary, snap_to_char_boundary};

/// A color annotation for one byte of text (packed `0xRRGGBBAA`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorTag(pub u32);

impl ColorTag {
    /// The uniform color used for plain text, fresh insertions and fallbacks.
    pub const DEFAULT: ColorTag = ColorTag::rgb(0xD4, 0xD4, 0xD4);

    /// Build an opaque color from its components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 0xFF)
    }

    /// Build a color from its components.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        ColorTag(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | a as u32)
    }

    /// `(r, g, b, a)` components.
    pub const fn components(self) -> (u8, u8, u8, u8) {
        (
            (self.0 >> 24) as u8,
            (self.0 >> 16) as u8,
            (self.0 >> 8) as u8,
            self.0 as u8,
        )
    }
}

impl Default for ColorTag {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The color buffer together with its edit epoch.
#[derive(Debug, Default)]
pub struct ColorBuffer {
    /// One tag per document byte.
    pub tags: Vec<ColorTag>,
    epoch: u64,
}

impl ColorBuffer {
    /// Epoch of the last synchronous edit.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Shared handle to a document's color buffer.
///
/// Cloning the handle shares the buffer. The mutex is held only for splices, snapshots and
/// the highlight publish swap.
#[derive(Debug, Clone, Default)]
pub struct SharedColors {
    inner: Arc<Mutex<ColorBuffer>>,
}

impl SharedColors {
    fn with_len(len: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ColorBuffer {
                tags: vec![ColorTag::DEFAULT; len],
                epoch: 0,
            })),
        }
    }

    /// Lock the buffer for reading.
    pub fn lock(&self) -> MutexGuard<'_, ColorBuffer> {
        self.inner.lock()
    }

    /// Current length of the color buffer.
    pub fn len(&self) -> usize {
        self.inner.lock().tags.len()
    }

    /// Returns `true` if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current edit epoch.
    pub fn epoch(&self) -> u64 {
        self.inner.lock().epoch
    }

    /// Copy of the tags plus the epoch they belong to.
    pub fn snapshot(&self) -> (Vec<ColorTag>, u64) {
        let buffer = self.inner.lock();
        (buffer.tags.clone(), buffer.epoch)
    }

    /// Returns `true` if both handles share one buffer.
    pub fn ptr_eq(&self, other: &SharedColors) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Apply a synchronous edit: the epoch is bumped under the same lock.
    pub(crate) fn edit<R>(&self, f: impl FnOnce(&mut Vec<ColorTag>) -> R) -> R {
        let mut buffer = self.inner.lock();
        buffer.epoch = buffer.epoch.wrapping_add(1);
        f(&mut buffer.tags)
    }

    /// Swap `local` into the shared buffer if `accept` approves the locked state.
    ///
    /// Returns `true` when the swap happened.
    pub(crate) fn publish_if(
        &self,
        local: &mut Vec<ColorTag>,
        accept: impl FnOnce(&ColorBuffer) -> bool,
    ) -> bool {
        let mut buffer = self.inner.lock();
        if !accept(&buffer) {
            return false;
        }
        std::mem::swap(&mut buffer.tags, local);
        true
    }
}

/// The in-memory document.
#[derive(Debug, Default)]
pub struct TextDocument {
    text: Vec<u8>,
    colors: SharedColors,
}

impl TextDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document from loaded content; every byte starts with the default color.
    pub fn from_bytes(content: impl Into<Vec<u8>>) -> Self {
        let text = content.into();
        let colors = SharedColors::with_len(text.len());
        Self { text, colors }
    }

    /// Document bytes.
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    /// Byte length.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns `true` if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Bytes in `range`, clamped to the document.
    pub fn slice(&self, range: Range<usize>) -> &[u8] {
        let end = range.end.min(self.text.len());
        let start = range.start.min(end);
        &self.text[start..end]
    }

    /// Lossy UTF-8 view of `range` (used for the clipboard).
    pub fn slice_lossy(&self, range: Range<usize>) -> String {
        String::from_utf8_lossy(self.slice(range)).into_owned()
    }

    /// Immutable snapshot of the text for background readers.
    pub fn snapshot(&self) -> Arc<[u8]> {
        Arc::from(self.text.as_slice())
    }

    /// Handle to the shared color buffer.
    pub fn colors(&self) -> &SharedColors {
        &self.colors
    }

    /// Copy of the color buffer.
    pub fn colors_snapshot(&self) -> Vec<ColorTag> {
        self.colors.snapshot().0
    }

    /// Color of the byte at `offset`, if the buffers agree in size.
    pub fn color_at(&self, offset: usize) -> Option<ColorTag> {
        let buffer = self.colors.lock();
        if buffer.tags.len() != self.text.len() {
            return None;
        }
        buffer.tags.get(offset).copied()
    }

    /// Insert `bytes` at `pos` (clamped and snapped). Returns the inserted range.
    pub fn insert(&mut self, pos: usize, bytes: &[u8]) -> Range<usize> {
        let pos = snap_to_char_boundary(&self.text, pos);
        if bytes.is_empty() {
            return pos..pos;
        }
        let text = &mut self.text;
        self.colors.edit(|tags| {
            text.splice(pos..pos, bytes.iter().copied());
            tags.splice(pos..pos, std::iter::repeat_n(ColorTag::DEFAULT, bytes.len()));
        });
        pos..pos + bytes.len()
    }

    /// Remove `[start, end)` (clamped, widened to char boundaries). Returns the removed range.
    pub fn erase(&mut self, start: usize, end: usize) -> Range<usize> {
        let start = snap_to_char_boundary(&self.text, start.min(end));
        let end = snap_up(&self.text, end.max(start));
        if start == end {
            return start..start;
        }
        let text = &mut self.text;
        self.colors.edit(|tags| {
            text.drain(start..end);
            tags.drain(start..end);
        });
        start..end
    }

    /// Replace the whole text with `content`, splicing only the differing middle so that the
    /// colors of the common prefix and suffix survive.
    ///
    /// Returns the changed range in the new content.
    pub fn replace_content(&mut self, content: &[u8]) -> Range<usize> {
        let old = &self.text;
        let shared = old
            .iter()
            .zip(content.iter())
            .take_while(|(a, b)| a == b)
            .count();
        let prefix = snap_to_char_boundary(content, shared);
        let max_suffix = old.len().min(content.len()) - prefix;
        let suffix = old
            .iter()
            .rev()
            .zip(content.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();

        let old_mid = prefix..old.len() - suffix;
        let new_mid = prefix..content.len() - suffix;
        if old_mid.is_empty() && new_mid.is_empty() {
            return prefix..prefix;
        }

        let text = &mut self.text;
        let replacement = &content[new_mid.clone()];
        self.colors.edit(|tags| {
            text.splice(old_mid.clone(), replacement.iter().copied());
            tags.splice(
                old_mid.clone(),
                std::iter::repeat_n(ColorTag::DEFAULT, replacement.len()),
            );
        });
        new_mid
    }

    /// Fill `range` (clamped) with a uniform color.
    pub fn fill_colors(&self, range: Range<usize>, tag: ColorTag) {
        self.colors.edit(|tags| {
            let end = range.end.min(tags.len());
            let start = range.start.min(end);
            tags[start..end].fill(tag);
        });
    }
}

fn snap_up(text: &[u8], offset: usize) -> usize {
    let snapped = snap_to_char_boundary(text, offset);
    if snapped == offset.min(text.len()) {
        snapped
    } else {
        next_char_boundary(text, snapped)
    }
}
