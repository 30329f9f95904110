//! Editor session: one open document and everything attached to it.
//!
//! # Overview
//!
//! [`EditorSession`] owns a [`TextDocument`] together with its [`LineIndex`], [`CursorState`],
//! [`UndoRedoManager`], [`HighlightScheduler`] and [`ScrollController`], and drives them from
//! discrete [`EditorIntent`]s. Every committed edit runs the same pipeline:
//!
//! 1. the cursor model mutates the document and reports the touched range;
//! 2. the line index is rebuilt from the full text;
//! 3. an undo snapshot is recorded with the touched range;
//! 4. the touched lines, padded by [`crate::HighlightConfig::line_margin`], are re-highlighted;
//! 5. the scroll controller is asked to keep the caret visible.
//!
//! # Example
//!
//! ```rust
//! use caret_core::{EditorIntent, EditorSession};
//!
//! let mut session = EditorSession::default();
//! session.handle(EditorIntent::InsertText("ab\ncd".to_string()));
//! assert_eq!(session.line_index().line_starts(), &[0, 3]);
//! assert_eq!(session.cursor().cursor_pos, 5);
//! ```

use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::Arc;

use caret_lang::{PLAIN_LANGUAGE_KEY, indent_for_key};
use parking_lot::MutexGuard;
use tracing::{debug, trace, warn};

use crate::config::{EditorConfig, IndentUnit};
use crate::cursor::{CursorState, Direction};
use crate::document::{ColorBuffer, ColorTag, TextDocument};
use crate::highlight::{HighlightScheduler, JobOutcome};
use crate::host::{Clipboard, LoadedFile, MemoryClipboard};
use crate::line_ending::LineEnding;
use crate::line_index::LineIndex;
use crate::scroll::{ScrollController, ScrollPosition, Viewport, VisibilityPasses};
use crate::tokenizer::{Theme, Tokenizer, TokenizerRegistry};
use crate::undo::{RestoredState, UndoRedoManager};
use crate::utf8::snap_to_char_boundary;

/// A decoded input intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorIntent {
    /// Move the caret, extending the selection if `extend`.
    Move {
        /// Direction to move.
        direction: Direction,
        /// Keep the anchor and move the head.
        extend: bool,
    },
    /// Move the caret to an offset computed by the host (mouse click).
    MoveTo {
        /// Target byte offset (snapped).
        offset: usize,
        /// Keep the anchor and move the head.
        extend: bool,
    },
    /// Select the word around an offset (double click).
    SelectWord(usize),
    /// Select everything, up to the configured cap.
    SelectAll,
    /// Type or insert text at the caret, replacing the selection.
    InsertText(String),
    /// Backspace.
    DeleteBackward,
    /// Forward delete.
    DeleteForward,
    /// Delete the selection only.
    DeleteSelection,
    /// Indent the caret position or covered lines.
    Indent,
    /// Unindent the covered lines.
    Unindent,
    /// Copy the selection to the clipboard.
    Copy,
    /// Copy, then delete the selection.
    Cut,
    /// Insert clipboard text.
    Paste,
    /// Undo one committed edit.
    Undo,
    /// Redo one undone edit.
    Redo,
    /// Jump to a zero-based line (clamped).
    JumpToLine(usize),
    /// Toggle a bookmark on the caret line.
    ToggleBookmark,
    /// Jump to the n-th bookmark in line order.
    JumpToBookmark(usize),
    /// Jump to the next bookmark after the caret line, wrapping around.
    NextBookmark,
}

/// Notification delivered to [`EditorSession::subscribe`] callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A load finished (successfully or with a placeholder).
    DocumentLoaded {
        /// Language key of the new document.
        language_key: String,
        /// Length after normalization and truncation.
        len: usize,
        /// The content was cut at `max_document_bytes`.
        truncated: bool,
        /// The host reported a failure; the document holds the placeholder text.
        failed: bool,
    },
    /// The content changed; `range` is in the new content's coordinates.
    ContentChanged {
        /// Touched byte range.
        range: Range<usize>,
    },
    /// A background highlight job finished.
    HighlightFinished(JobOutcome),
}

type Subscriber = Box<dyn FnMut(&SessionEvent) + Send>;
type Continuation = Box<dyn FnOnce(&mut EditorSession) + Send>;

/// Identifies a subscription for [`EditorSession::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// What to do once a load has been applied.
#[derive(Default)]
pub struct LoadOptions {
    /// Caret offset to restore (snapped and clamped).
    pub cursor: Option<usize>,
    /// Scroll position to restore on the next visibility pass.
    pub scroll: Option<ScrollPosition>,
    continuation: Option<Continuation>,
}

impl LoadOptions {
    /// No restoration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore the caret.
    pub fn with_cursor(mut self, offset: usize) -> Self {
        self.cursor = Some(offset);
        self
    }

    /// Restore the scroll position.
    pub fn with_scroll(mut self, scroll: ScrollPosition) -> Self {
        self.scroll = Some(scroll);
        self
    }

    /// Run `f` after the document is installed and before `DocumentLoaded` is emitted.
    pub fn then(mut self, f: impl FnOnce(&mut EditorSession) + Send + 'static) -> Self {
        self.continuation = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadOptions")
            .field("cursor", &self.cursor)
            .field("scroll", &self.scroll)
            .field("continuation", &self.continuation.is_some())
            .finish()
    }
}

/// Read-only view handed to the renderer.
///
/// Holds the color lock while alive; drop it before the next edit or publish is expected.
pub struct RenderView<'a> {
    text: &'a [u8],
    colors: MutexGuard<'a, ColorBuffer>,
    cursor: &'a CursorState,
    line_index: &'a LineIndex,
    status: Option<&'a str>,
}

impl<'a> RenderView<'a> {
    /// Document bytes.
    pub fn text(&self) -> &[u8] {
        self.text
    }

    /// Per-byte colors, or `None` if they do not match the text length.
    pub fn colors(&self) -> Option<&[ColorTag]> {
        (self.colors.tags.len() == self.text.len()).then_some(self.colors.tags.as_slice())
    }

    /// Cursor and selection.
    pub fn cursor(&self) -> &CursorState {
        self.cursor
    }

    /// Line index of `text`.
    pub fn line_index(&self) -> &LineIndex {
        self.line_index
    }

    /// Inert status message (load failure placeholder).
    pub fn status(&self) -> Option<&str> {
        self.status
    }
}

/// One open document.
pub struct EditorSession {
    config: EditorConfig,
    document: TextDocument,
    index: LineIndex,
    cursor: CursorState,
    undo: UndoRedoManager,
    highlighter: HighlightScheduler,
    scroll: ScrollController,
    language_key: String,
    line_ending: LineEnding,
    registry: Arc<TokenizerRegistry>,
    clipboard: Arc<dyn Clipboard>,
    bookmarks: BTreeSet<usize>,
    status: Option<String>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl EditorSession {
    /// Create a session over an empty plain-text document.
    pub fn new(
        config: EditorConfig,
        registry: Arc<TokenizerRegistry>,
        clipboard: Arc<dyn Clipboard>,
    ) -> Self {
        let mut undo = UndoRedoManager::new(config.undo_capacity);
        undo.reset(b"");
        Self {
            highlighter: HighlightScheduler::new(config.highlight.clone()),
            scroll: ScrollController::new(config.scroll, config.tab_width),
            config,
            document: TextDocument::new(),
            index: LineIndex::new(),
            cursor: CursorState::default(),
            undo,
            language_key: PLAIN_LANGUAGE_KEY.to_string(),
            line_ending: LineEnding::default(),
            registry,
            clipboard,
            bookmarks: BTreeSet::new(),
            status: None,
            subscribers: Vec::new(),
            next_subscription: 1,
        }
    }

    /// Session configuration.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The document.
    pub fn document(&self) -> &TextDocument {
        &self.document
    }

    /// Document bytes.
    pub fn text(&self) -> &[u8] {
        self.document.text()
    }

    /// Line index of the current text.
    pub fn line_index(&self) -> &LineIndex {
        &self.index
    }

    /// Cursor and selection.
    pub fn cursor(&self) -> &CursorState {
        &self.cursor
    }

    /// Undo history.
    pub fn undo_manager(&self) -> &UndoRedoManager {
        &self.undo
    }

    /// Highlight scheduler.
    pub fn highlighter(&self) -> &HighlightScheduler {
        &self.highlighter
    }

    /// Scroll controller.
    pub fn scroll_controller(&self) -> &ScrollController {
        &self.scroll
    }

    /// Mutable scroll controller (for font metrics).
    pub fn scroll_controller_mut(&mut self) -> &mut ScrollController {
        &mut self.scroll
    }

    /// Active language key.
    pub fn language_key(&self) -> &str {
        &self.language_key
    }

    /// Line ending detected at load.
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Bookmarked lines, ascending.
    pub fn bookmarks(&self) -> impl Iterator<Item = usize> + '_ {
        self.bookmarks.iter().copied()
    }

    /// Inert status message, set when a load failed.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Tokenizer for the active language.
    pub fn tokenizer(&self) -> Arc<dyn Tokenizer> {
        self.registry.resolve(&self.language_key)
    }

    /// Indent unit: the configured one, or the language default.
    pub fn indent_unit(&self) -> IndentUnit {
        self.config
            .indent_unit
            .unwrap_or_else(|| indent_for_key(&self.language_key))
    }

    /// Register an event callback.
    pub fn subscribe(&mut self, f: impl FnMut(&SessionEvent) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(f)));
        id
    }

    /// Remove a callback. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    fn emit(&mut self, event: SessionEvent) {
        for (_, subscriber) in &mut self.subscribers {
            subscriber(&event);
        }
    }

    /// Apply one intent. Returns the touched range if the content changed.
    pub fn handle(&mut self, intent: EditorIntent) -> Option<Range<usize>> {
        trace!(?intent, "handle intent");
        match intent {
            EditorIntent::Move { direction, extend } => {
                self.cursor
                    .move_cursor(&self.document, &self.index, direction, extend);
                self.scroll.notify_caret_moved();
                None
            }
            EditorIntent::MoveTo { offset, extend } => {
                self.cursor.move_to(self.document.text(), offset, extend);
                self.scroll.notify_caret_moved();
                None
            }
            EditorIntent::SelectWord(offset) => {
                self.cursor.select_word_at(self.document.text(), offset);
                self.scroll.notify_caret_moved();
                None
            }
            EditorIntent::SelectAll => {
                self.cursor
                    .select_all(self.document.text(), self.config.max_selection_bytes);
                None
            }
            EditorIntent::InsertText(text) => {
                let touched = self.cursor.insert_text(&mut self.document, text.as_bytes());
                self.commit(touched)
            }
            EditorIntent::DeleteBackward => {
                let touched = self.cursor.delete_backward(&mut self.document);
                self.commit(touched)
            }
            EditorIntent::DeleteForward => {
                let touched = self.cursor.delete_forward(&mut self.document);
                self.commit(touched)
            }
            EditorIntent::DeleteSelection => {
                let touched = self.cursor.delete_selection(&mut self.document);
                self.commit(touched)
            }
            EditorIntent::Indent => {
                let unit = self.indent_unit();
                let touched = self.cursor.indent(&mut self.document, &self.index, unit);
                self.commit(touched)
            }
            EditorIntent::Unindent => {
                let unit = self.indent_unit();
                let touched = self.cursor.unindent(&mut self.document, &self.index, unit);
                self.commit(touched)
            }
            EditorIntent::Copy => {
                self.copy_to_clipboard();
                None
            }
            EditorIntent::Cut => {
                if !self.copy_to_clipboard() {
                    return None;
                }
                let touched = self.cursor.delete_selection(&mut self.document);
                self.commit(touched)
            }
            EditorIntent::Paste => {
                let content = self.clipboard.get();
                if content.is_empty() {
                    return None;
                }
                let touched = self.cursor.paste_text(&mut self.document, &content);
                self.commit(touched)
            }
            EditorIntent::Undo => self.undo(),
            EditorIntent::Redo => self.redo(),
            EditorIntent::JumpToLine(line) => {
                self.jump_to_line(line);
                None
            }
            EditorIntent::ToggleBookmark => {
                let line = self.index.line_of(self.cursor.cursor_pos);
                if !self.bookmarks.remove(&line) {
                    self.bookmarks.insert(line);
                }
                None
            }
            EditorIntent::JumpToBookmark(n) => {
                match self.bookmarks.iter().nth(n).copied() {
                    Some(line) => self.jump_to_line(line),
                    None => trace!(n, "no such bookmark"),
                }
                None
            }
            EditorIntent::NextBookmark => {
                let line = self.index.line_of(self.cursor.cursor_pos);
                let next = self
                    .bookmarks
                    .range(line + 1..)
                    .next()
                    .or_else(|| self.bookmarks.iter().next())
                    .copied();
                if let Some(next) = next {
                    self.jump_to_line(next);
                }
                None
            }
        }
    }

    fn copy_to_clipboard(&mut self) -> bool {
        match self.cursor.copy_selection(&self.document) {
            Some(bytes) => {
                self.clipboard
                    .set(String::from_utf8_lossy(&bytes).into_owned());
                true
            }
            None => false,
        }
    }

    fn commit(&mut self, touched: Option<Range<usize>>) -> Option<Range<usize>> {
        let touched = touched?;
        self.index.rebuild(self.document.text());
        self.undo
            .add_state(self.document.text(), touched.start, touched.end);
        self.after_content_change(touched.clone());
        Some(touched)
    }

    fn after_content_change(&mut self, touched: Range<usize>) {
        let line_count = self.index.line_count();
        self.bookmarks.retain(|&line| line < line_count);
        self.highlight_lines(touched.clone());
        self.scroll.notify_caret_moved();
        self.emit(SessionEvent::ContentChanged { range: touched });
    }

    /// Re-highlight the lines of `touched`, padded by the configured line margin.
    fn highlight_lines(&mut self, touched: Range<usize>) {
        let margin = self.config.highlight.line_margin;
        let first = self.index.line_of(touched.start).saturating_sub(margin);
        let last = (self.index.line_of(touched.end) + margin).min(self.index.last_line());
        let end = if last < self.index.last_line() {
            self.index.line_start(last + 1)
        } else {
            self.document.len()
        };
        self.highlight_range(self.index.line_start(first)..end);
    }

    fn highlight_range(&mut self, range: Range<usize>) {
        if self.document.is_empty() {
            self.highlighter.cancel_in_flight();
            return;
        }
        let tokenizer = self.registry.resolve(&self.language_key);
        if let Err(err) =
            self.highlighter
                .request(&self.document, range, &self.language_key, tokenizer)
        {
            debug!(%err, "highlight request not scheduled");
        }
    }

    /// Re-highlight the whole document.
    pub fn highlight_all(&mut self) {
        self.highlight_range(0..self.document.len());
    }

    /// Undo one committed edit, restoring the caret's line and column.
    pub fn undo(&mut self) -> Option<Range<usize>> {
        let position = self.index.position_of(self.cursor.cursor_pos);
        let restored = self.undo.undo(self.document.text())?;
        Some(self.restore(restored, position))
    }

    /// Redo one undone edit, restoring the caret's line and column.
    pub fn redo(&mut self) -> Option<Range<usize>> {
        let position = self.index.position_of(self.cursor.cursor_pos);
        let restored = self.undo.redo(self.document.text())?;
        Some(self.restore(restored, position))
    }

    fn restore(&mut self, restored: RestoredState, (line, column): (usize, usize)) -> Range<usize> {
        let changed = self.document.replace_content(&restored.content);
        self.index.rebuild(self.document.text());
        let offset = self.index.offset_of(line, column);
        self.cursor.set_position(self.document.text(), offset);
        trace!(
            ?changed,
            recorded = ?(restored.change_start..restored.change_end),
            "restored undo state"
        );
        self.after_content_change(changed.clone());
        changed
    }

    /// Move the caret to the start of `line` (clamped to the last line) and scroll there.
    pub fn jump_to_line(&mut self, line: usize) {
        let line = line.min(self.index.last_line());
        let offset = self.index.line_start(line);
        self.cursor.set_position(self.document.text(), offset);
        self.scroll.request_scroll(self.scroll.target_for_line(line));
        self.scroll
            .request_visibility(VisibilityPasses::UntilSatisfied);
    }

    /// Install loaded content (or the failure placeholder) as the new document.
    pub fn load(&mut self, result: Result<LoadedFile, String>, options: LoadOptions) {
        self.highlighter.cancel_in_flight();

        let (raw, language_key, failed) = match result {
            Ok(file) => (file.content, file.language_key, false),
            Err(message) => {
                warn!(reason = %message, "load failed; showing placeholder");
                self.status = Some(message.clone());
                (message.into_bytes(), PLAIN_LANGUAGE_KEY.to_string(), true)
            }
        };
        if !failed {
            self.status = None;
        }

        self.line_ending = LineEnding::detect(&raw);
        let mut content = LineEnding::normalize(&raw);
        let truncated = content.len() > self.config.max_document_bytes;
        if truncated {
            let cut = snap_to_char_boundary(&content, self.config.max_document_bytes);
            warn!(
                len = content.len(),
                max = self.config.max_document_bytes,
                kept = cut,
                "document truncated on load"
            );
            content.truncate(cut);
        }

        self.document = TextDocument::from_bytes(content);
        self.index.rebuild(self.document.text());
        self.undo.reset(self.document.text());
        self.cursor = CursorState::default();
        self.bookmarks.clear();
        self.language_key = language_key;
        self.highlight_all();

        let LoadOptions {
            cursor,
            scroll,
            continuation,
        } = options;
        if let Some(offset) = cursor {
            self.cursor.set_position(self.document.text(), offset);
            self.scroll
                .request_visibility(VisibilityPasses::UntilSatisfied);
        }
        if let Some(target) = scroll {
            self.scroll.request_scroll(target);
        }
        if let Some(continuation) = continuation {
            continuation(self);
        }

        debug!(
            language = %self.language_key,
            len = self.document.len(),
            truncated,
            failed,
            "document loaded"
        );
        self.emit(SessionEvent::DocumentLoaded {
            language_key: self.language_key.clone(),
            len: self.document.len(),
            truncated,
            failed,
        });
    }

    /// Switch the language and re-highlight.
    pub fn set_language(&mut self, language_key: impl Into<String>) {
        self.language_key = language_key.into();
        self.highlight_all();
    }

    /// Content to hand to the file-I/O collaborator, with the original line ending.
    pub fn save_content(&self) -> Vec<u8> {
        self.line_ending.apply(self.document.text())
    }

    /// Record that the current content was saved.
    pub fn mark_saved(&mut self) {
        self.undo.mark_clean();
    }

    /// Returns `true` if the content differs from the last load or save.
    pub fn is_modified(&self) -> bool {
        !self.undo.is_clean()
    }

    /// Read-only view for rendering.
    pub fn render_view(&self) -> RenderView<'_> {
        RenderView {
            text: self.document.text(),
            colors: self.document.colors().lock(),
            cursor: &self.cursor,
            line_index: &self.index,
            status: self.status.as_deref(),
        }
    }

    /// Run one visibility pass for `viewport`. Returns the new scroll position if it changed.
    pub fn visibility_pass(&mut self, viewport: Viewport) -> Option<ScrollPosition> {
        let caret = self
            .scroll
            .caret_pixel(self.document.text(), &self.index, self.cursor.cursor_pos);
        self.scroll.visibility_pass(caret, viewport)
    }

    /// The theme changed its colors in place: refresh caches and re-highlight.
    pub fn set_theme_changed(&mut self) {
        self.registry.invalidate_cached_colors();
        self.highlight_all();
    }

    /// Install a new theme and re-highlight.
    pub fn set_theme(&mut self, theme: Arc<dyn Theme>) {
        self.registry.set_theme(theme);
        self.highlight_all();
    }

    /// Frame tick: collect a finished highlight job without blocking.
    pub fn tick(&mut self) -> Option<JobOutcome> {
        let outcome = self.highlighter.poll()?;
        self.emit(SessionEvent::HighlightFinished(outcome.clone()));
        Some(outcome)
    }

    /// Block until the highlight job in flight (if any) has finished.
    pub fn wait_for_highlight(&mut self) -> Option<JobOutcome> {
        let outcome = self.highlighter.wait_idle()?;
        self.emit(SessionEvent::HighlightFinished(outcome.clone()));
        Some(outcome)
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(
            EditorConfig::default(),
            Arc::new(TokenizerRegistry::default()),
            Arc::new(MemoryClipboard::new()),
        )
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("language_key", &self.language_key)
            .field("len", &self.document.len())
            .field("cursor", &self.cursor)
            .field("undo_depth", &self.undo.undo_depth())
            .field("highlighter", &self.highlighter)
            .finish()
    }
}
