//! Engine configuration.
//!
//! All knobs have defaults matching a typical desktop editor; hosts override individual fields
//! through the `with_*` builders.

pub use caret_lang::IndentUnit;

/// Default undo history depth (number of snapshots, including the baseline).
pub const DEFAULT_UNDO_CAPACITY: usize = 100;
/// Default cap on the span selected by select-all.
pub const DEFAULT_MAX_SELECTION_BYTES: usize = 8 * 1024 * 1024;
/// Default load-time truncation limit.
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 32 * 1024 * 1024;
/// Default size above which tokenization is skipped.
pub const DEFAULT_LARGE_FILE_THRESHOLD: usize = 2 * 1024 * 1024;

/// Configuration for the background highlighter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightConfig {
    /// Documents larger than this many bytes are filled with the default color instead of
    /// being tokenized.
    pub large_file_threshold: usize,
    /// Extra lines re-highlighted above and below an edited range.
    pub line_margin: usize,
    /// Name given to the worker thread.
    pub worker_name: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            large_file_threshold: DEFAULT_LARGE_FILE_THRESHOLD,
            line_margin: 3,
            worker_name: "caret-highlight".to_string(),
        }
    }
}

impl HighlightConfig {
    /// Set the large-file threshold.
    pub fn with_large_file_threshold(mut self, bytes: usize) -> Self {
        self.large_file_threshold = bytes;
        self
    }

    /// Set the line margin around edited ranges.
    pub fn with_line_margin(mut self, lines: usize) -> Self {
        self.line_margin = lines;
        self
    }
}

/// Look-ahead margins used by the scroll controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollConfig {
    /// Lines kept visible above and below the caret.
    pub vertical_margin_lines: f32,
    /// Character cells kept visible left and right of the caret.
    pub horizontal_margin_chars: f32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            vertical_margin_lines: 1.0,
            horizontal_margin_chars: 4.0,
        }
    }
}

/// Top-level configuration of an [`crate::EditorSession`].
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Undo history depth.
    pub undo_capacity: usize,
    /// Maximum span selected by select-all.
    pub max_selection_bytes: usize,
    /// Loaded content beyond this many bytes is truncated.
    pub max_document_bytes: usize,
    /// Unit inserted by indent. `None` uses the language default.
    pub indent_unit: Option<IndentUnit>,
    /// Tab width in cells, used when measuring caret x.
    pub tab_width: usize,
    /// Highlighter settings.
    pub highlight: HighlightConfig,
    /// Scroll margins.
    pub scroll: ScrollConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            undo_capacity: DEFAULT_UNDO_CAPACITY,
            max_selection_bytes: DEFAULT_MAX_SELECTION_BYTES,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            indent_unit: None,
            tab_width: 4,
            highlight: HighlightConfig::default(),
            scroll: ScrollConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Set the undo history depth (at least 1).
    pub fn with_undo_capacity(mut self, capacity: usize) -> Self {
        self.undo_capacity = capacity.max(1);
        self
    }

    /// Set the select-all cap.
    pub fn with_max_selection_bytes(mut self, bytes: usize) -> Self {
        self.max_selection_bytes = bytes;
        self
    }

    /// Set the load-time truncation limit.
    pub fn with_max_document_bytes(mut self, bytes: usize) -> Self {
        self.max_document_bytes = bytes;
        self
    }

    /// Force an indent unit regardless of language.
    pub fn with_indent_unit(mut self, unit: IndentUnit) -> Self {
        self.indent_unit = Some(unit);
        self
    }

    /// Set the tab width in cells.
    pub fn with_tab_width(mut self, width: usize) -> Self {
        self.tab_width = width.max(1);
        self
    }

    /// Replace the highlighter settings.
    pub fn with_highlight(mut self, highlight: HighlightConfig) -> Self {
        self.highlight = highlight;
        self
    }

    /// Replace the scroll margins.
    pub fn with_scroll(mut self, scroll: ScrollConfig) -> Self {
        self.scroll = scroll;
        self
    }
}
