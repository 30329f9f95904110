#![warn(missing_docs)]
//! Caret Core - headless text-editing engine
//!
//! # Overview
//!
//! `caret-core` is the editing kernel of a code editor: the in-memory document with its
//! per-byte color annotation, the cursor/selection state machine, line-index maintenance,
//! snapshot undo/redo, and an asynchronous highlighter that keeps colors in step with edits
//! without blocking typing. Rendering, input decoding, file I/O and clipboard backends are host
//! concerns reached through small interfaces.
//!
//! # Core Features
//!
//! - **Byte-exact document**: text and colors are spliced in lockstep; offsets stay on UTF-8
//!   code-point boundaries
//! - **Cursor model**: grapheme-aware movement, word movement, multi-line indent/unindent
//! - **Undo/redo**: bounded full-content snapshots with change ranges and clean tracking
//! - **Background highlighting**: one worker thread per document, cooperative cancellation,
//!   epoch-checked publish of a locally computed color buffer
//! - **Scroll control**: jump-to-visible with margins, one-shot scroll mailbox
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Workspace / EditorSession (intents)        │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  ScrollController                           │  ← Viewport
//! ├─────────────────────────────────────────────┤
//! │  HighlightScheduler + Tokenizer registry    │  ← Colors
//! ├─────────────────────────────────────────────┤
//! │  CursorState · UndoRedoManager              │  ← Editing
//! ├─────────────────────────────────────────────┤
//! │  TextDocument · LineIndex · utf8            │  ← Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use caret_core::{Direction, EditorIntent, EditorSession, LoadOptions, LoadedFile};
//!
//! let mut session = EditorSession::default();
//! session.load(Ok(LoadedFile::new("hello", "plain")), LoadOptions::new());
//!
//! session.handle(EditorIntent::Move { direction: Direction::DocumentEnd, extend: false });
//! session.handle(EditorIntent::InsertText(" world".to_string()));
//! assert_eq!(session.text(), b"hello world");
//!
//! session.handle(EditorIntent::Undo);
//! assert_eq!(session.text(), b"hello");
//! ```
//!
//! # Module Description
//!
//! - [`document`] - text buffer, color buffer and the shared color handle
//! - [`line_index`] - line-start offsets
//! - [`cursor`] - cursor and selection operations
//! - [`undo`] - snapshot undo/redo
//! - [`highlight`] - scheduler, job handles and outcomes
//! - [`tokenizer`] - tokenizer capability, themes and the registry
//! - [`scroll`] - caret visibility
//! - [`session`] - intent handling for one document
//! - [`workspace`] - open documents

pub mod cancel;
pub mod config;
pub mod cursor;
pub mod document;
pub mod error;
pub mod highlight;
pub mod host;
pub mod line_ending;
pub mod line_index;
pub mod scroll;
pub mod session;
pub mod tokenizer;
pub mod undo;
pub mod utf8;
pub mod workspace;

pub use caret_lang::TokenizerFamily;
pub use cancel::CancellationToken;
pub use config::{EditorConfig, HighlightConfig, IndentUnit, ScrollConfig};
pub use cursor::{CursorState, Direction};
pub use document::{ColorBuffer, ColorTag, SharedColors, TextDocument};
pub use error::{HighlightError, SessionError};
pub use highlight::{
    HighlightHandle, HighlightScheduler, JobId, JobOutcome, RequestStatus, highlight_content,
};
pub use host::{Clipboard, LoadedFile, MemoryClipboard};
pub use line_ending::LineEnding;
pub use line_index::LineIndex;
pub use scroll::{CaretPixel, ScrollController, ScrollPosition, Viewport, VisibilityPasses};
pub use session::{
    EditorIntent, EditorSession, LoadOptions, RenderView, SessionEvent, SubscriptionId,
};
pub use tokenizer::{
    DefaultTheme, Palette, PlainTokenizer, Theme, Token, TokenKind, Tokenizer, TokenizerRegistry,
};
pub use undo::{RestoredState, UndoRedoManager, UndoState};
pub use utf8::snap_to_char_boundary;
pub use workspace::{DocumentId, Workspace};
