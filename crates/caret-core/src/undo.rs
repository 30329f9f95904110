//! Snapshot based undo/redo.
//!
//! The manager keeps full-content snapshots, each tagged with the byte range that changed
//! relative to its predecessor. The bottom entry of the undo stack is the baseline (the
//! content as loaded) and is never popped.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::trace;

use crate::config::DEFAULT_UNDO_CAPACITY;

/// An immutable snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoState {
    /// Full document content.
    pub content: Arc<[u8]>,
    /// Start of the range changed by the edit that produced this state.
    pub change_start: usize,
    /// End of that range (in this state's coordinates).
    pub change_end: usize,
}

/// Content to restore after an undo or redo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredState {
    /// Content to install.
    pub content: Arc<[u8]>,
    /// Start of the range affected by the step, clamped to `content`.
    pub change_start: usize,
    /// End of that range, clamped to `content`.
    pub change_end: usize,
}

/// Bounded undo and redo stacks of [`UndoState`]s.
#[derive(Debug)]
pub struct UndoRedoManager {
    undo_stack: VecDeque<UndoState>,
    redo_stack: Vec<UndoState>,
    capacity: usize,
    /// Clean point tracking: `undo_stack.len()` at the last save. `None` once unreachable.
    clean_index: Option<usize>,
}

impl UndoRedoManager {
    /// Create an empty manager holding at most `capacity` undo entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            capacity: capacity.max(1),
            clean_index: None,
        }
    }

    /// Forget all history and install `content` as the baseline (clean).
    pub fn reset(&mut self, content: &[u8]) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.undo_stack.push_back(UndoState {
            content: Arc::from(content),
            change_start: 0,
            change_end: content.len(),
        });
        self.clean_index = Some(1);
    }

    /// Record a committed edit.
    ///
    /// No-op if `content` equals the current top. Otherwise pushes, clears redo, and evicts the
    /// oldest entry past capacity. Returns `true` if a state was pushed.
    pub fn add_state(&mut self, content: &[u8], change_start: usize, change_end: usize) -> bool {
        if self
            .undo_stack
            .back()
            .is_some_and(|top| top.content.as_ref() == content)
        {
            trace!("undo: content unchanged, not recording");
            return false;
        }

        self.clear_redo_and_adjust_clean();
        self.undo_stack.push_back(UndoState {
            content: Arc::from(content),
            change_start,
            change_end,
        });

        while self.undo_stack.len() > self.capacity {
            self.undo_stack.pop_front();
            self.clean_index = match self.clean_index {
                Some(0) | None => None,
                Some(index) => Some(index - 1),
            };
        }
        true
    }

    fn clear_redo_and_adjust_clean(&mut self) {
        if self.redo_stack.is_empty() {
            return;
        }
        // A clean point inside the redo area becomes unreachable.
        if let Some(clean_index) = self.clean_index
            && clean_index > self.undo_stack.len()
        {
            self.clean_index = None;
        }
        self.redo_stack.clear();
    }

    /// Step back one state.
    ///
    /// `current` is the live content; if it differs from the top (an edit that was never
    /// recorded) it is recorded first so it can be redone. Returns `None` when only the
    /// baseline remains.
    pub fn undo(&mut self, current: &[u8]) -> Option<RestoredState> {
        self.add_state(current, 0, current.len());
        if self.undo_stack.len() <= 1 {
            trace!("undo: at baseline");
            return None;
        }
        let popped = self.undo_stack.pop_back()?;
        let top = self.undo_stack.back()?;
        let restored = RestoredState {
            content: top.content.clone(),
            change_start: popped.change_start.min(top.content.len()),
            change_end: popped.change_end.min(top.content.len()),
        };
        self.redo_stack.push(popped);
        Some(restored)
    }

    /// Re-apply the most recently undone state. Returns `None` if there is nothing to redo.
    pub fn redo(&mut self, current: &[u8]) -> Option<RestoredState> {
        let Some(state) = self.redo_stack.pop() else {
            trace!("redo: nothing to redo");
            return None;
        };
        if self
            .undo_stack
            .back()
            .is_some_and(|top| top.content.as_ref() != current)
        {
            trace!("redo: live content diverged from history top");
        }
        let restored = RestoredState {
            content: state.content.clone(),
            change_start: state.change_start.min(state.content.len()),
            change_end: state.change_end.min(state.content.len()),
        };
        self.undo_stack.push_back(state);
        Some(restored)
    }

    /// Returns `true` if an undo would change the content.
    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    /// Returns `true` if a redo is available.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undo entries, including the baseline.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redo entries.
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Maximum number of undo entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The current top of the undo stack.
    pub fn current(&self) -> Option<&UndoState> {
        self.undo_stack.back()
    }

    /// Bytes held by all snapshots. Snapshots shared between stacks are counted once each
    /// time they appear.
    pub fn retained_bytes(&self) -> usize {
        self.undo_stack
            .iter()
            .chain(self.redo_stack.iter())
            .map(|state| state.content.len())
            .sum()
    }

    /// Whether the current state matches the last saved one.
    pub fn is_clean(&self) -> bool {
        self.clean_index == Some(self.undo_stack.len())
    }

    /// Mark the current state as saved.
    pub fn mark_clean(&mut self) {
        self.clean_index = Some(self.undo_stack.len());
    }
}

impl Default for UndoRedoManager {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_CAPACITY)
    }
}
