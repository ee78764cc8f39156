//! Snapshot-based undo/redo.

use crate::scene::{Scene, SceneState};

/// Default number of undo states to keep.
pub const DEFAULT_HISTORY_LIMIT: usize = 200;

/// A labelled deep copy of the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    pub label: String,
    pub state: SceneState,
}

/// Undo and redo stacks of whole-scene snapshots.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<HistorySnapshot>,
    redo_stack: Vec<HistorySnapshot>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        self.trim();
    }

    fn trim(&mut self) {
        if self.undo_stack.len() > self.limit {
            let excess = self.undo_stack.len() - self.limit;
            self.undo_stack.drain(..excess);
        }
    }

    /// Push current state to the undo stack (call before making changes).
    pub fn push(&mut self, label: impl Into<String>, scene: &Scene) {
        let label = label.into();
        log::debug!("History push: {label}");
        self.undo_stack.push(HistorySnapshot {
            label,
            state: scene.snapshot(),
        });

        // New changes invalidate the redo branch
        self.redo_stack.clear();
        self.trim();
    }

    /// Undo the last change.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self, scene: &mut Scene) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(HistorySnapshot {
            label: snapshot.label.clone(),
            state: scene.snapshot(),
        });
        scene.restore(snapshot.state);
        true
    }

    /// Redo the last undone change.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self, scene: &mut Scene) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(HistorySnapshot {
            label: snapshot.label.clone(),
            state: scene.snapshot(),
        });
        scene.restore(snapshot.state);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Label of the step `undo` would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.last().map(|s| s.label.as_str())
    }

    /// Label of the step `redo` would reapply.
    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.last().map(|s| s.label.as_str())
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
