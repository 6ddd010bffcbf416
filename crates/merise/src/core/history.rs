//! Linear undo/redo history
//!
//! Entries up to and including the cursor are applied; entries after it are
//! redoable. Recording a new command drops the redoable tail. When the
//! history is full the oldest entry is evicted and the cursor keeps pointing
//! at the newest command.

use std::collections::VecDeque;

use tracing::trace;

use super::Command;

/// Bounded command log with a cursor
#[derive(Debug)]
pub struct CommandHistory {
    entries: VecDeque<Box<dyn Command>>,
    cursor: Option<usize>,
    capacity: usize,
}

impl CommandHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            cursor: None,
            capacity,
        }
    }

    /// Record an already executed command
    ///
    /// Returns false when the history keeps nothing (capacity 0).
    pub fn record(&mut self, command: Box<dyn Command>) -> bool {
        let keep = self.cursor.map_or(0, |i| i + 1);
        if keep < self.entries.len() {
            trace!(dropped = self.entries.len() - keep, "Discarding redo tail");
            self.entries.truncate(keep);
        }

        if self.capacity == 0 {
            self.cursor = None;
            return false;
        }

        self.entries.push_back(command);
        if self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                trace!(command = evicted.name(), "Evicted oldest history entry");
            }
        }
        self.cursor = Some(self.entries.len() - 1);
        true
    }

    /// Change the capacity, evicting the oldest entries that no longer fit
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        let excess = self.entries.len().saturating_sub(capacity);
        if excess == 0 {
            return;
        }
        self.entries.drain(..excess);
        self.cursor = self.cursor.and_then(|i| i.checked_sub(excess));
        trace!(evicted = excess, capacity, "History shrunk");
    }

    /// Command to undo, moving the cursor back
    pub fn step_back(&mut self) -> Option<&mut dyn Command> {
        let index = self.cursor?;
        self.cursor = index.checked_sub(1);
        Some(self.entries[index].as_mut())
    }

    /// Command to redo, moving the cursor forward
    pub fn step_forward(&mut self) -> Option<&mut dyn Command> {
        let next = self.cursor.map_or(0, |i| i + 1);
        if next >= self.entries.len() {
            return None;
        }
        self.cursor = Some(next);
        Some(self.entries[next].as_mut())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.map_or(0, |i| i + 1) < self.entries.len()
    }

    /// Cursor position, -1 when nothing is applied
    pub fn index(&self) -> isize {
        self.cursor.map_or(-1, |i| i as isize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DiagramDatabase, MoveNode, NodeKind, Point};

    fn mv(n: f64) -> Box<dyn Command> {
        Box::new(MoveNode::new(NodeKind::Entity, "e", Point::new(n - 1.0, 0.0), Point::new(n, 0.0)))
    }

    #[test]
    fn test_empty_history() {
        let mut history = CommandHistory::new(50);
        assert_eq!(history.index(), -1);
        assert!(history.step_back().is_none());
        assert!(history.step_forward().is_none());
    }

    #[test]
    fn test_cursor_moves() {
        let mut history = CommandHistory::new(50);
        history.record(mv(1.0));
        history.record(mv(2.0));
        assert_eq!(history.index(), 1);
        assert!(history.step_back().is_some());
        assert_eq!(history.index(), 0);
        assert!(history.can_redo());
        assert!(history.step_forward().is_some());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_record_truncates_redo_tail() {
        let mut history = CommandHistory::new(50);
        history.record(mv(1.0));
        history.record(mv(2.0));
        history.record(mv(3.0));
        history.step_back();
        history.step_back();
        history.record(mv(4.0));
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert_eq!(history.index(), 1);
    }

    #[test]
    fn test_eviction_keeps_cursor_on_newest() {
        let mut history = CommandHistory::new(3);
        for n in 1..=5 {
            history.record(mv(n as f64));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.index(), 2);

        let mut db = DiagramDatabase::new();
        let mut undone = 0;
        while let Some(cmd) = history.step_back() {
            cmd.undo(&mut db);
            undone += 1;
        }
        assert_eq!(undone, 3);
    }

    #[test]
    fn test_zero_capacity_records_nothing() {
        let mut history = CommandHistory::new(0);
        assert!(!history.record(mv(1.0)));
        assert!(history.is_empty());
        assert!(!history.can_undo());
    }

    #[test]
    fn test_shrinking_capacity_keeps_newest() {
        let mut history = CommandHistory::new(10);
        for n in 1..=6 {
            assert!(history.record(mv(n as f64)));
        }
        history.step_back();
        assert_eq!(history.index(), 4);

        history.set_capacity(3);
        assert_eq!(history.capacity(), 3);
        assert_eq!(history.len(), 3);
        assert_eq!(history.index(), 1);
        assert!(history.can_redo());

        history.set_capacity(1);
        assert_eq!(history.len(), 1);
        assert_eq!(history.index(), -1);
        assert!(history.can_redo());
    }
}
