use super::Board;

/// Default number of snapshots kept for undo/redo.
pub const DEFAULT_CAPACITY: usize = 50;

/// Bounded linear undo history of full board snapshots.
///
/// `cursor` always points at the snapshot matching the live board and stays in
/// `0..entries.len()`. The history is never empty.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Board>,
    cursor: usize,
    capacity: usize,
}

impl History {
    /// Start a history whose only entry is `initial`. Capacity is at least 1.
    pub fn new(initial: Board, capacity: usize) -> Self {
        Self {
            entries: vec![initial],
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// Record a new current state.
    ///
    /// Anything after the cursor (the redo branch) is discarded first. When the
    /// capacity is exceeded the oldest snapshot is evicted and the cursor stays
    /// put, which leaves it on the new entry.
    pub fn push(&mut self, snapshot: Board) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(snapshot);
        if self.entries.len() > self.capacity {
            self.entries.remove(0);
        } else {
            self.cursor += 1;
        }
    }

    /// Step back one snapshot, returning a copy of it.
    pub fn undo(&mut self) -> Option<Board> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(self.entries[self.cursor].clone())
    }

    /// Step forward one snapshot, returning a copy of it.
    pub fn redo(&mut self) -> Option<Board> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(self.entries[self.cursor].clone())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every snapshot and restart from `initial`.
    pub fn reset(&mut self, initial: Board) {
        self.entries.clear();
        self.entries.push(initial);
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Board {
        Board::new(name)
    }

    fn current_name(history: &History) -> String {
        history.entries[history.cursor].name.clone()
    }

    #[test]
    fn push_advances_cursor() {
        let mut h = History::new(named("0"), 10);
        h.push(named("1"));
        h.push(named("2"));
        assert_eq!(h.len(), 3);
        assert_eq!(h.cursor(), 2);
        assert!(h.can_undo());
        assert!(!h.can_redo());
    }

    #[test]
    fn undo_redo_walk_the_cursor() {
        let mut h = History::new(named("0"), 10);
        h.push(named("1"));
        assert_eq!(h.undo().map(|b| b.name), Some("0".to_string()));
        assert!(h.undo().is_none());
        assert_eq!(h.redo().map(|b| b.name), Some("1".to_string()));
        assert!(h.redo().is_none());
    }

    #[test]
    fn push_after_undo_discards_redo_branch() {
        let mut h = History::new(named("0"), 10);
        h.push(named("1"));
        h.push(named("2"));
        h.undo();
        h.undo();
        h.push(named("x"));
        assert_eq!(h.len(), 2);
        assert!(!h.can_redo());
        assert_eq!(current_name(&h), "x");
    }

    #[test]
    fn capacity_evicts_oldest_and_keeps_cursor_on_newest() {
        let mut h = History::new(named("0"), 3);
        for i in 1..=5 {
            h.push(named(&i.to_string()));
            assert!(h.len() <= 3);
            assert_eq!(h.cursor(), h.len() - 1);
        }
        assert_eq!(current_name(&h), "5");
        assert_eq!(h.entries[0].name, "3");
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let mut h = History::new(named("0"), 0);
        h.push(named("1"));
        assert_eq!(h.len(), 1);
        assert_eq!(h.cursor(), 0);
        assert!(!h.can_undo());
        assert_eq!(current_name(&h), "1");
    }

    #[test]
    fn snapshots_do_not_alias() {
        let mut h = History::new(named("0"), 5);
        h.push(named("1"));
        let mut restored = h.undo().unwrap();
        restored.name = "mutated".into();
        assert_eq!(current_name(&h), "0");
    }

    #[test]
    fn reset_leaves_single_entry() {
        let mut h = History::new(named("0"), 5);
        h.push(named("1"));
        h.reset(named("fresh"));
        assert_eq!(h.len(), 1);
        assert_eq!(h.cursor(), 0);
        assert_eq!(current_name(&h), "fresh");
    }
}
