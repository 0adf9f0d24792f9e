//! Linear undo/redo over snapshots of a draft array.

use tracing::debug;

/// Default number of snapshots kept per history.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Where a state change came from. Changes produced by undo/redo are
/// applied with `Replay` and are never recorded again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    User,
    Replay,
}

/// A bounded stack of owned snapshots with a cursor.
///
/// Snapshots are clones, so mutating the live state never reaches back into
/// the history. Recording after an undo discards the redo branch. When the
/// stack is full the oldest snapshot is dropped.
#[derive(Debug, Clone)]
pub struct History<T> {
    snapshots: Vec<T>,
    index: usize,
    limit: usize,
}

impl<T: Clone + Default> History<T> {
    /// A history whose only snapshot is `T::default()` (the empty array).
    pub fn new(limit: usize) -> Self {
        Self::with_initial(T::default(), limit)
    }

    /// Drop everything and start over from the empty state.
    pub fn reset(&mut self) {
        self.reset_to(T::default());
    }
}

impl<T: Clone> History<T> {
    pub fn with_initial(initial: T, limit: usize) -> Self {
        Self {
            snapshots: vec![initial],
            index: 0,
            limit: limit.max(1),
        }
    }

    /// Drop everything and make `state` the only snapshot.
    pub fn reset_to(&mut self, state: T) {
        self.snapshots.clear();
        self.snapshots.push(state);
        self.index = 0;
    }

    /// Push a snapshot of `state` unless it was produced by a replay.
    /// Identical consecutive states are still recorded.
    pub fn record(&mut self, state: &T, origin: ChangeOrigin) {
        if origin == ChangeOrigin::Replay {
            return;
        }
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push(state.clone());
        if self.snapshots.len() > self.limit {
            let overflow = self.snapshots.len() - self.limit;
            self.snapshots.drain(..overflow);
        }
        self.index = self.snapshots.len() - 1;
        debug!(len = self.snapshots.len(), index = self.index, "history recorded");
    }

    /// Step back and return the state to restore, or `None` at the oldest
    /// snapshot.
    pub fn undo(&mut self) -> Option<T> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        debug!(index = self.index, "history undo");
        self.snapshots.get(self.index).cloned()
    }

    /// Step forward and return the state to restore, or `None` at the newest
    /// snapshot.
    pub fn redo(&mut self) -> Option<T> {
        if self.index + 1 >= self.snapshots.len() {
            return None;
        }
        self.index += 1;
        debug!(index = self.index, "history redo");
        self.snapshots.get(self.index).cloned()
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// The snapshot the cursor points at.
    pub fn current(&self) -> Option<&T> {
        self.snapshots.get(self.index)
    }
}
