//! Undo/Redo history of item state snapshots

/// Maximum number of snapshots kept by default
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

type StateObserver<S> = Box<dyn FnMut(&S) + Send>;

/// Linear undo/redo history over cloned states
///
/// The history is a list of snapshots plus a cursor pointing at the
/// snapshot the owner currently shows. Pushing truncates everything after
/// the cursor, so states undone before a new push can no longer be redone.
pub struct StateHistory<S> {
    /// Snapshots, oldest first
    states: Vec<S>,
    /// Index of the current snapshot, `None` while empty
    cursor: Option<usize>,
    /// Maximum number of snapshots
    max_history: usize,
    /// Notified with the adopted snapshot on every push, undo and redo
    observer: Option<StateObserver<S>>,
}

impl<S> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl<S> std::fmt::Debug for StateHistory<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateHistory")
            .field("len", &self.states.len())
            .field("cursor", &self.cursor)
            .field("max_history", &self.max_history)
            .finish()
    }
}

impl<S> StateHistory<S> {
    /// Create a history keeping at most `max_history` snapshots
    pub fn new(max_history: usize) -> Self {
        Self {
            states: Vec::new(),
            cursor: None,
            max_history: max_history.max(1),
            observer: None,
        }
    }

    /// Register the state-changed observer, replacing any previous one
    pub fn set_observer(&mut self, observer: impl FnMut(&S) + Send + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Append a snapshot after the cursor, discarding the redo tail
    pub fn push(&mut self, state: S) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.states.truncate(keep);
        self.states.push(state);

        // Drop the oldest snapshots beyond the limit
        if self.states.len() > self.max_history {
            let excess = self.states.len() - self.max_history;
            self.states.drain(..excess);
        }

        let index = self.states.len() - 1;
        self.cursor = Some(index);
        tracing::trace!("History push, {} snapshots", self.states.len());
        self.notify(index);
    }

    /// Step back one snapshot and return it; no-op at the start
    pub fn undo(&mut self) -> Option<&S> {
        let index = self.cursor.filter(|&c| c > 0)? - 1;
        self.cursor = Some(index);
        tracing::trace!("History undo to {}", index);
        self.notify(index);
        self.states.get(index)
    }

    /// Step forward one snapshot and return it; no-op at the end
    pub fn redo(&mut self) -> Option<&S> {
        let index = self.cursor? + 1;
        if index >= self.states.len() {
            return None;
        }
        self.cursor = Some(index);
        tracing::trace!("History redo to {}", index);
        self.notify(index);
        self.states.get(index)
    }

    /// Remove all snapshots
    pub fn clear(&mut self) {
        self.states.clear();
        self.cursor = None;
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.states.len())
    }

    /// The snapshot under the cursor
    pub fn current(&self) -> Option<&S> {
        self.cursor.and_then(|c| self.states.get(c))
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn notify(&mut self, index: usize) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&self.states[index]);
        }
    }
}
