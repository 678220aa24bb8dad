//! Snapshot policy for timeline scrubbing.
//!
//! Every command of the simulator ends with a call to [`SnapshotStore::record`]. Phase
//! transitions are always stored; other commands follow the configured policy.
//! Moving backwards or forwards never recomputes anything, it hands back stored clones.

/// How often non-transition commands are captured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SnapshotPolicy {
    #[default]
    EveryStep,
    /// Capture every n-th command (n >= 1), plus every phase transition.
    Every(usize),
}

#[derive(Clone, Debug)]
pub struct SnapshotStore<T> {
    policy: SnapshotPolicy,
    snapshots: Vec<T>,
    cursor: usize,
    /// Commands applied since the last stored snapshot.
    pending: usize,
}

impl<T: Clone> SnapshotStore<T> {
    pub fn new(policy: SnapshotPolicy) -> Self {
        Self {
            policy,
            snapshots: Vec::new(),
            cursor: 0,
            pending: 0,
        }
    }

    pub fn policy(&self) -> SnapshotPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Index of the snapshot matching (or last preceding) the live state.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.snapshots.get(index)
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = 0;
        self.pending = 0;
    }

    /// Registers a finished command. Anything after the cursor is discarded first,
    /// since the live state has diverged from it.
    ///
    /// Returns whether `state` was stored.
    pub fn record(&mut self, state: &T, boundary: bool) -> bool {
        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.cursor + 1);
        }
        self.pending += 1;

        let due = match self.policy {
            SnapshotPolicy::EveryStep => true,
            SnapshotPolicy::Every(n) => self.pending >= n.max(1),
        };
        if !(boundary || due || self.snapshots.is_empty()) {
            return false;
        }

        self.snapshots.push(state.clone());
        self.cursor = self.snapshots.len() - 1;
        self.pending = 0;
        true
    }

    /// Moves one snapshot back. When the live state was never stored, the latest
    /// snapshot is returned first.
    pub fn back(&mut self) -> Option<&T> {
        if self.pending > 0 {
            self.pending = 0;
            return self.snapshots.get(self.cursor);
        }
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.snapshots.get(self.cursor)
    }

    /// Moves one snapshot forward, if one was stored after the cursor.
    pub fn forward(&mut self) -> Option<&T> {
        if self.pending > 0 || self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        self.snapshots.get(self.cursor)
    }

    pub fn go_to(&mut self, index: usize) -> Option<&T> {
        if index >= self.snapshots.len() {
            return None;
        }
        self.cursor = index;
        self.pending = 0;
        self.snapshots.get(index)
    }
}
