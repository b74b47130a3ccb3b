//! Recording session store
//!
//! Holds the TMSI sets recorded during each start/stop window and the window
//! currently open. Sets are ordered so listings come out sorted.
//!
//! Identities paged while idle are treated as noise: they are removed from
//! every recorded window, which narrows the correlation result further.

use std::collections::BTreeSet;

use tmsimap_common::Tmsi;

/// What [`SessionStore::observe`] did with a TMSI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Added to the open session (or already in it)
    Recorded,
    /// Removed from the recorded history
    Filtered {
        /// Number of sessions the TMSI was removed from
        removed: usize,
    },
}

/// Per-slave store of recording sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    recording: bool,
    current: BTreeSet<Tmsi>,
    history: Vec<BTreeSet<Tmsi>>,
}

impl SessionStore {
    /// Creates an idle store with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a session is open.
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Returns the open session, if any.
    pub fn current(&self) -> Option<&BTreeSet<Tmsi>> {
        self.recording.then_some(&self.current)
    }

    /// Returns the closed sessions in the order they were recorded.
    pub fn history(&self) -> &[BTreeSet<Tmsi>] {
        &self.history
    }

    /// Opens a new empty session, discarding any uncommitted one.
    pub fn start(&mut self) {
        self.current.clear();
        self.recording = true;
    }

    /// Closes the open session and appends it to the history.
    ///
    /// Without an open session an empty one is appended.
    pub fn stop(&mut self) {
        self.history.push(std::mem::take(&mut self.current));
        self.recording = false;
    }

    /// Drops the history and any open session.
    pub fn flush(&mut self) {
        self.history.clear();
        self.current.clear();
        self.recording = false;
    }

    /// Feeds one paged TMSI into the store.
    pub fn observe(&mut self, tmsi: Tmsi) -> Observation {
        if self.recording {
            self.current.insert(tmsi);
            return Observation::Recorded;
        }

        let removed = self
            .history
            .iter_mut()
            .map(|session| session.remove(&tmsi))
            .filter(|&hit| hit)
            .count();
        Observation::Filtered { removed }
    }

    /// Returns the TMSIs present in every recorded session.
    ///
    /// Empty until at least two sessions have been recorded.
    pub fn cross(&self) -> BTreeSet<Tmsi> {
        let Some((first, rest)) = self.history.split_first() else {
            return BTreeSet::new();
        };
        if rest.is_empty() {
            return BTreeSet::new();
        }

        first
            .iter()
            .filter(|tmsi| rest.iter().all(|session| session.contains(tmsi)))
            .copied()
            .collect()
    }
}
