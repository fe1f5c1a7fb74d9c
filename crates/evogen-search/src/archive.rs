//! The archive — best witness per covered objective.
//!
//! Coverage is monotone: once an objective has a witness it never loses it.
//! A witness is only ever replaced by a strictly smaller one (fewer root
//! statements), so archived tests shrink over the run but never regress.

use evogen_encoding::{Encoding, ObjectiveId};
use std::collections::BTreeMap;

pub struct Archive<E: Encoding> {
    entries: BTreeMap<ObjectiveId, E>,
}

impl<E: Encoding> Archive<E> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Offer `candidate` as a witness for `objective`.
    ///
    /// The caller asserts the candidate actually covers the objective.
    /// Returns true when the archive changed.
    pub fn update(&mut self, objective: &ObjectiveId, candidate: &E) -> bool {
        match self.entries.get(objective) {
            None => {
                log::debug!("archive: first witness for {objective} ({})", candidate.id());
                self.entries.insert(objective.clone(), candidate.clone());
                true
            }
            Some(existing) if candidate.size() < existing.size() => {
                log::debug!(
                    "archive: smaller witness for {objective} ({} -> {} roots)",
                    existing.size(),
                    candidate.size()
                );
                self.entries.insert(objective.clone(), candidate.clone());
                true
            }
            Some(_) => false,
        }
    }

    pub fn witness(&self, objective: &ObjectiveId) -> Option<&E> {
        self.entries.get(objective)
    }

    pub fn covers(&self, objective: &ObjectiveId) -> bool {
        self.entries.contains_key(objective)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ObjectiveId, &E)> {
        self.entries.iter()
    }
}

impl<E: Encoding> Default for Archive<E> {
    fn default() -> Self {
        Self::new()
    }
}
