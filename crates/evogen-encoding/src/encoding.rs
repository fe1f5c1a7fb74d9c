//! The generic encoding contract and id types.

use crate::execution::ExecutionResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ENCODING_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of one encoding instance.
///
/// Fresh on every clone/mutation, so cached per-(objective, encoding)
/// distances can never be confused across genome edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EncodingId(u64);

impl EncodingId {
    pub fn fresh() -> Self {
        Self(NEXT_ENCODING_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for EncodingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Identity of one coverage objective (e.g. one branch outcome).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectiveId(String);

impl ObjectiveId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The contract the search engine is written against.
///
/// An encoding is a copyable genome carrying two caches: the most recent
/// execution result and per-objective distances. `copy()` must produce a
/// fully independent clone with a fresh [`EncodingId`] and empty caches —
/// downstream holders of the original must never observe mutations through
/// the copy.
pub trait Encoding: Clone {
    fn id(&self) -> EncodingId;

    /// Number of top-level (root) statements.
    fn size(&self) -> usize;

    /// Independent deep clone with fresh identities and cleared caches.
    fn copy(&self) -> Self;

    fn cached_distance(&self, objective: &ObjectiveId) -> Option<f64>;

    fn cache_distance(&mut self, objective: ObjectiveId, distance: f64);

    fn execution_result(&self) -> Option<&ExecutionResult>;

    fn set_execution_result(&mut self, result: ExecutionResult);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_ids_unique() {
        let a = EncodingId::fresh();
        let b = EncodingId::fresh();
        assert_ne!(a, b);
    }

    #[test]
    fn test_objective_id_ordering_is_stable() {
        let a = ObjectiveId::new("branch:1:true");
        let b = ObjectiveId::new("branch:1:false");
        assert!(b < a);
        assert_eq!(a.as_str(), "branch:1:true");
    }
}
