//! `TestCase` — the concrete genome.

use crate::encoding::{Encoding, EncodingId, ObjectiveId};
use crate::execution::ExecutionResult;
use crate::operators::OperatorError;
use crate::statement::Statement;
use std::collections::BTreeMap;
use std::fmt;

/// A candidate test case: one or more action roots, plus the caches the
/// search layer reads (last execution result, per-objective distances).
///
/// Cloning via [`Encoding::copy`] yields a fully independent tree with
/// fresh node ids and empty caches.
#[derive(Debug, Clone)]
pub struct TestCase {
    id: EncodingId,
    roots: Vec<Statement>,
    distances: BTreeMap<ObjectiveId, f64>,
    execution: Option<ExecutionResult>,
}

impl TestCase {
    /// Build a test case. Every root must be an action statement and there
    /// must be at least one.
    pub fn new(roots: Vec<Statement>) -> Result<Self, OperatorError> {
        if roots.is_empty() {
            return Err(OperatorError::EmptyGenome);
        }
        if let Some(bad) = roots.iter().find(|r| !r.is_action()) {
            return Err(OperatorError::NonActionRoot(bad.to_string()));
        }
        Ok(Self {
            id: EncodingId::fresh(),
            roots,
            distances: BTreeMap::new(),
            execution: None,
        })
    }

    pub fn roots(&self) -> &[Statement] {
        &self.roots
    }

    /// Mutable access for operators. Caches are dropped because the genome
    /// is about to change.
    pub(crate) fn roots_mut(&mut self) -> &mut Vec<Statement> {
        self.distances.clear();
        self.execution = None;
        &mut self.roots
    }

    /// Total statement nodes across all roots.
    pub fn node_count(&self) -> usize {
        self.roots.iter().map(Statement::node_count).sum()
    }

    pub fn cached_distances(&self) -> &BTreeMap<ObjectiveId, f64> {
        &self.distances
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, root) in self.roots.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{root}")?;
        }
        Ok(())
    }
}

impl Encoding for TestCase {
    fn id(&self) -> EncodingId {
        self.id
    }

    fn size(&self) -> usize {
        self.roots.len()
    }

    fn copy(&self) -> Self {
        Self {
            id: EncodingId::fresh(),
            roots: self.roots.iter().map(Statement::deep_copy).collect(),
            distances: BTreeMap::new(),
            execution: None,
        }
    }

    fn cached_distance(&self, objective: &ObjectiveId) -> Option<f64> {
        self.distances.get(objective).copied()
    }

    fn cache_distance(&mut self, objective: ObjectiveId, distance: f64) {
        self.distances.insert(objective, distance);
    }

    fn execution_result(&self) -> Option<&ExecutionResult> {
        self.execution.as_ref()
    }

    fn set_execution_result(&mut self, result: ExecutionResult) {
        self.execution = Some(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case() -> TestCase {
        TestCase::new(vec![Statement::call(
            "login",
            vec![Statement::string("admin"), Statement::number(3.0)],
        )])
        .unwrap()
    }

    #[test]
    fn test_empty_roots_rejected() {
        assert!(matches!(
            TestCase::new(Vec::new()),
            Err(OperatorError::EmptyGenome)
        ));
    }

    #[test]
    fn test_non_action_root_rejected() {
        assert!(matches!(
            TestCase::new(vec![Statement::number(1.0)]),
            Err(OperatorError::NonActionRoot(_))
        ));
    }

    #[test]
    fn test_copy_is_independent() {
        let mut original = case();
        original.cache_distance(ObjectiveId::new("o1"), 0.5);
        original.set_execution_result(ExecutionResult::passed());

        let copy = original.copy();

        assert_ne!(copy.id(), original.id());
        assert!(copy.cached_distance(&ObjectiveId::new("o1")).is_none());
        assert!(copy.execution_result().is_none());

        // No shared node identities.
        let mut original_ids = Vec::new();
        let mut copy_ids = Vec::new();
        for root in original.roots() {
            root.collect_ids(&mut original_ids);
        }
        for root in copy.roots() {
            root.collect_ids(&mut copy_ids);
        }
        for id in copy_ids {
            assert!(!original_ids.contains(&id));
        }
    }

    #[test]
    fn test_distance_cache() {
        let mut case = case();
        let o = ObjectiveId::new("branch:1:true");
        assert!(case.cached_distance(&o).is_none());
        case.cache_distance(o.clone(), 0.25);
        assert_eq!(case.cached_distance(&o), Some(0.25));
    }

    #[test]
    fn test_roots_mut_invalidates_caches() {
        let mut case = case();
        case.cache_distance(ObjectiveId::new("o1"), 0.5);
        case.set_execution_result(ExecutionResult::passed());

        case.roots_mut().push(Statement::call("logout", Vec::new()));

        assert!(case.cached_distances().is_empty());
        assert!(case.execution_result().is_none());
        assert_eq!(case.size(), 2);
    }

    #[test]
    fn test_node_count() {
        assert_eq!(case().node_count(), 3);
    }
}
