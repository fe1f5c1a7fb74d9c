//! Objective managers — which objectives the search optimizes for, when.
//!
//! Three policies, one per algorithm family: keep everything active
//! ([`SimpleObjectiveManager`]), retire objectives as they are covered
//! ([`UncoveredObjectiveManager`]), or additionally keep objectives dormant
//! until the covered region of the CFG grows close enough to reach them
//! ([`StructuralObjectiveManager`]).

use crate::archive::Archive;
use crate::objective::ObjectiveFunction;
use crate::subject::SearchSubject;
use evogen_cfg::ControlFlowGraph;
use evogen_encoding::{Encoding, ObjectiveId};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub trait ObjectiveManager<E: Encoding> {
    /// Objective functions the search currently optimizes for.
    fn current(&self) -> Vec<Arc<dyn ObjectiveFunction<E>>>;

    fn current_ids(&self) -> Vec<ObjectiveId>;

    fn covered(&self) -> &BTreeSet<ObjectiveId>;

    fn total(&self) -> usize;

    /// Digest a freshly evaluated pool: update the archive, flip coverage
    /// state, promote or retire objectives per policy.
    fn update(&mut self, archive: &mut Archive<E>, pool: &[E]);
}

/// Shared bookkeeping for all manager policies.
struct ObjectiveRegistry<E: Encoding> {
    all: BTreeMap<ObjectiveId, Arc<dyn ObjectiveFunction<E>>>,
    current: BTreeSet<ObjectiveId>,
    covered: BTreeSet<ObjectiveId>,
}

impl<E: Encoding> ObjectiveRegistry<E> {
    fn from_subject(subject: &SearchSubject<E>) -> Self {
        let all: BTreeMap<_, _> = subject
            .objectives()
            .iter()
            .map(|o| (o.id().clone(), Arc::clone(o)))
            .collect();
        Self {
            all,
            current: BTreeSet::new(),
            covered: BTreeSet::new(),
        }
    }

    fn current_functions(&self) -> Vec<Arc<dyn ObjectiveFunction<E>>> {
        self.current
            .iter()
            .map(|id| Arc::clone(&self.all[id]))
            .collect()
    }

    /// Archive every zero-distance witness in the pool and return the
    /// objectives that flipped from uncovered to covered.
    fn record_coverage(&mut self, archive: &mut Archive<E>, pool: &[E]) -> BTreeSet<ObjectiveId> {
        let mut newly = BTreeSet::new();
        for individual in pool {
            for id in self.all.keys() {
                if individual.cached_distance(id) == Some(0.0) {
                    archive.update(id, individual);
                    if self.covered.insert(id.clone()) {
                        log::info!("objective covered: {id}");
                        newly.insert(id.clone());
                    }
                }
            }
        }
        newly
    }
}

/// Every objective active from the start; covering one moves it out of the
/// active set one at a time.
pub struct SimpleObjectiveManager<E: Encoding> {
    registry: ObjectiveRegistry<E>,
}

impl<E: Encoding> SimpleObjectiveManager<E> {
    pub fn new(subject: &SearchSubject<E>) -> Self {
        let mut registry = ObjectiveRegistry::from_subject(subject);
        registry.current = registry.all.keys().cloned().collect();
        Self { registry }
    }
}

impl<E: Encoding> ObjectiveManager<E> for SimpleObjectiveManager<E> {
    fn current(&self) -> Vec<Arc<dyn ObjectiveFunction<E>>> {
        self.registry.current_functions()
    }

    fn current_ids(&self) -> Vec<ObjectiveId> {
        self.registry.current.iter().cloned().collect()
    }

    fn covered(&self) -> &BTreeSet<ObjectiveId> {
        &self.registry.covered
    }

    fn total(&self) -> usize {
        self.registry.all.len()
    }

    fn update(&mut self, archive: &mut Archive<E>, pool: &[E]) {
        let newly = self.registry.record_coverage(archive, pool);
        for id in &newly {
            self.registry.current.remove(id);
        }
    }
}

/// Same end state as [`SimpleObjectiveManager`] but re-derives the active
/// set as `all − covered` on every update, the bookkeeping plain MOSA
/// expects when it evaluates against the whole remaining uncovered set.
pub struct UncoveredObjectiveManager<E: Encoding> {
    registry: ObjectiveRegistry<E>,
}

impl<E: Encoding> UncoveredObjectiveManager<E> {
    pub fn new(subject: &SearchSubject<E>) -> Self {
        let mut registry = ObjectiveRegistry::from_subject(subject);
        registry.current = registry.all.keys().cloned().collect();
        Self { registry }
    }
}

impl<E: Encoding> ObjectiveManager<E> for UncoveredObjectiveManager<E> {
    fn current(&self) -> Vec<Arc<dyn ObjectiveFunction<E>>> {
        self.registry.current_functions()
    }

    fn current_ids(&self) -> Vec<ObjectiveId> {
        self.registry.current.iter().cloned().collect()
    }

    fn covered(&self) -> &BTreeSet<ObjectiveId> {
        &self.registry.covered
    }

    fn total(&self) -> usize {
        self.registry.all.len()
    }

    fn update(&mut self, archive: &mut Archive<E>, pool: &[E]) {
        self.registry.record_coverage(archive, pool);
        self.registry.current = self
            .registry
            .all
            .keys()
            .filter(|id| !self.registry.covered.contains(*id))
            .cloned()
            .collect();
    }
}

/// Structural activation: an objective only becomes active once the covered
/// region of the CFG has grown close enough that pursuing it is plausible.
///
/// Dormant objectives are grouped by the nearest covered ancestor of their
/// decision node; within each group only the nearest ones activate, so the
/// active set tracks the coverage frontier instead of flooding with deep,
/// currently hopeless targets.
pub struct StructuralObjectiveManager<E: Encoding> {
    registry: ObjectiveRegistry<E>,
    cfg: Arc<ControlFlowGraph>,
    covered_nodes: BTreeSet<String>,
}

impl<E: Encoding> StructuralObjectiveManager<E> {
    pub fn new(subject: &SearchSubject<E>) -> Self {
        let registry = ObjectiveRegistry::from_subject(subject);
        let cfg = Arc::clone(subject.cfg());

        let mut covered_nodes = BTreeSet::new();
        if let Some(entry) = cfg.entry() {
            covered_nodes.insert(entry.id.clone());
        } else {
            log::warn!("control-flow graph has no entry node, nothing will activate");
        }

        let mut manager = Self {
            registry,
            cfg,
            covered_nodes,
        };
        manager.promote_reachable();
        manager
    }

    /// Activate the dormant objectives on the current coverage frontier.
    fn promote_reachable(&mut self) {
        // ancestor node id -> (best distance seen, candidate objective ids)
        let mut groups: BTreeMap<String, (u32, Vec<ObjectiveId>)> = BTreeMap::new();

        for (id, objective) in &self.registry.all {
            if self.registry.current.contains(id) || self.registry.covered.contains(id) {
                continue;
            }
            let Some(ancestor) = self
                .cfg
                .closest_covered_ancestor(objective.decision_node(), &self.covered_nodes)
            else {
                continue;
            };

            let entry = groups
                .entry(ancestor.node_id)
                .or_insert((ancestor.distance, Vec::new()));
            if ancestor.distance < entry.0 {
                *entry = (ancestor.distance, vec![id.clone()]);
            } else if ancestor.distance == entry.0 {
                entry.1.push(id.clone());
            }
        }

        for (_, (_, ids)) in groups {
            for id in ids {
                log::debug!("objective activated: {id}");
                self.registry.current.insert(id);
            }
        }
    }
}

impl<E: Encoding> ObjectiveManager<E> for StructuralObjectiveManager<E> {
    fn current(&self) -> Vec<Arc<dyn ObjectiveFunction<E>>> {
        self.registry.current_functions()
    }

    fn current_ids(&self) -> Vec<ObjectiveId> {
        self.registry.current.iter().cloned().collect()
    }

    fn covered(&self) -> &BTreeSet<ObjectiveId> {
        &self.registry.covered
    }

    fn total(&self) -> usize {
        self.registry.all.len()
    }

    fn update(&mut self, archive: &mut Archive<E>, pool: &[E]) {
        let newly = self.registry.record_coverage(archive, pool);
        if newly.is_empty() {
            return;
        }
        for id in &newly {
            self.registry.current.remove(id);
            let objective = &self.registry.all[id];
            self.covered_nodes
                .insert(objective.decision_node().to_string());
            self.covered_nodes
                .insert(objective.target_node().to_string());
        }
        self.promote_reachable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evogen_cfg::{Edge, Node, NodeKind};
    use evogen_encoding::{Statement, TestCase};

    // ROOT -> 1 -(t)-> 2 -> 4 -(t)-> 5
    //           (f)-> 3      (f)-> 6
    fn nested_cfg() -> Arc<ControlFlowGraph> {
        Arc::new(
            ControlFlowGraph::new(
                vec![
                    Node::new("ROOT", NodeKind::Root),
                    Node::new("1", NodeKind::Branch),
                    Node::new("2", NodeKind::Intermediary),
                    Node::new("3", NodeKind::Intermediary),
                    Node::new("4", NodeKind::Branch),
                    Node::new("5", NodeKind::Intermediary),
                    Node::new("6", NodeKind::Intermediary),
                ],
                vec![
                    Edge::plain("ROOT", "1"),
                    Edge::branch("1", "2", true),
                    Edge::branch("1", "3", false),
                    Edge::plain("2", "4"),
                    Edge::branch("4", "5", true),
                    Edge::branch("4", "6", false),
                ],
            )
            .unwrap(),
        )
    }

    fn subject() -> SearchSubject<TestCase> {
        SearchSubject::from_cfg("nested", nested_cfg())
    }

    fn witness(covering: &[&str]) -> TestCase {
        let mut case = TestCase::new(vec![Statement::call("f", Vec::new())]).unwrap();
        for id in covering {
            case.cache_distance(ObjectiveId::new(*id), 0.0);
        }
        case
    }

    #[test]
    fn test_simple_manager_retires_covered() {
        let subject = subject();
        let mut manager = SimpleObjectiveManager::new(&subject);
        let mut archive = Archive::new();
        assert_eq!(manager.total(), 4);
        assert_eq!(manager.current_ids().len(), 4);

        manager.update(&mut archive, &[witness(&["branch:1:true"])]);
        assert_eq!(manager.covered().len(), 1);
        assert_eq!(manager.current_ids().len(), 3);
        assert_eq!(archive.len(), 1);

        // Current and covered never overlap.
        for id in manager.current_ids() {
            assert!(!manager.covered().contains(&id));
        }
    }

    #[test]
    fn test_uncovered_manager_retires_covered() {
        let subject = subject();
        let mut manager = UncoveredObjectiveManager::new(&subject);
        let mut archive = Archive::new();
        assert_eq!(manager.current_ids().len(), 4);

        manager.update(&mut archive, &[witness(&["branch:1:true"])]);
        assert_eq!(manager.current_ids().len(), 3);
        assert!(!manager
            .current_ids()
            .contains(&ObjectiveId::new("branch:1:true")));
        assert!(manager.covered().contains(&ObjectiveId::new("branch:1:true")));
    }

    #[test]
    fn test_coverage_never_regresses() {
        let subject = subject();
        let mut manager = UncoveredObjectiveManager::new(&subject);
        let mut archive = Archive::new();

        manager.update(&mut archive, &[witness(&["branch:1:true"])]);
        // A later pool without the witness changes nothing.
        manager.update(&mut archive, &[witness(&[])]);
        assert!(manager.covered().contains(&ObjectiveId::new("branch:1:true")));
        assert!(archive.covers(&ObjectiveId::new("branch:1:true")));
    }

    #[test]
    fn test_structural_manager_starts_at_frontier() {
        let subject = subject();
        let manager = StructuralObjectiveManager::new(&subject);

        // Only node 1's outcomes are near the entry; node 4's are dormant.
        let current = manager.current_ids();
        assert_eq!(current.len(), 2);
        assert!(current.contains(&ObjectiveId::new("branch:1:true")));
        assert!(current.contains(&ObjectiveId::new("branch:1:false")));
    }

    #[test]
    fn test_structural_manager_promotes_on_coverage() {
        let subject = subject();
        let mut manager = StructuralObjectiveManager::new(&subject);
        let mut archive = Archive::new();

        manager.update(&mut archive, &[witness(&["branch:1:true"])]);

        // Covering 1:true reaches node 2, so node 4's outcomes activate.
        let current = manager.current_ids();
        assert!(current.contains(&ObjectiveId::new("branch:4:true")));
        assert!(current.contains(&ObjectiveId::new("branch:4:false")));
        assert!(current.contains(&ObjectiveId::new("branch:1:false")));
        assert!(!current.contains(&ObjectiveId::new("branch:1:true")));
    }
}
