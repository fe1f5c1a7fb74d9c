//! The subject under test: a CFG plus the objectives derived from it.

use crate::objective::{BranchObjective, ObjectiveFunction};
use evogen_cfg::ControlFlowGraph;
use evogen_encoding::{Encoding, ObjectiveId};
use std::sync::Arc;

/// Canonical objective id for one branch outcome.
pub fn objective_id_for_branch(decision_node: &str, outcome: bool) -> ObjectiveId {
    ObjectiveId::new(format!("branch:{decision_node}:{outcome}"))
}

/// Everything the search needs to know about one target program.
pub struct SearchSubject<E: Encoding> {
    name: String,
    cfg: Arc<ControlFlowGraph>,
    objectives: Vec<Arc<dyn ObjectiveFunction<E>>>,
}

impl<E: Encoding> SearchSubject<E> {
    pub fn new(
        name: impl Into<String>,
        cfg: Arc<ControlFlowGraph>,
        objectives: Vec<Arc<dyn ObjectiveFunction<E>>>,
    ) -> Self {
        Self {
            name: name.into(),
            cfg,
            objectives,
        }
    }

    /// Derive one branch objective per control edge of the CFG.
    pub fn from_cfg(name: impl Into<String>, cfg: Arc<ControlFlowGraph>) -> Self {
        let mut objectives: Vec<Arc<dyn ObjectiveFunction<E>>> = Vec::new();
        for edge in cfg.edges() {
            if let Some(outcome) = edge.branch_type {
                objectives.push(Arc::new(BranchObjective::new(
                    edge.from.clone(),
                    edge.to.clone(),
                    outcome,
                    Arc::clone(&cfg),
                )));
            }
        }
        log::info!(
            "derived {} branch objectives from control-flow graph",
            objectives.len()
        );
        Self::new(name, cfg, objectives)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cfg(&self) -> &Arc<ControlFlowGraph> {
        &self.cfg
    }

    pub fn objectives(&self) -> &[Arc<dyn ObjectiveFunction<E>>] {
        &self.objectives
    }
}
