//! Coverage objectives — fitness functions over executed encodings.
//!
//! Every objective maps an executed encoding to a non-negative distance;
//! zero means covered. Branch objectives combine three regimes: the desired
//! outcome was taken (0), the decision node was reached but the outcome was
//! not taken (normalized branch distance, in `[0, 1)`), or the decision node
//! was never reached (approach level through the CFG, always ≥ 1, so any
//! reaching individual dominates any non-reaching one).

use crate::subject::objective_id_for_branch;
use evogen_cfg::ControlFlowGraph;
use evogen_distance::BranchDistance;
use evogen_encoding::{Encoding, ObjectiveId};
use std::sync::Arc;

/// A single coverage objective.
pub trait ObjectiveFunction<E: Encoding> {
    fn id(&self) -> &ObjectiveId;

    /// CFG node an encoding must reach before this objective can close.
    fn decision_node(&self) -> &str;

    /// CFG node that is provably covered once this objective reaches zero.
    fn target_node(&self) -> &str;

    /// Distance of `encoding` to this objective. Never negative, never NaN.
    fn calculate(&self, encoding: &E) -> f64;
}

/// One outcome of one branch node.
pub struct BranchObjective {
    id: ObjectiveId,
    decision_node: String,
    target_node: String,
    desired: bool,
    cfg: Arc<ControlFlowGraph>,
    distance: BranchDistance,
}

impl BranchObjective {
    pub fn new(
        decision_node: impl Into<String>,
        target_node: impl Into<String>,
        desired: bool,
        cfg: Arc<ControlFlowGraph>,
    ) -> Self {
        let decision_node = decision_node.into();
        Self {
            id: objective_id_for_branch(&decision_node, desired),
            decision_node,
            target_node: target_node.into(),
            desired,
            cfg,
            distance: BranchDistance::default(),
        }
    }

    pub fn desired_outcome(&self) -> bool {
        self.desired
    }

    /// Score when no covered ancestor is reachable at all. Strictly worse
    /// than any possible approach level.
    fn unreachable_score(&self) -> f64 {
        self.cfg.node_count() as f64 + 2.0
    }
}

impl<E: Encoding> ObjectiveFunction<E> for BranchObjective {
    fn id(&self) -> &ObjectiveId {
        &self.id
    }

    fn decision_node(&self) -> &str {
        &self.decision_node
    }

    fn target_node(&self) -> &str {
        &self.target_node
    }

    fn calculate(&self, encoding: &E) -> f64 {
        let Some(result) = encoding.execution_result() else {
            return self.unreachable_score();
        };

        if let Some(trace) = result.trace_for(&self.decision_node) {
            if trace.hits(self.desired) > 0 {
                return 0.0;
            }
            if trace.reached() {
                return self
                    .distance
                    .calculate(&trace.predicate, &trace.bindings, self.desired);
            }
        }

        // Decision node never reached: approach level through the CFG,
        // shifted by one so it always exceeds any branch distance.
        match self
            .cfg
            .closest_covered_ancestor(&self.decision_node, &result.covered_nodes)
        {
            Some(ancestor) => ancestor.distance as f64 + 1.0,
            None => self.unreachable_score(),
        }
    }
}

/// Entry coverage of one function.
pub struct FunctionObjective {
    id: ObjectiveId,
    function: String,
    root_node: String,
}

impl FunctionObjective {
    pub fn new(function: impl Into<String>, root_node: impl Into<String>) -> Self {
        let function = function.into();
        Self {
            id: ObjectiveId::new(format!("function:{function}")),
            function,
            root_node: root_node.into(),
        }
    }
}

impl<E: Encoding> ObjectiveFunction<E> for FunctionObjective {
    fn id(&self) -> &ObjectiveId {
        &self.id
    }

    fn decision_node(&self) -> &str {
        &self.root_node
    }

    fn target_node(&self) -> &str {
        &self.root_node
    }

    fn calculate(&self, encoding: &E) -> f64 {
        match encoding.execution_result() {
            Some(result) if result.covered_functions.contains(&self.function) => 0.0,
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evogen_cfg::{Edge, Node, NodeKind};
    use evogen_distance::Value;
    use evogen_encoding::execution::BranchTrace;
    use evogen_encoding::{ExecutionResult, Statement, TestCase};

    fn diamond() -> Arc<ControlFlowGraph> {
        Arc::new(
            ControlFlowGraph::new(
                vec![
                    Node::new("ROOT", NodeKind::Root),
                    Node::new("1", NodeKind::Branch),
                    Node::new("2", NodeKind::Intermediary),
                    Node::new("3", NodeKind::Intermediary),
                ],
                vec![
                    Edge::plain("ROOT", "1"),
                    Edge::branch("1", "2", true),
                    Edge::branch("1", "3", false),
                ],
            )
            .unwrap(),
        )
    }

    fn case() -> TestCase {
        TestCase::new(vec![Statement::call("f", vec![Statement::number(2.0)])]).unwrap()
    }

    fn executed(case: &mut TestCase, result: ExecutionResult) {
        case.set_execution_result(result);
    }

    fn trace(hits_true: u64, hits_false: u64) -> BranchTrace {
        let mut bindings = evogen_distance::Bindings::new();
        bindings.insert("x".into(), Value::Num(2.0));
        BranchTrace {
            node_id: "1".into(),
            predicate: "x > 5".into(),
            bindings,
            hits_true,
            hits_false,
        }
    }

    #[test]
    fn test_branch_covered_is_zero() {
        let objective = BranchObjective::new("1", "2", true, diamond());
        let mut case = case();
        let mut result = ExecutionResult::passed();
        result.branch_traces.push(trace(1, 0));
        executed(&mut case, result);
        assert_eq!(objective.calculate(&case), 0.0);
    }

    #[test]
    fn test_branch_reached_wrong_outcome_uses_branch_distance() {
        let objective = BranchObjective::new("1", "2", true, diamond());
        let mut case = case();
        let mut result = ExecutionResult::passed();
        result.branch_traces.push(trace(0, 1));
        executed(&mut case, result);

        // x = 2, want x > 5 true: raw gap 3 + 1 punishment, normalized.
        let d = <BranchObjective as ObjectiveFunction<TestCase>>::calculate(&objective, &case);
        assert_eq!(d, 0.8);
    }

    #[test]
    fn test_branch_unreached_uses_approach_level() {
        let objective = BranchObjective::new("1", "2", true, diamond());
        let mut case = case();
        let mut result = ExecutionResult::passed();
        result.covered_nodes.insert("ROOT".into());
        executed(&mut case, result);

        // Nearest covered ancestor is ROOT, one hop away: 1 + 1.
        let d = <BranchObjective as ObjectiveFunction<TestCase>>::calculate(&objective, &case);
        assert_eq!(d, 2.0);
    }

    #[test]
    fn test_branch_nothing_covered_is_worst() {
        let objective = BranchObjective::new("1", "2", true, diamond());
        let mut case = case();
        executed(&mut case, ExecutionResult::worst_case());

        let d = <BranchObjective as ObjectiveFunction<TestCase>>::calculate(&objective, &case);
        assert_eq!(d, 6.0); // node_count 4 + 2
    }

    #[test]
    fn test_branch_unexecuted_is_worst() {
        let objective = BranchObjective::new("1", "2", true, diamond());
        let d = <BranchObjective as ObjectiveFunction<TestCase>>::calculate(&objective, &case());
        assert_eq!(d, 6.0);
    }

    #[test]
    fn test_approach_level_always_dominates_branch_distance() {
        // A reaching individual must always score below a non-reaching one.
        let objective = BranchObjective::new("1", "2", true, diamond());

        let mut reaching = case();
        let mut result = ExecutionResult::passed();
        result.branch_traces.push(trace(0, 1));
        executed(&mut reaching, result);

        let mut wandering = case();
        let mut result = ExecutionResult::passed();
        result.covered_nodes.insert("ROOT".into());
        executed(&mut wandering, result);

        let near = <BranchObjective as ObjectiveFunction<TestCase>>::calculate(
            &objective, &reaching,
        );
        let far = <BranchObjective as ObjectiveFunction<TestCase>>::calculate(
            &objective, &wandering,
        );
        assert!(near < 1.0);
        assert!(far >= 1.0);
    }

    #[test]
    fn test_function_objective() {
        let objective = FunctionObjective::new("login", "ROOT");
        let mut case = case();
        assert_eq!(
            <FunctionObjective as ObjectiveFunction<TestCase>>::calculate(&objective, &case),
            1.0
        );

        let mut result = ExecutionResult::passed();
        result.covered_functions.insert("login".into());
        executed(&mut case, result);
        assert_eq!(
            <FunctionObjective as ObjectiveFunction<TestCase>>::calculate(&objective, &case),
            0.0
        );
    }
}
