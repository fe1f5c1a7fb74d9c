//! Execution results and the external runner interface.
//!
//! Running a candidate test case against the instrumented program is an
//! external concern. This module pins down the boundary: what the runner
//! must accept (an immutable encoding) and what it must report back
//! (status, coverage hits, recorded branch evaluations).

use crate::encoding::Encoding;
use evogen_distance::Bindings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors from the external runner.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("execution timed out after {0} ms")]
    Timeout(u64),

    #[error("runner crashed: {0}")]
    Crashed(String),
}

/// Terminal status of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Passed,
    Failed,
    TimedOut,
    InfiniteLoop,
}

/// One recorded predicate evaluation site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchTrace {
    /// CFG id of the deciding branch node.
    pub node_id: String,
    /// Source text of the condition.
    pub predicate: String,
    /// Operand values captured at the last evaluation.
    pub bindings: Bindings,
    pub hits_true: u64,
    pub hits_false: u64,
}

impl BranchTrace {
    /// Whether the node was reached at all.
    pub fn reached(&self) -> bool {
        self.hits_true + self.hits_false > 0
    }

    pub fn hits(&self, outcome: bool) -> u64 {
        if outcome {
            self.hits_true
        } else {
            self.hits_false
        }
    }
}

/// Raw coverage observed while executing one encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub duration_ms: u64,
    /// CFG nodes whose probes fired.
    pub covered_nodes: BTreeSet<String>,
    /// Function entry probes that fired.
    pub covered_functions: BTreeSet<String>,
    pub branch_traces: Vec<BranchTrace>,
}

impl ExecutionResult {
    pub fn passed() -> Self {
        Self {
            status: ExecutionStatus::Passed,
            duration_ms: 0,
            covered_nodes: BTreeSet::new(),
            covered_functions: BTreeSet::new(),
            branch_traces: Vec::new(),
        }
    }

    /// The degraded result assigned when a runner times out or crashes:
    /// nothing covered, worst possible status. The generation proceeds with
    /// this individual scored maximally far from every objective.
    pub fn worst_case() -> Self {
        Self {
            status: ExecutionStatus::TimedOut,
            duration_ms: 0,
            covered_nodes: BTreeSet::new(),
            covered_functions: BTreeSet::new(),
            branch_traces: Vec::new(),
        }
    }

    pub fn covers_node(&self, node_id: &str) -> bool {
        self.covered_nodes.contains(node_id)
    }

    pub fn trace_for(&self, node_id: &str) -> Option<&BranchTrace> {
        self.branch_traces.iter().find(|t| t.node_id == node_id)
    }
}

/// External executor of candidate test cases.
///
/// Must be safe to call repeatedly and must not mutate the encoding. A
/// timeout or crash is reported as an error; the caller degrades that one
/// individual to [`ExecutionResult::worst_case`] and continues.
pub trait Runner<E: Encoding> {
    fn execute(&mut self, encoding: &E) -> Result<ExecutionResult, RunnerError>;
}
