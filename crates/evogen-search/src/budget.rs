//! Search budgets — iteration, evaluation and wall-clock limits.
//!
//! Budgets are observers: the loop notifies them of events and asks whether
//! any limit has been crossed. Checks happen at iteration boundaries, so a
//! time budget can overshoot by at most one generation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Which resource a budget tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetKind {
    Iterations,
    Evaluations,
    /// Wall-clock time of the search loop itself.
    SearchTime,
    /// Wall-clock time since the budget was created.
    TotalTime,
}

impl fmt::Display for BudgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BudgetKind::Iterations => "iterations",
            BudgetKind::Evaluations => "evaluations",
            BudgetKind::SearchTime => "search time",
            BudgetKind::TotalTime => "total time",
        };
        f.write_str(name)
    }
}

/// One tracked limit. Time budgets measure milliseconds.
pub trait Budget {
    fn kind(&self) -> BudgetKind;
    fn used(&self) -> u64;
    fn limit(&self) -> u64;

    fn remaining(&self) -> u64 {
        self.limit().saturating_sub(self.used())
    }

    fn is_exhausted(&self) -> bool {
        self.used() >= self.limit()
    }

    fn on_search_start(&mut self) {}
    fn on_iteration(&mut self) {}
    fn on_evaluation(&mut self) {}
}

pub struct IterationBudget {
    used: u64,
    limit: u64,
}

impl IterationBudget {
    pub fn new(limit: u64) -> Self {
        Self { used: 0, limit }
    }
}

impl Budget for IterationBudget {
    fn kind(&self) -> BudgetKind {
        BudgetKind::Iterations
    }

    fn used(&self) -> u64 {
        self.used
    }

    fn limit(&self) -> u64 {
        self.limit
    }

    fn on_iteration(&mut self) {
        self.used += 1;
    }
}

pub struct EvaluationBudget {
    used: u64,
    limit: u64,
}

impl EvaluationBudget {
    pub fn new(limit: u64) -> Self {
        Self { used: 0, limit }
    }
}

impl Budget for EvaluationBudget {
    fn kind(&self) -> BudgetKind {
        BudgetKind::Evaluations
    }

    fn used(&self) -> u64 {
        self.used
    }

    fn limit(&self) -> u64 {
        self.limit
    }

    fn on_evaluation(&mut self) {
        self.used += 1;
    }
}

/// Wall-clock limit on the search loop. The clock starts at
/// [`Budget::on_search_start`], not at construction.
pub struct SearchTimeBudget {
    limit_ms: u64,
    started: Option<Instant>,
}

impl SearchTimeBudget {
    pub fn new(limit_ms: u64) -> Self {
        Self {
            limit_ms,
            started: None,
        }
    }
}

impl Budget for SearchTimeBudget {
    fn kind(&self) -> BudgetKind {
        BudgetKind::SearchTime
    }

    fn used(&self) -> u64 {
        self.started
            .map(|s| s.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    fn limit(&self) -> u64 {
        self.limit_ms
    }

    fn on_search_start(&mut self) {
        self.started = Some(Instant::now());
    }
}

/// Wall-clock limit covering everything since construction, including
/// pre-search setup such as instrumentation and CFG loading.
pub struct TotalTimeBudget {
    limit_ms: u64,
    created: Instant,
}

impl TotalTimeBudget {
    pub fn new(limit_ms: u64) -> Self {
        Self {
            limit_ms,
            created: Instant::now(),
        }
    }
}

impl Budget for TotalTimeBudget {
    fn kind(&self) -> BudgetKind {
        BudgetKind::TotalTime
    }

    fn used(&self) -> u64 {
        self.created.elapsed().as_millis() as u64
    }

    fn limit(&self) -> u64 {
        self.limit_ms
    }
}

/// Fans events out to every registered budget.
pub struct BudgetManager {
    budgets: Vec<Box<dyn Budget>>,
}

impl BudgetManager {
    pub fn new() -> Self {
        Self {
            budgets: Vec::new(),
        }
    }

    pub fn add_budget(&mut self, budget: Box<dyn Budget>) {
        self.budgets.push(budget);
    }

    pub fn start_search(&mut self) {
        for budget in &mut self.budgets {
            budget.on_search_start();
        }
    }

    pub fn record_iteration(&mut self) {
        for budget in &mut self.budgets {
            budget.on_iteration();
        }
    }

    pub fn record_evaluation(&mut self) {
        for budget in &mut self.budgets {
            budget.on_evaluation();
        }
    }

    /// The first exhausted budget, if any.
    pub fn any_exhausted(&self) -> Option<BudgetKind> {
        for budget in &self.budgets {
            if budget.is_exhausted() {
                log::info!(
                    "{} budget exhausted ({}/{})",
                    budget.kind(),
                    budget.used(),
                    budget.limit()
                );
                return Some(budget.kind());
            }
        }
        None
    }

    pub fn used(&self, kind: BudgetKind) -> Option<u64> {
        self.budgets
            .iter()
            .find(|b| b.kind() == kind)
            .map(|b| b.used())
    }
}

impl Default for BudgetManager {
    fn default() -> Self {
        Self::new()
    }
}
