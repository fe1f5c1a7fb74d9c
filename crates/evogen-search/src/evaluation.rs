//! Evaluation — executes encodings and fills their distance caches.
//!
//! The only component that touches the external runner. Execution happens
//! at most once per encoding identity; distance back-fill runs every
//! generation because the active objective set can grow between them.

use crate::budget::BudgetManager;
use crate::objective::ObjectiveFunction;
use evogen_encoding::{Encoding, ExecutionResult, Runner};
use std::sync::Arc;

pub struct Evaluator<E: Encoding> {
    runner: Box<dyn Runner<E>>,
    executions: u64,
}

impl<E: Encoding> Evaluator<E> {
    pub fn new(runner: Box<dyn Runner<E>>) -> Self {
        Self {
            runner,
            executions: 0,
        }
    }

    /// Total runner invocations so far.
    pub fn executions(&self) -> u64 {
        self.executions
    }

    /// Execute any not-yet-executed encodings and cache the distance to
    /// every objective in `objectives` that is not already cached.
    ///
    /// A runner timeout or crash degrades that one individual to the
    /// worst-case result and the generation continues.
    pub fn evaluate(
        &mut self,
        pool: &mut [E],
        objectives: &[Arc<dyn ObjectiveFunction<E>>],
        budgets: &mut BudgetManager,
    ) {
        for encoding in pool.iter_mut() {
            if encoding.execution_result().is_none() {
                let result = match self.runner.execute(encoding) {
                    Ok(result) => result,
                    Err(err) => {
                        log::warn!("execution of {} failed: {err}", encoding.id());
                        ExecutionResult::worst_case()
                    }
                };
                encoding.set_execution_result(result);
                self.executions += 1;
                budgets.record_evaluation();
            }

            for objective in objectives {
                if encoding.cached_distance(objective.id()).is_none() {
                    let distance = objective.calculate(encoding);
                    encoding.cache_distance(objective.id().clone(), distance);
                }
            }
        }
    }
}
