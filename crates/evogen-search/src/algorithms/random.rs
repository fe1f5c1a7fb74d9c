//! Random search — the sanity baseline.
//!
//! Samples a fresh batch every iteration with no selection pressure at all.
//! Anything an evolutionary algorithm cannot beat random search on is not
//! worth the evolutionary machinery.

use super::{SearchAlgorithm, SearchConfig, SearchError, SearchOutcome};
use crate::archive::Archive;
use crate::budget::BudgetManager;
use crate::evaluation::Evaluator;
use crate::events::{IterationStats, SearchListener};
use crate::manager::{ObjectiveManager, UncoveredObjectiveManager};
use crate::report::{CoveragePoint, SearchReport};
use crate::subject::SearchSubject;
use crate::termination::{StopReason, TerminationManager};
use evogen_encoding::{Encoding, EncodingSampler, Runner};

pub struct RandomSearch<E: Encoding> {
    subject_name: String,
    config: SearchConfig,
    sampler: Box<dyn EncodingSampler<E>>,
    evaluator: Evaluator<E>,
    manager: UncoveredObjectiveManager<E>,
    listeners: Vec<Box<dyn SearchListener<E>>>,
}

impl<E: Encoding> RandomSearch<E> {
    pub fn new(
        subject: &SearchSubject<E>,
        config: SearchConfig,
        sampler: Box<dyn EncodingSampler<E>>,
        runner: Box<dyn Runner<E>>,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self {
            subject_name: subject.name().to_string(),
            config,
            sampler,
            evaluator: Evaluator::new(runner),
            manager: UncoveredObjectiveManager::new(subject),
            listeners: Vec::new(),
        })
    }

    pub fn add_listener(&mut self, listener: Box<dyn SearchListener<E>>) {
        self.listeners.push(listener);
    }
}

impl<E: Encoding> SearchAlgorithm<E> for RandomSearch<E> {
    fn search(
        &mut self,
        budgets: &mut BudgetManager,
        termination: &TerminationManager,
    ) -> Result<SearchOutcome<E>, SearchError> {
        budgets.start_search();
        for listener in &mut self.listeners {
            listener.on_search_start(&self.subject_name);
        }

        let n = self.config.population_size;
        let mut archive = Archive::new();
        let mut series = Vec::new();
        let mut iteration = 0u64;

        let stop_reason = loop {
            if let Some(reason) = termination.check(budgets) {
                break reason;
            }
            if self.manager.current_ids().is_empty() {
                break StopReason::ObjectivesExhausted;
            }

            let mut batch: Vec<E> = (0..n).map(|_| self.sampler.sample()).collect();
            let objectives = self.manager.current();
            self.evaluator.evaluate(&mut batch, &objectives, budgets);
            self.manager.update(&mut archive, &batch);

            budgets.record_iteration();
            iteration += 1;

            let stats = IterationStats {
                iteration,
                evaluations: self.evaluator.executions(),
                covered: self.manager.covered().len(),
                total: self.manager.total(),
                front_size: 0,
                archive_size: archive.len(),
            };
            series.push(CoveragePoint {
                iteration,
                evaluations: stats.evaluations,
                covered: stats.covered,
            });
            for listener in &mut self.listeners {
                listener.on_iteration(&stats);
            }
        };

        let report = SearchReport {
            subject: self.subject_name.clone(),
            algorithm: "random".to_string(),
            stop_reason,
            iterations: iteration,
            evaluations: self.evaluator.executions(),
            covered_objectives: self.manager.covered().len(),
            total_objectives: self.manager.total(),
            series,
        };
        for listener in &mut self.listeners {
            listener.on_search_complete(&report);
        }

        Ok(SearchOutcome { archive, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::{BudgetKind, EvaluationBudget};
    use evogen_cfg::{ControlFlowGraph, Edge, Node, NodeKind};
    use evogen_distance::Bindings;
    use evogen_encoding::execution::BranchTrace;
    use evogen_encoding::{ExecutionResult, FixtureSampler, RunnerError, TestCase};
    use std::sync::Arc;

    struct SaturatingRunner;

    impl Runner<TestCase> for SaturatingRunner {
        fn execute(&mut self, _: &TestCase) -> Result<ExecutionResult, RunnerError> {
            let mut result = ExecutionResult::passed();
            for id in ["ROOT", "1", "2", "3"] {
                result.covered_nodes.insert(id.into());
            }
            result.branch_traces.push(BranchTrace {
                node_id: "1".into(),
                predicate: "x > 5".into(),
                bindings: Bindings::new(),
                hits_true: 1,
                hits_false: 1,
            });
            Ok(result)
        }
    }

    fn subject() -> SearchSubject<TestCase> {
        let cfg = Arc::new(
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
        );
        SearchSubject::from_cfg("diamond", cfg)
    }

    #[test]
    fn test_random_search_archives_coverage() {
        let subject = subject();
        let mut algorithm = RandomSearch::new(
            &subject,
            SearchConfig {
                population_size: 4,
                ..Default::default()
            },
            Box::new(FixtureSampler::new(7, vec!["f".into()])),
            Box::new(SaturatingRunner),
        )
        .unwrap();

        let mut budgets = BudgetManager::new();
        budgets.add_budget(Box::new(EvaluationBudget::new(100)));
        let outcome = algorithm
            .search(&mut budgets, &TerminationManager::new())
            .unwrap();

        assert_eq!(outcome.report.stop_reason, StopReason::ObjectivesExhausted);
        assert_eq!(outcome.report.covered_objectives, 2);
        assert_eq!(outcome.archive.len(), 2);
        // One batch was enough.
        assert_eq!(outcome.report.iterations, 1);
        assert_eq!(budgets.used(BudgetKind::Evaluations), Some(4));
    }
}
