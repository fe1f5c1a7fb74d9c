//! Many-objective search engine for coverage-guided test generation.
//!
//! This crate runs the actual search: given a control-flow graph and a way
//! to execute candidate test cases, it evolves a population of encodings
//! towards covering every branch objective of the subject.
//!
//! # Architecture
//!
//! ```text
//! 1. Derive one objective per branch outcome from the CFG
//! 2. Sample an initial population of test-case encodings
//! 3. Each generation:
//!    - Breed offspring (tournament selection, crossover, mutation)
//!    - Execute new encodings, cache per-objective distances
//!    - Archive every zero-distance witness (coverage is monotone)
//!    - Rank the merged pool (preference sorting + non-dominated sorting)
//!    - Cut the next population by crowding distance
//! 4. Stop on budget exhaustion, external signal, or full coverage
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use evogen_cfg::ControlFlowGraph;
//! use evogen_encoding::{FixtureSampler, MutationConfig, TreeCrossover, TreeMutation};
//! use evogen_search::algorithms::{Mosa, SearchAlgorithm, SearchConfig};
//! use evogen_search::budget::{BudgetManager, IterationBudget};
//! use evogen_search::report::format_report;
//! use evogen_search::subject::SearchSubject;
//! use evogen_search::termination::TerminationManager;
//! use std::sync::Arc;
//!
//! # fn run(runner: Box<dyn evogen_search::Runner<evogen_encoding::TestCase>>) {
//! let cfg = Arc::new(ControlFlowGraph::from_json(r#"{"nodes": [], "edges": []}"#).unwrap());
//! let subject = SearchSubject::from_cfg("calculator", Arc::clone(&cfg));
//!
//! let targets = vec!["add".to_string(), "div".to_string()];
//! let sampler = FixtureSampler::new(42, targets.clone());
//! let mutation = TreeMutation::new(42, FixtureSampler::new(43, targets), MutationConfig::default());
//!
//! let mut search = Mosa::dynamosa(
//!     &subject,
//!     SearchConfig::default(),
//!     Box::new(sampler),
//!     Box::new(mutation),
//!     Box::new(TreeCrossover::new(42)),
//!     runner,
//! )
//! .unwrap();
//!
//! let mut budgets = BudgetManager::new();
//! budgets.add_budget(Box::new(IterationBudget::new(100)));
//! let outcome = search.search(&mut budgets, &TerminationManager::new()).unwrap();
//!
//! println!("{}", format_report(&outcome.report));
//! # }
//! ```
//!
//! # Module Structure
//!
//! - [`objective`] — Branch and function coverage objectives
//! - [`subject`] — The subject under test (CFG + derived objectives)
//! - [`ranking`] — Dominance, preference sorting, crowding distance
//! - [`manager`] — Objective activation policies (simple / MOSA / DynaMOSA)
//! - [`archive`] — Best covering test per objective
//! - [`evaluation`] — Runner invocation and distance caching
//! - [`budget`] / [`termination`] — Resource limits and stop conditions
//! - [`algorithms`] — MOSA, DynaMOSA, NSGA-II, random search
//! - [`events`] / [`report`] — Observation hooks and run reports
//!
//! # Determinism
//!
//! Given the same seed and a deterministic runner, a whole search run
//! replays exactly: seeded `ChaCha8Rng` throughout, `BTreeMap`/`BTreeSet`
//! for every keyed collection, no wall-clock dependence outside the time
//! budgets.

pub mod algorithms;
pub mod archive;
pub mod budget;
pub mod evaluation;
pub mod events;
pub mod manager;
pub mod objective;
pub mod ranking;
pub mod report;
pub mod subject;
pub mod termination;

pub use algorithms::{
    Mosa, Nsga2, RandomSearch, SearchAlgorithm, SearchConfig, SearchError, SearchOutcome,
};
pub use archive::Archive;
pub use budget::{
    Budget, BudgetKind, BudgetManager, EvaluationBudget, IterationBudget, SearchTimeBudget,
    TotalTimeBudget,
};
pub use evaluation::Evaluator;
pub use events::{IterationStats, LogListener, SearchListener};
pub use manager::{
    ObjectiveManager, SimpleObjectiveManager, StructuralObjectiveManager,
    UncoveredObjectiveManager,
};
pub use objective::{BranchObjective, FunctionObjective, ObjectiveFunction};
pub use ranking::{
    crowding_distance, dominance_compare, environmental_selection, fast_non_dominated_sort,
    preference_sort, Dominance,
};
pub use report::{format_report, load_report, save_report, CoveragePoint, SearchReport};
pub use subject::SearchSubject;
pub use termination::{
    CancellationToken, SignalTrigger, StopReason, TerminationManager, TerminationTrigger,
};

// These live with the encodings; re-exported here because every embedder
// of the search needs them.
pub use evogen_encoding::{Encoding, ObjectiveId, Runner};

#[cfg(test)]
mod tests {
    use super::*;
    use evogen_encoding::{ObjectiveId, Statement, TestCase};

    #[test]
    fn test_module_exports() {
        let mut archive: Archive<TestCase> = Archive::new();
        let case = TestCase::new(vec![Statement::call("f", Vec::new())]).unwrap();
        archive.update(&ObjectiveId::new("branch:1:true"), &case);
        assert_eq!(archive.len(), 1);
        assert!(SearchConfig::default().validate().is_ok());
    }
}
