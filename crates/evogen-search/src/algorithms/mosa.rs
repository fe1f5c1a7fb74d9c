//! MOSA — many-objective sorting algorithm, plus its DynaMOSA variant.
//!
//! Both run the same loop; they differ only in the objective manager. MOSA
//! optimizes every uncovered objective from the start, DynaMOSA keeps deep
//! objectives dormant until the coverage frontier reaches them.
//!
//! Each generation: preference sorting puts the per-objective champions in
//! front zero, the rest is layered by non-dominated sorting, and the next
//! population is cut by crowding distance.

use super::{
    generate_offspring, rank_population, SearchAlgorithm, SearchConfig, SearchError,
    SearchOutcome,
};
use crate::archive::Archive;
use crate::budget::BudgetManager;
use crate::evaluation::Evaluator;
use crate::events::{IterationStats, SearchListener};
use crate::manager::{ObjectiveManager, StructuralObjectiveManager, UncoveredObjectiveManager};
use crate::ranking;
use crate::report::{CoveragePoint, SearchReport};
use crate::subject::SearchSubject;
use crate::termination::{StopReason, TerminationManager};
use evogen_encoding::{CrossoverOperator, Encoding, EncodingSampler, MutationOperator, Runner};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub struct Mosa<E: Encoding> {
    subject_name: String,
    algorithm: &'static str,
    config: SearchConfig,
    sampler: Box<dyn EncodingSampler<E>>,
    mutation: Box<dyn MutationOperator<E>>,
    crossover: Box<dyn CrossoverOperator<E>>,
    evaluator: Evaluator<E>,
    manager: Box<dyn ObjectiveManager<E>>,
    listeners: Vec<Box<dyn SearchListener<E>>>,
    rng: ChaCha8Rng,
}

impl<E: Encoding + 'static> Mosa<E> {
    /// Classic MOSA: all uncovered objectives are active from generation 0.
    pub fn mosa(
        subject: &SearchSubject<E>,
        config: SearchConfig,
        sampler: Box<dyn EncodingSampler<E>>,
        mutation: Box<dyn MutationOperator<E>>,
        crossover: Box<dyn CrossoverOperator<E>>,
        runner: Box<dyn Runner<E>>,
    ) -> Result<Self, SearchError> {
        let manager = Box::new(UncoveredObjectiveManager::new(subject));
        Self::with_manager("mosa", subject, config, sampler, mutation, crossover, runner, manager)
    }

    /// DynaMOSA: objectives activate as the coverage frontier reaches them.
    pub fn dynamosa(
        subject: &SearchSubject<E>,
        config: SearchConfig,
        sampler: Box<dyn EncodingSampler<E>>,
        mutation: Box<dyn MutationOperator<E>>,
        crossover: Box<dyn CrossoverOperator<E>>,
        runner: Box<dyn Runner<E>>,
    ) -> Result<Self, SearchError> {
        let manager = Box::new(StructuralObjectiveManager::new(subject));
        Self::with_manager(
            "dynamosa", subject, config, sampler, mutation, crossover, runner, manager,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn with_manager(
        algorithm: &'static str,
        subject: &SearchSubject<E>,
        config: SearchConfig,
        sampler: Box<dyn EncodingSampler<E>>,
        mutation: Box<dyn MutationOperator<E>>,
        crossover: Box<dyn CrossoverOperator<E>>,
        runner: Box<dyn Runner<E>>,
        manager: Box<dyn ObjectiveManager<E>>,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self {
            subject_name: subject.name().to_string(),
            algorithm,
            config,
            sampler,
            mutation,
            crossover,
            evaluator: Evaluator::new(runner),
            manager,
            listeners: Vec::new(),
            rng,
        })
    }

    pub fn add_listener(&mut self, listener: Box<dyn SearchListener<E>>) {
        self.listeners.push(listener);
    }
}

impl<E: Encoding> SearchAlgorithm<E> for Mosa<E> {
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

        let mut population: Vec<E> = (0..n).map(|_| self.sampler.sample()).collect();
        let objectives = self.manager.current();
        self.evaluator.evaluate(&mut population, &objectives, budgets);
        self.manager.update(&mut archive, &population);

        let stop_reason = loop {
            if let Some(reason) = termination.check(budgets) {
                break reason;
            }
            let current_ids = self.manager.current_ids();
            if current_ids.is_empty() {
                break StopReason::ObjectivesExhausted;
            }

            let (ranks, crowding) = rank_population(&population, &current_ids);
            let mut offspring = generate_offspring(
                &population,
                &ranks,
                &crowding,
                &self.config,
                &mut self.rng,
                self.crossover.as_mut(),
                self.mutation.as_mut(),
            )?;
            let objectives = self.manager.current();
            self.evaluator.evaluate(&mut offspring, &objectives, budgets);

            let mut pool = std::mem::take(&mut population);
            pool.extend(offspring);
            self.manager.update(&mut archive, &pool);

            let current_ids = self.manager.current_ids();
            if current_ids.is_empty() {
                break StopReason::ObjectivesExhausted;
            }
            // Newly activated objectives need distances before ranking.
            let objectives = self.manager.current();
            self.evaluator.evaluate(&mut pool, &objectives, budgets);

            let champions = ranking::preference_sort(&pool, &current_ids, &mut self.rng);
            let rest: Vec<usize> = (0..pool.len())
                .filter(|i| !champions.contains(i))
                .collect();
            let mut fronts = vec![champions.clone()];
            fronts.extend(ranking::fast_non_dominated_sort_subset(
                &pool,
                &rest,
                &current_ids,
            ));

            population = ranking::environmental_selection(&pool, &fronts, n, &current_ids)?;

            budgets.record_iteration();
            iteration += 1;

            let stats = IterationStats {
                iteration,
                evaluations: self.evaluator.executions(),
                covered: self.manager.covered().len(),
                total: self.manager.total(),
                front_size: champions.len(),
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
            algorithm: self.algorithm.to_string(),
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
