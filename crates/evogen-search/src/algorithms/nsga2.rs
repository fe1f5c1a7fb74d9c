//! NSGA-II — the baseline generational many-objective algorithm.
//!
//! No preference sorting and no objective retirement: every objective stays
//! active for the whole run and selection is plain non-dominated sorting
//! with crowding. Mostly useful as a comparison baseline for MOSA.

use super::{
    generate_offspring, rank_population, SearchAlgorithm, SearchConfig, SearchError,
    SearchOutcome,
};
use crate::archive::Archive;
use crate::budget::BudgetManager;
use crate::evaluation::Evaluator;
use crate::events::{IterationStats, SearchListener};
use crate::manager::{ObjectiveManager, SimpleObjectiveManager};
use crate::ranking;
use crate::report::{CoveragePoint, SearchReport};
use crate::subject::SearchSubject;
use crate::termination::{StopReason, TerminationManager};
use evogen_encoding::{CrossoverOperator, Encoding, EncodingSampler, MutationOperator, Runner};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub struct Nsga2<E: Encoding> {
    subject_name: String,
    config: SearchConfig,
    sampler: Box<dyn EncodingSampler<E>>,
    mutation: Box<dyn MutationOperator<E>>,
    crossover: Box<dyn CrossoverOperator<E>>,
    evaluator: Evaluator<E>,
    manager: SimpleObjectiveManager<E>,
    listeners: Vec<Box<dyn SearchListener<E>>>,
    rng: ChaCha8Rng,
}

impl<E: Encoding> Nsga2<E> {
    pub fn new(
        subject: &SearchSubject<E>,
        config: SearchConfig,
        sampler: Box<dyn EncodingSampler<E>>,
        mutation: Box<dyn MutationOperator<E>>,
        crossover: Box<dyn CrossoverOperator<E>>,
        runner: Box<dyn Runner<E>>,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self {
            subject_name: subject.name().to_string(),
            config,
            sampler,
            mutation,
            crossover,
            evaluator: Evaluator::new(runner),
            manager: SimpleObjectiveManager::new(subject),
            listeners: Vec::new(),
            rng,
        })
    }

    pub fn add_listener(&mut self, listener: Box<dyn SearchListener<E>>) {
        self.listeners.push(listener);
    }
}

impl<E: Encoding> SearchAlgorithm<E> for Nsga2<E> {
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
        self.evaluator
            .evaluate(&mut population, &self.manager.current(), budgets);
        self.manager.update(&mut archive, &population);

        let stop_reason = loop {
            if let Some(reason) = termination.check(budgets) {
                break reason;
            }
            // The manager retires covered objectives, so refresh each round.
            let objectives = self.manager.current();
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
            self.evaluator.evaluate(&mut offspring, &objectives, budgets);

            let mut pool = std::mem::take(&mut population);
            pool.extend(offspring);
            self.manager.update(&mut archive, &pool);

            let fronts = ranking::fast_non_dominated_sort(&pool, &current_ids);
            let front_size = fronts.first().map(Vec::len).unwrap_or(0);
            population = ranking::environmental_selection(&pool, &fronts, n, &current_ids)?;

            budgets.record_iteration();
            iteration += 1;

            let stats = IterationStats {
                iteration,
                evaluations: self.evaluator.executions(),
                covered: self.manager.covered().len(),
                total: self.manager.total(),
                front_size,
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
            algorithm: "nsga2".to_string(),
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
