//! Search algorithms: MOSA/DynaMOSA, NSGA-II and random search.
//!
//! All algorithms implement [`SearchAlgorithm`] and share the same outer
//! contract: run until a budget, an external trigger, or objective
//! exhaustion stops them, then hand back the archive and a run report.

pub mod mosa;
pub mod nsga2;
pub mod random;

pub use mosa::Mosa;
pub use nsga2::Nsga2;
pub use random::RandomSearch;

use crate::archive::Archive;
use crate::budget::BudgetManager;
use crate::ranking;
use crate::report::SearchReport;
use crate::termination::TerminationManager;
use evogen_encoding::{CrossoverOperator, Encoding, MutationOperator, ObjectiveId, OperatorError};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

/// Fatal search-level failures. Anything recoverable (a crashed execution,
/// an unparseable predicate) is degraded long before it reaches here.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("invalid search configuration: {0}")]
    Config(String),

    #[error("environmental selection produced {got} survivors, expected {expected}")]
    SelectionSize { got: usize, expected: usize },

    #[error(transparent)]
    Operator(#[from] OperatorError),
}

/// Knobs shared by the evolutionary algorithms.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub population_size: usize,
    pub crossover_prob: f64,
    pub tournament_size: usize,
    /// Master seed; all per-iteration randomness derives from it.
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            crossover_prob: 0.7,
            tournament_size: 2,
            seed: 42,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.population_size < 2 {
            return Err(SearchError::Config(format!(
                "population size must be at least 2, got {}",
                self.population_size
            )));
        }
        if !(0.0..=1.0).contains(&self.crossover_prob) {
            return Err(SearchError::Config(format!(
                "crossover probability must be in [0, 1], got {}",
                self.crossover_prob
            )));
        }
        if self.tournament_size == 0 {
            return Err(SearchError::Config(
                "tournament size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// What a finished run hands back: the archive of covering tests plus the
/// run report.
pub struct SearchOutcome<E: Encoding> {
    pub archive: Archive<E>,
    pub report: SearchReport,
}

pub trait SearchAlgorithm<E: Encoding> {
    fn search(
        &mut self,
        budgets: &mut BudgetManager,
        termination: &TerminationManager,
    ) -> Result<SearchOutcome<E>, SearchError>;
}

/// Rank and crowding of every pool member, aligned with the pool.
pub(crate) fn rank_population<E: Encoding>(
    pool: &[E],
    objectives: &[ObjectiveId],
) -> (Vec<usize>, Vec<f64>) {
    let fronts = ranking::fast_non_dominated_sort(pool, objectives);
    let mut ranks = vec![0usize; pool.len()];
    let mut crowding = vec![0.0f64; pool.len()];
    for (r, front) in fronts.iter().enumerate() {
        let cd = ranking::crowding_distance(pool, front, objectives);
        for (w, &i) in front.iter().enumerate() {
            ranks[i] = r;
            crowding[i] = cd[w];
        }
    }
    (ranks, crowding)
}

/// Binary (or k-ary) tournament on (rank ascending, crowding descending).
pub(crate) fn tournament(
    rng: &mut ChaCha8Rng,
    ranks: &[usize],
    crowding: &[f64],
    tournament_size: usize,
) -> usize {
    let mut best = rng.gen_range(0..ranks.len());
    for _ in 1..tournament_size {
        let challenger = rng.gen_range(0..ranks.len());
        let wins = match ranks[challenger].cmp(&ranks[best]) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => crowding[challenger] > crowding[best],
        };
        if wins {
            best = challenger;
        }
    }
    best
}

/// One generation of offspring: tournament selection, probabilistic
/// crossover, unconditional mutation.
pub(crate) fn generate_offspring<E: Encoding>(
    population: &[E],
    ranks: &[usize],
    crowding: &[f64],
    config: &SearchConfig,
    rng: &mut ChaCha8Rng,
    crossover: &mut dyn CrossoverOperator<E>,
    mutation: &mut dyn MutationOperator<E>,
) -> Result<Vec<E>, SearchError> {
    let n = config.population_size;
    let mut offspring = Vec::with_capacity(n);

    while offspring.len() < n {
        let a = tournament(rng, ranks, crowding, config.tournament_size);
        let b = tournament(rng, ranks, crowding, config.tournament_size);

        let (first, second) = if rng.gen_bool(config.crossover_prob) {
            let parents = [population[a].clone(), population[b].clone()];
            crossover.crossover(&parents)?
        } else {
            (population[a].copy(), population[b].copy())
        };

        offspring.push(mutation.mutate(&first));
        if offspring.len() < n {
            offspring.push(mutation.mutate(&second));
        }
    }

    Ok(offspring)
}

#[cfg(test)]
mod tests {
    use super::*;
    use evogen_encoding::{Statement, TestCase};
    use rand::SeedableRng;

    #[test]
    fn test_config_validation() {
        assert!(SearchConfig::default().validate().is_ok());

        let too_small = SearchConfig {
            population_size: 1,
            ..Default::default()
        };
        assert!(matches!(too_small.validate(), Err(SearchError::Config(_))));

        let bad_prob = SearchConfig {
            crossover_prob: 1.5,
            ..Default::default()
        };
        assert!(matches!(bad_prob.validate(), Err(SearchError::Config(_))));

        let no_tournament = SearchConfig {
            tournament_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            no_tournament.validate(),
            Err(SearchError::Config(_))
        ));
    }

    #[test]
    fn test_rank_population_aligns_with_pool() {
        let o = ObjectiveId::new("o1");
        let mut near = TestCase::new(vec![Statement::call("f", Vec::new())]).unwrap();
        near.cache_distance(o.clone(), 0.1);
        let mut far = TestCase::new(vec![Statement::call("f", Vec::new())]).unwrap();
        far.cache_distance(o.clone(), 0.9);

        let pool = vec![far, near];
        let (ranks, crowding) = rank_population(&pool, &[o]);
        assert_eq!(ranks, vec![1, 0]);
        assert_eq!(crowding.len(), 2);
    }

    #[test]
    fn test_tournament_prefers_lower_rank() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let ranks = vec![3, 0, 2];
        let crowding = vec![0.0, 0.0, 0.0];
        // A large tournament all but guarantees the single rank-0
        // individual participates, so it must win.
        for _ in 0..20 {
            assert_eq!(tournament(&mut rng, &ranks, &crowding, 64), 1);
        }
    }
}
