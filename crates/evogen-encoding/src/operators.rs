//! Tree mutation and crossover.
//!
//! Both operators follow the master-seed + counter scheme: every invocation
//! derives a child seed, so a run replays exactly and two operators with the
//! same seed produce the same edit sequence.

use crate::encoding::Encoding;
use crate::sampler::StatementSampler;
use crate::statement::{Statement, StatementKind};
use crate::test_case::TestCase;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

/// Structural errors from genome construction and the genetic operators.
///
/// These signal implementation bugs, not recoverable input conditions; the
/// search aborts rather than continue with a corrupted population.
#[derive(Error, Debug)]
pub enum OperatorError {
    #[error("crossover requires exactly 2 parents, got {0}")]
    Arity(usize),

    #[error("encoding must have at least one root statement")]
    EmptyGenome,

    #[error("genome root must be an action statement: {0}")]
    NonActionRoot(String),
}

/// Produces a new, independent encoding from a parent.
pub trait MutationOperator<E: Encoding> {
    fn mutate(&mut self, parent: &E) -> E;
}

/// Recombines exactly two parents into two children.
pub trait CrossoverOperator<E: Encoding> {
    fn crossover(&mut self, parents: &[E]) -> Result<(E, E), OperatorError>;
}

/// Per-strategy mutation probabilities plus structural bounds.
///
/// The four strategies mirror what the search needs at minimum: whole
/// subtree resampling, structural insert/remove of a root statement, and
/// delta mutation of a leaf value. Probabilities are normalized at roll
/// time, so they need not sum to 1.
#[derive(Debug, Clone)]
pub struct MutationConfig {
    pub resample_prob: f64,
    pub insert_prob: f64,
    pub remove_prob: f64,
    pub delta_prob: f64,
    /// Upper bound on root statements after insertion.
    pub max_roots: usize,
    /// Depth bound passed to the sampler for resampled subtrees.
    pub max_depth: usize,
    /// Numeric delta mutations draw from `-delta_range..=delta_range`.
    pub delta_range: f64,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            resample_prob: 0.3,
            insert_prob: 0.2,
            remove_prob: 0.1,
            delta_prob: 0.4,
            max_roots: 10,
            max_depth: 3,
            delta_range: 10.0,
        }
    }
}

/// Mutates statement trees using a [`StatementSampler`] for fresh material.
pub struct TreeMutation<S: StatementSampler> {
    sampler: S,
    config: MutationConfig,
    seed: u64,
    counter: u64,
}

impl<S: StatementSampler> TreeMutation<S> {
    pub fn new(seed: u64, sampler: S, config: MutationConfig) -> Self {
        Self {
            sampler,
            config,
            seed,
            counter: 0,
        }
    }

    pub fn sampler_mut(&mut self) -> &mut S {
        &mut self.sampler
    }

    fn resample(&mut self, case: &mut TestCase, rng: &mut ChaCha8Rng) {
        let idx = rng.gen_range(0..case.size());
        let max_depth = self.config.max_depth;
        let roots = case.roots_mut();
        let root = &mut roots[idx];

        // Either replace the whole root or one of its argument subtrees.
        if !root.has_children() || rng.gen_bool(0.5) {
            *root = self.sampler.sample_root(max_depth);
        } else {
            let children = root.children_mut();
            let child_idx = rng.gen_range(0..children.len());
            children[child_idx] = self.sampler.sample_argument(max_depth.saturating_sub(1));
        }
    }

    fn insert_root(&mut self, case: &mut TestCase, rng: &mut ChaCha8Rng) {
        if case.size() >= self.config.max_roots {
            return;
        }
        let stmt = self.sampler.sample_root(self.config.max_depth);
        let roots = case.roots_mut();
        let pos = rng.gen_range(0..=roots.len());
        roots.insert(pos, stmt);
    }

    fn remove_root(&mut self, case: &mut TestCase, rng: &mut ChaCha8Rng) {
        // Never drop the last root.
        if case.size() <= 1 {
            return;
        }
        let roots = case.roots_mut();
        let pos = rng.gen_range(0..roots.len());
        roots.remove(pos);
    }

    fn delta(&mut self, case: &mut TestCase, rng: &mut ChaCha8Rng) {
        let delta_range = self.config.delta_range;
        let roots = case.roots_mut();

        // Collect mutable references to all primitive leaves.
        let mut leaves: Vec<&mut Statement> = Vec::new();
        let mut stack: Vec<&mut Statement> = roots.iter_mut().collect();
        while let Some(stmt) = stack.pop() {
            if stmt.is_action() {
                stack.extend(stmt.children_mut().iter_mut());
            } else {
                leaves.push(stmt);
            }
        }

        if leaves.is_empty() {
            return;
        }

        let idx = rng.gen_range(0..leaves.len());
        match &mut *leaves[idx] {
            Statement::NumberLit { value, .. } => {
                *value += rng.gen_range(-delta_range..=delta_range);
            }
            Statement::BoolLit { value, .. } => {
                *value = !*value;
            }
            Statement::StringLit { value, .. } => {
                let c = (b'a' + rng.gen_range(0..26u8)) as char;
                if value.is_empty() || rng.gen_bool(0.5) {
                    value.push(c);
                } else {
                    let char_positions: Vec<usize> =
                        value.char_indices().map(|(i, _)| i).collect();
                    let pos = char_positions[rng.gen_range(0..char_positions.len())];
                    value.remove(pos);
                    value.insert(pos, c);
                }
            }
            _ => {}
        }
    }
}

impl<S: StatementSampler> MutationOperator<TestCase> for TreeMutation<S> {
    /// Returns a new, independent test case. The parent is never touched.
    fn mutate(&mut self, parent: &TestCase) -> TestCase {
        let child_seed = self.seed.wrapping_add(self.counter);
        self.counter += 1;
        let mut rng = ChaCha8Rng::seed_from_u64(child_seed);

        let mut child = parent.copy();

        let num_mutations = rng.gen_range(1..=3);
        for _ in 0..num_mutations {
            let total = self.config.resample_prob
                + self.config.insert_prob
                + self.config.remove_prob
                + self.config.delta_prob;
            if total == 0.0 {
                break;
            }

            let roll = rng.gen::<f64>();
            let norm_resample = self.config.resample_prob / total;
            let norm_insert = norm_resample + self.config.insert_prob / total;
            let norm_remove = norm_insert + self.config.remove_prob / total;

            if roll < norm_resample {
                self.resample(&mut child, &mut rng);
            } else if roll < norm_insert {
                self.insert_root(&mut child, &mut rng);
            } else if roll < norm_remove {
                self.remove_root(&mut child, &mut rng);
            } else {
                self.delta(&mut child, &mut rng);
            }
        }

        child
    }
}

/// Swaps compatible roots between two parents.
///
/// Swap points are matched by statement kind and, for calls/constructions,
/// by the same export/class identity. When no compatible point exists the
/// operator degenerates to returning independent copies of both parents.
pub struct TreeCrossover {
    seed: u64,
    counter: u64,
}

impl TreeCrossover {
    pub fn new(seed: u64) -> Self {
        Self { seed, counter: 0 }
    }

    fn compatible(a: &Statement, b: &Statement) -> bool {
        if a.kind() != b.kind() {
            return false;
        }
        match a.kind() {
            StatementKind::Call | StatementKind::Construct => a.target_key() == b.target_key(),
            _ => true,
        }
    }
}

impl CrossoverOperator<TestCase> for TreeCrossover {
    fn crossover(&mut self, parents: &[TestCase]) -> Result<(TestCase, TestCase), OperatorError> {
        if parents.len() != 2 {
            return Err(OperatorError::Arity(parents.len()));
        }

        let child_seed = self.seed.wrapping_add(self.counter);
        self.counter += 1;
        let mut rng = ChaCha8Rng::seed_from_u64(child_seed);

        let mut left = parents[0].copy();
        let mut right = parents[1].copy();

        let mut pairs = Vec::new();
        for (i, a) in left.roots().iter().enumerate() {
            for (j, b) in right.roots().iter().enumerate() {
                if Self::compatible(a, b) {
                    pairs.push((i, j));
                }
            }
        }

        if pairs.is_empty() {
            log::debug!("no compatible swap point, crossover degenerates to copies");
            return Ok((left, right));
        }

        let (i, j) = pairs[rng.gen_range(0..pairs.len())];
        // Both sides are already independent deep copies, so a plain swap
        // cannot introduce aliasing with either parent.
        std::mem::swap(&mut left.roots_mut()[i], &mut right.roots_mut()[j]);

        Ok((left, right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::Encoding;
    use crate::sampler::FixtureSampler;

    fn sampler() -> FixtureSampler {
        FixtureSampler::new(7, vec!["login".into(), "logout".into()])
    }

    fn mutation() -> TreeMutation<FixtureSampler> {
        TreeMutation::new(42, sampler(), MutationConfig::default())
    }

    fn case_with(args: Vec<Statement>) -> TestCase {
        TestCase::new(vec![Statement::call("login", args)]).unwrap()
    }

    #[test]
    fn test_mutate_returns_independent_child() {
        let mut op = mutation();
        let parent = case_with(vec![Statement::number(5.0)]);
        let child = op.mutate(&parent);

        assert_ne!(child.id(), parent.id());
        assert!(child.size() >= 1);
        assert!(child.roots().iter().all(Statement::is_action));

        let mut parent_ids = Vec::new();
        let mut child_ids = Vec::new();
        for r in parent.roots() {
            r.collect_ids(&mut parent_ids);
        }
        for r in child.roots() {
            r.collect_ids(&mut child_ids);
        }
        for id in child_ids {
            assert!(!parent_ids.contains(&id), "child aliases parent node {id}");
        }
    }

    #[test]
    fn test_mutate_parent_untouched() {
        let mut op = mutation();
        let parent = case_with(vec![Statement::number(5.0)]);
        let before = parent.to_string();
        for _ in 0..20 {
            op.mutate(&parent);
        }
        assert_eq!(parent.to_string(), before);
    }

    #[test]
    fn test_mutate_deterministic() {
        let parent = case_with(vec![Statement::number(5.0)]);
        let mut a = mutation();
        let mut b = mutation();
        for _ in 0..10 {
            assert_eq!(a.mutate(&parent).to_string(), b.mutate(&parent).to_string());
        }
    }

    #[test]
    fn test_mutate_never_empties_genome() {
        let mut op = TreeMutation::new(
            42,
            sampler(),
            MutationConfig {
                remove_prob: 1.0,
                resample_prob: 0.0,
                insert_prob: 0.0,
                delta_prob: 0.0,
                ..Default::default()
            },
        );
        let parent = case_with(vec![Statement::number(5.0)]);
        for _ in 0..30 {
            let child = op.mutate(&parent);
            assert!(child.size() >= 1);
        }
    }

    #[test]
    fn test_mutate_respects_max_roots() {
        let mut op = TreeMutation::new(
            42,
            sampler(),
            MutationConfig {
                insert_prob: 1.0,
                resample_prob: 0.0,
                remove_prob: 0.0,
                delta_prob: 0.0,
                max_roots: 3,
                ..Default::default()
            },
        );
        let mut case = case_with(vec![]);
        for _ in 0..10 {
            case = op.mutate(&case);
            assert!(case.size() <= 3);
        }
    }

    #[test]
    fn test_delta_changes_number() {
        let mut op = TreeMutation::new(
            1,
            sampler(),
            MutationConfig {
                delta_prob: 1.0,
                resample_prob: 0.0,
                insert_prob: 0.0,
                remove_prob: 0.0,
                ..Default::default()
            },
        );
        let parent = case_with(vec![Statement::number(5.0)]);
        let child = op.mutate(&parent);
        match &child.roots()[0].children()[0] {
            Statement::NumberLit { value, .. } => assert_ne!(*value, 5.0),
            other => panic!("expected number leaf, got {other}"),
        }
    }

    #[test]
    fn test_crossover_rejects_wrong_arity() {
        let mut op = TreeCrossover::new(42);
        let a = case_with(vec![]);
        assert!(matches!(
            op.crossover(&[a.clone()]),
            Err(OperatorError::Arity(1))
        ));
        assert!(matches!(
            op.crossover(&[a.clone(), a.clone(), a]),
            Err(OperatorError::Arity(3))
        ));
    }

    #[test]
    fn test_crossover_swaps_compatible_roots() {
        let mut op = TreeCrossover::new(42);
        let a = case_with(vec![Statement::number(1.0)]);
        let b = case_with(vec![Statement::number(2.0)]);

        let (left, right) = op.crossover(&[a.clone(), b.clone()]).unwrap();

        // Same target, so the swap must have happened: the children carry
        // each other's argument values.
        assert_eq!(left.to_string(), "login(2)");
        assert_eq!(right.to_string(), "login(1)");
        // Parents untouched.
        assert_eq!(a.to_string(), "login(1)");
        assert_eq!(b.to_string(), "login(2)");
    }

    #[test]
    fn test_crossover_degenerates_without_compatible_point() {
        let mut op = TreeCrossover::new(42);
        let a = case_with(vec![Statement::number(1.0)]);
        let b = TestCase::new(vec![Statement::construct("Account", vec![])]).unwrap();

        let (left, right) = op.crossover(&[a.clone(), b.clone()]).unwrap();

        assert_eq!(left.to_string(), a.to_string());
        assert_eq!(right.to_string(), b.to_string());
        assert_ne!(left.id(), a.id());
        assert_ne!(right.id(), b.id());
    }

    #[test]
    fn test_crossover_children_independent_of_parents() {
        let mut op = TreeCrossover::new(42);
        let a = case_with(vec![Statement::number(1.0)]);
        let b = case_with(vec![Statement::number(2.0)]);

        let (left, right) = op.crossover(&[a.clone(), b.clone()]).unwrap();

        let mut parent_ids = Vec::new();
        for r in a.roots().iter().chain(b.roots()) {
            r.collect_ids(&mut parent_ids);
        }
        let mut child_ids = Vec::new();
        for r in left.roots().iter().chain(right.roots()) {
            r.collect_ids(&mut child_ids);
        }
        for id in child_ids {
            assert!(!parent_ids.contains(&id));
        }
    }
}
