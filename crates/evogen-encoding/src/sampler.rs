//! Sampling interfaces — the supply of fresh genetic material.
//!
//! Real samplers are language-specific (they know the subject's exports and
//! signatures) and live outside this workspace. The search only needs the
//! two traits below; [`FixtureSampler`] is a deterministic implementation
//! used by tests and demos.

use crate::encoding::Encoding;
use crate::statement::Statement;
use crate::test_case::TestCase;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Supplies whole fresh encodings (initial population, random search).
pub trait EncodingSampler<E: Encoding> {
    fn sample(&mut self) -> E;
}

/// Statement-level sampling, used by mutation to resample subtrees.
pub trait StatementSampler: EncodingSampler<TestCase> {
    /// Sample a fresh action statement usable as a genome root.
    fn sample_root(&mut self, depth: usize) -> Statement;

    /// Sample a fresh argument subtree. `depth` bounds nesting.
    fn sample_argument(&mut self, depth: usize) -> Statement;
}

/// Deterministic sampler over a fixed set of callable targets.
///
/// Samples calls with 0–3 primitive or shallowly nested arguments; numbers
/// are drawn from a configurable range. Seeded, so identical across runs.
pub struct FixtureSampler {
    rng: ChaCha8Rng,
    targets: Vec<String>,
    /// Numeric literals are drawn from `-number_range..=number_range`.
    pub number_range: f64,
    /// Max roots in a freshly sampled test case.
    pub max_roots: usize,
    /// Max argument nesting depth.
    pub max_depth: usize,
}

impl FixtureSampler {
    pub fn new(seed: u64, targets: Vec<String>) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            targets,
            number_range: 100.0,
            max_roots: 3,
            max_depth: 3,
        }
    }

    fn sample_primitive(&mut self) -> Statement {
        match self.rng.gen_range(0..3) {
            0 => {
                let value = self.rng.gen_range(-self.number_range..=self.number_range);
                Statement::number(value)
            }
            1 => Statement::bool(self.rng.gen_bool(0.5)),
            _ => {
                let len = self.rng.gen_range(0..8);
                let s: String = (0..len)
                    .map(|_| (b'a' + self.rng.gen_range(0..26u8)) as char)
                    .collect();
                Statement::string(s)
            }
        }
    }
}

impl EncodingSampler<TestCase> for FixtureSampler {
    fn sample(&mut self) -> TestCase {
        let n = self.rng.gen_range(1..=self.max_roots);
        let roots = (0..n).map(|_| self.sample_root(self.max_depth)).collect();
        TestCase::new(roots).expect("sampled roots are actions and non-empty")
    }
}

impl StatementSampler for FixtureSampler {
    fn sample_root(&mut self, depth: usize) -> Statement {
        let target = self.targets[self.rng.gen_range(0..self.targets.len())].clone();
        let arg_count = self.rng.gen_range(0..=3);
        let args = (0..arg_count)
            .map(|_| self.sample_argument(depth.saturating_sub(1)))
            .collect();
        Statement::call(target, args)
    }

    fn sample_argument(&mut self, depth: usize) -> Statement {
        // Nested calls only while depth remains; always leaves at depth 0.
        if depth > 0 && self.rng.gen_bool(0.2) {
            self.sample_root(depth)
        } else {
            self.sample_primitive()
        }
    }
}
