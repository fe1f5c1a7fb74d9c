//! Genome model and genetic operators.
//!
//! A candidate test case is an ownership tree of statements: one or more
//! "action" roots (calls, constructions) whose arguments are nested
//! statements. Ownership makes the structural invariants cheap: a node can
//! never alias or contain itself, and `copy()` is a deep clone with fresh
//! identities.
//!
//! # Module Structure
//!
//! - [`encoding`] — The generic `Encoding` contract the search is written
//!   against, plus id types
//! - [`statement`] — The closed statement enum and tree traversal
//! - [`test_case`] — `TestCase`, the concrete genome
//! - [`execution`] — Execution results and the external `Runner` interface
//! - [`sampler`] — Sampling interfaces (fresh genetic material) and a
//!   deterministic sampler for tests
//! - [`operators`] — Tree mutation and crossover
//!
//! # Determinism
//!
//! Operators follow the master-seed + derived-child-seed scheme: each
//! mutation draws from a `ChaCha8Rng` seeded with `seed + counter`, so a
//! whole search run replays exactly from one seed.

pub mod encoding;
pub mod execution;
pub mod operators;
pub mod sampler;
pub mod statement;
pub mod test_case;

pub use encoding::{Encoding, EncodingId, ObjectiveId};
pub use execution::{BranchTrace, ExecutionResult, ExecutionStatus, Runner, RunnerError};
pub use operators::{
    CrossoverOperator, MutationConfig, MutationOperator, OperatorError, TreeCrossover,
    TreeMutation,
};
pub use sampler::{EncodingSampler, FixtureSampler, StatementSampler};
pub use statement::{Statement, StatementKind};
pub use test_case::TestCase;
