//! Branch-distance numeric model.
//!
//! Turns a recorded predicate evaluation (operator, operand values, desired
//! branch outcome) into a continuous fitness signal in `[0, 1)`, with 0
//! meaning "the desired outcome holds". The search uses this signal to pull
//! candidate inputs towards the boundary of an uncovered branch.
//!
//! # Module Structure
//!
//! - [`value`] — Runtime operand values recorded by the instrumenter
//! - [`predicate`] — Predicate AST and its parser
//! - [`calculator`] — The distance rules and the global normalization
//!
//! # Numeric contract
//!
//! The exact constants here are load-bearing for search convergence: the
//! ordered-comparison punishment factor is 1, a raw result of exactly 1.0 is
//! nudged down so it stays distinguishable from the opposite branch, and all
//! failure modes (unparseable predicate, NaN, cross-type comparison) degrade
//! to a large-but-finite penalty instead of an error.

pub mod calculator;
pub mod predicate;
pub mod value;

pub use calculator::{BranchDistance, DistanceConfig};
pub use predicate::{CmpOp, Operand, ParseError, Predicate};
pub use value::{Bindings, Value};
