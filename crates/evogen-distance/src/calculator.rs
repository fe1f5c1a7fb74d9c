//! The branch-distance rules and the global normalization.
//!
//! All distances returned to the search are normalized into `[0, 1)`.
//! Failure modes (unparseable predicate, NaN operands, cross-type
//! comparisons, unbound variables) degrade to a large-but-finite penalty so
//! one bad trace never aborts a generation.

use crate::predicate::{CmpOp, Operand, Predicate};
use crate::value::{Bindings, Value};
use log::{debug, warn};

/// The largest representable normalized distance.
///
/// An exact 1.0 would be indistinguishable from covering the opposite
/// branch, so full-penalty results are nudged just below it.
pub const MAX_DISTANCE: f64 = 0.999_999_999_999_999;

/// Punishment added to a barely-false ordered comparison so the boundary
/// case never scores zero.
const PUNISHMENT: f64 = 1.0;

/// Map a non-negative raw cost into `[0, 1)` via `x / (x + 1)`.
pub fn normalize(raw: f64) -> f64 {
    if raw.is_nan() {
        warn!("normalizing NaN distance, substituting max");
        return MAX_DISTANCE;
    }
    if raw.is_infinite() {
        return MAX_DISTANCE;
    }
    let raw = raw.max(0.0);
    let normalized = raw / (raw + 1.0);
    if normalized >= 1.0 {
        MAX_DISTANCE
    } else {
        normalized
    }
}

/// Configuration for the distance rules.
#[derive(Debug, Clone)]
pub struct DistanceConfig {
    /// Characters string edit distance treats as ordinary (cost 1).
    pub alphabet: String,
    /// Per-character cost for characters outside the alphabet.
    pub unknown_char_cost: f64,
    /// Raw cost for comparing incompatible types.
    pub cross_type_cost: f64,
    /// Raw cost substituted for NaN operands and unbound variables.
    pub penalty_cost: f64,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            alphabet: "abcdefghijklmnopqrstuvwxyz\
                       ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                       0123456789 _-.,:;!?'\"()[]{}@#$%&*/+=<>"
                .to_string(),
            unknown_char_cost: 100.0,
            cross_type_cost: 1000.0,
            penalty_cost: 1000.0,
        }
    }
}

/// Turns a recorded predicate evaluation into a normalized distance.
#[derive(Debug, Clone, Default)]
pub struct BranchDistance {
    config: DistanceConfig,
}

impl BranchDistance {
    pub fn new(config: DistanceConfig) -> Self {
        Self { config }
    }

    /// Distance in `[0, 1)` for reaching `desired` on `predicate` under the
    /// recorded `bindings`. 0 means the desired outcome already holds.
    pub fn calculate(&self, predicate: &str, bindings: &Bindings, desired: bool) -> f64 {
        match Predicate::parse(predicate) {
            Ok(parsed) => self.calculate_parsed(&parsed, bindings, desired),
            Err(e) => {
                warn!("unparseable predicate {predicate:?}: {e}");
                MAX_DISTANCE
            }
        }
    }

    /// Same as [`calculate`](Self::calculate) for an already parsed tree.
    pub fn calculate_parsed(
        &self,
        predicate: &Predicate,
        bindings: &Bindings,
        desired: bool,
    ) -> f64 {
        let d = self.eval(predicate, bindings, desired);
        if d == 0.0 {
            debug!("branch distance is exactly 0 for desired={desired}");
        }
        d
    }

    /// Recursive evaluation. The result is always normalized.
    ///
    /// `desired = false` flows down as operator inversion, so short-circuit
    /// operators see inverted sub-operators rather than an inverted sum.
    fn eval(&self, predicate: &Predicate, bindings: &Bindings, desired: bool) -> f64 {
        match predicate {
            Predicate::Truthy(operand) => match self.resolve(operand, bindings) {
                Some(value) => {
                    if value.truthy() == desired {
                        0.0
                    } else {
                        normalize(PUNISHMENT)
                    }
                }
                None => normalize(self.config.penalty_cost),
            },
            Predicate::Cmp { op, lhs, rhs } => {
                let op = if desired { *op } else { op.inverted() };
                match (self.resolve(lhs, bindings), self.resolve(rhs, bindings)) {
                    (Some(a), Some(b)) => normalize(self.raw_cmp(op, &a, &b)),
                    _ => normalize(self.config.penalty_cost),
                }
            }
            Predicate::And(lhs, rhs) => {
                if desired {
                    let dl = self.eval(lhs, bindings, true);
                    let dr = self.eval(rhs, bindings, true);
                    normalize(dl + dr)
                } else {
                    // !(A && B) == !A || !B
                    let dl = self.eval(lhs, bindings, false);
                    let dr = self.eval(rhs, bindings, false);
                    dl.min(dr)
                }
            }
            Predicate::Or(lhs, rhs) => {
                if desired {
                    let dl = self.eval(lhs, bindings, true);
                    let dr = self.eval(rhs, bindings, true);
                    dl.min(dr)
                } else {
                    // !(A || B) == !A && !B
                    let dl = self.eval(lhs, bindings, false);
                    let dr = self.eval(rhs, bindings, false);
                    normalize(dl + dr)
                }
            }
            Predicate::Not(inner) => self.eval(inner, bindings, !desired),
        }
    }

    fn resolve(&self, operand: &Operand, bindings: &Bindings) -> Option<Value> {
        match operand {
            Operand::Lit(value) => Some(value.clone()),
            Operand::Var(name) => {
                let value = bindings.get(name).cloned();
                if value.is_none() {
                    warn!("predicate variable {name:?} missing from bindings");
                }
                value
            }
        }
    }

    /// Raw (un-normalized) cost of making `a op b` true.
    fn raw_cmp(&self, op: CmpOp, a: &Value, b: &Value) -> f64 {
        match op {
            CmpOp::Eq | CmpOp::StrictEq => self.equality_distance(a, b),
            CmpOp::Ne | CmpOp::StrictNe => {
                if self.values_equal(a, b) {
                    PUNISHMENT
                } else {
                    0.0
                }
            }
            CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => self.ordered_distance(op, a, b),
        }
    }

    /// Equality-class distance: numeric gap, restricted edit distance,
    /// boolean 0/1, or the cross-type constant.
    fn equality_distance(&self, a: &Value, b: &Value) -> f64 {
        match (a, b) {
            (Value::Num(x), Value::Num(y)) => {
                if x.is_nan() || y.is_nan() {
                    warn!("NaN operand in equality comparison");
                    self.config.penalty_cost
                } else {
                    (x - y).abs()
                }
            }
            (Value::Str(x), Value::Str(y)) => self.edit_distance(x, y),
            (Value::Bool(x), Value::Bool(y)) => {
                if x == y {
                    0.0
                } else {
                    1.0
                }
            }
            _ => {
                debug!(
                    "cross-type equality: {} vs {}",
                    a.type_name(),
                    b.type_name()
                );
                self.config.cross_type_cost
            }
        }
    }

    /// Whether two values compare equal (for the inequality operators).
    /// Cross-type values are never equal.
    fn values_equal(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Num(x), Value::Num(y)) => x == y,
            (Value::Str(x), Value::Str(y)) => x == y,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            _ => false,
        }
    }

    /// Ordered-comparison distance: 0 when satisfied, else the numeric gap
    /// plus the punishment factor.
    fn ordered_distance(&self, op: CmpOp, a: &Value, b: &Value) -> f64 {
        let (x, y) = match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => (x, y),
            _ => {
                warn!(
                    "non-numeric operands in ordered comparison: {} {} {}",
                    a.type_name(),
                    op,
                    b.type_name()
                );
                return self.config.penalty_cost;
            }
        };

        match op {
            CmpOp::Lt => {
                if x < y {
                    0.0
                } else {
                    (x - y) + PUNISHMENT
                }
            }
            CmpOp::Le => {
                if x <= y {
                    0.0
                } else {
                    (x - y) + PUNISHMENT
                }
            }
            CmpOp::Gt => {
                if x > y {
                    0.0
                } else {
                    (y - x) + PUNISHMENT
                }
            }
            CmpOp::Ge => {
                if x >= y {
                    0.0
                } else {
                    (y - x) + PUNISHMENT
                }
            }
            _ => unreachable!("ordered_distance called with equality operator"),
        }
    }

    /// Levenshtein distance where characters outside the configured
    /// alphabet carry a heavy per-character cost.
    fn edit_distance(&self, a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let char_cost = |c: char| {
            if self.config.alphabet.contains(c) {
                1.0
            } else {
                self.config.unknown_char_cost
            }
        };

        let mut prev: Vec<f64> = Vec::with_capacity(b.len() + 1);
        prev.push(0.0);
        for &bc in &b {
            prev.push(prev.last().unwrap() + char_cost(bc));
        }

        for &ac in &a {
            let mut row = Vec::with_capacity(b.len() + 1);
            row.push(prev[0] + char_cost(ac));
            for (j, &bc) in b.iter().enumerate() {
                let substitute = if ac == bc {
                    prev[j]
                } else {
                    prev[j] + char_cost(ac).max(char_cost(bc))
                };
                let delete = prev[j + 1] + char_cost(ac);
                let insert = row[j] + char_cost(bc);
                row.push(substitute.min(delete).min(insert));
            }
            prev = row;
        }

        *prev.last().unwrap()
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Num(n) if !n.is_nan() => Some(*n),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc() -> BranchDistance {
        BranchDistance::default()
    }

    fn bind(pairs: &[(&str, Value)]) -> Bindings {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_equality_scenario() {
        let b = Bindings::new();
        assert_eq!(calc().calculate("2 === 1", &b, true), 0.5);
        assert_eq!(calc().calculate("2 === 1", &b, false), 0.0);
    }

    #[test]
    fn test_logical_or_scenario() {
        let b = Bindings::new();
        assert_eq!(calc().calculate("0 || 0", &b, true), 0.5);
        assert_eq!(calc().calculate("0 || 1", &b, true), 0.0);
    }

    #[test]
    fn test_normalize_range() {
        for raw in [0.0, 0.1, 1.0, 7.5, 1e6, 1e300, f64::INFINITY] {
            let n = normalize(raw);
            assert!((0.0..1.0).contains(&n), "normalize({raw}) = {n}");
        }
        assert_eq!(normalize(0.0), 0.0);
        assert_eq!(normalize(f64::NAN), MAX_DISTANCE);
    }

    #[test]
    fn test_ordered_punishment() {
        // 5 < 5 is barely false: gap 0 plus punishment 1, normalized 0.5.
        let b = bind(&[("x", Value::Num(5.0))]);
        assert_eq!(calc().calculate("x < 5", &b, true), 0.5);
        // Satisfied comparison is exactly 0.
        assert_eq!(calc().calculate("x < 6", &b, true), 0.0);
        // Larger gap, larger distance: 5 < 0 needs raw 6.
        assert_eq!(calc().calculate("x < 0", &b, true), 6.0 / 7.0);
    }

    #[test]
    fn test_desired_false_inverts_operator() {
        // desired=false on x > 3 becomes x <= 3: already true for x=2.
        let b = bind(&[("x", Value::Num(2.0))]);
        assert_eq!(calc().calculate("x > 3", &b, false), 0.0);
        // For x=5 the inverted x <= 3 misses by 2 + punishment.
        let b = bind(&[("x", Value::Num(5.0))]);
        assert_eq!(calc().calculate("x > 3", &b, false), 3.0 / 4.0);
    }

    #[test]
    fn test_logical_and() {
        // Both sides false by 1: normalized 0.5 each, re-normalized sum.
        let b = Bindings::new();
        assert_eq!(calc().calculate("0 && 0", &b, true), 0.5);
        // One side satisfied: distance comes from the other.
        assert!(calc().calculate("1 && 0", &b, true) > 0.0);
        assert_eq!(calc().calculate("1 && 1", &b, true), 0.0);
    }

    #[test]
    fn test_and_desired_false_is_min() {
        // !(A && B): falsifying either side suffices.
        let b = bind(&[("a", Value::Num(1.0)), ("b", Value::Num(0.0))]);
        assert_eq!(calc().calculate("a && b", &b, false), 0.0);
    }

    #[test]
    fn test_not_flips_polarity() {
        let b = Bindings::new();
        assert_eq!(calc().calculate("!1", &b, false), 0.0);
        assert_eq!(calc().calculate("!1", &b, true), 0.5);
    }

    #[test]
    fn test_short_circuit_sees_inverted_suboperator() {
        // desired=false on (x > 3 || y > 3) becomes x <= 3 && y <= 3:
        // both conjuncts must be falsified, so distances add.
        let b = bind(&[("x", Value::Num(4.0)), ("y", Value::Num(4.0))]);
        let d = calc().calculate("x > 3 || y > 3", &b, false);
        // Each inverted side misses by 1 + punishment = 2, normalized 2/3;
        // re-normalized sum: (4/3) / (7/3) = 4/7.
        assert!((d - 4.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_string_distance() {
        let c = calc();
        let b = bind(&[("s", Value::Str("abd".into()))]);
        let close = c.calculate("s === 'abc'", &b, true);
        let b = bind(&[("s", Value::Str("xyz".into()))]);
        let far = c.calculate("s === 'abc'", &b, true);
        assert!(close < far);
        let b = bind(&[("s", Value::Str("abc".into()))]);
        assert_eq!(c.calculate("s === 'abc'", &b, true), 0.0);
    }

    #[test]
    fn test_unknown_characters_penalized() {
        let c = calc();
        let b = bind(&[("s", Value::Str("ab\u{1F600}".into()))]);
        let exotic = c.calculate("s === 'abc'", &b, true);
        let b = bind(&[("s", Value::Str("abd".into()))]);
        let plain = c.calculate("s === 'abc'", &b, true);
        assert!(exotic > plain);
    }

    #[test]
    fn test_cross_type_large_constant() {
        let b = bind(&[("x", Value::Str("5".into()))]);
        let d = calc().calculate("x === 5", &b, true);
        // Large but still inside [0, 1).
        assert!(d > 0.99 && d < 1.0);
    }

    #[test]
    fn test_nan_recovers_with_penalty() {
        let b = bind(&[("x", Value::Num(f64::NAN))]);
        let d = calc().calculate("x === 5", &b, true);
        assert!(d.is_finite() && d < 1.0);
    }

    #[test]
    fn test_missing_variable_recovers_with_penalty() {
        let b = Bindings::new();
        let d = calc().calculate("missing > 3", &b, true);
        assert!(d.is_finite() && d > 0.99 && d < 1.0);
    }

    #[test]
    fn test_unparseable_predicate_is_worst_case() {
        let b = Bindings::new();
        assert_eq!(calc().calculate("x ===", &b, true), MAX_DISTANCE);
    }

    #[test]
    fn test_inequality() {
        let b = Bindings::new();
        assert_eq!(calc().calculate("2 !== 1", &b, true), 0.0);
        assert_eq!(calc().calculate("2 !== 2", &b, true), 0.5);
        assert_eq!(calc().calculate("2 !== 2", &b, false), 0.0);
    }
}
