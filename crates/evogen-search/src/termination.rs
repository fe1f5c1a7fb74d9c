//! Termination — why and when a search run stops.

use crate::budget::{BudgetKind, BudgetManager};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation handle, safe to share across threads.
///
/// Typically wired to a ctrl-c handler by the embedding application.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Why the search loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    BudgetExhausted(BudgetKind),
    /// An external trigger (signal, caller cancellation) fired.
    ExternalSignal,
    /// Every objective is covered or permanently out of reach.
    ObjectivesExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::BudgetExhausted(kind) => write!(f, "{kind} budget exhausted"),
            StopReason::ExternalSignal => f.write_str("external signal"),
            StopReason::ObjectivesExhausted => f.write_str("all objectives exhausted"),
        }
    }
}

/// An external stop condition, polled once per iteration.
pub trait TerminationTrigger {
    fn should_stop(&self) -> bool;
}

/// Stops the search when a [`CancellationToken`] is cancelled.
pub struct SignalTrigger {
    token: CancellationToken,
}

impl SignalTrigger {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }
}

impl TerminationTrigger for SignalTrigger {
    fn should_stop(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Combines external triggers with budget exhaustion.
///
/// Triggers are checked before budgets, so an operator interrupt is always
/// reported as such even when a budget ran out in the same iteration.
pub struct TerminationManager {
    triggers: Vec<Box<dyn TerminationTrigger>>,
}

impl TerminationManager {
    pub fn new() -> Self {
        Self {
            triggers: Vec::new(),
        }
    }

    pub fn add_trigger(&mut self, trigger: Box<dyn TerminationTrigger>) {
        self.triggers.push(trigger);
    }

    pub fn check(&self, budgets: &BudgetManager) -> Option<StopReason> {
        if self.triggers.iter().any(|t| t.should_stop()) {
            return Some(StopReason::ExternalSignal);
        }
        budgets.any_exhausted().map(StopReason::BudgetExhausted)
    }
}

impl Default for TerminationManager {
    fn default() -> Self {
        Self::new()
    }
}
