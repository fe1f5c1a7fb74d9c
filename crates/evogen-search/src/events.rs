//! Search listeners — per-iteration observation hooks.

use crate::report::SearchReport;
use evogen_encoding::Encoding;
use std::marker::PhantomData;

/// Snapshot of the loop state after one iteration.
#[derive(Debug, Clone)]
pub struct IterationStats {
    pub iteration: u64,
    pub evaluations: u64,
    pub covered: usize,
    pub total: usize,
    /// Size of the current first front.
    pub front_size: usize,
    pub archive_size: usize,
}

/// Observer of the search loop. All hooks default to no-ops.
pub trait SearchListener<E: Encoding> {
    fn on_search_start(&mut self, _subject: &str) {}
    fn on_iteration(&mut self, _stats: &IterationStats) {}
    fn on_search_complete(&mut self, _report: &SearchReport) {}
}

/// Logs progress through the `log` facade.
pub struct LogListener<E: Encoding> {
    _marker: PhantomData<E>,
}

impl<E: Encoding> LogListener<E> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<E: Encoding> Default for LogListener<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Encoding> SearchListener<E> for LogListener<E> {
    fn on_search_start(&mut self, subject: &str) {
        log::info!("search started on {subject}");
    }

    fn on_iteration(&mut self, stats: &IterationStats) {
        log::debug!(
            "iteration {}: {}/{} covered, front {}, archive {}, {} evaluations",
            stats.iteration,
            stats.covered,
            stats.total,
            stats.front_size,
            stats.archive_size,
            stats.evaluations
        );
    }

    fn on_search_complete(&mut self, report: &SearchReport) {
        log::info!(
            "search complete: {}/{} objectives covered after {} iterations ({})",
            report.covered_objectives,
            report.total_objectives,
            report.iterations,
            report.stop_reason
        );
    }
}
