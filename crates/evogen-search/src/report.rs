//! Search run reports: serialization and human-readable formatting.

use crate::termination::StopReason;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("report I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("report serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coverage at one point during the run, for plotting progress curves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoveragePoint {
    pub iteration: u64,
    pub evaluations: u64,
    pub covered: usize,
}

/// Outcome summary of one search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    pub subject: String,
    pub algorithm: String,
    pub stop_reason: StopReason,
    pub iterations: u64,
    pub evaluations: u64,
    pub covered_objectives: usize,
    pub total_objectives: usize,
    /// Coverage over time, one point per iteration.
    pub series: Vec<CoveragePoint>,
}

impl SearchReport {
    pub fn coverage_fraction(&self) -> f64 {
        if self.total_objectives == 0 {
            return 1.0;
        }
        self.covered_objectives as f64 / self.total_objectives as f64
    }
}

/// Format a search report for human consumption.
pub fn format_report(report: &SearchReport) -> String {
    let mut output = String::new();

    output.push_str("═══════════════════════════════════════════════════════════════════════\n");
    output.push_str("  Evogen Search Report\n");
    output.push_str("═══════════════════════════════════════════════════════════════════════\n\n");

    output.push_str(&format!("Subject:             {}\n", report.subject));
    output.push_str(&format!("Algorithm:           {}\n", report.algorithm));
    output.push_str(&format!("Stopped because:     {}\n", report.stop_reason));
    output.push_str(&format!("Iterations:          {}\n", report.iterations));
    output.push_str(&format!("Evaluations:         {}\n", report.evaluations));
    output.push('\n');

    output.push_str("─── Coverage ──────────────────────────────────────────────────────────\n");
    output.push_str(&format!(
        "Objectives covered:  {} / {} ({:.1}%)\n",
        report.covered_objectives,
        report.total_objectives,
        report.coverage_fraction() * 100.0
    ));
    if let Some(first) = report.series.first() {
        output.push_str(&format!(
            "First iteration:     {} covered after {} evaluations\n",
            first.covered, first.evaluations
        ));
    }
    output.push('\n');

    output.push_str("═══════════════════════════════════════════════════════════════════════\n");

    output
}

pub fn save_report(report: &SearchReport, path: &Path) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    log::info!("search report written to {}", path.display());
    Ok(())
}

pub fn load_report(path: &Path) -> Result<SearchReport, ReportError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::BudgetKind;

    fn make_report() -> SearchReport {
        SearchReport {
            subject: "calculator".into(),
            algorithm: "dynamosa".into(),
            stop_reason: StopReason::BudgetExhausted(BudgetKind::Iterations),
            iterations: 100,
            evaluations: 5050,
            covered_objectives: 7,
            total_objectives: 10,
            series: vec![
                CoveragePoint {
                    iteration: 0,
                    evaluations: 50,
                    covered: 3,
                },
                CoveragePoint {
                    iteration: 100,
                    evaluations: 5050,
                    covered: 7,
                },
            ],
        }
    }

    #[test]
    fn test_format_report() {
        let formatted = format_report(&make_report());
        assert!(formatted.contains("Subject:             calculator"));
        assert!(formatted.contains("Algorithm:           dynamosa"));
        assert!(formatted.contains("7 / 10 (70.0%)"));
        assert!(formatted.contains("iterations budget exhausted"));
    }

    #[test]
    fn test_coverage_fraction() {
        let report = make_report();
        assert!((report.coverage_fraction() - 0.7).abs() < 1e-9);

        let empty = SearchReport {
            total_objectives: 0,
            covered_objectives: 0,
            ..report
        };
        assert_eq!(empty.coverage_fraction(), 1.0);
    }

    #[test]
    fn test_report_round_trips_through_json() {
        let report = make_report();
        let json = serde_json::to_string(&report).unwrap();
        let back: SearchReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.subject, report.subject);
        assert_eq!(back.stop_reason, report.stop_reason);
        assert_eq!(back.series.len(), 2);
    }
}
