//! # Performance Grading
//!
//! Turns an elapsed wall-clock time into a coarse grade that the dashboards
//! show next to a completed sale or shift action.
//!
//! ## Grade Tables
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  elapsed (ms)     0 ──── 50 ──── 100 ──── 200 ──── 300 ────►           │
//! │                                                                         │
//! │  SALE_GRADES      │   Excellent   │  Good  │Acceptable│  Slow          │
//! │  SHIFT_GRADES     │ Excellent │ Good │           Slow                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A table is an ordered list of `(upper_bound_ms, grade)` rows. The first
//! row whose bound is strictly greater than the elapsed time wins; anything
//! past the last row gets the table's fallback grade.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Coarse latency band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceGrade {
    Excellent,
    Good,
    Acceptable,
    Slow,
}

impl PerformanceGrade {
    /// Short label used in logs and the CLI.
    pub fn label(&self) -> &'static str {
        match self {
            PerformanceGrade::Excellent => "excellent",
            PerformanceGrade::Good => "good",
            PerformanceGrade::Acceptable => "acceptable",
            PerformanceGrade::Slow => "slow",
        }
    }
}

impl fmt::Display for PerformanceGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered thresholds plus the grade for everything beyond them.
#[derive(Debug, Clone, Copy)]
pub struct GradeTable {
    rows: &'static [(f64, PerformanceGrade)],
    fallback: PerformanceGrade,
}

impl GradeTable {
    /// Rows must be sorted by ascending bound.
    pub const fn new(rows: &'static [(f64, PerformanceGrade)], fallback: PerformanceGrade) -> Self {
        GradeTable { rows, fallback }
    }

    /// Grades an elapsed time in milliseconds.
    ///
    /// ```rust
    /// use posflow_core::performance::{PerformanceGrade, SALE_GRADES};
    ///
    /// assert_eq!(SALE_GRADES.classify(99.9), PerformanceGrade::Excellent);
    /// assert_eq!(SALE_GRADES.classify(100.0), PerformanceGrade::Good);
    /// assert_eq!(SALE_GRADES.classify(300.0), PerformanceGrade::Slow);
    /// ```
    pub fn classify(&self, elapsed_ms: f64) -> PerformanceGrade {
        self.rows
            .iter()
            .find(|(bound, _)| elapsed_ms < *bound)
            .map(|(_, grade)| *grade)
            .unwrap_or(self.fallback)
    }
}

/// Sale completion: <100 / <200 / <300 / slower.
pub const SALE_GRADES: GradeTable = GradeTable::new(
    &[
        (100.0, PerformanceGrade::Excellent),
        (200.0, PerformanceGrade::Good),
        (300.0, PerformanceGrade::Acceptable),
    ],
    PerformanceGrade::Slow,
);

/// Clock-in / clock-out: <50 / <100 / slower.
pub const SHIFT_GRADES: GradeTable = GradeTable::new(
    &[
        (50.0, PerformanceGrade::Excellent),
        (100.0, PerformanceGrade::Good),
    ],
    PerformanceGrade::Slow,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_bands() {
        assert_eq!(SALE_GRADES.classify(0.0), PerformanceGrade::Excellent);
        assert_eq!(SALE_GRADES.classify(150.0), PerformanceGrade::Good);
        assert_eq!(SALE_GRADES.classify(250.0), PerformanceGrade::Acceptable);
        assert_eq!(SALE_GRADES.classify(299.99), PerformanceGrade::Acceptable);
        assert_eq!(SALE_GRADES.classify(5_000.0), PerformanceGrade::Slow);
    }

    #[test]
    fn test_shift_bands() {
        assert_eq!(SHIFT_GRADES.classify(49.0), PerformanceGrade::Excellent);
        assert_eq!(SHIFT_GRADES.classify(50.0), PerformanceGrade::Good);
        assert_eq!(SHIFT_GRADES.classify(100.0), PerformanceGrade::Slow);
    }

    #[test]
    fn test_grade_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&PerformanceGrade::Acceptable).unwrap(),
            "\"acceptable\""
        );
    }
}
