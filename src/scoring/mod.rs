//! Quality Scoring System
//!
//! Grades a project on four fixed dimensions and estimates its technical
//! debt. Everything here is pure arithmetic over [`QualityMetrics`].
//!
//! # Grading Ladders
//!
//! ```text
//! Dimension        Unit                      A    B    C    D    E
//! complexity       average flow complexity   <5   <10  <15  <20  rest
//! maintainability  debt ratio (%)            <5   <10  <20  <50  rest
//! reliability      bug count                 <0   <2   <5   <10  rest
//! security         vulnerability count       <0   <1   <3   <5   rest
//! ```
//!
//! A value gets the grade of the first step whose bound is strictly
//! greater than the value, so 12 on the complexity ladder is a C and a
//! project with zero bugs lands on B.
//!
//! # Technical Debt
//!
//! ```text
//! debt minutes = smells × 5 + bugs × 15 + vulnerabilities × 30
//! dev minutes  = max(60, flows × 10 + sub-flows × 5)
//! debt ratio   = debt minutes / dev minutes × 100   (0 when dev minutes is 0)
//! ```

mod debt;
mod ratings;

pub use debt::{
    calculate_debt_ratio, calculate_tech_debt_minutes, estimate_development_minutes,
    format_tech_debt, BUG_MINUTES, CODE_SMELL_MINUTES, MINUTES_PER_DAY, VULNERABILITY_MINUTES,
};
pub use ratings::{
    calculate_all_ratings, calculate_grade, grade_by_name, ladder, Dimension, Grade,
    QualityMetrics, QualityRatings, RatingResult, RatingThreshold,
};

/// Errors from scoring requests
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScoringError {
    #[error("unknown quality dimension '{0}' (expected complexity, maintainability, reliability or security)")]
    UnknownDimension(String),
}
