//! A-E grade ladders

use super::ScoringError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Complexity,
    Maintainability,
    Reliability,
    Security,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Complexity,
        Dimension::Maintainability,
        Dimension::Reliability,
        Dimension::Security,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Complexity => "complexity",
            Dimension::Maintainability => "maintainability",
            Dimension::Reliability => "reliability",
            Dimension::Security => "security",
        }
    }

    fn display_value(&self, value: f64) -> String {
        match self {
            Dimension::Complexity => format!("{:.1}", value),
            Dimension::Maintainability => format!("{:.1}%", value),
            Dimension::Reliability => count_label(value, "bug", "bugs"),
            Dimension::Security => count_label(value, "vulnerability", "vulnerabilities"),
        }
    }
}

fn count_label(value: f64, singular: &str, plural: &str) -> String {
    let n = value.round() as u64;
    if n == 1 {
        format!("1 {}", singular)
    } else {
        format!("{} {}", n, plural)
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "complexity" => Ok(Dimension::Complexity),
            "maintainability" => Ok(Dimension::Maintainability),
            "reliability" => Ok(Dimension::Reliability),
            "security" => Ok(Dimension::Security),
            _ => Err(ScoringError::UnknownDimension(s.to_string())),
        }
    }
}

/// Letter grade, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
        };
        f.write_str(letter)
    }
}

/// One step of a grading ladder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingThreshold {
    pub grade: Grade,
    /// Exclusive upper bound
    pub max_value: f64,
    pub label: &'static str,
    pub description: &'static str,
    /// Terminal color name used by the text reporter
    pub color: &'static str,
}

const fn step(
    grade: Grade,
    max_value: f64,
    label: &'static str,
    description: &'static str,
    color: &'static str,
) -> RatingThreshold {
    RatingThreshold {
        grade,
        max_value,
        label,
        description,
        color,
    }
}

static COMPLEXITY_LADDER: [RatingThreshold; 5] = [
    step(Grade::A, 5.0, "Excellent", "Flows are simple and linear", "green"),
    step(Grade::B, 10.0, "Good", "Flows branch moderately", "cyan"),
    step(Grade::C, 15.0, "Fair", "Flows carry noticeable routing logic", "yellow"),
    step(Grade::D, 20.0, "Poor", "Flows are hard to follow", "magenta"),
    step(Grade::E, f64::INFINITY, "Critical", "Flows need to be split up", "red"),
];

static MAINTAINABILITY_LADDER: [RatingThreshold; 5] = [
    step(Grade::A, 5.0, "Excellent", "Debt is negligible", "green"),
    step(Grade::B, 10.0, "Good", "Debt is under control", "cyan"),
    step(Grade::C, 20.0, "Fair", "Debt is accumulating", "yellow"),
    step(Grade::D, 50.0, "Poor", "Debt slows down changes", "magenta"),
    step(Grade::E, f64::INFINITY, "Critical", "Debt dominates the project", "red"),
];

static RELIABILITY_LADDER: [RatingThreshold; 5] = [
    step(Grade::A, 0.0, "Excellent", "No reliability issues", "green"),
    step(Grade::B, 2.0, "Good", "At most one reliability issue", "cyan"),
    step(Grade::C, 5.0, "Fair", "A few reliability issues", "yellow"),
    step(Grade::D, 10.0, "Poor", "Many reliability issues", "magenta"),
    step(Grade::E, f64::INFINITY, "Critical", "Reliability is at risk", "red"),
];

static SECURITY_LADDER: [RatingThreshold; 5] = [
    step(Grade::A, 0.0, "Excellent", "No vulnerabilities", "green"),
    step(Grade::B, 1.0, "Good", "No confirmed vulnerabilities", "cyan"),
    step(Grade::C, 3.0, "Fair", "A few vulnerabilities", "yellow"),
    step(Grade::D, 5.0, "Poor", "Several vulnerabilities", "magenta"),
    step(Grade::E, f64::INFINITY, "Critical", "Security is at risk", "red"),
];

/// Ordered ladder for `dimension`, A first
pub fn ladder(dimension: Dimension) -> &'static [RatingThreshold] {
    match dimension {
        Dimension::Complexity => &COMPLEXITY_LADDER,
        Dimension::Maintainability => &MAINTAINABILITY_LADDER,
        Dimension::Reliability => &RELIABILITY_LADDER,
        Dimension::Security => &SECURITY_LADDER,
    }
}

fn threshold_for(dimension: Dimension, value: f64) -> Option<&'static RatingThreshold> {
    ladder(dimension).iter().find(|t| value < t.max_value)
}

/// Grade of the first step whose bound is strictly greater than `value`
///
/// Falls back to E, which only happens for NaN.
pub fn calculate_grade(dimension: Dimension, value: f64) -> Grade {
    threshold_for(dimension, value).map_or(Grade::E, |t| t.grade)
}

/// Rate one value on the ladder named `dimension`
pub fn grade_by_name(dimension: &str, value: f64) -> Result<RatingResult, ScoringError> {
    let dimension: Dimension = dimension.parse()?;
    Ok(RatingResult::rate(dimension, value))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingResult {
    pub value: f64,
    pub grade: Grade,
    pub label: String,
    pub display_value: String,
}

impl RatingResult {
    pub fn rate(dimension: Dimension, value: f64) -> Self {
        let grade = calculate_grade(dimension, value);
        let label = threshold_for(dimension, value)
            .map_or("Critical", |t| t.label)
            .to_string();
        Self {
            value,
            grade,
            label,
            display_value: dimension.display_value(value),
        }
    }

    /// Color of the step this result landed on
    pub fn color(&self, dimension: Dimension) -> &'static str {
        ladder(dimension)
            .iter()
            .find(|t| t.grade == self.grade)
            .map_or("red", |t| t.color)
    }
}

/// Inputs to grading; absent fields are not graded
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_complexity: Option<f64>,
    /// Debt ratio percentage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bug_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vulnerability_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotspot_count: Option<u64>,
}

impl QualityMetrics {
    /// Value measured for `dimension`, if any
    pub fn value_for(&self, dimension: Dimension) -> Option<f64> {
        match dimension {
            Dimension::Complexity => self.average_complexity,
            Dimension::Maintainability => self.debt_ratio,
            Dimension::Reliability => self.bug_count.map(|n| n as f64),
            Dimension::Security => self.vulnerability_count.map(|n| n as f64),
        }
    }
}

/// Ratings for the dimensions that were measured
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualityRatings(BTreeMap<Dimension, RatingResult>);

impl QualityRatings {
    pub fn get(&self, dimension: Dimension) -> Option<&RatingResult> {
        self.0.get(&dimension)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &RatingResult)> {
        self.0.iter().map(|(d, r)| (*d, r))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Worst grade across the rated dimensions
    pub fn worst(&self) -> Option<Grade> {
        self.0.values().map(|r| r.grade).max()
    }
}

/// Grade every dimension present in `metrics`
pub fn calculate_all_ratings(metrics: &QualityMetrics) -> QualityRatings {
    QualityRatings(
        Dimension::ALL
            .iter()
            .filter_map(|&d| metrics.value_for(d).map(|v| (d, RatingResult::rate(d, v))))
            .collect(),
    )
}
