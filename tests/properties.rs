//! Property-based tests for complexity and scoring.

use proptest::prelude::*;

use flowlint::complexity::{calculate_flow_complexity, ComplexityRating};
use flowlint::scoring::{
    calculate_debt_ratio, calculate_grade, estimate_development_minutes, format_tech_debt,
    Dimension,
};
use flowlint::xml::{parse_document, QueryEngine};

/// Flow body with the given number of each construct, plus some noise
fn flow_body(counts: &[usize; 10], noise: usize) -> String {
    let mut body = String::new();
    body.push_str(&"<logger/>".repeat(noise));
    if counts[0] > 0 {
        body.push_str("<choice>");
        body.push_str(&"<when expression='x'><logger/></when>".repeat(counts[0]));
        body.push_str("<otherwise/></choice>");
    }
    let scopes = [
        "until-successful",
        "foreach",
        "parallel-foreach",
        "scatter-gather",
        "async",
        "try",
        "first-successful",
        "round-robin",
    ];
    for (scope, &n) in scopes.iter().zip(&counts[1..9]) {
        body.push_str(&format!("<{scope}><set-payload value='p'/></{scope}>").repeat(n));
    }
    if counts[9] > 0 {
        body.push_str("<error-handler>");
        for i in 0..counts[9] {
            let handler = if i % 2 == 0 { "on-error-continue" } else { "on-error-propagate" };
            body.push_str(&format!("<{handler}/>"));
        }
        body.push_str("</error-handler>");
    }
    body
}

fn flow_complexity_of(body: &str) -> flowlint::complexity::ComplexityResult {
    let xml = format!(
        r#"<mule xmlns="http://www.mulesoft.org/schema/mule/core"><flow name="f">{body}</flow></mule>"#
    );
    let doc = parse_document(&xml).expect("generated flow parses");
    let query = QueryEngine::default();
    let flow = query
        .select_node("/mule:mule/mule:flow", doc.root())
        .expect("flow present");
    calculate_flow_complexity(&query, flow)
}

// ── complexity properties ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn complexity_is_one_plus_contributions(
        counts in prop::array::uniform10(0usize..4),
        noise in 0usize..5
    ) {
        let result = flow_complexity_of(&flow_body(&counts, noise));
        let sum: u32 = result.details.iter().map(|d| d.contribution).sum();
        prop_assert_eq!(result.complexity, 1 + sum);

        let expected: usize = counts.iter().sum();
        prop_assert_eq!(result.complexity as usize, 1 + expected);
        prop_assert_eq!(result.details.len(), counts.iter().filter(|&&n| n > 0).count());
        prop_assert!(result.details.iter().all(|d| d.count > 0));
    }

    #[test]
    fn linear_flows_are_low_one(noise in 0usize..10) {
        let result = flow_complexity_of(&flow_body(&[0; 10], noise));
        prop_assert_eq!(result.complexity, 1);
        prop_assert!(result.details.is_empty());
        prop_assert_eq!(result.rating, ComplexityRating::Low);
    }

    #[test]
    fn rating_follows_complexity(counts in prop::array::uniform10(0usize..4)) {
        let result = flow_complexity_of(&flow_body(&counts, 0));
        prop_assert_eq!(result.rating, ComplexityRating::from_complexity(result.complexity));
    }
}

// ── grading properties ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn grade_is_monotonic(a in 0.0f64..200.0, b in 0.0f64..200.0) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        for dimension in Dimension::ALL {
            prop_assert!(
                calculate_grade(dimension, low) <= calculate_grade(dimension, high),
                "{} graded {} better than {}", dimension, high, low
            );
        }
    }
}

// ── debt properties ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn debt_ratio_zero_division_policy(x in 0u64..100_000, dev in 1u64..100_000) {
        prop_assert_eq!(calculate_debt_ratio(0, dev), 0.0);
        prop_assert_eq!(calculate_debt_ratio(x, 0), 0.0);
    }

    #[test]
    fn development_minutes_have_a_floor(flows in 0u64..1000, sub_flows in 0u64..1000) {
        prop_assert!(estimate_development_minutes(flows, sub_flows) >= 60);
    }

    #[test]
    fn formatted_debt_reads_back(minutes in 0u64..1_000_000) {
        let formatted = format_tech_debt(minutes);
        let (days, hours, mins) = parse_debt(&formatted)
            .unwrap_or_else(|| panic!("unexpected format: {formatted}"));

        prop_assert!(hours < 8, "{} has {} leftover hours", formatted, hours);
        prop_assert!(mins < 60, "{} has {} leftover minutes", formatted, mins);
        prop_assert!(!formatted.contains(" 0"), "zero part kept in {}", formatted);
        if days > 0 {
            prop_assert_eq!(mins, 0);
        }

        let read_back = days * 480 + hours * 60 + mins;
        prop_assert!(read_back >= minutes, "{} reads back as {}", formatted, read_back);
        prop_assert!(read_back - minutes < 60, "{} reads back as {}", formatted, read_back);
    }
}

/// Split `1d 2h`, `3h 5m`, `45min` into (days, hours, minutes)
fn parse_debt(formatted: &str) -> Option<(u64, u64, u64)> {
    if let Some(mins) = formatted.strip_suffix("min") {
        return Some((0, 0, mins.parse().ok()?));
    }
    let (mut days, mut hours, mut mins) = (0, 0, 0);
    for part in formatted.split(' ') {
        let (value, unit) = part.split_at(part.len().checked_sub(1)?);
        let value: u64 = value.parse().ok()?;
        match unit {
            "d" => days = value,
            "h" => hours = value,
            "m" => mins = value,
            _ => return None,
        }
    }
    Some((days, hours, mins))
}

#[test]
fn formatted_debt_examples() {
    assert_eq!(format_tech_debt(45), "45min");
    assert_eq!(format_tech_debt(125), "2h 5m");
    assert_eq!(format_tech_debt(480), "1d");
    assert_eq!(format_tech_debt(500), "1d 1h");
    assert_eq!(format_tech_debt(901), "2d");
    assert_eq!(format_tech_debt(959), "2d");
    assert_eq!(estimate_development_minutes(0, 0), 60);
}
