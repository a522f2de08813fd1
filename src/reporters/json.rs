//! JSON reporter
//!
//! Outputs the full AnalysisReport as pretty-printed JSON.

use crate::models::AnalysisReport;
use anyhow::Result;

pub fn render(report: &AnalysisReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_report;

    #[test]
    fn test_json_render_valid() {
        let report = test_report();
        let json_str = render(&report).expect("render JSON");
        let parsed: serde_json::Value = serde_json::from_str(&json_str).expect("parse JSON");

        assert_eq!(parsed["flow_count"], 1);
        assert_eq!(parsed["ratings"]["security"]["grade"], "C");
        assert_eq!(
            parsed["flows"]["src/main/mule/orders.xml::GetOrders"]["complexity"],
            3
        );
        let issues = parsed["issues"].as_array().expect("issues array");
        assert!(issues.iter().any(|i| i["rule_id"] == "hardcoded-credentials"
            && i["severity"] == "error"
            && i["file"] == "src/main/mule/orders.xml"));
    }

    #[test]
    fn test_json_round_trips() {
        let report = test_report();
        let json_str = render(&report).expect("render JSON");
        let back: AnalysisReport = serde_json::from_str(&json_str).expect("deserialize");
        assert_eq!(back.issues, report.issues);
        assert_eq!(back.tech_debt, report.tech_debt);
    }
}
