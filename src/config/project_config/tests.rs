use super::*;

#[test]
fn test_normalize_rule_id() {
    assert_eq!(normalize_rule_id("FlowComplexityRule"), "flow-complexity");
    assert_eq!(normalize_rule_id("flow_complexity"), "flow-complexity");
    assert_eq!(normalize_rule_id("flow-complexity"), "flow-complexity");
    assert_eq!(normalize_rule_id("Flow-Complexity"), "flow-complexity");
    // Consecutive uppercase stays together: POM -> pom
    assert_eq!(normalize_rule_id("ProjectPOMRule"), "project-pom");
}

#[test]
fn test_option_value() {
    let int_val = OptionValue::Integer(42);
    assert_eq!(int_val.as_i64(), Some(42));
    assert_eq!(int_val.as_f64(), Some(42.0));
    assert_eq!(int_val.as_bool(), None);

    let float_val = OptionValue::Float(2.5);
    assert_eq!(float_val.as_i64(), Some(2));
    assert_eq!(float_val.as_f64(), Some(2.5));

    let str_val = OptionValue::String("^x$".into());
    assert_eq!(str_val.as_str(), Some("^x$"));
    assert_eq!(str_val.as_i64(), None);
}

#[test]
fn test_default_config() {
    let config = ProjectConfig::default();

    // All rules enabled by default
    assert!(config.rules.is_enabled("flow-complexity"));
    assert!(config.rules.is_enabled("unknown-rule"));
    assert_eq!(
        config.rules.severity_for("flow-complexity", Severity::Warning),
        Severity::Warning
    );
    assert_eq!(config.scan.flows_dir(), DEFAULT_FLOWS_DIR);
    assert!(config.defaults.fail_on.is_none());
}

#[test]
fn test_parse_toml_config() {
    let toml_str = r#"
[rules.flow-complexity]
severity = "error"
options = { max_complexity = 15, ratio = 0.5 }

[rules.flow_naming]
enabled = false

[rules.hardcoded-credentials]
severity = "warn"

[scan]
flows_dir = "app/flows"
exclude = ["**/generated/**"]
workers = 2

[defaults]
format = "json"
fail_on = "warning"
skip_rules = ["project-gitignore"]
"#;

    let config: ProjectConfig = toml::from_str(toml_str).expect("parse toml");

    assert_eq!(
        config.rules.severity_for("flow-complexity", Severity::Warning),
        Severity::Error
    );
    assert_eq!(config.rules.option_i64("flow-complexity", "max_complexity"), Some(15));
    assert_eq!(config.rules.option_f64("flow-complexity", "ratio"), Some(0.5));
    assert!(!config.rules.is_enabled("flow-naming"));
    assert!(!config.rules.is_enabled("FlowNamingRule"));
    assert_eq!(
        config.rules.severity_for("hardcoded-credentials", Severity::Error),
        Severity::Warning
    );

    assert_eq!(config.scan.flows_dir(), "app/flows");
    assert_eq!(config.scan.exclude, vec!["**/generated/**".to_string()]);
    assert_eq!(config.scan.workers, Some(2));
    assert_eq!(config.defaults.format.as_deref(), Some("json"));
    assert_eq!(config.defaults.fail_on, Some(Severity::Warning));

    let effective = config.effective_rules();
    assert!(!effective.is_enabled("project-gitignore"));
    assert_eq!(effective.disabled_rules(), vec!["flow-naming", "project-gitignore"]);
}

#[test]
fn test_parse_json_config() {
    let json_str = r#"{
        "rules": { "FlowComplexity": { "options": { "max_complexity": 7 } } },
        "defaults": { "fail_on": "error" }
    }"#;

    let config: ProjectConfig = serde_json::from_str(json_str).expect("parse json");
    assert_eq!(config.rules.option_i64("flow-complexity", "max_complexity"), Some(7));
    assert_eq!(config.defaults.fail_on, Some(Severity::Error));
}

#[test]
fn test_builder_overrides() {
    let rules = RulesConfig::new()
        .with_severity("flow-naming", Severity::Error)
        .with_option("flow-naming", "pattern", OptionValue::String("^x".into()))
        .without("project-pom");

    assert_eq!(rules.severity_for("flow_naming", Severity::Info), Severity::Error);
    assert_eq!(rules.option_str("flow-naming", "pattern"), Some("^x"));
    assert!(!rules.is_enabled("project-pom"));
    assert!(rules.is_enabled("flow-naming"));
}

#[test]
fn test_load_project_config_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("flowlint.toml"),
        "[scan]\nflows_dir = \"mule\"\n",
    )
    .expect("write config");

    let config = load_project_config(dir.path());
    assert_eq!(config.scan.flows_dir(), "mule");
}

#[test]
fn test_broken_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("flowlint.toml"), "[scan\nbroken").expect("write config");

    let config = load_project_config(dir.path());
    assert_eq!(config.scan.flows_dir(), DEFAULT_FLOWS_DIR);
}

#[test]
fn test_missing_config_uses_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = load_project_config(dir.path());
    assert!(config.rules.disabled_rules().is_empty());
}
