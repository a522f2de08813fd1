//! CLI contract tests
//!
//! Runs the compiled binary against temporary Mule projects and checks
//! output formats, --fail-on exit codes, --output and rule overrides.

use std::path::Path;
use std::process::Command;

fn flowlint_bin() -> &'static str {
    env!("CARGO_BIN_EXE_flowlint")
}

fn setup_project(with_secret: bool) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let flows = dir.path().join("src/main/mule");
    std::fs::create_dir_all(&flows).expect("mkdir");

    let connection = if with_secret {
        r#"<db:my-sql-connection host="db" password="changeme"/>"#
    } else {
        r#"<db:my-sql-connection host="db" password="${secure::db.password}"/>"#
    };
    std::fs::write(
        flows.join("api.xml"),
        format!(
            r##"<mule xmlns="http://www.mulesoft.org/schema/mule/core"
      xmlns:db="http://www.mulesoft.org/schema/mule/db">
  <db:config name="db">{connection}</db:config>
  <flow name="list-items">
    <choice><when expression="#[true]"><logger/></when><otherwise/></choice>
    <error-handler><on-error-continue/></error-handler>
  </flow>
</mule>"##
        ),
    )
    .expect("write flow");
    std::fs::write(
        dir.path().join("pom.xml"),
        "<project><packaging>mule-application</packaging></project>",
    )
    .expect("write pom");
    std::fs::write(dir.path().join(".gitignore"), "target/\n").expect("write gitignore");
    dir
}

fn run(dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(flowlint_bin())
        .args(args)
        .arg(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("run flowlint");
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

#[test]
fn test_json_output() {
    let dir = setup_project(true);
    let (code, stdout, _) = run(dir.path(), &["analyze", "--format", "json"]);

    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(parsed["files_scanned"], 1);
    assert_eq!(parsed["flows"]["src/main/mule/api.xml::list-items"]["complexity"], 3);
    assert_eq!(parsed["summary"]["error"], 1);
    assert_eq!(parsed["issues"][0]["rule_id"], "hardcoded-credentials");
}

#[test]
fn test_default_command_renders_text() {
    let dir = setup_project(false);
    let (code, stdout, _) = run(dir.path(), &[]);

    assert_eq!(code, 0);
    assert!(stdout.contains("flowlint analysis"));
    assert!(stdout.contains("No issues found"));
}

#[test]
fn test_fail_on_error_exits_nonzero() {
    let dir = setup_project(true);
    let (code, _, stderr) = run(dir.path(), &["analyze", "--fail-on", "error"]);

    assert_eq!(code, 1);
    assert!(stderr.contains("--fail-on=error"));
}

#[test]
fn test_fail_on_passes_for_clean_project() {
    let dir = setup_project(false);
    let (code, _, _) = run(dir.path(), &["analyze", "--fail-on", "info"]);
    assert_eq!(code, 0);
}

#[test]
fn test_disable_rule_flag() {
    let dir = setup_project(true);
    let (code, stdout, _) = run(
        dir.path(),
        &[
            "analyze",
            "--format",
            "json",
            "--fail-on",
            "error",
            "--disable-rule",
            "hardcoded-credentials",
        ],
    );

    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(parsed["summary"]["total"], 0);
}

#[test]
fn test_fail_on_from_project_config() {
    let dir = setup_project(true);
    std::fs::write(
        dir.path().join("flowlint.toml"),
        "[defaults]\nfail_on = \"error\"\nformat = \"json\"\n",
    )
    .expect("write config");

    let (code, stdout, _) = run(dir.path(), &["analyze"]);
    assert_eq!(code, 1);
    assert!(serde_json::from_str::<serde_json::Value>(&stdout).is_ok());
}

#[test]
fn test_output_file() {
    let dir = setup_project(false);
    let out = dir.path().join("report.json");
    let out_str = out.to_string_lossy().into_owned();

    let (code, stdout, stderr) = run(dir.path(), &["analyze", "-f", "json", "-o", &out_str]);

    assert_eq!(code, 0);
    assert!(stdout.is_empty());
    assert!(stderr.contains("Report written to"));
    let content = std::fs::read_to_string(&out).expect("report written");
    let parsed: serde_json::Value = serde_json::from_str(&content).expect("valid JSON");
    assert_eq!(parsed["flow_count"], 1);
}

#[test]
fn test_rules_command_lists_catalog() {
    let dir = setup_project(false);
    let (code, stdout, _) = run(dir.path(), &["rules"]);

    assert_eq!(code, 0);
    for id in [
        "flow-complexity",
        "missing-error-handler",
        "flow-naming",
        "hardcoded-credentials",
        "project-pom",
        "project-gitignore",
    ] {
        assert!(stdout.contains(id), "missing {id} in:\n{stdout}");
    }
}

#[test]
fn test_missing_path_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (code, _, stderr) = run(&dir.path().join("nope"), &["analyze"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Path does not exist"));
}
