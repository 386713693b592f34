// Regression tests: the CLI prints translations and renders failures as miette diagnostics.
// Requires: assert_cmd, predicates crates in [dev-dependencies]

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(path)
}

fn cqn() -> Command {
    Command::cargo_bin("cqn").unwrap()
}

#[test]
fn translate_prints_query_and_options() {
    cqn()
        .arg("translate")
        .arg("--schema")
        .arg(fixture("schema.yaml"))
        .arg(fixture("trees/order_by.json"))
        .assert()
        .success()
        .stdout(
            contains(r#"greaterThanOrEqual("price", 9.5)"#)
                .and(contains("orderBy(age descending, name ascending)")),
        );
}

#[test]
fn translate_can_print_json() {
    cqn()
        .args(["translate", "--format", "json", "-s"])
        .arg(fixture("schema.yaml"))
        .arg(fixture("trees/in_colors.json"))
        .assert()
        .success()
        .stdout(contains(r#""type": "in""#).and(contains(r#""green""#)));
}

#[test]
fn check_reports_counters() {
    cqn()
        .args(["check", "-s"])
        .arg(fixture("schema.yaml"))
        .arg(fixture("trees/nested_scopes.yaml"))
        .assert()
        .success()
        .stdout(contains("6 queries encountered, 6 converted"));
}

#[test]
fn cli_reports_miette_diagnostics_on_error() {
    cqn()
        .args(["translate", "-s"])
        .arg(fixture("schema.yaml"))
        .arg(fixture("trees/not_arity.json"))
        .assert()
        .failure()
        .stderr(contains("cqn::arity").and(contains("'not' takes exactly one query")));
}

#[test]
fn missing_files_are_config_errors() {
    cqn()
        .args(["check", "-s", "no/such/schema.yaml"])
        .arg(fixture("trees/order_by.json"))
        .assert()
        .failure()
        .stderr(contains("cqn::config").or(contains("Failed to read")));
}

#[test]
fn fixture_cases_are_not_parse_trees() {
    cqn()
        .args(["check", "-s"])
        .arg(fixture("schema.yaml"))
        .arg(fixture("cases/nested_scopes.json"))
        .assert()
        .failure()
        .stderr(contains("cqn::config").and(contains("unknown field")));
}

#[test]
fn attributes_lists_the_schema() {
    cqn()
        .args(["attributes", "-s"])
        .arg(fixture("schema.yaml"))
        .assert()
        .success()
        .stdout(contains("Person").and(contains("age: Integer")).and(contains("price: Float")));
}
