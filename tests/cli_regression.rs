// Regression test: Ensure CLI errors are rendered with miette diagnostics
// Requires: assert_cmd, predicates crates in [dev-dependencies]

use std::fs;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

#[test]
fn cli_check_reports_miette_diagnostics_and_fails() {
    let bad_file = "tests/bad_unit.cpp";
    fs::write(bad_file, "int x = ;\n").unwrap();

    let mut cmd = Command::cargo_bin("carbide").unwrap();
    cmd.arg("check").arg(bad_file);
    cmd.assert().failure().stderr(contains("carbide::parse"));

    let _ = fs::remove_file(bad_file);
}

#[test]
fn cli_check_passes_on_well_formed_input() {
    let good_file = "tests/good_unit.cpp";
    fs::write(good_file, "int x = 1;\n").unwrap();

    let mut cmd = Command::cargo_bin("carbide").unwrap();
    cmd.arg("check").arg(good_file);
    cmd.assert().success().stdout(contains("no syntax errors"));

    let _ = fs::remove_file(good_file);
}

#[test]
fn cli_parse_prints_an_outline() {
    let file = "tests/outline_unit.cpp";
    fs::write(file, "UCLASS() class A { GENERATED_BODY() };\n").unwrap();

    let mut cmd = Command::cargo_bin("carbide").unwrap();
    cmd.arg("parse").arg(file);
    cmd.assert()
        .success()
        .stdout(contains("translation_unit").and(contains("unreal_class_declaration")));

    let _ = fs::remove_file(file);
}

#[test]
fn cli_validate_grammar_reports_ok() {
    let mut cmd = Command::cargo_bin("carbide").unwrap();
    cmd.arg("validate-grammar");
    cmd.assert().success().stdout(contains("conflict sets"));
}
