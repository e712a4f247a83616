// CLI behavior against the scripts in tests/fixtures.
// Requires: assert_cmd, predicates crates in [dev-dependencies]

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

fn linebased() -> Command {
    let mut cmd = Command::cargo_bin("linebased").unwrap();
    cmd.env("NO_COLOR", "1").env("TERM", "dumb").env_remove("LINEBASED_LOG");
    cmd
}

fn in_dir(dir: &str) -> Command {
    let mut cmd = linebased();
    cmd.args(["--dir", dir, "--ext", ".lb"]);
    cmd
}

#[test]
fn expand_prints_source() {
    in_dir("tests/fixtures/good")
        .args(["expand", "main.lb"])
        .assert()
        .success()
        .stdout("echo Hello, World!\necho bye\n");
}

#[test]
fn expand_json_emits_one_object_per_line() {
    let output = in_dir("tests/fixtures/good")
        .args(["expand", "main.lb", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["name"], "echo");
    assert_eq!(lines[0]["file"], "_lib.lb");
    assert_eq!(lines[0]["stack"][0]["name"], "greet");
    assert_eq!(lines[1]["file"], "main.lb");
}

#[test]
fn trace_shows_locations_and_callers() {
    in_dir("tests/fixtures/good")
        .args(["trace", "main.lb"])
        .assert()
        .success()
        .stdout(
            contains("_lib.lb:2: greet@1> echo Hello, World!")
                .and(contains("    from main.lb:2: main@2> greet World"))
                .and(contains("main.lb:3: main@3> echo bye")),
        );
}

#[test]
fn expansion_errors_are_rendered_as_diagnostics() {
    in_dir("tests/fixtures/broken")
        .args(["expand", "loop.lb"])
        .assert()
        .failure()
        .stderr(contains("linebased::recursion").and(contains("recursion detected in template loop")));
}

#[test]
fn missing_script_fails() {
    in_dir("tests/fixtures/good")
        .args(["expand", "absent.lb"])
        .assert()
        .failure()
        .stderr(contains("linebased::open"));
}

#[test]
fn check_passes_clean_directory() {
    in_dir("tests/fixtures")
        .args(["check", "good"])
        .assert()
        .success()
        .stdout(
            contains("PASS _lib.lb (0 expressions)")
                .and(contains("PASS main.lb (2 expressions)"))
                .and(contains("2 passed, 0 failed")),
        );
}

#[test]
fn check_reports_failing_scripts() {
    in_dir("tests/fixtures")
        .args(["check", "broken"])
        .assert()
        .failure()
        .stdout(
            contains("PASS early.lb")
                .and(contains("FAIL loop.lb"))
                .and(contains("loop.lb:3: loop@1: recursion detected in template loop"))
                .and(contains("1 passed, 1 failed")),
        );
}

#[test]
fn lint_reports_use_before_definition() {
    in_dir("tests/fixtures/broken")
        .args(["lint", "early.lb"])
        .assert()
        .failure()
        .stdout(contains(
            "early.lb:1: template \"greet\" used before definition on line 2",
        ));
}

#[test]
fn lint_is_quiet_on_clean_script() {
    in_dir("tests/fixtures/good")
        .args(["lint", "main.lb"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn templates_lists_included_definitions() {
    in_dir("tests/fixtures/good")
        .args(["templates", "main.lb"])
        .assert()
        .success()
        .stdout("greet name  (_lib.lb:2)\n    Says hello.\n");
}

#[test]
fn conflicting_extension_flags_are_rejected() {
    linebased()
        .args(["--no-ext", "--ext", ".lb", "expand", "main.lb"])
        .assert()
        .failure();
}
