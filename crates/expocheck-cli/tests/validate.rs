use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn empty_path_fails_before_any_network_call() {
    // The backend address is unroutable; the command must fail on validation,
    // not on a connection attempt.
    let mut cmd = Command::cargo_bin("expocheck-cli").unwrap();
    cmd.args(["--api-url", "http://127.0.0.1:1/api", "scan", ""])
        .assert()
        .failure()
        .stderr(contains("scan path must not be empty"));
}

#[test]
fn whitespace_only_path_is_rejected_as_empty() {
    let mut cmd = Command::cargo_bin("expocheck-cli").unwrap();
    cmd.args(["--api-url", "http://127.0.0.1:1/api", "scan", "   "])
        .assert()
        .failure()
        .stderr(contains("scan path must not be empty"));
}
