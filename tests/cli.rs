use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn viewer_without_model_prints_usage_and_fails() {
    Command::cargo_bin("gltf-viewer")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("usage:"))
        .stderr(predicate::str::contains("<path/to/model.gltf>"));
}

#[test]
fn empty_model_argument_is_rejected() {
    Command::cargo_bin("gltf-viewer")
        .unwrap()
        .arg("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("usage:"));
}
