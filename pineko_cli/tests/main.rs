#![allow(missing_docs)]

use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn help() {
    Command::cargo_bin("pineko")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("Usage: pineko [OPTIONS] <COMMAND>"))
        .stdout(contains("check"))
        .stdout(contains("combine-fonll"))
        .stdout(contains("kfactor"))
        .stdout(contains("opcard"))
        .stdout(contains("ren-sv-grid"))
        .stdout(contains("scaffold"))
        .stdout(contains("--configs <CONFIGS>"))
        .stdout(contains("--log-level <LOG_LEVEL>"));
}

#[test]
fn without_arguments() {
    Command::cargo_bin("pineko")
        .unwrap()
        .assert()
        .failure()
        .stderr(contains("Usage: pineko [OPTIONS] <COMMAND>"));
}

#[test]
fn missing_configuration() {
    let directory = assert_fs::TempDir::new().unwrap();

    Command::cargo_bin("pineko")
        .unwrap()
        .args(["--configs", "does-not-exist.toml", "scaffold", "check"])
        .current_dir(directory.path())
        .assert()
        .failure()
        .stderr(contains("Error: could not read configuration 'does-not-exist.toml'"));
}
