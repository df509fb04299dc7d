#![allow(missing_docs)]

use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::str::contains;

const CONFIG: &str = "[paths]
ymldb = 'data/ymldb'
grids = 'data/grids'
operator_cards = 'data/operator_cards'
theory_cards = 'data/theory_cards'
fktables = 'data/fktables'
ekos = 'data/ekos'

[paths.logs]
eko = 'logs/eko'
fk = 'logs/fk'
";

#[test]
fn help() {
    Command::cargo_bin("pineko")
        .unwrap()
        .args(["scaffold", "--help"])
        .assert()
        .success()
        .stdout(contains("Set up or inspect the folders of a project"))
        .stdout(contains("new"))
        .stdout(contains("check"));
}

#[test]
fn new_and_check() {
    let directory = assert_fs::TempDir::new().unwrap();
    directory.child("pineko.toml").write_str(CONFIG).unwrap();
    let nested = directory.child("data");
    nested.create_dir_all().unwrap();

    Command::cargo_bin("pineko")
        .unwrap()
        .args(["scaffold", "check"])
        .current_dir(nested.path())
        .assert()
        .failure()
        .stdout(contains("operator_cards"))
        .stdout(contains("logs.fk"))
        .stdout(contains("Error: 8 folders are missing"));

    Command::cargo_bin("pineko")
        .unwrap()
        .args(["scaffold", "new"])
        .current_dir(nested.path())
        .assert()
        .success()
        .stdout(contains("Success: created the folders"));

    directory.child("data/grids").assert(predicates::path::is_dir());
    directory.child("logs/eko").assert(predicates::path::is_dir());

    Command::cargo_bin("pineko")
        .unwrap()
        .args(["-c"])
        .arg(directory.child("pineko.toml").path())
        .args(["scaffold", "check"])
        .assert()
        .success()
        .stdout("Success: all folders exist\n");
}
