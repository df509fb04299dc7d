#![allow(missing_docs)]

use assert_cmd::Command;
use assert_fs::TempDir;
use ndarray::Array3;
use pineko::backend::GridBackend;
use pineko::bin::BinLimits;
use pineko::boc::Order;
use pineko::channel;
use pineko::grid::Grid;
use pineko::import_only_subgrid::ImportOnlySubgridV2;
use pineko::subgrid::Mu2;
use predicates::str::contains;
use std::fs::File;
use std::path::{Path, PathBuf};
use tar::{Builder, Header};

fn write_grid(directory: &Path, orders: &[Order]) -> PathBuf {
    let mut grid = Grid::new(
        vec![channel![2, 21, 1.0]],
        orders.to_vec(),
        BinLimits::new(vec![0.0, 1.0]),
    );

    for order in 0..orders.len() {
        grid.set_subgrid(
            order,
            0,
            0,
            ImportOnlySubgridV2::new(
                Array3::from_elem((2, 2, 1), 1.0),
                vec![
                    Mu2 {
                        ren: 10.0,
                        fac: 10.0,
                    },
                    Mu2 {
                        ren: 100.0,
                        fac: 100.0,
                    },
                ],
                vec![0.01, 0.1],
                vec![1.0],
            )
            .into(),
        );
    }

    let path = directory.join("grid.pineappl.lz4");
    grid.write_to(&path).unwrap();
    path
}

fn write_eko(directory: &Path, q2_grid: &str) -> PathBuf {
    let metadata = format!(
        "Q2grid: {q2_grid}
inputgrid: [0.01, 0.1, 1.0]
inputpids: [21, 1, 2]
q2_ref: 2.7225
targetgrid: [0.1, 1.0]
targetpids: [21, 1, 2]
"
    );
    let path = directory.join("eko.tar");
    let mut builder = Builder::new(File::create(&path).unwrap());
    let mut header = Header::new_gnu();
    header.set_size(metadata.len().try_into().unwrap());
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, "metadata.yaml", metadata.as_bytes())
        .unwrap();
    builder.finish().unwrap();
    path
}

#[test]
fn help() {
    Command::cargo_bin("pineko")
        .unwrap()
        .args(["check", "--help"])
        .assert()
        .success()
        .stdout(contains("compat"))
        .stdout(contains("scvar"));
}

#[test]
fn compatible() {
    let directory = TempDir::new().unwrap();
    let grid = write_grid(directory.path(), &[Order::new(0, 0, 0, 0)]);
    let eko = write_eko(directory.path(), "[10.0, 100.0]");

    Command::cargo_bin("pineko")
        .unwrap()
        .args(["check", "compat"])
        .args([&grid, &eko])
        .assert()
        .success()
        .stdout("Success: grids are compatible\n");
}

#[test]
fn compatible_with_varied_factorization_scale() {
    let directory = TempDir::new().unwrap();
    let grid = write_grid(directory.path(), &[Order::new(0, 0, 0, 0)]);
    let eko = write_eko(directory.path(), "[40.0]");

    Command::cargo_bin("pineko")
        .unwrap()
        .args(["check", "compat", "--xif=2"])
        .args([&grid, &eko])
        .assert()
        .success()
        .stdout("Success: grids are compatible\n");
}

#[test]
fn incompatible() {
    let directory = TempDir::new().unwrap();
    let grid = write_grid(directory.path(), &[Order::new(0, 0, 0, 0)]);
    let eko = write_eko(directory.path(), "[20.0]");

    Command::cargo_bin("pineko")
        .unwrap()
        .args(["check", "compat"])
        .args([&grid, &eko])
        .assert()
        .failure()
        .stdout("Error: the scales of the operator are not scales of the grid\n");
}

#[test]
fn scale_variations() {
    let directory = TempDir::new().unwrap();
    let grid = write_grid(
        directory.path(),
        &[
            Order::new(0, 0, 0, 0),
            Order::new(1, 0, 0, 0),
            Order::new(1, 0, 1, 0),
        ],
    );

    Command::cargo_bin("pineko")
        .unwrap()
        .args(["check", "scvar"])
        .arg(&grid)
        .args(["ren", "2", "0"])
        .assert()
        .success()
        .stdout(contains(
            "Success: renormalization scale, alphas^1: central order and scale variations",
        ));

    Command::cargo_bin("pineko")
        .unwrap()
        .args(["check", "scvar"])
        .arg(&grid)
        .args(["fact", "2", "0"])
        .assert()
        .failure()
        .stdout(contains(
            "Error: the central order alphas^1 is present, but not its factorization-scale variations",
        ));
}

#[test]
fn unknown_scale() {
    let directory = TempDir::new().unwrap();
    let grid = write_grid(directory.path(), &[Order::new(0, 0, 0, 0)]);

    Command::cargo_bin("pineko")
        .unwrap()
        .args(["check", "scvar"])
        .arg(&grid)
        .args(["both", "1", "0"])
        .assert()
        .failure()
        .stderr(contains("unknown scale 'both'"));
}
