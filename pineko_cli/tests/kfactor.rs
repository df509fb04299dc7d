#![allow(missing_docs)]

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::str::contains;

#[test]
fn help() {
    Command::cargo_bin("pineko")
        .unwrap()
        .args(["kfactor", "--help"])
        .assert()
        .success()
        .stdout(contains(
            "Usage: pineko kfactor [OPTIONS] <THEORY_ID> <DATASET> <KFACTOR_FOLDER> <TARGET_FOLDER> <PTO>",
        ));
}

#[test]
fn missing_yamldb() {
    let directory = TempDir::new().unwrap();
    directory
        .child("pineko.toml")
        .write_str(
            "[paths]
ymldb = 'ymldb'
grids = 'grids'
operator_cards = 'operator_cards'
theory_cards = 'theory_cards'
fktables = 'fktables'
ekos = 'ekos'
",
        )
        .unwrap();

    Command::cargo_bin("pineko")
        .unwrap()
        .args(["kfactor", "400", "DATASET", "kfactors", "target", "2"])
        .current_dir(directory.path())
        .assert()
        .failure()
        .stderr(contains("Error: could not read yamldb"));
}

#[cfg(not(feature = "lhapdf"))]
#[test]
fn without_lhapdf() {
    use ndarray::Array3;
    use pineko::backend::GridBackend;
    use pineko::bin::BinLimits;
    use pineko::boc::Order;
    use pineko::channel;
    use pineko::grid::Grid;
    use pineko::import_only_subgrid::ImportOnlySubgridV2;
    use pineko::subgrid::Mu2;

    let directory = TempDir::new().unwrap();
    directory
        .child("pineko.toml")
        .write_str(
            "[paths]
ymldb = 'ymldb'
grids = 'grids'
operator_cards = 'operator_cards'
theory_cards = 'theory_cards'
fktables = 'fktables'
ekos = 'ekos'
",
        )
        .unwrap();
    directory
        .child("ymldb/DATASET.yaml")
        .write_str("operands:\n- - GRID\n")
        .unwrap();
    directory
        .child("kfactors/CF_QCD_GRID.dat")
        .write_str("*\nPDFset: NNPDF40_nnlo_as_01180\n*\n1.1 0.0\n")
        .unwrap();

    let mut grid = Grid::new(
        vec![channel![2, -2, 1.0]],
        vec![Order::new(0, 2, 0, 0)],
        BinLimits::new(vec![0.0, 1.0]),
    );
    grid.set_subgrid(
        0,
        0,
        0,
        ImportOnlySubgridV2::new(
            Array3::from_elem((1, 1, 1), 1.0),
            vec![Mu2 {
                ren: 100.0,
                fac: 100.0,
            }],
            vec![0.1],
            vec![0.1],
        )
        .into(),
    );
    grid.write_to(directory.child("grids/400/GRID.pineappl.lz4").path())
        .unwrap();

    Command::cargo_bin("pineko")
        .unwrap()
        .args(["kfactor", "400", "DATASET", "kfactors", "target", "2"])
        .current_dir(directory.path())
        .assert()
        .failure()
        .stderr(contains("you need to install `pineko` with feature `lhapdf`"));
}
