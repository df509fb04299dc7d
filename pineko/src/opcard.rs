//! Operator cards: the runcards an evolution operator is computed from.

use super::backend::GridBackend;
use super::boc::Order;
use super::check;
use super::error::{Error, Result};
use super::theory_card::TheoryCard;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;
use tracing::info;

/// Return the number of active flavors at the squared scale `mu2`, given the squared thresholds
/// at which the charm, bottom and top quarks become active.
#[must_use]
pub fn active_flavors(mu2: f64, thresholds_squared: &[f64; 3]) -> u32 {
    3 + thresholds_squared
        .iter()
        .map(|&threshold| u32::from(threshold <= mu2))
        .sum::<u32>()
}

/// Write an operator card for `grid` to `target`, starting from the card `template` and using
/// the parameters of `theory`. The card lists the `x` nodes of the grid and, for each of its
/// factorization scales, the scale of the evolution together with its number of active
/// flavors. Returns the `x` nodes and the squared scales of the card.
///
/// # Errors
///
/// Returns an error if the template is not a YAML mapping, the theory card lacks a required
/// parameter or `target` can not be written.
pub fn write_operator_card<G: GridBackend>(
    grid: &G,
    template: &Path,
    theory: &TheoryCard,
    target: &Path,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let Value::Mapping(mut card) = serde_yaml::from_str::<Value>(&fs::read_to_string(template)?)?
    else {
        return Err(Error::Parse(format!(
            "operator card template '{}' is not a mapping",
            template.display()
        )));
    };

    let max_as = check::max_as_for_theory(theory.pto()?, theory.fns()?, grid);
    let mask = Order::create_mask(grid.orders(), max_as, 0, true);
    let info = grid.evolve_info(&mask);

    let xif = theory.xif()?;
    let thresholds = theory.thresholds_squared()?;
    let mu2_grid: Vec<_> = info.fac1.iter().map(|fac| xif * xif * fac).collect();

    let mugrid = mu2_grid
        .iter()
        .map(|&mu2| {
            Value::Sequence(vec![
                Value::from(mu2.sqrt()),
                Value::from(active_flavors(mu2, &thresholds)),
            ])
        })
        .collect();

    insert(&mut card, "mu0", Value::from(theory.q0()?));
    insert(&mut card, "mugrid", Value::Sequence(mugrid));
    insert(
        &mut card,
        "xgrid",
        Value::Sequence(info.x1.iter().copied().map(Value::from).collect()),
    );

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(target, serde_yaml::to_string(&card)?)?;

    info!(
        "wrote operator card '{}' with {} scales and {} x nodes",
        target.display(),
        mu2_grid.len(),
        info.x1.len()
    );

    Ok((info.x1, mu2_grid))
}

fn insert(card: &mut Mapping, key: &str, value: Value) {
    card.insert(Value::String(key.to_owned()), value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bin::BinLimits;
    use crate::channel;
    use crate::grid::Grid;
    use crate::import_only_subgrid::ImportOnlySubgridV2;
    use crate::subgrid::{Mu2, SubgridEnum};
    use ndarray::Array3;

    const THEORY: &str = "ID: 400
PTO: 1
FNS: FONLL-C
Q0: 1.65
XIF: 2.0
mc: 1.51
mb: 4.92
mt: 172.5
";

    #[test]
    fn flavors_at_thresholds() {
        let thresholds = [2.0, 20.0, 200.0];

        assert_eq!(active_flavors(1.0, &thresholds), 3);
        assert_eq!(active_flavors(2.0, &thresholds), 4);
        assert_eq!(active_flavors(100.0, &thresholds), 5);
        assert_eq!(active_flavors(1e6, &thresholds), 6);
    }

    #[test]
    fn write_card() {
        let mut grid = Grid::new(
            vec![channel![2, 21, 1.0]],
            vec![Order::new(0, 0, 0, 0), Order::new(3, 0, 0, 0)],
            BinLimits::new(vec![0.0, 1.0]),
        );
        let subgrid = |fac: f64, x: f64| -> SubgridEnum {
            ImportOnlySubgridV2::new(
                Array3::from_elem((1, 1, 1), 1.0),
                vec![Mu2 { ren: fac, fac }],
                vec![x],
                vec![1.0],
            )
            .into()
        };
        grid.set_subgrid(0, 0, 0, subgrid(1.0, 0.1));
        // not selected by a theory at NLO
        grid.set_subgrid(1, 0, 0, subgrid(4.0, 0.2));

        let directory = tempfile::tempdir().unwrap();
        let template = directory.path().join("template.yaml");
        let target = directory.path().join("cards").join("NAME.yaml");
        fs::write(&template, "configs:\n  polynomial_degree: 4\nmu0: 0.0\n").unwrap();

        let theory: TheoryCard = THEORY.parse().unwrap();
        let (x_grid, mu2_grid) =
            write_operator_card(&grid, &template, &theory, &target).unwrap();

        assert_eq!(x_grid, [0.1, 1.0]);
        assert_eq!(mu2_grid, [4.0]);

        let card: Value = serde_yaml::from_str(&fs::read_to_string(&target).unwrap()).unwrap();

        assert_eq!(card["mu0"], Value::from(1.65));
        assert_eq!(card["mugrid"][0][0], Value::from(2.0));
        assert_eq!(card["mugrid"][0][1], Value::from(4));
        assert_eq!(card["xgrid"][1], Value::from(1.0));
        assert_eq!(card["configs"]["polynomial_degree"], Value::from(4));
    }

    #[test]
    fn template_must_be_a_mapping() {
        let grid = Grid::new(
            vec![channel![2, 21, 1.0]],
            vec![Order::new(0, 0, 0, 0)],
            BinLimits::new(vec![0.0, 1.0]),
        );
        let directory = tempfile::tempdir().unwrap();
        let template = directory.path().join("template.yaml");
        fs::write(&template, "- 1\n").unwrap();
        let theory: TheoryCard = THEORY.parse().unwrap();

        assert!(matches!(
            write_operator_card(&grid, &template, &theory, &directory.path().join("out.yaml")),
            Err(Error::Parse(_))
        ));
    }
}
