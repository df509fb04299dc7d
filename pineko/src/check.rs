//! Checks of the preconditions for evolving a grid.

use super::backend::{GridBackend, OperatorAxes};
use super::boc::{Channel, Order};
use super::error::{Error, Result};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

const RTOL: f64 = 1e-5;
const ATOL: f64 = 1e-8;

fn is_close(lhs: f64, rhs: f64) -> bool {
    (lhs - rhs).abs() <= RTOL.mul_add(rhs.abs(), ATOL)
}

fn contained_in(values: &[f64], nodes: &[f64]) -> bool {
    values
        .iter()
        .all(|&value| nodes.iter().any(|&node| is_close(value, node)))
}

/// The scale a logarithm belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scale {
    /// Renormalization scale.
    Ren,
    /// Factorization scale.
    Fact,
}

impl FromStr for Scale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ren" => Ok(Self::Ren),
            "fact" => Ok(Self::Fact),
            _ => Err(Error::Parse(format!(
                "unknown scale '{s}', expected 'ren' or 'fact'"
            ))),
        }
    }
}

impl Display for Scale {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Ren => write!(f, "renormalization"),
            Self::Fact => write!(f, "factorization"),
        }
    }
}

impl Scale {
    const fn log_power(self, order: &Order) -> u32 {
        match self {
            Self::Ren => order.logxir,
            Self::Fact => order.logxif,
        }
    }
}

/// What is available at the highest selected power of the strong coupling.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AvailableAtMax {
    /// The central order and its scale variations.
    Both,
    /// Only the central order.
    Central,
    /// Only the scale variations.
    ScVar,
}

/// Check that the evolution operator `eko` can be applied to the orders of `grid` selected by
/// `max_as` and `max_al`, when the factorization scale is varied by `xif`.
///
/// # Errors
///
/// Returns [`Error::Incompatible`] if a scale or an `x` node of the operator is not a node of
/// the grid.
pub fn check_grid_and_eko_compatible<G: GridBackend>(
    grid: &G,
    eko: &impl OperatorAxes,
    xif: f64,
    max_as: u32,
    max_al: u32,
) -> Result<()> {
    let mask = Order::create_mask(grid.orders(), max_as, max_al, true);
    let info = grid.evolve_info(&mask);
    let fac1: Vec<_> = info.fac1.iter().map(|fac| xif * xif * fac).collect();

    if !contained_in(eko.mu2_grid(), &fac1) {
        return Err(Error::Incompatible(
            "the scales of the operator are not scales of the grid".to_owned(),
        ));
    }

    if !contained_in(eko.x_grid(), &info.x1) {
        return Err(Error::Incompatible(
            "the x nodes of the operator are not x nodes of the grid".to_owned(),
        ));
    }

    Ok(())
}

/// Return the orders of `grid` selected by `max_as` and `max_al`, including logarithmic ones.
#[must_use]
pub fn selected_orders<G: GridBackend>(grid: &G, max_as: u32, max_al: u32) -> Vec<Order> {
    let mask = Order::create_mask(grid.orders(), max_as, max_al, true);

    grid.orders()
        .iter()
        .zip(mask)
        .filter_map(|(order, selected)| selected.then_some(*order))
        .collect()
}

/// Return which orders the `grid` contains at the highest power of the strong coupling selected
/// by `max_as` and `max_al`, with respect to logarithms of `scale`, together with that power.
///
/// # Errors
///
/// Returns an error if no order is selected.
pub fn contains_sv<G: GridBackend>(
    grid: &G,
    max_as: u32,
    max_al: u32,
    scale: Scale,
) -> Result<(AvailableAtMax, u32)> {
    let orders = selected_orders(grid, max_as, max_al);
    let max_as_effective = orders
        .iter()
        .map(|order| order.alphas)
        .max()
        .ok_or_else(|| Error::General("no order of the grid is selected".to_owned()))?;

    let at_max = orders.iter().filter(|order| order.alphas == max_as_effective);
    let (mut central, mut scvar) = (false, false);

    for order in at_max {
        if scale.log_power(order) == 0 {
            central = true;
        } else {
            scvar = true;
        }
    }

    let available = match (central, scvar) {
        (true, true) => AvailableAtMax::Both,
        (true, false) => AvailableAtMax::Central,
        _ => AvailableAtMax::ScVar,
    };

    Ok((available, max_as_effective))
}

/// Check that the scale variations of `scale` of the orders selected by `max_as` and `max_al`
/// are consistent with the central orders. Scale variations are not expected at the leading
/// order, and renormalization-scale logarithms are not expected at the first order above a
/// leading order without the strong coupling.
///
/// # Errors
///
/// Returns [`Error::Incompatible`] if the scale variations are missing or if they are present
/// without the central order.
pub fn check_scvar_evolve<G: GridBackend>(
    grid: &G,
    max_as: u32,
    max_al: u32,
    scale: Scale,
) -> Result<()> {
    let (available, max_as_effective) = contains_sv(grid, max_as, max_al, scale)?;
    let min_as = selected_orders(grid, max_as, max_al)
        .iter()
        .map(|order| order.alphas)
        .min()
        .unwrap_or_default();

    if max_as_effective == min_as
        || (scale == Scale::Ren && min_as == 0 && max_as_effective == 1)
    {
        return Ok(());
    }

    match available {
        AvailableAtMax::Both => Ok(()),
        AvailableAtMax::Central => Err(Error::Incompatible(format!(
            "the central order alphas^{max_as_effective} is present, but not its {scale}-scale variations"
        ))),
        AvailableAtMax::ScVar => Err(Error::Incompatible(format!(
            "the {scale}-scale variations of alphas^{max_as_effective} are present, but not the central order"
        ))),
    }
}

/// Return `true` if every channel has a lepton in its initial state.
#[must_use]
pub fn is_dis(channels: &[Channel]) -> bool {
    let is_lepton = |pid: i32| (11..=16).contains(&pid.abs());

    channels.iter().all(|channel| {
        channel
            .entry()
            .iter()
            .all(|(pids, _)| pids.iter().any(|&pid| is_lepton(pid)))
    })
}

/// Return `true` if the flavor-number scheme `fns` is a FONLL scheme whose massive part is
/// computed one order lower than its massless part, and `grid` is a DIS grid.
#[must_use]
pub fn is_fonll_mixed<G: GridBackend>(fns: &str, grid: &G) -> bool {
    matches!(fns, "FONLL-B" | "FONLL-D" | "FONLL-F") && is_dis(grid.channels())
}

/// Return the `max_as` argument selecting the orders a theory with perturbative order `pto` and
/// flavor-number scheme `fns` needs from `grid`.
#[must_use]
pub fn max_as_for_theory<G: GridBackend>(pto: u32, fns: &str, grid: &G) -> u32 {
    1 + pto + u32::from(is_fonll_mixed(fns, grid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bin::BinLimits;
    use crate::channel;
    use crate::grid::Grid;
    use crate::import_only_subgrid::ImportOnlySubgridV2;
    use crate::subgrid::Mu2;
    use ndarray::Array3;

    struct Eko {
        x_grid: Vec<f64>,
        mu2_grid: Vec<f64>,
    }

    impl OperatorAxes for Eko {
        fn x_grid(&self) -> &[f64] {
            &self.x_grid
        }

        fn mu2_grid(&self) -> &[f64] {
            &self.mu2_grid
        }

        fn input_pids(&self) -> &[i32] {
            &[]
        }

        fn target_pids(&self) -> &[i32] {
            &[]
        }
    }

    fn grid(orders: Vec<Order>, channels: Vec<Channel>) -> Grid {
        let mut grid = Grid::new(channels, orders, BinLimits::new(vec![0.0, 1.0]));

        for order in 0..grid.orders().len() {
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
                            ren: 20.0,
                            fac: 20.0,
                        },
                    ],
                    vec![0.01, 1.0],
                    vec![1.0],
                )
                .into(),
            );
        }

        grid
    }

    #[test]
    fn grid_and_eko_compatibility() {
        let grid = grid(vec![Order::new(0, 0, 0, 0)], vec![channel![11, 21, 1.0]]);

        let eko = Eko {
            x_grid: vec![0.01, 1.0],
            mu2_grid: vec![10.0 * (1.0 + 1e-7)],
        };
        check_grid_and_eko_compatible(&grid, &eko, 1.0, 1, 0).unwrap();

        let eko = Eko {
            x_grid: vec![0.01],
            mu2_grid: vec![40.0, 80.0],
        };
        check_grid_and_eko_compatible(&grid, &eko, 2.0, 1, 0).unwrap();

        assert!(matches!(
            check_grid_and_eko_compatible(&grid, &eko, 1.0, 1, 0),
            Err(Error::Incompatible(_))
        ));

        let eko = Eko {
            x_grid: vec![0.02],
            mu2_grid: vec![10.0],
        };

        assert!(matches!(
            check_grid_and_eko_compatible(&grid, &eko, 1.0, 1, 0),
            Err(Error::Incompatible(_))
        ));
    }

    #[test]
    fn scale_variations_at_max() {
        let channels = vec![channel![2, 21, 1.0]];
        let both = grid(
            vec![
                Order::new(0, 0, 0, 0),
                Order::new(1, 0, 0, 0),
                Order::new(1, 0, 1, 0),
                Order::new(1, 0, 0, 1),
            ],
            channels.clone(),
        );

        assert_eq!(
            contains_sv(&both, 2, 0, Scale::Ren).unwrap(),
            (AvailableAtMax::Both, 1)
        );
        assert_eq!(
            contains_sv(&both, 1, 0, Scale::Fact).unwrap(),
            (AvailableAtMax::Central, 0)
        );
        check_scvar_evolve(&both, 2, 0, Scale::Fact).unwrap();
        check_scvar_evolve(&both, 1, 0, Scale::Fact).unwrap();

        let central = grid(
            vec![
                Order::new(1, 0, 0, 0),
                Order::new(2, 0, 0, 0),
                Order::new(2, 0, 0, 1),
            ],
            channels.clone(),
        );

        assert_eq!(
            contains_sv(&central, 2, 0, Scale::Ren).unwrap(),
            (AvailableAtMax::Central, 2)
        );
        assert!(matches!(
            check_scvar_evolve(&central, 2, 0, Scale::Ren),
            Err(Error::Incompatible(_))
        ));
        check_scvar_evolve(&central, 2, 0, Scale::Fact).unwrap();

        let scvar = grid(
            vec![Order::new(0, 0, 0, 0), Order::new(1, 0, 0, 1)],
            channels,
        );

        assert!(matches!(
            check_scvar_evolve(&scvar, 2, 0, Scale::Fact),
            Err(Error::Incompatible(msg)) if msg.contains("not the central order")
        ));
        // no renormalization-scale logarithms at NLO for a leading order without alphas
        check_scvar_evolve(&scvar, 2, 0, Scale::Ren).unwrap();
    }

    #[test]
    fn parse_scale() {
        assert_eq!("ren".parse::<Scale>().unwrap(), Scale::Ren);
        assert_eq!("fact".parse::<Scale>().unwrap(), Scale::Fact);
        assert!("both".parse::<Scale>().is_err());
    }

    #[test]
    fn fonll_mixed() {
        let dis = grid(vec![Order::new(0, 0, 0, 0)], vec![channel![11, 21, 1.0]]);
        let hadronic = grid(vec![Order::new(0, 0, 0, 0)], vec![channel![2, 21, 1.0]]);

        assert!(is_fonll_mixed("FONLL-B", &dis));
        assert!(!is_fonll_mixed("FONLL-C", &dis));
        assert!(!is_fonll_mixed("FONLL-B", &hadronic));
        assert_eq!(max_as_for_theory(1, "FONLL-B", &dis), 3);
        assert_eq!(max_as_for_theory(1, "FONLL-C", &dis), 2);
    }
}
