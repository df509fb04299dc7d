//! Inclusion of k-factors as an additional perturbative order.
//!
//! A k-factor file multiplies the prediction of a grid bin by bin. The correction is stored as a
//! new order, computed from the orders below it, such that the convolution of the grid reproduces
//! the k-factor corrected prediction.

use super::backend::{AlphasEvaluator, GridBackend};
use super::boc::Order;
use super::configs::Configuration;
use super::convert::i32_from_u32;
use super::error::{Error, Result};
use super::reconstruct::{self, OrderPresence, ReturnState};
use super::rescale::{self, Factor};
use super::subgrid::{Subgrid, node_value_eq};
use float_cmp::approx_eq;
use itertools::Itertools;
use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// PDF set the strong coupling is taken from if the k-factor file does not name one.
pub const DEFAULT_PDF_SET: &str = "NNPDF40_nnlo_as_01180";

/// Metadata key recording the applied k-factors.
pub const METADATA_KEY: &str = "kfactor";

/// Contents of a k-factor file.
#[derive(Clone, Debug, PartialEq)]
pub struct KFactor {
    /// Central value of the k-factor for each bin.
    pub central: Vec<f64>,
    /// PDF set the k-factors were computed with, if the file names one.
    pub pdf_set: Option<String>,
}

/// Parse the `content` of a k-factor file.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the file does not start with a line beginning with `*`, if the
/// description is not closed by such a line, or if the data block does not consist of pairs of
/// numbers.
pub fn parse_kfactor(content: &str) -> Result<KFactor> {
    let mut lines = content.lines();

    if !lines.next().is_some_and(|line| line.starts_with('*')) {
        return Err(Error::Parse(
            "the first line of a k-factor file must start with '*'".to_owned(),
        ));
    }

    let mut description = String::new();
    let mut closed = false;

    for line in lines.by_ref() {
        if line.starts_with('*') {
            closed = true;
            break;
        }

        description.push_str(line);
        description.push('\n');
    }

    if !closed {
        return Err(Error::Parse(
            "the description of the k-factor file is not closed by a line starting with '*'"
                .to_owned(),
        ));
    }

    let pdf_set = description
        .split_once("PDFset:")
        .and_then(|(_, rest)| rest.split_once('\n'))
        .map(|(name, _)| name.trim().to_owned())
        .filter(|name| !name.is_empty());

    let values = lines
        .flat_map(str::split_whitespace)
        .map(|value| {
            value
                .parse::<f64>()
                .map_err(|err| Error::Parse(format!("'{value}' in k-factor file: {err}")))
        })
        .collect::<Result<Vec<_>>>()?;

    if values.len() % 2 != 0 {
        return Err(Error::Parse(format!(
            "the k-factor file contains {} numbers, but two columns are expected",
            values.len()
        )));
    }

    Ok(KFactor {
        central: values.chunks_exact(2).map(|row| row[0]).collect(),
        pdf_set,
    })
}

/// Read the k-factor file at `path`.
///
/// # Errors
///
/// Returns an error if the file can not be read or parsed.
pub fn read_kfactor(path: &Path) -> Result<KFactor> {
    let content = fs::read_to_string(path).map_err(|err| {
        Error::General(format!(
            "could not read k-factor file '{}': {err}",
            path.display()
        ))
    })?;

    parse_kfactor(&content)
}

/// Reconcile the k-factors in `central` with a grid having `bins` bins. Equal lengths and
/// uniform k-factors are accepted, entries past the last bin are never read. Fewer non-uniform
/// k-factors than bins are replaced by zeros.
///
/// # Errors
///
/// Returns [`Error::KFactorLength`] if there are more non-uniform k-factors than bins.
pub fn to_list(bins: usize, central: &[f64]) -> Result<Vec<f64>> {
    let uniform = central
        .iter()
        .tuple_windows()
        .all(|(&lhs, &rhs)| approx_eq!(f64, lhs, rhs, ulps = 4));

    match central.len().cmp(&bins) {
        Ordering::Equal => Ok(central.to_vec()),
        Ordering::Greater if uniform => Ok(central.to_vec()),
        Ordering::Greater => Err(Error::KFactorLength {
            kfactors: central.len(),
            bins,
        }),
        Ordering::Less if uniform && !central.is_empty() => Ok(vec![central[0]; bins]),
        Ordering::Less => {
            warn!(
                "{} k-factors for {bins} bins, the grid is assumed to multiply zero",
                central.len()
            );
            Ok(vec![0.0; bins])
        }
    }
}

/// Return the factor turning the content of an order with `source_as` powers of the strong
/// coupling into the k-factor correction of the order with `target_as` powers, at the squared
/// renormalization scale `mu2`.
#[must_use]
pub fn compute_scale_factor(
    source_as: u32,
    target_as: u32,
    mu2: f64,
    kfactor: f64,
    alphas: &impl AlphasEvaluator,
) -> f64 {
    (kfactor - 1.0) / alphas.alphas_q2(mu2).powi(i32_from_u32(target_as - source_as))
}

/// Add the k-factor correction computed from `central` to the order `pto_to_update` of `grid`,
/// where `1` is the leading order. With `order_exists` the order must be present and is
/// replaced, otherwise it must be absent.
///
/// # Errors
///
/// Returns an error if `pto_to_update` is zero, if no order below it is present, or if the
/// k-factors can not be reconciled with the bins.
pub fn apply_to_grid<G: GridBackend>(
    grid: &mut G,
    central: &[f64],
    alphas: &impl AlphasEvaluator,
    pto_to_update: u32,
    order_exists: bool,
) -> Result<ReturnState> {
    let leading = reconstruct::leading_order(&*grid)?;
    let offset = pto_to_update.checked_sub(1).ok_or_else(|| {
        Error::General("the perturbative order to update starts at 1".to_owned())
    })?;
    let order_to_update = Order::new(leading.alphas + offset, leading.alpha, 0, 0);
    let exists = grid.orders().contains(&order_to_update);

    match (exists, order_exists) {
        (true, false) => return Ok(ReturnState::AlreadyThere),
        (false, true) => return Ok(ReturnState::OrderExistsFailure),
        _ => {}
    }

    let kfactors = to_list(grid.bin_info().bins(), central)?;
    let sources: Vec<_> = grid
        .orders()
        .iter()
        .filter(|order| {
            order.is_central()
                && order.alpha == leading.alpha
                && order.alphas < order_to_update.alphas
        })
        .copied()
        .collect();
    let mask: Vec<_> = grid
        .orders()
        .iter()
        .map(|order| sources.contains(order))
        .collect();
    let alphas_table: Vec<_> = grid
        .evolve_info(&mask)
        .ren1
        .into_iter()
        .map(|mu2| (mu2, alphas.alphas_q2(mu2)))
        .collect();
    let lookup = |q2: f64| {
        alphas_table
            .iter()
            .find(|(mu2, _)| node_value_eq(*mu2, q2))
            .map(|&(_, alphas)| alphas)
            // UNWRAP: the table contains every renormalization scale of the source orders
            .unwrap_or_else(|| unreachable!())
    };

    info!("computing order {order_to_update} from the k-factors");

    let order_grid =
        reconstruct::construct_order(&*grid, order_to_update, &sources, |source, bin, subgrid| {
            // the scales of subgrids without content are not in the table
            if subgrid.is_empty() {
                return Ok(Factor::Scalar(0.0));
            }

            Ok(rescale::per_scale_factors(subgrid, |mu2| {
                compute_scale_factor(
                    source.alphas,
                    order_to_update.alphas,
                    mu2,
                    kfactors[bin],
                    &lookup,
                )
            }))
        })?;

    let presence = if order_exists {
        OrderPresence::Replace
    } else {
        OrderPresence::Add
    };

    reconstruct::install_orders(grid, vec![order_grid], &[order_to_update], presence)?;
    grid.set_key_value(
        METADATA_KEY,
        &format!("[{}]", kfactors.iter().map(ToString::to_string).join(", ")),
    );

    Ok(ReturnState::Success)
}

/// Add the k-factors of the files `<kfactor_folder>/CF_QCD_<name>.dat` to the grids of
/// `dataset` for theory `theory_id` and write them into `target_folder`. The strong coupling is
/// created with `make_alphas` from the PDF set named in each file, or [`DEFAULT_PDF_SET`].
/// Returns the name and outcome for every grid.
///
/// # Errors
///
/// Returns an error if one of the files can not be read, the grid can not be written, or if
/// applying the k-factors fails.
#[allow(clippy::too_many_arguments)]
pub fn compute_k_factor_grid<G, A, F>(
    cfg: &Configuration,
    theory_id: u32,
    dataset: &str,
    kfactor_folder: &Path,
    target_folder: &Path,
    pto_to_update: u32,
    order_exists: bool,
    make_alphas: F,
) -> Result<Vec<(String, ReturnState)>>
where
    G: GridBackend,
    A: AlphasEvaluator,
    F: Fn(&str) -> Result<A>,
{
    let mut states = Vec::new();

    for name in cfg.dataset_grids(dataset)? {
        let kfactor = read_kfactor(&kfactor_folder.join(format!("CF_QCD_{name}.dat")))?;
        let alphas = make_alphas(kfactor.pdf_set.as_deref().unwrap_or(DEFAULT_PDF_SET))?;
        let mut grid = G::read_from(&cfg.grid_path(theory_id, &name))?;

        let state = apply_to_grid(
            &mut grid,
            &kfactor.central,
            &alphas,
            pto_to_update,
            order_exists,
        )?;

        if state == ReturnState::Success {
            let target = target_folder.join(format!("{name}.pineappl.lz4"));
            grid.write_to(&target)?;
            info!("wrote '{}'", target.display());
        }

        states.push((name, state));
    }

    Ok(states)
}
