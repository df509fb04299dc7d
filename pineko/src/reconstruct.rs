//! Assembly of new orders from rescaled subgrids of existing ones.
//!
//! A new order is built as one single-order grid per contributing source order. Each of these
//! grids starts as an empty shell of the source grid, gets its subgrids from the rescaled subgrids
//! of the source order and a copy of the bin metadata. The single-order grids are then merged
//! pairwise and finally merged into the grid that receives the new order.

use super::backend::GridBackend;
use super::bin::BinRemapper;
use super::boc::Order;
use super::error::{Error, Result};
use super::rescale::{self, Factor};
use super::subgrid::{Subgrid, SubgridEnum};
use itertools::Itertools;
use rayon::prelude::*;
use std::fmt::{self, Display, Formatter};

/// Outcome of a driver that adds orders to a grid.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReturnState {
    /// All requested orders are already present and nothing has been written.
    AlreadyThere,
    /// Replacing orders was requested, but at least one of them is absent. Nothing has been
    /// written.
    OrderExistsFailure,
    /// The orders have been added and the grid has been written.
    Success,
}

impl ReturnState {
    /// Return the message describing this state, where `orders` names the orders the driver adds,
    /// for example [`SCALE_VARIATION_ORDERS`].
    #[must_use]
    pub fn message(self, orders: &str) -> String {
        match self {
            Self::AlreadyThere => format!("{orders} are already in the grid."),
            Self::OrderExistsFailure => {
                "Order_exists is True but the order does not appear to be in the grid.".to_owned()
            }
            Self::Success => "Success.".to_owned(),
        }
    }
}

impl Display for ReturnState {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.message(SCALE_VARIATION_ORDERS))
    }
}

/// Name of the orders added by the scale-variation driver.
pub const SCALE_VARIATION_ORDERS: &str = "Renormalization scale variations";

/// Name of the orders added by the k-factor driver.
pub const KFACTOR_ORDERS: &str = "The k-factor orders";

/// How constructed orders are installed into a grid.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OrderPresence {
    /// The orders are new and their content is merged into the grid.
    Add,
    /// The orders exist and are removed before the new content is merged.
    Replace,
}

/// Return the lowest order without logarithms that has a non-empty subgrid.
///
/// # Errors
///
/// Returns an error if the grid does not contain such an order.
pub fn leading_order<G: GridBackend>(grid: &G) -> Result<Order> {
    let bins = grid.bin_info().bins();
    let channels = grid.channels().len();

    grid.orders()
        .iter()
        .enumerate()
        .filter(|(_, order)| order.is_central())
        .filter(|&(index, _)| {
            (0..bins)
                .cartesian_product(0..channels)
                .any(|(bin, channel)| !grid.subgrid(index, bin, channel).is_empty())
        })
        .map(|(_, order)| *order)
        .min()
        .ok_or_else(|| Error::General("the grid does not contain any non-empty order".to_owned()))
}

/// Create an empty grid with the channels, bins and metadata of `source` and the given `orders`.
#[must_use]
pub fn empty_shell<G: GridBackend>(source: &G, orders: Vec<Order>) -> G {
    source.empty_like(orders)
}

/// Fill the order with index `target_order` of `target` with the subgrids of the order with index
/// `source_order` of `source`, rescaled with the factors `factor` returns for each bin and
/// subgrid. Every pair of bin and channel is computed independently.
///
/// # Errors
///
/// Returns the first error of `factor` or of the rescaling.
pub fn populate<G, F>(
    target: &mut G,
    source: &G,
    target_order: usize,
    source_order: usize,
    factor: F,
) -> Result<()>
where
    G: GridBackend,
    F: Fn(usize, &SubgridEnum) -> Result<Factor> + Sync,
{
    let indices: Vec<_> = (0..source.bin_info().bins())
        .cartesian_product(0..source.channels().len())
        .collect();

    let subgrids = indices
        .into_par_iter()
        .map(|(bin, channel)| {
            let subgrid = source.subgrid(source_order, bin, channel);
            let factor = factor(bin, subgrid)?;

            Ok((bin, channel, rescale::rescale_subgrid(subgrid, &factor)?))
        })
        .collect::<Result<Vec<_>>>()?;

    for (bin, channel, subgrid) in subgrids {
        target.set_subgrid(target_order, bin, channel, subgrid);
    }

    Ok(())
}

/// Copy the limits of every bin dimension and the bin normalizations of `source` into a
/// [`BinRemapper`] of `target`.
///
/// # Errors
///
/// Returns an error if the bins of `target` and `source` differ.
pub fn copy_bin_metadata<G: GridBackend>(target: &mut G, source: &G) -> Result<()> {
    let info = source.bin_info();
    let dimensions = info.dimensions();
    let left: Vec<_> = (0..dimensions).map(|dim| info.left(dim)).collect();
    let right: Vec<_> = (0..dimensions).map(|dim| info.right(dim)).collect();

    let mut limits = Vec::with_capacity(info.bins() * dimensions);

    for bin in 0..info.bins() {
        for dim in 0..dimensions {
            limits.push((left[dim][bin], right[dim][bin]));
        }
    }

    target.set_remapper(BinRemapper::new(info.normalizations(), limits)?)
}

/// Build a grid containing only the order `target` whose content is the sum of the contents of
/// `sources`, each rescaled by the factor `factor` returns for the source order, the bin and
/// the subgrid.
///
/// # Errors
///
/// Returns [`Error::MissingOrder`] if one of `sources` is not present in `grid`, or an error if
/// `sources` is empty.
pub fn construct_order<G, F>(grid: &G, target: Order, sources: &[Order], factor: F) -> Result<G>
where
    G: GridBackend,
    F: Fn(Order, usize, &SubgridEnum) -> Result<Factor> + Sync,
{
    let mut result: Option<G> = None;

    for &source in sources {
        let source_index = grid
            .orders()
            .iter()
            .position(|order| *order == source)
            .ok_or(Error::MissingOrder(source))?;

        let mut order_grid = empty_shell(grid, vec![target]);
        populate(&mut order_grid, grid, 0, source_index, |bin, subgrid| {
            factor(source, bin, subgrid)
        })?;
        copy_bin_metadata(&mut order_grid, grid)?;

        result = Some(match result.take() {
            Some(mut merged) => {
                merged.merge(order_grid)?;
                merged
            }
            None => order_grid,
        });
    }

    result.ok_or_else(|| Error::General(format!("order {target} has no contributions")))
}

/// Merge the `constructed` grids, which contain the orders `targets`, into `grid`.
///
/// # Errors
///
/// With [`OrderPresence::Replace`] an error is returned if one of `targets` is not present in
/// `grid`. Merging errors are propagated.
pub fn install_orders<G: GridBackend>(
    grid: &mut G,
    constructed: Vec<G>,
    targets: &[Order],
    presence: OrderPresence,
) -> Result<()> {
    if presence == OrderPresence::Replace {
        let indices = targets
            .iter()
            .map(|target| {
                grid.orders()
                    .iter()
                    .position(|order| order == target)
                    .ok_or_else(|| {
                        Error::Incompatible(format!(
                            "order {target} can not be replaced, it is not present in the grid"
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        grid.delete_orders(&indices);
    }

    for order_grid in constructed {
        grid.merge(order_grid)?;
    }

    Ok(())
}
