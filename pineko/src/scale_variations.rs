//! Generation of renormalization-scale-variation orders.
//!
//! The logarithms of the renormalization scale are reconstructed from the orders without
//! logarithms using the renormalization-group equation of the strong coupling.

use super::backend::GridBackend;
use super::beta;
use super::boc::Order;
use super::convert::i32_from_u32;
use super::error::{Error, Result};
use super::reconstruct::{self, OrderPresence, ReturnState};
use super::rescale::Factor;
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::path::Path;
use tracing::info;

/// Return the coefficient multiplying the order with `alpha_s` power `m + which_part` that
/// contributes to the order with `alpha_s` power `m + delta` and `logpart` powers of the
/// renormalization-scale logarithm, for `nf` active flavors. The coefficient belongs to the
/// expansion in `a_s = alpha_s / (4 pi)`.
///
/// # Errors
///
/// Returns [`Error::UnsupportedOrder`] if `delta` is larger than two.
pub fn ren_sv_coeffs(m: u32, delta: u32, logpart: u32, which_part: u32, nf: u32) -> Result<f64> {
    let m = f64::from(m);
    let beta0 = beta::beta_qcd_as2(nf);

    match (delta, logpart, which_part) {
        (0, _, _) => Ok(0.0),
        (1, _, _) => Ok(-m * beta0),
        (2, 1, 0) => Ok(-m * beta::beta_qcd_as3(nf)),
        (2, 1, _) => Ok(-(m + 1.0) * beta0),
        (2, _, _) => Ok(0.5 * m * (m + 1.0) * beta0 * beta0),
        _ => Err(Error::UnsupportedOrder(delta)),
    }
}

/// Return the orders with renormalization-scale logarithms that appear `delta` orders above
/// the leading order with powers `m` of `alpha_s` and `alpha` of `alpha`, together with the
/// orders they are computed from.
///
/// # Examples
///
/// ```rust
/// use pineko::boc::Order;
/// use pineko::scale_variations::compute_orders_map;
///
/// let map = compute_orders_map(1, 2, 0);
///
/// assert_eq!(
///     map[&Order::new(3, 0, 1, 0)],
///     [Order::new(1, 0, 0, 0), Order::new(2, 0, 0, 0)]
/// );
/// assert_eq!(map[&Order::new(3, 0, 2, 0)], [Order::new(1, 0, 0, 0)]);
/// ```
#[must_use]
pub fn compute_orders_map(m: u32, delta: u32, alpha: u32) -> BTreeMap<Order, Vec<Order>> {
    (1..=delta)
        .map(|logpart| {
            (
                Order::new(m + delta, alpha, logpart, 0),
                (0..=(delta - logpart))
                    .map(|de| Order::new(m + de, alpha, 0, 0))
                    .collect(),
            )
        })
        .collect()
}

/// Add the renormalization-scale-variation orders up to `alpha_s` power `max_as` to `grid`,
/// using `nf` active flavors. With `order_exists` the orders must already be present and are
/// replaced, otherwise only missing orders are added.
///
/// # Errors
///
/// Returns an error if a required order without logarithms is not present in the grid, if more
/// than two orders above the leading one are requested or if the grid is empty.
pub fn add_ren_sv_orders<G: GridBackend>(
    grid: &mut G,
    max_as: u32,
    nf: u32,
    order_exists: bool,
) -> Result<ReturnState> {
    let leading = reconstruct::leading_order(&*grid)?;
    let (m, alpha) = (leading.alphas, leading.alpha);
    let maps: Vec<_> = (1..=max_as.saturating_sub(m))
        .map(|delta| (delta, compute_orders_map(m, delta, alpha)))
        .collect();
    let present = |order: &Order| grid.orders().contains(order);

    let targets: Vec<_> = maps.iter().flat_map(|(_, map)| map.keys().copied()).collect();

    if order_exists {
        if !targets.iter().all(present) {
            return Ok(ReturnState::OrderExistsFailure);
        }
    } else if targets.iter().all(present) {
        return Ok(ReturnState::AlreadyThere);
    }

    let presence = if order_exists {
        OrderPresence::Replace
    } else {
        OrderPresence::Add
    };

    let mut constructed = Vec::new();
    let mut installed = Vec::new();

    for (delta, map) in &maps {
        for (target, sources) in map {
            if presence == OrderPresence::Add && present(target) {
                info!("order {target} is already present");
                continue;
            }

            info!(
                "computing order {target} from {}",
                sources.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
            );

            // check the coefficients before touching any subgrid
            for source in sources {
                ren_sv_coeffs(m, *delta, target.logxir, source.alphas - m, nf)?;
            }

            let order_grid = reconstruct::construct_order(&*grid, *target, sources, |source, _, _| {
                let coefficient =
                    ren_sv_coeffs(m, *delta, target.logxir, source.alphas - m, nf)?;

                Ok(Factor::Scalar(
                    coefficient / (4.0 * PI).powi(i32_from_u32(target.alphas - source.alphas)),
                ))
            })?;

            constructed.push(order_grid);
            installed.push(*target);
        }
    }

    reconstruct::install_orders(grid, constructed, &installed, presence)?;

    Ok(ReturnState::Success)
}

/// Read the grid at `grid_path`, add the renormalization-scale-variation orders up to `alpha_s`
/// power `max_as` for `nf` active flavors and write the result to `target_path`. The file is only
/// written if [`ReturnState::Success`] is returned.
///
/// # Errors
///
/// Returns an error if reading or writing fails, or if the orders can not be constructed.
pub fn compute_ren_sv_grid<G: GridBackend>(
    grid_path: &Path,
    max_as: u32,
    nf: u32,
    target_path: &Path,
    order_exists: bool,
) -> Result<ReturnState> {
    let mut grid = G::read_from(grid_path)?;
    let state = add_ren_sv_orders(&mut grid, max_as, nf, order_exists)?;

    if state == ReturnState::Success {
        grid.write_to(target_path)?;
        info!("wrote '{}'", target_path.display());
    }

    Ok(state)
}
