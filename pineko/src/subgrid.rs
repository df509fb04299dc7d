//! Module containing the trait `Subgrid` and supporting structs.

use super::empty_subgrid::EmptySubgridV1;
use super::import_only_subgrid::ImportOnlySubgridV2;
use enum_dispatch::enum_dispatch;
use float_cmp::approx_eq;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Compare two node values with the tolerance used for all grid axes.
#[must_use]
pub fn node_value_eq(lhs: f64, rhs: f64) -> bool {
    approx_eq!(f64, lhs, rhs, ulps = 4096)
}

/// Same as [`node_value_eq`], with a signature suitable for [`Vec::dedup_by`].
#[must_use]
pub fn node_value_eq_ref_mut(lhs: &mut f64, rhs: &mut f64) -> bool {
    node_value_eq(*lhs, *rhs)
}

/// Return `true` if `lhs` and `rhs` have the same `x` nodes for both convolutions. Subgrids
/// with different nodes can not be merged.
#[must_use]
pub fn same_x_grids(lhs: &impl Subgrid, rhs: &impl Subgrid) -> bool {
    let eq = |lhs: &[f64], rhs: &[f64]| {
        lhs.len() == rhs.len() && lhs.iter().zip(rhs).all(|(&a, &b)| node_value_eq(a, b))
    };

    eq(&lhs.x1_grid(), &rhs.x1_grid()) && eq(&lhs.x2_grid(), &rhs.x2_grid())
}

/// A pair of squared renormalization and factorization scales.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Mu2 {
    /// Squared renormalization scale.
    pub ren: f64,
    /// Squared factorization scale.
    pub fac: f64,
}

impl Mu2 {
    /// Return `true` if both scales of `self` and `other` are equal within the node tolerance.
    #[must_use]
    pub fn node_eq(&self, other: &Self) -> bool {
        node_value_eq(self.ren, other.ren) && node_value_eq(self.fac, other.fac)
    }
}

/// Enum which lists all possible `Subgrid` variants possible.
#[enum_dispatch(Subgrid)]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum SubgridEnum {
    // WARNING: never change the order or content of this enum, only add to the end of it
    /// Empty subgrid.
    EmptySubgridV1,
    /// Dense subgrid with explicit node values.
    ImportOnlySubgridV2,
}

/// Trait each subgrid must implement.
#[enum_dispatch]
pub trait Subgrid {
    /// Return the scale pairs of this subgrid.
    fn mu2_grid(&self) -> Cow<'_, [Mu2]>;

    /// Return the `x` nodes of the first convolution.
    fn x1_grid(&self) -> Cow<'_, [f64]>;

    /// Return the `x` nodes of the second convolution.
    fn x2_grid(&self) -> Cow<'_, [f64]>;

    /// Returns true if the subgrid does not contain any non-zero values.
    fn is_empty(&self) -> bool;

    /// Add the contents of `other` to this subgrid.
    fn merge(&mut self, other: &SubgridEnum);

    /// Multiply every value with `factor`.
    fn scale(&mut self, factor: f64);
}
