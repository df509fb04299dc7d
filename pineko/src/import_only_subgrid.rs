//! Module containing the dense subgrid type with explicit node values.

use super::subgrid::{self, Mu2, Subgrid, SubgridEnum};
use ndarray::{Array3, Axis};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Subgrid storing its values in a dense array indexed by scale pair, `x1` and `x2` node.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ImportOnlySubgridV2 {
    array: Array3<f64>,
    mu2_grid: Vec<Mu2>,
    x1_grid: Vec<f64>,
    x2_grid: Vec<f64>,
}

impl ImportOnlySubgridV2 {
    /// Constructor.
    ///
    /// # Panics
    ///
    /// Panics if the shape of `array` does not match the lengths of `mu2_grid`, `x1_grid` and
    /// `x2_grid`.
    #[must_use]
    pub fn new(array: Array3<f64>, mu2_grid: Vec<Mu2>, x1_grid: Vec<f64>, x2_grid: Vec<f64>) -> Self {
        assert_eq!(
            array.dim(),
            (mu2_grid.len(), x1_grid.len(), x2_grid.len()),
            "array shape does not match the node values"
        );

        Self {
            array,
            mu2_grid,
            x1_grid,
            x2_grid,
        }
    }

    /// Return the array containing the numerical values of the grid.
    #[must_use]
    pub const fn array(&self) -> &Array3<f64> {
        &self.array
    }

    /// Return the array containing the numerical values of the grid.
    pub const fn array_mut(&mut self) -> &mut Array3<f64> {
        &mut self.array
    }
}

impl Subgrid for ImportOnlySubgridV2 {
    fn mu2_grid(&self) -> Cow<'_, [Mu2]> {
        Cow::Borrowed(&self.mu2_grid)
    }

    fn x1_grid(&self) -> Cow<'_, [f64]> {
        Cow::Borrowed(&self.x1_grid)
    }

    fn x2_grid(&self) -> Cow<'_, [f64]> {
        Cow::Borrowed(&self.x2_grid)
    }

    fn is_empty(&self) -> bool {
        self.array.iter().all(|&value| value == 0.0)
    }

    fn merge(&mut self, other: &SubgridEnum) {
        if other.is_empty() {
            return;
        }

        let SubgridEnum::ImportOnlySubgridV2(other) = other else {
            // every other variant is empty
            unreachable!();
        };

        if self.is_empty() {
            self.clone_from(other);
            return;
        }

        // TODO: merging subgrids with different x nodes requires an interpolation
        assert!(
            subgrid::same_x_grids(&*self, other),
            "can not merge subgrids with different x nodes"
        );

        if self.mu2_grid.len() == other.mu2_grid.len()
            && self
                .mu2_grid
                .iter()
                .zip(&other.mu2_grid)
                .all(|(lhs, rhs)| lhs.node_eq(rhs))
        {
            self.array += &other.array;
            return;
        }

        let mut mu2_grid = self.mu2_grid.clone();

        for mu2 in &other.mu2_grid {
            if !mu2_grid.iter().any(|other| other.node_eq(mu2)) {
                mu2_grid.push(*mu2);
            }
        }

        mu2_grid.sort_by(|a, b| a.ren.total_cmp(&b.ren).then(a.fac.total_cmp(&b.fac)));

        let mut array = Array3::zeros((mu2_grid.len(), self.x1_grid.len(), self.x2_grid.len()));

        for (source_mu2, source) in [
            (&self.mu2_grid, &self.array),
            (&other.mu2_grid, &other.array),
        ] {
            for (index, mu2) in source_mu2.iter().enumerate() {
                let new_index = mu2_grid
                    .iter()
                    .position(|other| other.node_eq(mu2))
                    // UNWRAP: `mu2_grid` is the union of both scale axes
                    .unwrap_or_else(|| unreachable!());
                let mut slice = array.index_axis_mut(Axis(0), new_index);
                slice += &source.index_axis(Axis(0), index);
            }
        }

        self.array = array;
        self.mu2_grid = mu2_grid;
    }

    fn scale(&mut self, factor: f64) {
        if factor == 0.0 {
            self.array.fill(0.0);
        } else {
            self.array.iter_mut().for_each(|x| *x *= factor);
        }
    }
}
