//! Interfaces to the collaborators of the drivers: grids, evolution operators and the strong
//! coupling.

use super::bin::{BinInfo, BinRemapper};
use super::boc::{Channel, Order};
use super::error::{Error, Result};
use super::grid::{EvolveInfo, Grid};
use super::subgrid::SubgridEnum;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::Path;
use tempfile::NamedTempFile;

/// Operations the drivers need from a grid.
pub trait GridBackend: Sized + Sync {
    /// Read a grid from the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can not be opened or is not a grid.
    fn read_from(path: &Path) -> Result<Self>;

    /// Write this grid to `path`, creating missing parent folders. The file appears only once it
    /// has been written completely.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(&self, path: &Path) -> Result<()>;

    /// Return the orders of this grid.
    fn orders(&self) -> &[Order];

    /// Return the channels of this grid.
    fn channels(&self) -> &[Channel];

    /// Return the bin information of this grid.
    fn bin_info(&self) -> BinInfo<'_>;

    /// Return the subgrid with the given indices.
    fn subgrid(&self, order: usize, bin: usize, channel: usize) -> &SubgridEnum;

    /// Replace the subgrid with the given indices.
    fn set_subgrid(&mut self, order: usize, bin: usize, channel: usize, subgrid: SubgridEnum);

    /// Create a grid with the same channels, bins and metadata as `self`, the given `orders` and
    /// only empty subgrids.
    #[must_use]
    fn empty_like(&self, orders: Vec<Order>) -> Self;

    /// Set the multi-dimensional bin limits and normalizations.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of bins does not match.
    fn set_remapper(&mut self, remapper: BinRemapper) -> Result<()>;

    /// Merge `other` into `self`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bins of both grids are different.
    fn merge(&mut self, other: Self) -> Result<()>;

    /// Delete the orders with the given indices.
    fn delete_orders(&mut self, order_indices: &[usize]);

    /// Scale every subgrid of bin `b` by `factors[b]`.
    fn scale_by_bin(&mut self, factors: &[f64]);

    /// Return the key-value metadata.
    fn key_values(&self) -> &BTreeMap<String, String>;

    /// Set the metadata `key` to `value`.
    fn set_key_value(&mut self, key: &str, value: &str);

    /// Return the nodes of the selected orders, see [`Grid::evolve_info`].
    fn evolve_info(&self, order_mask: &[bool]) -> EvolveInfo;
}

impl GridBackend for Grid {
    fn read_from(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|err| {
            Error::General(format!("could not open '{}': {err}", path.display()))
        })?;

        Self::read(file)
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        let directory = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(directory)?;
        let mut file = NamedTempFile::new_in(directory)?;

        if path.extension().is_some_and(|ext| ext == "lz4") {
            self.write_lz4(&mut file)?;
        } else {
            self.write(&mut file)?;
        }

        file.persist(path).map_err(|err| Error::Io(err.error))?;

        Ok(())
    }

    fn orders(&self) -> &[Order] {
        Grid::orders(self)
    }

    fn channels(&self) -> &[Channel] {
        Grid::channels(self)
    }

    fn bin_info(&self) -> BinInfo<'_> {
        Grid::bin_info(self)
    }

    fn subgrid(&self, order: usize, bin: usize, channel: usize) -> &SubgridEnum {
        Grid::subgrid(self, order, bin, channel)
    }

    fn set_subgrid(&mut self, order: usize, bin: usize, channel: usize, subgrid: SubgridEnum) {
        self.subgrids_mut()[[order, bin, channel]] = subgrid;
    }

    fn empty_like(&self, orders: Vec<Order>) -> Self {
        let mut grid = Self::new(
            Grid::channels(self).to_vec(),
            orders,
            self.bin_limits().clone(),
        );

        if let Some(remapper) = self.remapper() {
            // UNWRAP: the remapper was valid for the same bin limits
            Grid::set_remapper(&mut grid, remapper.clone()).unwrap_or_else(|_| unreachable!());
        }

        for (key, value) in Grid::key_values(self) {
            Grid::set_key_value(&mut grid, key, value);
        }

        grid
    }

    fn set_remapper(&mut self, remapper: BinRemapper) -> Result<()> {
        Grid::set_remapper(self, remapper)
    }

    fn merge(&mut self, other: Self) -> Result<()> {
        Grid::merge(self, other)
    }

    fn delete_orders(&mut self, order_indices: &[usize]) {
        Grid::delete_orders(self, order_indices);
    }

    fn scale_by_bin(&mut self, factors: &[f64]) {
        Grid::scale_by_bin(self, factors);
    }

    fn key_values(&self) -> &BTreeMap<String, String> {
        Grid::key_values(self)
    }

    fn set_key_value(&mut self, key: &str, value: &str) {
        Grid::set_key_value(self, key, value);
    }

    fn evolve_info(&self, order_mask: &[bool]) -> EvolveInfo {
        Grid::evolve_info(self, order_mask)
    }
}

/// Axes of an evolution operator.
pub trait OperatorAxes {
    /// The `x` nodes the operator evolves to, which must be a subset of the grid's `x` nodes.
    fn x_grid(&self) -> &[f64];

    /// The squared factorization scales the operator evolves from.
    fn mu2_grid(&self) -> &[f64];

    /// Particle identifiers of the evolved PDFs.
    fn input_pids(&self) -> &[i32];

    /// Particle identifiers of the grid's PDFs.
    fn target_pids(&self) -> &[i32];
}

/// Evaluator of the strong coupling.
pub trait AlphasEvaluator {
    /// Return the value of the strong coupling at the squared scale `q2`.
    fn alphas_q2(&self, q2: f64) -> f64;
}

impl<F: Fn(f64) -> f64> AlphasEvaluator for F {
    fn alphas_q2(&self, q2: f64) -> f64 {
        self(q2)
    }
}
