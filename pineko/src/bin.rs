//! Bin limits of the observable of a grid.

use super::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Ordered limits of one-dimensional bins: bin `i` extends from `limits[i]` to `limits[i + 1]`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct BinLimits(Vec<f64>);

impl BinLimits {
    /// Sort `limits` and use them as the edges of consecutive bins.
    ///
    /// # Panics
    ///
    /// Panics if `limits` contains less than two entries.
    #[must_use]
    pub fn new(mut limits: Vec<f64>) -> Self {
        assert!(limits.len() >= 2, "bin limits need at least two entries");
        limits.sort_by(f64::total_cmp);
        Self(limits)
    }

    /// Number of bins, one less than the number of limits.
    #[must_use]
    pub fn bins(&self) -> usize {
        self.0.len() - 1
    }

    /// The edges of all bins.
    ///
    /// ```rust
    /// use pineko::bin::BinLimits;
    ///
    /// let limits = BinLimits::new(vec![1.0, 0.125, 0.25]);
    /// assert_eq!(limits.limits(), [0.125, 0.25, 1.0]);
    /// ```
    #[must_use]
    pub fn limits(&self) -> &[f64] {
        &self.0
    }

    /// Width of every bin.
    #[must_use]
    pub fn bin_sizes(&self) -> Vec<f64> {
        self.0.windows(2).map(|edge| edge[1] - edge[0]).collect()
    }
}

/// Multi-dimensional bin limits, stored bin after bin, together with the normalization of each
/// bin. Grids converted from other formats carry one of these to describe observables that are
/// binned in more than one variable.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct BinRemapper {
    normalizations: Vec<f64>,
    limits: Vec<(f64, f64)>,
}

impl BinRemapper {
    /// Constructor. The number of dimensions is the length of `limits` divided by the length of
    /// `normalizations`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::General`] if `normalizations` is empty or if the length of `limits` is
    /// not a multiple of it.
    pub fn new(normalizations: Vec<f64>, limits: Vec<(f64, f64)>) -> Result<Self> {
        if normalizations.is_empty() || limits.len() % normalizations.len() != 0 {
            return Err(Error::General(format!(
                "{} limits can not be distributed over {} bins",
                limits.len(),
                normalizations.len()
            )));
        }

        Ok(Self {
            normalizations,
            limits,
        })
    }

    /// Number of bins.
    #[must_use]
    pub fn bins(&self) -> usize {
        self.normalizations.len()
    }

    /// Number of dimensions of each bin.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.limits.len() / self.normalizations.len()
    }

    /// Left and right limits, all dimensions of the first bin first.
    #[must_use]
    pub fn limits(&self) -> &[(f64, f64)] {
        &self.limits
    }

    /// Normalization of every bin.
    #[must_use]
    pub fn normalizations(&self) -> &[f64] {
        &self.normalizations
    }
}

/// View on the bins of a grid, preferring the multi-dimensional limits if there are any.
#[derive(Debug)]
pub struct BinInfo<'a> {
    limits: &'a BinLimits,
    remapper: Option<&'a BinRemapper>,
}

impl<'a> BinInfo<'a> {
    /// Constructor.
    #[must_use]
    pub const fn new(limits: &'a BinLimits, remapper: Option<&'a BinRemapper>) -> Self {
        Self { limits, remapper }
    }

    /// Number of bins.
    #[must_use]
    pub fn bins(&self) -> usize {
        self.limits.bins()
    }

    /// Number of dimensions, one without a remapper.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.remapper.map_or(1, BinRemapper::dimensions)
    }

    fn edges(&self, dimension: usize, right: bool) -> Vec<f64> {
        if dimension >= self.dimensions() {
            return Vec::new();
        }

        match self.remapper {
            Some(remapper) => remapper
                .limits()
                .chunks_exact(remapper.dimensions())
                .map(|bin| if right { bin[dimension].1 } else { bin[dimension].0 })
                .collect(),
            None => {
                let limits = self.limits.limits();
                let bins = self.bins();

                if right {
                    limits[1..=bins].to_vec()
                } else {
                    limits[..bins].to_vec()
                }
            }
        }
    }

    /// Left limits of every bin in `dimension`, empty if there is no such dimension.
    #[must_use]
    pub fn left(&self, dimension: usize) -> Vec<f64> {
        self.edges(dimension, false)
    }

    /// Right limits of every bin in `dimension`, empty if there is no such dimension.
    #[must_use]
    pub fn right(&self, dimension: usize) -> Vec<f64> {
        self.edges(dimension, true)
    }

    /// Normalization of every bin, which is the bin width without a remapper.
    #[must_use]
    pub fn normalizations(&self) -> Vec<f64> {
        self.remapper.map_or_else(
            || self.limits.bin_sizes(),
            |remapper| remapper.normalizations().to_vec(),
        )
    }
}

impl PartialEq<BinInfo<'_>> for BinInfo<'_> {
    fn eq(&self, other: &BinInfo) -> bool {
        self.bins() == other.bins()
            && self.dimensions() == other.dimensions()
            && self.normalizations() == other.normalizations()
            && (0..self.dimensions()).all(|dimension| {
                self.left(dimension) == other.left(dimension)
                    && self.right(dimension) == other.right(dimension)
            })
    }
}
