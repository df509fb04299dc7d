//! Error type of this crate.

use super::boc::Order;
use thiserror::Error;

/// Catch-all error for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// An error that originates in this crate.
    #[error("{0}")]
    General(String),
    /// A grid is not compatible with an evolution operator, a theory card or another grid.
    #[error("{0}")]
    Incompatible(String),
    /// An array of factors does not match the axis it is applied to.
    #[error("expected {expected} factors, found {found}")]
    ShapeMismatch {
        /// Length of the axis the factors apply to.
        expected: usize,
        /// Number of factors that were given.
        found: usize,
    },
    /// The number of k-factors cannot be reconciled with the number of bins.
    #[error("{kfactors} non-uniform k-factors can not be applied to a grid with {bins} bins")]
    KFactorLength {
        /// Number of k-factors read from the file.
        kfactors: usize,
        /// Number of bins of the grid.
        bins: usize,
    },
    /// An order that is needed to build another one is not present in the grid.
    #[error("order {0} is required but not present in the grid")]
    MissingOrder(Order),
    /// The requested number of additional perturbative orders is not implemented.
    #[error("scale-variation coefficients for {0} additional orders are not implemented")]
    UnsupportedOrder(u32),
    /// A file could not be parsed.
    #[error("{0}")]
    Parse(String),
    /// Reading or writing failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A YAML document could not be (de)serialized.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    /// A TOML document could not be deserialized.
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    /// Error that does not originate from this crate.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type of this crate.
pub type Result<T> = std::result::Result<T, Error>;
