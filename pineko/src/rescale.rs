//! Numerical rescaling of subgrids.

use super::empty_subgrid::EmptySubgridV1;
use super::error::{Error, Result};
use super::import_only_subgrid::ImportOnlySubgridV2;
use super::subgrid::{Subgrid, SubgridEnum};
use ndarray::{Array3, Axis};

/// Factor applied to the content of a subgrid.
#[derive(Clone, Debug, PartialEq)]
pub enum Factor {
    /// The same factor for every scale.
    Scalar(f64),
    /// One factor for each scale pair of the subgrid, in the order of [`Subgrid::mu2_grid`]. An
    /// empty vector zeroes the subgrid.
    PerScale(Vec<f64>),
}

/// Return a copy of `subgrid` whose values at scale index `i` are multiplied with the `i`-th
/// factor. The node values of the subgrid are kept.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if a non-empty [`Factor::PerScale`] does not have one entry
/// per scale pair.
pub fn rescale_subgrid(subgrid: &SubgridEnum, factor: &Factor) -> Result<SubgridEnum> {
    let SubgridEnum::ImportOnlySubgridV2(source) = subgrid else {
        // all other variants are empty
        return Ok(EmptySubgridV1.into());
    };

    match factor {
        Factor::Scalar(factor) => {
            let mut result = source.clone();
            result.scale(*factor);
            Ok(result.into())
        }
        Factor::PerScale(factors) if factors.is_empty() => Ok(ImportOnlySubgridV2::new(
            Array3::zeros(source.array().dim()),
            source.mu2_grid().into_owned(),
            source.x1_grid().into_owned(),
            source.x2_grid().into_owned(),
        )
        .into()),
        Factor::PerScale(factors) => {
            let expected = source.mu2_grid().len();

            if factors.len() != expected {
                return Err(Error::ShapeMismatch {
                    expected,
                    found: factors.len(),
                });
            }

            let mut result = source.clone();

            for (mut slice, &factor) in result.array_mut().axis_iter_mut(Axis(0)).zip(factors) {
                slice *= factor;
            }

            Ok(result.into())
        }
    }
}

/// Evaluate `f` on the squared renormalization scales of `subgrid`.
pub fn per_scale_factors(subgrid: &SubgridEnum, f: impl Fn(f64) -> f64) -> Factor {
    Factor::PerScale(subgrid.mu2_grid().iter().map(|mu2| f(mu2.ren)).collect())
}
