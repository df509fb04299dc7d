//! Module containing the empty subgrid.

use super::subgrid::{Mu2, Subgrid, SubgridEnum};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A subgrid type that is always empty.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EmptySubgridV1;

impl Subgrid for EmptySubgridV1 {
    fn mu2_grid(&self) -> Cow<'_, [Mu2]> {
        Cow::Borrowed(&[])
    }

    fn x1_grid(&self) -> Cow<'_, [f64]> {
        Cow::Borrowed(&[])
    }

    fn x2_grid(&self) -> Cow<'_, [f64]> {
        Cow::Borrowed(&[])
    }

    fn is_empty(&self) -> bool {
        true
    }

    fn merge(&mut self, subgrid: &SubgridEnum) {
        // we can't merge into an `EmptySubgridV1`, the grid swaps non-empty subgrids in instead
        assert!(subgrid.is_empty());
    }

    fn scale(&mut self, _: f64) {}
}
