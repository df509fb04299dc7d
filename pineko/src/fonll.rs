//! Combination of the constituent grids of a FONLL prediction.
//!
//! A FONLL prediction is the sum of fixed-flavor-number predictions with three, four and five
//! flavors together with their massless limits. Optionally the contributions above the heavy
//! quark thresholds are damped.

use super::backend::GridBackend;
use super::configs::Configuration;
use super::error::{Error, Result};
use super::theory_card::{SCHEME_KEYS, TheoryCard};
use std::path::PathBuf;
use tracing::info;

/// Metadata key of the theory card a grid was computed with.
pub const THEORY_KEY: &str = "theory";

/// Names of the constituents in canonical order.
pub const CONSTITUENT_NAMES: [&str; 7] = [
    "ffns3", "ffn03", "ffns4til", "ffns4bar", "ffn04", "ffns5til", "ffns5bar",
];

/// One optional value for each constituent of a FONLL prediction.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Constituents<T> {
    /// Three-flavor scheme.
    pub ffns3: Option<T>,
    /// Massless limit of the three-flavor scheme.
    pub ffn03: Option<T>,
    /// Four-flavor scheme, contribution of the heavy quark.
    pub ffns4til: Option<T>,
    /// Four-flavor scheme, contribution of the light quarks.
    pub ffns4bar: Option<T>,
    /// Massless limit of the four-flavor scheme.
    pub ffn04: Option<T>,
    /// Five-flavor scheme, contribution of the heavy quark.
    pub ffns5til: Option<T>,
    /// Five-flavor scheme, contribution of the light quarks.
    pub ffns5bar: Option<T>,
}

/// Paths of the constituent grids of a single FONLL grid.
pub type FonllInfo = Constituents<PathBuf>;

impl<T> Constituents<T> {
    fn as_array(&self) -> [Option<&T>; 7] {
        [
            self.ffns3.as_ref(),
            self.ffn03.as_ref(),
            self.ffns4til.as_ref(),
            self.ffns4bar.as_ref(),
            self.ffn04.as_ref(),
            self.ffns5til.as_ref(),
            self.ffns5bar.as_ref(),
        ]
    }

    /// Return the present constituents with their names, in canonical order.
    ///
    /// # Errors
    ///
    /// Returns an error if `ffns3` is absent.
    pub fn fks(&self) -> Result<Vec<(&'static str, &T)>> {
        if self.ffns3.is_none() {
            return Err(Error::General(
                "the FONLL combination needs at least the 'ffns3' constituent".to_owned(),
            ));
        }

        Ok(CONSTITUENT_NAMES
            .into_iter()
            .zip(self.as_array())
            .filter_map(|(name, value)| value.map(|value| (name, value)))
            .collect())
    }

    /// Apply `f` to every present constituent.
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Constituents<U> {
        Constituents {
            ffns3: self.ffns3.as_ref().map(&f),
            ffn03: self.ffn03.as_ref().map(&f),
            ffns4til: self.ffns4til.as_ref().map(&f),
            ffns4bar: self.ffns4bar.as_ref().map(&f),
            ffn04: self.ffn04.as_ref().map(&f),
            ffns5til: self.ffns5til.as_ref().map(&f),
            ffns5bar: self.ffns5bar.as_ref().map(&f),
        }
    }
}

/// Damping factors for each bin.
#[derive(Clone, Debug, PartialEq)]
pub struct Dampings {
    /// Factors for the charm threshold.
    pub charm: Vec<f64>,
    /// Factors for the bottom threshold.
    pub bottom: Vec<f64>,
}

/// Check that the theory `cards` of all constituents are identical, apart from the keys
/// identifying the scheme.
///
/// # Errors
///
/// Returns [`Error::Incompatible`] if two cards differ.
pub fn check_theory_cards(cards: &[TheoryCard]) -> Result<()> {
    let Some((first, rest)) = cards.split_first() else {
        return Ok(());
    };
    let reference = first.without_scheme();

    for card in rest {
        let mapping = card.without_scheme();

        if mapping != reference {
            let key = reference
                .iter()
                .chain(mapping.iter())
                .map(|(key, _)| key)
                .find(|key| reference.get(*key) != mapping.get(*key))
                .and_then(|key| key.as_str())
                .unwrap_or("?")
                .to_owned();

            return Err(Error::Incompatible(format!(
                "theory cards of the FONLL constituents differ in '{key}', only {} may differ",
                SCHEME_KEYS.join(", ")
            )));
        }
    }

    Ok(())
}

/// Return the damping factors `θ(Q² - m²) (1 - m²/Q²)^power` for the charm mass `mc` and the
/// bottom mass `mb`, for each bin with squared scale `q2_bins`.
#[must_use]
pub fn produce_dampings(q2_bins: &[f64], mc: f64, mb: f64, powers: (i32, i32)) -> Dampings {
    let damping = |mass: f64, power: i32| -> Vec<f64> {
        let mass2 = mass * mass;

        q2_bins
            .iter()
            .map(|&q2| {
                if q2 > mass2 {
                    (1.0 - mass2 / q2).powi(power)
                } else {
                    0.0
                }
            })
            .collect()
    };

    Dampings {
        charm: damping(mc, powers.0),
        bottom: damping(mb, powers.1),
    }
}

/// Sum the constituent `grids`. With `dampings` the massless limits `ffn03` and `ffn04` are
/// subtracted and the contributions above the charm and bottom thresholds are damped. The
/// five-flavor pieces receive the product of both dampings.
///
/// # Errors
///
/// Returns an error if `grids` is empty or if the grids have different bins.
pub fn combine<G: GridBackend>(
    grids: Vec<(&str, G)>,
    dampings: Option<&Dampings>,
) -> Result<G> {
    let mut combined: Option<G> = None;

    for (name, mut grid) in grids {
        if let Some(dampings) = dampings {
            let bins = grid.bin_info().bins();
            let sign = if matches!(name, "ffn03" | "ffn04") {
                -1.0
            } else {
                1.0
            };
            let factors: Vec<_> = match name {
                "ffn03" | "ffns4til" => dampings.charm.iter().map(|factor| sign * factor).collect(),
                // above the bottom threshold the charm damping applies as well
                "ffn04" | "ffns5til" => dampings
                    .bottom
                    .iter()
                    .zip(&dampings.charm)
                    .map(|(bottom, charm)| sign * bottom * charm)
                    .collect(),
                _ => vec![sign; bins],
            };

            if factors.len() != bins {
                return Err(Error::ShapeMismatch {
                    expected: bins,
                    found: factors.len(),
                });
            }

            grid.scale_by_bin(&factors);
        }

        combined = Some(match combined.take() {
            Some(mut combined) => {
                combined.merge(grid)?;
                combined
            }
            None => grid,
        });
    }

    combined.ok_or_else(|| Error::General("there are no grids to combine".to_owned()))
}

/// Return the theory card stored in the metadata of `grid`.
///
/// # Errors
///
/// Returns an error if the grid has no theory card or it can not be parsed.
pub fn theory_card_of<G: GridBackend>(grid: &G) -> Result<TheoryCard> {
    grid.key_values()
        .get(THEORY_KEY)
        .ok_or_else(|| Error::Incompatible("the grid does not contain a theory card".to_owned()))?
        .parse()
}

/// Read the constituents of `info`, check their compatibility and combine them into a single
/// grid for the theory `target_card`. Damping is applied if the target card asks for it.
///
/// # Errors
///
/// Returns an error if a constituent can not be read, the theory cards are incompatible or the
/// grids can not be merged.
pub fn produce_combined_fk<G: GridBackend>(info: &FonllInfo, target_card: &TheoryCard) -> Result<G> {
    let grids = info
        .fks()?
        .into_iter()
        .map(|(name, path)| Ok((name, G::read_from(path)?)))
        .collect::<Result<Vec<_>>>()?;
    let cards = grids
        .iter()
        .map(|(_, grid)| theory_card_of(grid))
        .collect::<Result<Vec<_>>>()?;

    check_theory_cards(&cards)?;

    let dampings = if target_card.damp()? {
        let [mc2, mb2, _] = target_card.thresholds_squared()?;
        // UNWRAP: `fks` guarantees that there is at least one grid
        let q2_bins = grids
            .first()
            .map(|(_, grid)| grid.bin_info().left(0))
            .unwrap_or_else(|| unreachable!());

        Some(produce_dampings(
            &q2_bins,
            mc2.sqrt(),
            mb2.sqrt(),
            target_card.damping_powers()?,
        ))
    } else {
        None
    };

    let mut card = cards[0].clone();

    for key in SCHEME_KEYS {
        let value = target_card.get(key).cloned().ok_or_else(|| {
            Error::Parse(format!("the target theory card is missing '{key}'"))
        })?;
        card.set(key, value);
    }

    let mut combined = combine(grids, dampings.as_ref())?;
    combined.set_key_value(THEORY_KEY, &card.to_yaml()?);

    Ok(combined)
}

/// Combine the grids of `dataset` for the FONLL theory `theory_id` from the grids of the
/// constituent `theories` and write them into the grid folder of `theory_id`. Returns the paths
/// of the written grids.
///
/// # Errors
///
/// Returns an error if one of the grids can not be combined or written.
pub fn combine_dataset<G: GridBackend>(
    cfg: &Configuration,
    theory_id: u32,
    dataset: &str,
    theories: &Constituents<u32>,
) -> Result<Vec<PathBuf>> {
    let target_card = TheoryCard::load(cfg, theory_id)?;
    let first = *theories.fks()?[0].1;
    let mut written = Vec::new();

    for name in cfg.dataset_grids(dataset)? {
        let info = theories.map(|&id| cfg.grid_path(id, &name));
        let grid: G = produce_combined_fk(&info, &target_card)?;
        let path = cfg.grid_path(theory_id, &name);
        grid.write_to(&path)?;
        info!(
            "combined '{name}' of theory {first} and its partners into '{}'",
            path.display()
        );
        written.push(path);
    }

    Ok(written)
}
