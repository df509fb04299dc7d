//! Orders and channels, two of the three axes of a [`Grid`]. The third axis, the bins, lives in
//! [`bin`](super::bin).
//!
//! [`Grid`]: super::grid::Grid

use super::error::{Error, Result};
use float_cmp::approx_eq;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Powers of the couplings and scale logarithms identifying a perturbative contribution.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Order {
    /// Power of the strong coupling.
    pub alphas: u32,
    /// Power of the electromagnetic coupling.
    pub alpha: u32,
    /// Power of the logarithm of the renormalization-scale ratio.
    pub logxir: u32,
    /// Power of the logarithm of the factorization-scale ratio.
    pub logxif: u32,
}

impl Display for Order {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            alphas,
            alpha,
            logxir,
            logxif,
        } = self;
        write!(f, "as{alphas}a{alpha}lr{logxir}lf{logxif}")
    }
}

impl FromStr for Order {
    type Err = Error;

    /// Parse strings like `as2a1lr1lf0`. Missing labels have a power of zero.
    fn from_str(s: &str) -> Result<Self> {
        let mut order = Self::new(0, 0, 0, 0);
        let mut rest = s;

        while !rest.is_empty() {
            let digits = rest
                .find(|c: char| c.is_ascii_digit())
                .ok_or_else(|| Error::Parse(format!("'{rest}' in order '{s}' has no power")))?;
            let (label, tail) = rest.split_at(digits);
            let end = tail
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(tail.len());
            let power = tail[..end]
                .parse()
                .map_err(|err| Error::Parse(format!("power of '{label}' in order '{s}': {err}")))?;

            match label {
                "as" => order.alphas = power,
                "a" => order.alpha = power,
                "lr" => order.logxir = power,
                "lf" => order.logxif = power,
                _ => return Err(Error::Parse(format!("unknown label '{label}' in order '{s}'"))),
            }

            rest = &tail[end..];
        }

        Ok(order)
    }
}

impl Ord for Order {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for Order {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Order {
    /// Constructor.
    #[must_use]
    pub const fn new(alphas: u32, alpha: u32, logxir: u32, logxif: u32) -> Self {
        Self {
            alphas,
            alpha,
            logxir,
            logxif,
        }
    }

    // the power of the strong coupling dominates the ordering
    const fn key(&self) -> (u32, u32, u32, u32) {
        (self.alphas, self.alpha, self.logxir, self.logxif)
    }

    /// `true` if no scale logarithm multiplies this order.
    #[must_use]
    pub const fn is_central(&self) -> bool {
        self.logxir == 0 && self.logxif == 0
    }

    const fn couplings(&self) -> u32 {
        self.alphas + self.alpha
    }

    /// Select the orders of `orders` that are less than `max_as` QCD and `max_al` electroweak
    /// orders away from the leading order. Mixed orders are selected as long as the smaller of
    /// both numbers allows it; beyond that only pure corrections in the coupling with the larger
    /// number are selected. Orders with scale logarithms are skipped unless `logs` is `true`.
    ///
    /// ```rust
    /// use pineko::boc::Order;
    ///
    /// let orders = [
    ///     Order::new(0, 2, 0, 0),
    ///     Order::new(1, 2, 0, 0),
    ///     Order::new(1, 2, 1, 0),
    ///     Order::new(0, 3, 0, 0),
    ///     Order::new(2, 2, 0, 0),
    /// ];
    ///
    /// assert_eq!(Order::create_mask(&orders, 1, 0, false), [true, false, false, false, false]);
    /// assert_eq!(Order::create_mask(&orders, 2, 0, true), [true, true, true, false, false]);
    /// assert_eq!(Order::create_mask(&orders, 0, 2, false), [true, false, false, true, false]);
    /// ```
    #[must_use]
    pub fn create_mask(orders: &[Self], max_as: u32, max_al: u32, logs: bool) -> Vec<bool> {
        let Some(lo) = orders.iter().map(Self::couplings).min() else {
            return Vec::new();
        };

        let (lo_as, lo_al) = orders
            .iter()
            .filter(|order| order.couplings() == lo)
            .fold((0, 0), |(lo_as, lo_al), order| {
                (lo_as.max(order.alphas), lo_al.max(order.alpha))
            });

        let mixed = max_as.min(max_al);
        let pure = max_as.max(max_al);

        orders
            .iter()
            .map(|order| {
                if !logs && !order.is_central() {
                    return false;
                }

                let pto = order.couplings() - lo;

                if pto < mixed {
                    return true;
                }

                pto < pure
                    && match max_as.cmp(&max_al) {
                        Ordering::Greater => order.alphas == lo_as + pto,
                        Ordering::Less => order.alpha == lo_al + pto,
                        Ordering::Equal => false,
                    }
            })
            .collect()
    }
}

/// Linear combination of parton-ID tuples, each with its factor, that a grid convolutes with the
/// same subgrids.
#[derive(Clone, Debug, Deserialize, PartialEq, PartialOrd, Serialize)]
pub struct Channel {
    entry: Vec<(Vec<i32>, f64)>,
}

impl Channel {
    /// Constructor. Factors of identical parton-ID tuples are added up and tuples whose factor
    /// vanishes are dropped. The resulting entries are sorted by their IDs.
    ///
    /// # Panics
    ///
    /// Panics if `entry` is empty or if the tuples do not all have the same length.
    #[must_use]
    pub fn new(entry: Vec<(Vec<i32>, f64)>) -> Self {
        assert!(!entry.is_empty(), "can not create empty channel");
        assert!(
            entry.iter().map(|(pids, _)| pids.len()).all_equal(),
            "can not create channel with a different number of PIDs"
        );

        let mut summed = BTreeMap::new();

        for (pids, factor) in entry {
            *summed.entry(pids).or_insert(0.0) += factor;
        }

        Self {
            entry: summed
                .into_iter()
                .filter(|&(_, factor): &(_, f64)| !approx_eq!(f64, factor, 0.0, epsilon = 1e-14))
                .collect(),
        }
    }

    /// Parton-ID tuples and their factors.
    #[must_use]
    pub fn entry(&self) -> &[(Vec<i32>, f64)] {
        &self.entry
    }
}

/// Create a [`Channel`] of two initial-state partons out of `id1, id2, factor` triples separated
/// by semicolons.
///
/// ```rust
/// use pineko::channel;
///
/// assert_eq!(channel![2, 2, 1.0; 4, 4, 1.0], channel![4, 4, 1.0; 2, 2, 1.0]);
/// ```
#[macro_export]
macro_rules! channel {
    ($a:expr, $b:expr, $factor:expr $(; $c:expr, $d:expr, $fac:expr)*) => {
        $crate::boc::Channel::new(vec![(vec![$a, $b], $factor), $((vec![$c, $d], $fac)),*])
    };
}
