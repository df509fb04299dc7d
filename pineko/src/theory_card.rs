//! Theory cards: the YAML mapping of parameters a theory is computed with.

use super::configs::Configuration;
use super::error::{Error, Result};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Keys that identify the flavor-number scheme of a theory and therefore are allowed to differ
/// between the constituents of a FONLL combination.
pub const SCHEME_KEYS: [&str; 4] = ["FNS", "PTO", "NfFF", "ID"];

/// A theory card.
#[derive(Clone, Debug, PartialEq)]
pub struct TheoryCard {
    mapping: Mapping,
}

impl FromStr for TheoryCard {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match serde_yaml::from_str::<Value>(s)? {
            Value::Mapping(mapping) => Ok(Self { mapping }),
            _ => Err(Error::Parse("theory card is not a mapping".to_owned())),
        }
    }
}

impl TheoryCard {
    /// Read the theory card at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can not be read or is not a mapping.
    pub fn read(path: &Path) -> Result<Self> {
        fs::read_to_string(path)
            .map_err(|err| {
                Error::General(format!(
                    "could not read theory card '{}': {err}",
                    path.display()
                ))
            })?
            .parse()
    }

    /// Load the card of theory `theory_id` from the theory-card folder of `cfg`.
    ///
    /// # Errors
    ///
    /// Returns an error if the card can not be read.
    pub fn load(cfg: &Configuration, theory_id: u32) -> Result<Self> {
        Self::read(&cfg.paths().theory_cards.join(format!("{theory_id}.yaml")))
    }

    /// Return the full mapping.
    #[must_use]
    pub const fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Return the value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.mapping.get(key)
    }

    /// Set `key` to `value`.
    pub fn set(&mut self, key: &str, value: Value) {
        self.mapping.insert(Value::String(key.to_owned()), value);
    }

    /// Return a copy of the mapping without the [`SCHEME_KEYS`].
    #[must_use]
    pub fn without_scheme(&self) -> Mapping {
        let mut mapping = self.mapping.clone();

        for key in SCHEME_KEYS {
            mapping.remove(key);
        }

        mapping
    }

    /// Serialize the card as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.mapping)?)
    }

    fn required(&self, key: &str) -> Result<&Value> {
        self.get(key)
            .ok_or_else(|| Error::Parse(format!("theory card is missing '{key}'")))
    }

    fn float(&self, key: &str) -> Result<f64> {
        self.required(key)?
            .as_f64()
            .ok_or_else(|| Error::Parse(format!("'{key}' of the theory card is not a number")))
    }

    fn float_or(&self, key: &str, default: f64) -> Result<f64> {
        if self.get(key).is_some() {
            self.float(key)
        } else {
            Ok(default)
        }
    }

    fn integer(&self, key: &str) -> Result<u32> {
        self.required(key)?
            .as_u64()
            .and_then(|value| u32::try_from(value).ok())
            .ok_or_else(|| {
                Error::Parse(format!(
                    "'{key}' of the theory card is not a non-negative integer"
                ))
            })
    }

    /// Identifier of the theory.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is missing or has the wrong type.
    pub fn id(&self) -> Result<u32> {
        self.integer("ID")
    }

    /// Perturbative order of the theory, `0` is LO.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is missing or has the wrong type.
    pub fn pto(&self) -> Result<u32> {
        self.integer("PTO")
    }

    /// Flavor-number scheme.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is missing or has the wrong type.
    pub fn fns(&self) -> Result<&str> {
        self.required("FNS")?
            .as_str()
            .ok_or_else(|| Error::Parse("'FNS' of the theory card is not a string".to_owned()))
    }

    /// Number of flavors of a fixed-flavor-number scheme.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is missing or has the wrong type.
    pub fn nf_ff(&self) -> Result<u32> {
        self.integer("NfFF")
    }

    /// Ratio of the renormalization scale to the process scale, `1` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the field has the wrong type.
    pub fn xir(&self) -> Result<f64> {
        self.float_or("XIR", 1.0)
    }

    /// Ratio of the factorization scale to the process scale, `1` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the field has the wrong type.
    pub fn xif(&self) -> Result<f64> {
        self.float_or("XIF", 1.0)
    }

    /// Scale at which the PDF is parametrized.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is missing or has the wrong type.
    pub fn q0(&self) -> Result<f64> {
        self.float("Q0")
    }

    /// Return the masses of the charm, bottom and top quarks.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the fields is missing or has the wrong type.
    pub fn heavy_quark_masses(&self) -> Result<[f64; 3]> {
        Ok([self.float("mc")?, self.float("mb")?, self.float("mt")?])
    }

    /// Return the ratios of the matching scales to the masses of the charm, bottom and top
    /// quarks, `1` for absent ratios.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the fields has the wrong type.
    pub fn matching_ratios(&self) -> Result<[f64; 3]> {
        Ok([
            self.float_or("kcThr", 1.0)?,
            self.float_or("kbThr", 1.0)?,
            self.float_or("ktThr", 1.0)?,
        ])
    }

    /// Return the squared scales at which the number of active flavors increases from three to
    /// four, from four to five and from five to six.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the masses or ratios is missing or has the wrong type.
    pub fn thresholds_squared(&self) -> Result<[f64; 3]> {
        let masses = self.heavy_quark_masses()?;
        let ratios = self.matching_ratios()?;

        Ok([
            (masses[0] * ratios[0]).powi(2),
            (masses[1] * ratios[1]).powi(2),
            (masses[2] * ratios[2]).powi(2),
        ])
    }

    /// Maximum number of flavors of the PDF, `6` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the field has the wrong type.
    pub fn max_nf_pdf(&self) -> Result<u32> {
        if self.get("MaxNfPdf").is_some() {
            self.integer("MaxNfPdf")
        } else {
            Ok(6)
        }
    }

    /// Whether FONLL damping is switched on, `false` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the field has the wrong type.
    pub fn damp(&self) -> Result<bool> {
        match self.get("DAMP") {
            None => Ok(false),
            Some(Value::Bool(damp)) => Ok(*damp),
            Some(_) => Ok(self.integer("DAMP")? != 0),
        }
    }

    /// Powers of the charm and bottom damping factors, `2` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the fields has the wrong type.
    pub fn damping_powers(&self) -> Result<(i32, i32)> {
        let power = |key| -> Result<i32> {
            if self.get(key).is_some() {
                i32::try_from(self.integer(key)?).map_err(|err| Error::Other(err.into()))
            } else {
                Ok(2)
            }
        };

        Ok((power("DAMPPOWERc")?, power("DAMPPOWERb")?))
    }
}
