//! Coefficients of the QCD beta function, expanded in powers of `a_s = alpha_s / (4 pi)`.

/// Leading-order coefficient `beta_0` for `nf` active flavors.
#[must_use]
pub fn beta_qcd_as2(nf: u32) -> f64 {
    (2.0 / 3.0f64).mul_add(-f64::from(nf), 11.0)
}

/// Next-to-leading-order coefficient `beta_1` for `nf` active flavors.
#[must_use]
pub fn beta_qcd_as3(nf: u32) -> f64 {
    (38.0 / 3.0f64).mul_add(-f64::from(nf), 102.0)
}
