#![warn(clippy::all, clippy::cargo, clippy::nursery, clippy::pedantic)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

//! `pineko` turns interpolation grids into FK tables: it writes the operator cards evolution
//! operators are computed from, checks that grids and operators fit together, and adds
//! scale-variation and k-factor orders to grids or combines FONLL constituents.

mod convert;

pub mod backend;
pub mod beta;
pub mod bin;
pub mod boc;
pub mod check;
pub mod configs;
pub mod eko;
pub mod empty_subgrid;
pub mod error;
pub mod fonll;
pub mod grid;
pub mod import_only_subgrid;
pub mod kfactor;
pub mod opcard;
pub mod reconstruct;
pub mod rescale;
pub mod scaffold;
pub mod scale_variations;
pub mod subgrid;
pub mod theory_card;
