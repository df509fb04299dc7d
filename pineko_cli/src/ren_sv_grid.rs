use super::helpers;
use super::{GlobalConfiguration, Subcommand};
use anyhow::Result;
use clap::{ArgAction, Parser, ValueHint};
use pineko::grid::Grid;
use pineko::reconstruct;
use pineko::scale_variations;
use std::path::PathBuf;
use std::process::ExitCode;

/// Add the renormalization-scale variations of the higher orders to a grid.
#[derive(Parser)]
pub struct Opts {
    /// Path to the input grid.
    #[arg(value_hint = ValueHint::FilePath)]
    grid: PathBuf,
    /// Path of the grid to write.
    #[arg(value_hint = ValueHint::FilePath)]
    target: PathBuf,
    /// Highest power of the strong coupling to add scale variations for.
    max_as: u32,
    /// Number of active flavors.
    nf: u32,
    /// Replace scale-variation orders that are already in the grid, `true` or `false`.
    #[arg(action = ArgAction::Set, default_value_t = false)]
    order_exists: bool,
}

impl Subcommand for Opts {
    fn run(&self, _: &GlobalConfiguration) -> Result<ExitCode> {
        let state = scale_variations::compute_ren_sv_grid::<Grid>(
            &self.grid,
            self.max_as,
            self.nf,
            &self.target,
            self.order_exists,
        )?;

        helpers::report(
            &self.grid.display().to_string(),
            reconstruct::SCALE_VARIATION_ORDERS,
            state,
        );

        Ok(helpers::exit_code(&[state]))
    }
}
