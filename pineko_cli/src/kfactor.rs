use super::helpers;
use super::{GlobalConfiguration, Subcommand};
use anyhow::Result;
use clap::{Parser, ValueHint};
use pineko::grid::Grid;
use pineko::kfactor;
use pineko::reconstruct;
use std::path::PathBuf;
use std::process::ExitCode;

/// Add the orders of k-factor files to the grids of a dataset.
#[derive(Parser)]
pub struct Opts {
    /// Identifier of the theory whose grids are read.
    theory_id: u32,
    /// Name of the dataset.
    dataset: String,
    /// Folder with the k-factor files.
    #[arg(value_hint = ValueHint::DirPath)]
    kfactor_folder: PathBuf,
    /// Folder the grids are written to.
    #[arg(value_hint = ValueHint::DirPath)]
    target_folder: PathBuf,
    /// Perturbative order the k-factors lift the grids to, `1` is the leading order.
    pto: u32,
    /// Replace the order if it is already in the grid.
    #[arg(long)]
    order_exists: bool,
}

impl Subcommand for Opts {
    fn run(&self, cfg: &GlobalConfiguration) -> Result<ExitCode> {
        let configuration = helpers::load_configuration(cfg)?;
        let states = kfactor::compute_k_factor_grid::<Grid, _, _>(
            &configuration,
            self.theory_id,
            &self.dataset,
            &self.kfactor_folder,
            &self.target_folder,
            self.pto,
            self.order_exists,
            |pdfset| helpers::create_alphas(cfg, pdfset),
        )?;

        for (name, state) in &states {
            helpers::report(name, reconstruct::KFACTOR_ORDERS, *state);
        }

        let states: Vec<_> = states.into_iter().map(|(_, state)| state).collect();

        Ok(helpers::exit_code(&states))
    }
}
