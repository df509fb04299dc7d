use super::{GlobalConfiguration, Subcommand};
use anyhow::Result;
use clap::{Parser, ValueHint};
use pineko::backend::GridBackend;
use pineko::grid::Grid;
use pineko::opcard;
use pineko::theory_card::TheoryCard;
use std::path::PathBuf;
use std::process::ExitCode;

/// Write the operator card needed to evolve a grid.
#[derive(Parser)]
pub struct Opts {
    /// Path to the grid.
    #[arg(value_hint = ValueHint::FilePath)]
    grid: PathBuf,
    /// Path to the template of the operator card.
    #[arg(value_hint = ValueHint::FilePath)]
    template: PathBuf,
    /// Path to the theory card.
    #[arg(value_hint = ValueHint::FilePath)]
    theory_card: PathBuf,
    /// Path of the operator card to write.
    #[arg(value_hint = ValueHint::FilePath)]
    target: PathBuf,
}

impl Subcommand for Opts {
    fn run(&self, _: &GlobalConfiguration) -> Result<ExitCode> {
        let grid = Grid::read_from(&self.grid)?;
        let theory = TheoryCard::read(&self.theory_card)?;
        let (x_grid, mu2_grid) =
            opcard::write_operator_card(&grid, &self.template, &theory, &self.target)?;

        println!(
            "Success: wrote '{}' with {} x nodes and {} scales",
            self.target.display(),
            x_grid.len(),
            mu2_grid.len()
        );

        Ok(ExitCode::SUCCESS)
    }
}
