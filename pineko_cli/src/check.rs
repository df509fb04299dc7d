use super::helpers;
use super::{GlobalConfiguration, Subcommand};
use anyhow::Result;
use clap::{Parser, ValueHint};
use pineko::backend::GridBackend;
use pineko::check::{self, AvailableAtMax, Scale};
use pineko::eko;
use pineko::error::Error;
use pineko::grid::Grid;
use prettytable::row;
use std::path::PathBuf;
use std::process::ExitCode;

/// Check that a grid can be evolved with an evolution kernel operator.
#[derive(Parser)]
struct Compat {
    /// Path to the grid.
    #[arg(value_hint = ValueHint::FilePath)]
    grid: PathBuf,
    /// Path to the evolution kernel operator.
    #[arg(value_hint = ValueHint::FilePath)]
    eko: PathBuf,
    /// Ratio of the factorization scale of the operator to the one of the grid.
    #[arg(default_value_t = 1.0, long)]
    xif: f64,
    /// Select orders whose power of the strong coupling is lower than this, counted from the
    /// leading order.
    #[arg(default_value_t = 10, long)]
    max_as: u32,
    /// Select orders whose power of the electromagnetic coupling is lower than this, counted
    /// from the leading order.
    #[arg(default_value_t = 10, long)]
    max_al: u32,
}

impl Compat {
    fn run(&self) -> Result<ExitCode> {
        let grid = Grid::read_from(&self.grid)?;
        let eko = eko::read_metadata(&self.eko)?;

        match check::check_grid_and_eko_compatible(
            &grid,
            &eko,
            self.xif,
            self.max_as,
            self.max_al,
        ) {
            Ok(()) => {
                println!("Success: grids are compatible");
                Ok(ExitCode::SUCCESS)
            }
            Err(Error::Incompatible(message)) => {
                println!("Error: {message}");
                Ok(ExitCode::FAILURE)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Check that the scale variations of a grid are consistent with its central orders.
#[derive(Parser)]
struct Scvar {
    /// Path to the grid.
    #[arg(value_hint = ValueHint::FilePath)]
    grid: PathBuf,
    /// Scale whose variations are checked, `ren` or `fact`.
    scale: Scale,
    /// Select orders whose power of the strong coupling is lower than this, counted from the
    /// leading order.
    max_as: u32,
    /// Select orders whose power of the electromagnetic coupling is lower than this, counted
    /// from the leading order.
    max_al: u32,
}

impl Scvar {
    fn run(&self) -> Result<ExitCode> {
        let grid = Grid::read_from(&self.grid)?;
        let mut table = helpers::create_table();
        table.set_titles(row![c => "as", "a", "lr", "lf"]);

        for order in check::selected_orders(&grid, self.max_as, self.max_al) {
            table.add_row(row![r => order.alphas, order.alpha, order.logxir, order.logxif]);
        }

        table.printstd();

        let (available, max_as_effective) =
            check::contains_sv(&grid, self.max_as, self.max_al, self.scale)?;

        match check::check_scvar_evolve(&grid, self.max_as, self.max_al, self.scale) {
            Ok(()) => {
                let what = match available {
                    AvailableAtMax::Both => "central order and scale variations",
                    AvailableAtMax::Central => "central order only",
                    AvailableAtMax::ScVar => "scale variations only",
                };
                println!(
                    "Success: {} scale, alphas^{max_as_effective}: {what}",
                    self.scale
                );
                Ok(ExitCode::SUCCESS)
            }
            Err(Error::Incompatible(message)) => {
                println!("Error: {message}");
                Ok(ExitCode::FAILURE)
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Parser)]
enum Mode {
    Compat(Compat),
    Scvar(Scvar),
}

/// Check grids before evolving them.
#[derive(Parser)]
pub struct Opts {
    #[command(subcommand)]
    mode: Mode,
}

impl Subcommand for Opts {
    fn run(&self, _: &GlobalConfiguration) -> Result<ExitCode> {
        match &self.mode {
            Mode::Compat(compat) => compat.run(),
            Mode::Scvar(scvar) => scvar.run(),
        }
    }
}
