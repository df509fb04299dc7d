use super::helpers;
use super::{GlobalConfiguration, Subcommand};
use anyhow::Result;
use clap::Parser;
use pineko::fonll::{self, Constituents};
use pineko::grid::Grid;
use std::process::ExitCode;

/// Combine the grids of the FONLL constituents of a dataset into the grids of a FONLL theory.
#[derive(Parser)]
pub struct Opts {
    /// Identifier of the FONLL theory.
    theory_id: u32,
    /// Name of the dataset.
    dataset: String,
    /// Theory of the three-flavor scheme.
    #[arg(long, value_name = "ID")]
    ffns3: u32,
    /// Theory of the massless limit of the three-flavor scheme.
    #[arg(long, value_name = "ID")]
    ffn03: Option<u32>,
    /// Theory of the heavy-quark part of the four-flavor scheme.
    #[arg(long, value_name = "ID")]
    ffns4til: Option<u32>,
    /// Theory of the light-quark part of the four-flavor scheme.
    #[arg(long, value_name = "ID")]
    ffns4bar: Option<u32>,
    /// Theory of the massless limit of the four-flavor scheme.
    #[arg(long, value_name = "ID")]
    ffn04: Option<u32>,
    /// Theory of the heavy-quark part of the five-flavor scheme.
    #[arg(long, value_name = "ID")]
    ffns5til: Option<u32>,
    /// Theory of the light-quark part of the five-flavor scheme.
    #[arg(long, value_name = "ID")]
    ffns5bar: Option<u32>,
}

impl Subcommand for Opts {
    fn run(&self, cfg: &GlobalConfiguration) -> Result<ExitCode> {
        let configuration = helpers::load_configuration(cfg)?;
        let theories = Constituents {
            ffns3: Some(self.ffns3),
            ffn03: self.ffn03,
            ffns4til: self.ffns4til,
            ffns4bar: self.ffns4bar,
            ffn04: self.ffn04,
            ffns5til: self.ffns5til,
            ffns5bar: self.ffns5bar,
        };

        for path in
            fonll::combine_dataset::<Grid>(&configuration, self.theory_id, &self.dataset, &theories)?
        {
            println!("Success: wrote '{}'", path.display());
        }

        Ok(ExitCode::SUCCESS)
    }
}
