use super::helpers;
use super::{GlobalConfiguration, Subcommand};
use anyhow::Result;
use clap::Parser;
use pineko::scaffold;
use prettytable::row;
use std::process::ExitCode;

#[derive(Parser)]
enum Mode {
    /// Create the folders of the project.
    New,
    /// Check that the folders of the project exist.
    Check,
}

/// Set up or inspect the folders of a project.
#[derive(Parser)]
pub struct Opts {
    #[command(subcommand)]
    mode: Mode,
}

impl Subcommand for Opts {
    fn run(&self, cfg: &GlobalConfiguration) -> Result<ExitCode> {
        let configuration = helpers::load_configuration(cfg)?;

        match self.mode {
            Mode::New => {
                scaffold::set_up_project(&configuration)?;
                println!(
                    "Success: created the folders of '{}'",
                    configuration.path().display()
                );

                Ok(ExitCode::SUCCESS)
            }
            Mode::Check => {
                let missing = scaffold::check_folders(&configuration);

                if missing.is_empty() {
                    println!("Success: all folders exist");
                    return Ok(ExitCode::SUCCESS);
                }

                let mut table = helpers::create_table();
                table.set_titles(row![c => "folder", "path"]);

                for (name, path) in &missing {
                    table.add_row(row![l => name, path.display()]);
                }

                table.printstd();
                println!("Error: {} folders are missing", missing.len());

                Ok(ExitCode::FAILURE)
            }
        }
    }
}
