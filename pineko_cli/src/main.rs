#![warn(clippy::all, clippy::cargo, clippy::nursery, clippy::pedantic)]

mod check;
mod fonll;
mod helpers;
mod kfactor;
mod opcard;
mod ren_sv_grid;
mod scaffold;

use anyhow::Result;
use clap::{Parser, ValueHint};
use enum_dispatch::enum_dispatch;
use git_version::git_version;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser)]
pub struct GlobalConfiguration {
    /// Path of the configuration file, searched for in the working directory and its parents
    /// if not given.
    #[arg(long, short, value_hint = ValueHint::FilePath)]
    pub configs: Option<PathBuf>,
    /// Show log messages up to this level.
    #[arg(default_value_t = Level::WARN, long)]
    pub log_level: Level,
    /// Allow LHAPDF to print banners.
    #[arg(long)]
    pub lhapdf_banner: bool,
}

#[enum_dispatch]
pub trait Subcommand {
    fn run(&self, cfg: &GlobalConfiguration) -> Result<ExitCode>;
}

#[enum_dispatch(Subcommand)]
#[derive(Parser)]
pub enum SubcommandEnum {
    Check(check::Opts),
    CombineFonll(fonll::Opts),
    Kfactor(kfactor::Opts),
    Opcard(opcard::Opts),
    RenSvGrid(ren_sv_grid::Opts),
    Scaffold(scaffold::Opts),
}

#[derive(Parser)]
#[command(
    arg_required_else_help = true,
    author,
    about,
    disable_help_subcommand = true,
    name = "pineko",
    version = git_version!(
        args = ["--always", "--dirty", "--long", "--tags"],
        cargo_prefix = "",
        fallback = "unknown"
    )
)]
pub struct Opts {
    #[command(flatten)]
    pub configuration: GlobalConfiguration,
    #[command(subcommand)]
    pub subcommand: SubcommandEnum,
}

fn main() -> ExitCode {
    let opts = Opts::parse();

    tracing_subscriber::fmt()
        .with_max_level(opts.configuration.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match opts.subcommand.run(&opts.configuration) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}
