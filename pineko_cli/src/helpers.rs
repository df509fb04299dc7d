use super::GlobalConfiguration;
use anyhow::Result;
use pineko::backend::AlphasEvaluator;
use pineko::configs::Configuration;
use pineko::reconstruct::ReturnState;
use prettytable::Table;
use prettytable::format::{FormatBuilder, LinePosition, LineSeparator};
use std::env;
use std::process::ExitCode;

#[cfg(feature = "lhapdf")]
use lhapdf::Pdf;

pub fn create_table() -> Table {
    let mut table = Table::new();
    table.set_format(
        FormatBuilder::new()
            .column_separator(' ')
            .separator(LinePosition::Title, LineSeparator::new('-', '+', ' ', ' '))
            .build(),
    );
    table
}

pub fn load_configuration(cfg: &GlobalConfiguration) -> Result<Configuration> {
    let path = match &cfg.configs {
        Some(path) => path.clone(),
        None => Configuration::detect(&env::current_dir()?)?,
    };

    Ok(Configuration::load(&path)?)
}

/// Print the status line of `state` for `subject`, to which a driver adds `orders`.
pub fn report(subject: &str, orders: &str, state: ReturnState) {
    let status = match state {
        ReturnState::Success => "Success",
        ReturnState::AlreadyThere => "Abort",
        ReturnState::OrderExistsFailure => "Error",
    };

    println!("{status}: {subject}: {}", state.message(orders));
}

pub fn exit_code(states: &[ReturnState]) -> ExitCode {
    if states.contains(&ReturnState::OrderExistsFailure) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// The strong coupling of a PDF set.
#[cfg(feature = "lhapdf")]
pub struct PdfAlphas(Pdf);

#[cfg(feature = "lhapdf")]
impl AlphasEvaluator for PdfAlphas {
    fn alphas_q2(&self, q2: f64) -> f64 {
        self.0.alphas_q2(q2)
    }
}

#[cfg(feature = "lhapdf")]
pub fn create_alphas(cfg: &GlobalConfiguration, pdfset: &str) -> pineko::error::Result<PdfAlphas> {
    if !cfg.lhapdf_banner {
        lhapdf::set_verbosity(0);
    }

    let pdf = pdfset
        .parse()
        .map_or_else(|_| Pdf::with_setname_and_member(pdfset, 0), Pdf::with_lhaid)
        .map_err(|err| pineko::error::Error::Other(err.into()))?;

    Ok(PdfAlphas(pdf))
}

#[cfg(not(feature = "lhapdf"))]
pub enum PdfAlphas {}

#[cfg(not(feature = "lhapdf"))]
impl AlphasEvaluator for PdfAlphas {
    fn alphas_q2(&self, _: f64) -> f64 {
        match *self {}
    }
}

#[cfg(not(feature = "lhapdf"))]
pub fn create_alphas(_: &GlobalConfiguration, _: &str) -> pineko::error::Result<PdfAlphas> {
    Err(pineko::error::Error::General(
        "you need to install `pineko` with feature `lhapdf`".to_owned(),
    ))
}
