//! Reader for the metadata of evolution-operator (EKO) archives.

use super::backend::OperatorAxes;
use super::error::{Error, Result};
use base64::Engine;
use base64::alphabet::URL_SAFE;
use base64::engine::GeneralPurpose;
use base64::engine::general_purpose::PAD;
use either::Either;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use tar::Archive;

const OPERATOR_SUFFIX: &str = ".npz.lz4";

#[derive(Deserialize)]
struct MetadataV0 {
    #[serde(rename = "Q2grid")]
    q2_grid: Vec<f64>,
    inputgrid: Vec<f64>,
    inputpids: Vec<i32>,
    q2_ref: f64,
    targetgrid: Vec<f64>,
    targetpids: Vec<i32>,
}

#[derive(Deserialize)]
struct Rotations {
    #[serde(alias = "_inputgrid")]
    inputgrid: Option<Vec<f64>>,
    #[serde(alias = "_inputpids", with = "either::serde_untagged_optional")]
    inputpids: Option<Either<Vec<Vec<f64>>, Vec<i32>>>,
    #[serde(alias = "_targetgrid")]
    targetgrid: Option<Vec<f64>>,
    #[serde(alias = "_targetpids")]
    targetpids: Option<Vec<i32>>,
    pids: Vec<i32>,
    xgrid: Vec<f64>,
}

#[derive(Deserialize)]
struct MetadataV1 {
    mu20: f64,
    rotations: Rotations,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Metadata {
    V0(MetadataV0),
    V1(MetadataV1),
}

/// Axes of an evolution operator.
#[derive(Clone, Debug, PartialEq)]
pub struct OperatorMetadata {
    /// Squared factorization scale the operator evolves from.
    pub mu20: f64,
    /// Squared factorization scales the operator evolves to, in the order of the archive.
    pub mu2: Vec<f64>,
    /// Particle identifiers at the input scale.
    pub input_pids: Vec<i32>,
    /// `x` nodes at the input scale.
    pub input_x: Vec<f64>,
    /// Particle identifiers at the target scales.
    pub target_pids: Vec<i32>,
    /// `x` nodes at the target scales.
    pub target_x: Vec<f64>,
}

impl OperatorAxes for OperatorMetadata {
    fn x_grid(&self) -> &[f64] {
        &self.target_x
    }

    fn mu2_grid(&self) -> &[f64] {
        &self.mu2
    }

    fn input_pids(&self) -> &[i32] {
        &self.input_pids
    }

    fn target_pids(&self) -> &[i32] {
        &self.target_pids
    }
}

fn decode_mu2(name: &str) -> Result<f64> {
    let base64 = GeneralPurpose::new(&URL_SAFE, PAD);
    let bytes = base64
        .decode(name.as_bytes())
        .map_err(|err| Error::Parse(format!("operator name '{name}' is not base64: {err}")))?;
    let array: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
        Error::Parse(format!(
            "operator name '{name}' does not encode a 64-bit float"
        ))
    })?;

    Ok(f64::from_le_bytes(array))
}

/// Read the metadata of the EKO archive at `path`. Operators stored as separate files (the
/// current layout) contribute their scale through their file name; older archives list the
/// scales in `metadata.yaml`.
///
/// # Errors
///
/// Returns an error if the archive can not be read, has no `metadata.yaml` or a file name of an
/// operator does not encode a scale.
pub fn read_metadata(path: &Path) -> Result<OperatorMetadata> {
    let mut archive = Archive::new(File::open(path)?);
    let mut metadata = None;
    let mut mu2 = Vec::new();

    for entry in archive.entries()? {
        let file = entry?;
        let entry_path = file.header().path()?;

        let Some(file_name) = entry_path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };

        if file_name == "metadata.yaml" {
            metadata = Some(serde_yaml::from_reader::<_, Metadata>(file)?);
        } else if let Some(name) = file_name.strip_suffix(OPERATOR_SUFFIX) {
            mu2.push(decode_mu2(name)?);
        }
    }

    match metadata {
        Some(Metadata::V0(metadata)) => Ok(OperatorMetadata {
            mu20: metadata.q2_ref,
            mu2: metadata.q2_grid,
            input_pids: metadata.inputpids,
            input_x: metadata.inputgrid,
            target_pids: metadata.targetpids,
            target_x: metadata.targetgrid,
        }),
        Some(Metadata::V1(metadata)) => {
            let rotations = metadata.rotations;
            // a rotation into another basis keeps the flavors of `pids`
            let input_pids = match rotations.inputpids {
                Some(Either::Right(pids)) => pids,
                Some(Either::Left(_)) | None => rotations.pids.clone(),
            };

            Ok(OperatorMetadata {
                mu20: metadata.mu20,
                mu2,
                input_pids,
                input_x: rotations
                    .inputgrid
                    .unwrap_or_else(|| rotations.xgrid.clone()),
                target_pids: rotations.targetpids.unwrap_or(rotations.pids),
                target_x: rotations.targetgrid.unwrap_or(rotations.xgrid),
            })
        }
        None => Err(Error::General(format!(
            "no `metadata.yaml` file found in '{}'",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tar::{Builder, Header};

    fn append(builder: &mut Builder<File>, name: &str, content: &[u8]) {
        let mut header = Header::new_gnu();
        header.set_size(content.len().try_into().unwrap());
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, content).unwrap();
    }

    fn archive(files: &[(&str, &[u8])]) -> (tempfile::TempDir, std::path::PathBuf) {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("eko.tar");
        let mut builder = Builder::new(File::create(&path).unwrap());

        for &(name, content) in files {
            append(&mut builder, name, content);
        }

        builder.finish().unwrap();

        (directory, path)
    }

    fn encode(mu2: f64) -> String {
        GeneralPurpose::new(&URL_SAFE, PAD).encode(mu2.to_le_bytes())
    }

    #[test]
    fn read_v0() {
        let metadata = b"Q2grid: [10.0, 100.0]
inputgrid: [0.1, 1.0]
inputpids: [21, 1, 2]
q2_ref: 1.65
targetgrid: [0.1, 0.5, 1.0]
targetpids: [21, 1]
";
        let (_directory, path) = archive(&[("metadata.yaml", metadata)]);
        let eko = read_metadata(&path).unwrap();

        assert_eq!(eko.mu20, 1.65);
        assert_eq!(eko.mu2_grid(), [10.0, 100.0]);
        assert_eq!(eko.x_grid(), [0.1, 0.5, 1.0]);
        assert_eq!(eko.input_pids(), [21, 1, 2]);
        assert_eq!(eko.target_pids(), [21, 1]);
    }

    #[test]
    fn read_v1() {
        let metadata = b"mu20: 2.56
rotations:
  _inputgrid: null
  _inputpids: [[1.0, 0.0], [0.0, 1.0]]
  _targetgrid: [0.01, 1.0]
  _targetpids: null
  pids: [21, 22]
  xgrid: [0.001, 0.01, 1.0]
";
        let first = format!("operators/{}.npz.lz4", encode(10.0));
        let second = format!("operators/{}.npz.lz4", encode(10000.0));
        let (_directory, path) = archive(&[
            ("metadata.yaml", metadata),
            ("theory.yaml", b"ID: 400\n"),
            (&first, b"ignored"),
            (&second, b"ignored"),
        ]);
        let eko = read_metadata(&path).unwrap();

        assert_eq!(eko.mu20, 2.56);
        assert_eq!(eko.mu2_grid(), [10.0, 10000.0]);
        assert_eq!(eko.input_x, [0.001, 0.01, 1.0]);
        assert_eq!(eko.x_grid(), [0.01, 1.0]);
        assert_eq!(eko.input_pids(), [21, 22]);
        assert_eq!(eko.target_pids(), [21, 22]);
    }

    #[test]
    fn missing_metadata() {
        let (_directory, path) = archive(&[("theory.yaml", b"ID: 400\n")]);

        assert!(matches!(read_metadata(&path), Err(Error::General(_))));
    }

    #[test]
    fn malformed_operator_name() {
        let (_directory, path) = archive(&[("operators/abc.npz.lz4", b"")]);

        assert!(matches!(read_metadata(&path), Err(Error::Parse(_))));
    }
}
