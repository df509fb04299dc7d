//! Project configuration, read from a `pineko.toml` file.

use super::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file.
pub const NAME: &str = "pineko.toml";

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfiguration {
    paths: RawPaths,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPaths {
    root: Option<PathBuf>,
    ymldb: PathBuf,
    grids: PathBuf,
    operator_cards: PathBuf,
    theory_cards: PathBuf,
    fktables: PathBuf,
    ekos: PathBuf,
    #[serde(default)]
    logs: RawLogs,
}

#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLogs {
    eko: Option<PathBuf>,
    fk: Option<PathBuf>,
}

#[derive(Deserialize)]
struct YamlDb {
    operands: Vec<Vec<String>>,
}

/// Folders of a project. All paths are absolute if the configuration file was given with an
/// absolute path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paths {
    /// Folder the relative paths are resolved against.
    pub root: PathBuf,
    /// Folder with the dataset definitions, one `<dataset>.yaml` file each.
    pub ymldb: PathBuf,
    /// Folder with the grids, one subfolder per theory.
    pub grids: PathBuf,
    /// Folder with the operator cards.
    pub operator_cards: PathBuf,
    /// Folder with the theory cards, one `<theory_id>.yaml` file each.
    pub theory_cards: PathBuf,
    /// Folder with the FK tables.
    pub fktables: PathBuf,
    /// Folder with the evolution operators.
    pub ekos: PathBuf,
    /// Folder for the logs of the EKO computations.
    pub logs_eko: Option<PathBuf>,
    /// Folder for the logs of the FK-table computations.
    pub logs_fk: Option<PathBuf>,
}

impl Paths {
    /// Return every configured folder together with its name.
    #[must_use]
    pub fn folders(&self) -> Vec<(&'static str, &Path)> {
        let mut folders = vec![
            ("ymldb", self.ymldb.as_path()),
            ("grids", self.grids.as_path()),
            ("operator_cards", self.operator_cards.as_path()),
            ("theory_cards", self.theory_cards.as_path()),
            ("fktables", self.fktables.as_path()),
            ("ekos", self.ekos.as_path()),
        ];

        if let Some(eko) = &self.logs_eko {
            folders.push(("logs.eko", eko.as_path()));
        }

        if let Some(fk) = &self.logs_fk {
            folders.push(("logs.fk", fk.as_path()));
        }

        folders
    }
}

/// Immutable project configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Configuration {
    path: PathBuf,
    paths: Paths,
}

impl Configuration {
    /// Read the configuration from the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can not be read or is not a valid configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| {
            Error::General(format!(
                "could not read configuration '{}': {err}",
                path.display()
            ))
        })?;
        let directory = path.parent().unwrap_or_else(|| Path::new(""));

        Ok(Self {
            path: path.to_path_buf(),
            paths: Self::parse(&content, directory)?,
        })
    }

    /// Parse the configuration `content`, resolving relative paths against `directory`.
    ///
    /// # Errors
    ///
    /// Returns an error if `content` is not a valid configuration.
    pub fn from_toml_str(content: &str, directory: &Path) -> Result<Self> {
        Ok(Self {
            path: directory.join(NAME),
            paths: Self::parse(content, directory)?,
        })
    }

    fn parse(content: &str, directory: &Path) -> Result<Paths> {
        let raw: RawConfiguration = toml::from_str(content)?;
        let paths = raw.paths;
        let root = paths
            .root
            .map_or_else(|| directory.to_path_buf(), |root| directory.join(root));

        Ok(Paths {
            ymldb: root.join(paths.ymldb),
            grids: root.join(paths.grids),
            operator_cards: root.join(paths.operator_cards),
            theory_cards: root.join(paths.theory_cards),
            fktables: root.join(paths.fktables),
            ekos: root.join(paths.ekos),
            logs_eko: paths.logs.eko.map(|eko| root.join(eko)),
            logs_fk: paths.logs.fk.map(|fk| root.join(fk)),
            root,
        })
    }

    /// Search `start` and its parents for a configuration file and return its path.
    ///
    /// # Errors
    ///
    /// Returns an error if no configuration file is found.
    pub fn detect(start: &Path) -> Result<PathBuf> {
        start
            .ancestors()
            .map(|directory| directory.join(NAME))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| {
                Error::General(format!(
                    "no '{NAME}' found in '{}' or any of its parents",
                    start.display()
                ))
            })
    }

    /// Path of the configuration file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The configured folders.
    #[must_use]
    pub const fn paths(&self) -> &Paths {
        &self.paths
    }

    /// Return the names of the grids `dataset` is built from, read from its yamldb file.
    ///
    /// # Errors
    ///
    /// Returns an error if the yamldb file can not be read or parsed.
    pub fn dataset_grids(&self, dataset: &str) -> Result<Vec<String>> {
        let path = self.paths.ymldb.join(format!("{dataset}.yaml"));
        let content = fs::read_to_string(&path).map_err(|err| {
            Error::General(format!("could not read yamldb '{}': {err}", path.display()))
        })?;
        let yamldb: YamlDb = serde_yaml::from_str(&content)?;

        Ok(yamldb.operands.into_iter().flatten().collect())
    }

    /// Path of the grid `name` of theory `theory_id`.
    #[must_use]
    pub fn grid_path(&self, theory_id: u32, name: &str) -> PathBuf {
        self.paths
            .grids
            .join(theory_id.to_string())
            .join(format!("{name}.pineappl.lz4"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[paths]
ymldb = "data/ymldb"
grids = "data/grids"
operator_cards = "data/operator_cards"
theory_cards = "/shared/theory_cards"
fktables = "data/fktables"
ekos = "data/ekos"

[paths.logs]
eko = "logs/eko"
"#;

    #[test]
    fn relative_paths_are_resolved() {
        let config = Configuration::from_toml_str(CONFIG, Path::new("/project")).unwrap();
        let paths = config.paths();

        assert_eq!(paths.root, Path::new("/project"));
        assert_eq!(paths.ymldb, Path::new("/project/data/ymldb"));
        assert_eq!(paths.theory_cards, Path::new("/shared/theory_cards"));
        assert_eq!(paths.logs_eko.as_deref(), Some(Path::new("/project/logs/eko")));
        assert_eq!(paths.logs_fk, None);
        assert_eq!(paths.folders().len(), 7);
        assert_eq!(config.path(), Path::new("/project/pineko.toml"));
    }

    #[test]
    fn explicit_root() {
        let content = CONFIG.replace("[paths]\n", "[paths]\nroot = \"nested\"\n");
        let config = Configuration::from_toml_str(&content, Path::new("/project")).unwrap();

        assert_eq!(config.paths().grids, Path::new("/project/nested/data/grids"));
    }

    #[test]
    fn missing_folder_is_an_error() {
        let content = CONFIG.replace("ekos = \"data/ekos\"\n", "");

        assert!(matches!(
            Configuration::from_toml_str(&content, Path::new("/project")),
            Err(Error::Toml(_))
        ));
    }

    #[test]
    fn load_and_detect() {
        let directory = tempfile::tempdir().unwrap();
        let nested = directory.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        assert!(Configuration::detect(&nested).is_err());

        fs::write(directory.path().join(NAME), CONFIG).unwrap();
        let path = Configuration::detect(&nested).unwrap();

        assert_eq!(path, directory.path().join(NAME));

        let config = Configuration::load(&path).unwrap();

        assert_eq!(config.paths().ekos, directory.path().join("data/ekos"));
    }

    #[test]
    fn dataset_grids_from_yamldb() {
        let directory = tempfile::tempdir().unwrap();
        let config = Configuration::from_toml_str(CONFIG, directory.path()).unwrap();
        fs::create_dir_all(&config.paths().ymldb).unwrap();
        fs::write(
            config.paths().ymldb.join("ATLAS_RATIO.yaml"),
            "conversion_factor: 1.0\noperation: RATIO\noperands:\n- - NUM_A\n  - NUM_B\n- - DEN\n",
        )
        .unwrap();

        assert_eq!(
            config.dataset_grids("ATLAS_RATIO").unwrap(),
            ["NUM_A", "NUM_B", "DEN"]
        );
        assert!(config.dataset_grids("MISSING").is_err());
        assert_eq!(
            config.grid_path(400, "DEN"),
            directory.path().join("data/grids/400/DEN.pineappl.lz4")
        );
    }
}
