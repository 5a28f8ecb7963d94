use anyhow::{anyhow, Context, Result};
use contractgen_splice::SpliceConfig;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};

/// Batch run settings, read from TOML and then overridden by flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Source files to annotate; relative entries live under `source_dir`
    #[serde(deserialize_with = "file_list")]
    pub files_to_annotate: Vec<PathBuf>,

    pub source_dir: PathBuf,

    /// Where copies, descriptors and annotated files are kept
    pub target_dir: PathBuf,

    /// Copy every annotated file back over its source
    pub update_source: bool,

    pub verbose: bool,

    pub splice: SpliceConfig,
}

/// Flag values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub files: Vec<PathBuf>,
    pub source_dir: Option<PathBuf>,
    pub target_dir: Option<PathBuf>,
    pub update_source: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FileList {
    Lines(String),
    List(Vec<PathBuf>),
}

fn file_list<'de, D>(deserializer: D) -> std::result::Result<Vec<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match FileList::deserialize(deserializer)? {
        FileList::Lines(text) => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect(),
        FileList::List(files) => files,
    })
}

impl RunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|err| anyhow!("{err}"))?;
        Ok(config)
    }

    /// Load `path` (or defaults), apply `overrides`, expand and validate.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply(overrides);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if !overrides.files.is_empty() {
            self.files_to_annotate = overrides.files;
        }
        if let Some(dir) = overrides.source_dir {
            self.source_dir = dir;
        }
        if let Some(dir) = overrides.target_dir {
            self.target_dir = dir;
        }
        self.update_source |= overrides.update_source;
    }

    /// Expand `~` in directories and anchor relative files at `source_dir`
    pub fn normalize(&mut self) {
        self.source_dir = expand_home(&self.source_dir);
        self.target_dir = expand_home(&self.target_dir);
        let source_dir = self.source_dir.clone();
        for file in &mut self.files_to_annotate {
            let expanded = expand_home(file);
            *file = if expanded.is_relative() {
                source_dir.join(expanded)
            } else {
                expanded
            };
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_dir.as_os_str().is_empty() {
            return Err(anyhow!("target_dir is not set (use --target or the config file)"));
        }
        self.splice.validate().context("Invalid [splice] settings")?;
        Ok(())
    }
}

fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_config() {
        let config = RunConfig::parse(
            r##"
files_to_annotate = ["library/core/src/ptr/non_null.rs", "library/alloc/src/vec.rs"]
source_dir = "/src/verify-rust-std"
target_dir = "/tmp/target"
update_source = true

[splice]
feature_line = "#![feature(contracts)]"
"##,
        )
        .unwrap();

        assert_eq!(config.files_to_annotate.len(), 2);
        assert!(config.update_source);
        assert_eq!(config.splice.feature_line, "#![feature(contracts)]");
        assert_eq!(config.splice.core_path_marker, "library-core-");
    }

    #[test]
    fn test_newline_separated_file_list() {
        let config = RunConfig::parse(
            "files_to_annotate = \"\"\"\na.rs\n\n  nested/b.rs  \n\"\"\"\ntarget_dir = \"out\"\n",
        )
        .unwrap();
        assert_eq!(
            config.files_to_annotate,
            vec![PathBuf::from("a.rs"), PathBuf::from("nested/b.rs")]
        );
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(RunConfig::parse("target = \"out\"\n").is_err());
        assert!(RunConfig::parse("[splice]\npreamble = \"x\"\n").is_err());
    }

    #[test]
    fn test_overrides_and_normalization() {
        let mut config = RunConfig::parse(
            "files_to_annotate = [\"a.rs\"]\nsource_dir = \"src\"\ntarget_dir = \"out\"\n",
        )
        .unwrap();
        config.apply(Overrides {
            files: vec![PathBuf::from("b.rs"), PathBuf::from("/abs/c.rs")],
            source_dir: Some(PathBuf::from("lib")),
            target_dir: None,
            update_source: true,
        });
        config.normalize();

        assert_eq!(
            config.files_to_annotate,
            vec![PathBuf::from("lib/b.rs"), PathBuf::from("/abs/c.rs")]
        );
        assert_eq!(config.target_dir, PathBuf::from("out"));
        assert!(config.update_source);
    }

    #[test]
    fn test_home_expansion() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_home(Path::new("~/std")), home.join("std"));
        assert_eq!(expand_home(Path::new("~")), home);
        assert_eq!(expand_home(Path::new("/x/~")), PathBuf::from("/x/~"));
    }

    #[test]
    fn test_missing_target_fails_validation() {
        let err = RunConfig::load(None, Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("target_dir"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contractgen.toml");
        fs::write(&path, "target_dir = \"out\"\nverbose = true\n").unwrap();

        let config = RunConfig::load(Some(&path), Overrides::default()).unwrap();
        assert!(config.verbose);
        assert!(config.files_to_annotate.is_empty());

        let missing = RunConfig::load(Some(&dir.path().join("nope.toml")), Overrides::default());
        assert!(missing.is_err());
    }
}
