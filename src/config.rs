//! Configuration file schema for codeatlas.
//!
//! The configuration tunes which files are scanned and which extractors run.
//! Every field is optional; a missing file means defaults everywhere.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Default config file names, in discovery order.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["codeatlas.yaml", ".codeatlas.yaml"];

/// Files above this size are skipped unless configured otherwise.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 2 * 1024 * 1024;

/// Errors from loading or validating a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid excluded_paths pattern {pattern:?}: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("max_file_bytes must be greater than zero")]
    ZeroMaxFileBytes,
    #[error("unknown extractor {0:?} (expected symbols, endpoints, components or dependencies)")]
    UnknownExtractor(String),
}

/// Top-level configuration. Unknown keys are rejected.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Glob patterns for paths to leave out (e.g. `"**/generated/**"`).
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Directory names pruned in addition to the built-in list.
    #[serde(default)]
    pub extra_exclude_dirs: Vec<String>,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    /// Extract files in parallel (results are identical either way).
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub extractors: ExtractorToggles,
}

fn default_max_file_bytes() -> u64 {
    DEFAULT_MAX_FILE_BYTES
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            excluded_paths: Vec::new(),
            extra_exclude_dirs: Vec::new(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            parallel: false,
            extractors: ExtractorToggles::default(),
        }
    }
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a configuration from YAML text. Empty text gives the defaults.
    pub fn parse_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    /// Matcher for `excluded_paths`.
    pub fn excluded_matcher(&self) -> Result<GlobSet, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.excluded_paths {
            let glob = Glob::new(pattern).map_err(|source| ConfigError::Glob {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|source| ConfigError::Glob {
            pattern: self.excluded_paths.join(", "),
            source,
        })
    }
}

/// Look for a config file in `dir`.
pub fn discover(dir: &Path) -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Load the config at `explicit`, else the one discovered in `dir`, else defaults.
pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<(Config, Option<PathBuf>), ConfigError> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => discover(dir),
    };
    let config = match &path {
        Some(p) => Config::parse_file(p)?,
        None => Config::default(),
    };
    validate(&config)?;
    Ok((config, path))
}

/// Validate a configuration for correctness.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.max_file_bytes == 0 {
        return Err(ConfigError::ZeroMaxFileBytes);
    }
    config.excluded_matcher()?;
    Ok(())
}

/// One of the four extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extractor {
    Symbols,
    Endpoints,
    Components,
    Dependencies,
}

impl Extractor {
    pub const ALL: [Extractor; 4] = [
        Extractor::Symbols,
        Extractor::Endpoints,
        Extractor::Components,
        Extractor::Dependencies,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Extractor::Symbols => "symbols",
            Extractor::Endpoints => "endpoints",
            Extractor::Components => "components",
            Extractor::Dependencies => "dependencies",
        }
    }
}

impl FromStr for Extractor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "symbols" => Ok(Extractor::Symbols),
            "endpoints" => Ok(Extractor::Endpoints),
            "components" => Ok(Extractor::Components),
            "dependencies" | "deps" => Ok(Extractor::Dependencies),
            other => Err(ConfigError::UnknownExtractor(other.to_string())),
        }
    }
}

impl std::fmt::Display for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which extractors run. All are on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractorToggles {
    #[serde(default = "default_true")]
    pub symbols: bool,
    #[serde(default = "default_true")]
    pub endpoints: bool,
    #[serde(default = "default_true")]
    pub components: bool,
    #[serde(default = "default_true")]
    pub dependencies: bool,
}

impl Default for ExtractorToggles {
    fn default() -> Self {
        Self {
            symbols: true,
            endpoints: true,
            components: true,
            dependencies: true,
        }
    }
}

impl ExtractorToggles {
    /// Only the listed extractors.
    pub fn only(extractors: &[Extractor]) -> Self {
        Self {
            symbols: extractors.contains(&Extractor::Symbols),
            endpoints: extractors.contains(&Extractor::Endpoints),
            components: extractors.contains(&Extractor::Components),
            dependencies: extractors.contains(&Extractor::Dependencies),
        }
    }

    pub fn is_enabled(&self, extractor: Extractor) -> bool {
        match extractor {
            Extractor::Symbols => self.symbols,
            Extractor::Endpoints => self.endpoints,
            Extractor::Components => self.components,
            Extractor::Dependencies => self.dependencies,
        }
    }

    /// Enabled extractors in their canonical order.
    pub fn enabled(&self) -> Vec<Extractor> {
        Extractor::ALL
            .into_iter()
            .filter(|e| self.is_enabled(*e))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
excluded_paths:
  - "**/generated/**"
extra_exclude_dirs: ["fixtures"]
max_file_bytes: 1024
parallel: true
extractors:
  components: false
"#;
        let config = Config::parse_str(yaml).unwrap();
        assert_eq!(config.excluded_paths, vec!["**/generated/**"]);
        assert_eq!(config.extra_exclude_dirs, vec!["fixtures"]);
        assert_eq!(config.max_file_bytes, 1024);
        assert!(config.parallel);
        assert!(config.extractors.symbols);
        assert!(!config.extractors.components);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::parse_str("  \n").unwrap();
        assert_eq!(config.max_file_bytes, DEFAULT_MAX_FILE_BYTES);
        assert_eq!(config.extractors.enabled(), Extractor::ALL.to_vec());
    }

    #[test]
    fn test_invalid_glob_rejected() {
        let config = Config {
            excluded_paths: vec!["src/[".to_string()],
            ..Default::default()
        };
        assert!(matches!(validate(&config), Err(ConfigError::Glob { .. })));
    }

    #[test]
    fn test_zero_max_file_bytes_rejected() {
        let config = Config {
            max_file_bytes: 0,
            ..Default::default()
        };
        assert!(matches!(validate(&config), Err(ConfigError::ZeroMaxFileBytes)));
    }

    #[test]
    fn test_excluded_matcher() {
        let config = Config {
            excluded_paths: vec!["**/generated/**".to_string(), "docs/*.md".to_string()],
            ..Default::default()
        };
        let matcher = config.excluded_matcher().unwrap();
        assert!(matcher.is_match("src/generated/api.ts"));
        assert!(matcher.is_match("docs/intro.md"));
        assert!(!matcher.is_match("src/api.ts"));
    }

    #[test]
    fn test_unknown_extractor_key_rejected() {
        let err = Config::parse_str("extractors:\n  routes: false\n").unwrap_err();
        assert!(err.to_string().contains("routes"));
        assert!(Config::parse_str("extractors:\n  endpoints: false\n").is_ok());
    }

    #[test]
    fn test_unknown_top_level_key_rejected() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("codeatlas.yaml"), "exclude_paths: [\"x\"]\n").unwrap();
        assert!(matches!(
            load(None, temp.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_extractor_parsing_and_toggles() {
        assert_eq!("Endpoints".parse::<Extractor>().unwrap(), Extractor::Endpoints);
        assert_eq!("deps".parse::<Extractor>().unwrap(), Extractor::Dependencies);
        assert!("routes".parse::<Extractor>().is_err());

        let toggles = ExtractorToggles::only(&[Extractor::Symbols, Extractor::Dependencies]);
        assert_eq!(
            toggles.enabled(),
            vec![Extractor::Symbols, Extractor::Dependencies]
        );
    }

    #[test]
    fn test_load_discovers_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".codeatlas.yaml"), "parallel: true\n").unwrap();

        let (config, path) = load(None, temp.path()).unwrap();
        assert!(config.parallel);
        assert_eq!(path, Some(temp.path().join(".codeatlas.yaml")));

        let empty = TempDir::new().unwrap();
        let (config, path) = load(None, empty.path()).unwrap();
        assert!(!config.parallel);
        assert!(path.is_none());
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.yaml");
        assert!(matches!(
            load(Some(&missing), temp.path()),
            Err(ConfigError::Read { .. })
        ));
    }
}
