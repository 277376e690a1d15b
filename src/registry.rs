//! Source registry: the tracked files of a project.
//!
//! Scanning only records paths. File contents are read on demand with
//! [`SourceRegistry::load`] so a run can hold one file in memory at a time.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::{Config, ConfigError};
use crate::diagnostics::Diagnostics;
use crate::extract::PathIndex;
use crate::source::{language_of, normalize_separators, SourceFile};

/// Directories never descended into. Hidden directories are pruned as well.
pub const EXCLUDE_DIRS: &[&str] = &[
    "node_modules",
    ".venv",
    "venv",
    "env",
    "__pycache__",
    ".git",
    "dist",
    "build",
    ".next",
    ".nuxt",
    ".output",
    ".cache",
    "coverage",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    "vendor",
    "target",
    "bin",
    "obj",
    ".idea",
    ".vscode",
];

/// File names never tracked.
pub const EXCLUDE_FILES: &[&str] = &[
    ".DS_Store",
    "Thumbs.db",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "poetry.lock",
    "Pipfile.lock",
    "composer.lock",
    "Gemfile.lock",
    "Cargo.lock",
];

/// Extensions of tracked files.
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "py", "js", "mjs", "cjs", "ts", "tsx", "jsx", "vue", "svelte", "java", "kt", "go", "rs",
    "rb", "php", "c", "cpp", "h", "hpp", "cs", "html", "css", "scss", "sass", "less", "json",
    "yaml", "yml", "toml", "xml", "sql", "sh", "bash", "zsh", "md", "rst", "txt",
];

/// Errors that can occur while building or reading a registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("cannot access {path}: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Project-relative paths of every tracked file under a root.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    root: PathBuf,
    /// Sorted, `/`-separated, relative to `root`.
    paths: Vec<String>,
}

impl SourceRegistry {
    /// Walk `root` and record every tracked file.
    ///
    /// Unreadable entries and oversized files are reported through `diag`
    /// and skipped. `root` may also be a single file.
    pub fn scan(root: &Path, config: &Config, diag: &Diagnostics) -> Result<Self, RegistryError> {
        let metadata = fs::metadata(root).map_err(|source| RegistryError::Root {
            path: root.to_path_buf(),
            source,
        })?;

        if metadata.is_file() {
            let parent = root.parent().unwrap_or_else(|| Path::new(""));
            let name = root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            return Ok(Self {
                root: parent.to_path_buf(),
                paths: vec![name],
            });
        }

        let excluded = config.excluded_matcher()?;
        let mut paths = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 || !e.file_type().is_dir() {
                    return true;
                }
                let name = e.file_name().to_string_lossy();
                !(name.starts_with('.')
                    || EXCLUDE_DIRS.contains(&name.as_ref())
                    || config.extra_exclude_dirs.iter().any(|d| *d == name))
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    diag.warn(format!("cannot walk entry: {}", e), &root.display().to_string());
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if EXCLUDE_FILES.contains(&name.as_ref()) || !is_source_file(&name) {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let relative = normalize_separators(&relative.to_string_lossy());
            if excluded.is_match(&relative) {
                diag.note(3, format!("excluded by pattern: {}", relative));
                continue;
            }

            match entry.metadata() {
                Ok(meta) if meta.len() > config.max_file_bytes => {
                    diag.warn(
                        format!("skipping large file ({} bytes)", meta.len()),
                        &relative,
                    );
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    diag.warn(format!("cannot stat file: {}", e), &relative);
                    continue;
                }
            }

            paths.push(relative);
        }

        paths.sort();
        diag.note(1, format!("tracked files: {}", paths.len()));
        Ok(Self {
            root: root.to_path_buf(),
            paths,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Tracked paths in sorted order.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Read one tracked file. Invalid UTF-8 is replaced, never rejected.
    pub fn load(&self, path: &str) -> Result<SourceFile, RegistryError> {
        let bytes = fs::read(self.root.join(path)).map_err(|source| RegistryError::Read {
            path: path.to_string(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(SourceFile::from_text(path, &text))
    }

    /// Index of all tracked paths, for import resolution.
    pub fn path_index(&self) -> PathIndex {
        PathIndex::new(&self.paths)
    }
}

fn is_source_file(name: &str) -> bool {
    let language = language_of(name);
    SOURCE_EXTENSIONS.contains(&language.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_scan_prunes_and_sorts() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "src/main.py", b"print(1)\n");
        write(root, "src/app.ts", b"export {}\n");
        write(root, "README.md", b"# hi\n");
        write(root, "node_modules/lib/index.js", b"x\n");
        write(root, ".hidden/secret.py", b"x\n");
        write(root, "src/__pycache__/main.pyc", b"x\n");
        write(root, "package-lock.json", b"{}\n");
        write(root, "logo.png", b"\x89PNG");

        let registry = SourceRegistry::scan(root, &Config::default(), &Diagnostics::quiet()).unwrap();
        assert_eq!(registry.paths(), &["README.md", "src/app.ts", "src/main.py"]);
    }

    #[test]
    fn test_scan_honours_config_exclusions() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "src/api.ts", b"x\n");
        write(root, "src/generated/client.ts", b"x\n");
        write(root, "fixtures/data.json", b"{}\n");

        let config = Config {
            excluded_paths: vec!["**/generated/**".to_string()],
            extra_exclude_dirs: vec!["fixtures".to_string()],
            ..Default::default()
        };
        let registry = SourceRegistry::scan(root, &config, &Diagnostics::quiet()).unwrap();
        assert_eq!(registry.paths(), &["src/api.ts"]);
    }

    #[test]
    fn test_large_files_skipped_with_warning() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "big.py", &vec![b'#'; 64]);
        write(root, "small.py", b"x = 1\n");

        let config = Config {
            max_file_bytes: 32,
            ..Default::default()
        };
        let diag = Diagnostics::quiet();
        let registry = SourceRegistry::scan(root, &config, &diag).unwrap();
        assert_eq!(registry.paths(), &["small.py"]);
        assert_eq!(diag.warning_count(), 1);
        assert!(diag.warnings()[0].contains("big.py"));
    }

    #[test]
    fn test_load_is_lossy() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "bad.py", b"def ok():\n    x = '\xff'\n");
        let registry =
            SourceRegistry::scan(temp.path(), &Config::default(), &Diagnostics::quiet()).unwrap();

        let file = registry.load("bad.py").unwrap();
        assert_eq!(file.language, "py");
        assert_eq!(file.lines.len(), 2);
        assert!(file.lines[1].contains('\u{FFFD}'));
    }

    #[test]
    fn test_scan_single_file() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "solo.rb", b"def hi\nend\n");
        let registry = SourceRegistry::scan(
            &temp.path().join("solo.rb"),
            &Config::default(),
            &Diagnostics::quiet(),
        )
        .unwrap();
        assert_eq!(registry.paths(), &["solo.rb"]);
        assert_eq!(registry.load("solo.rb").unwrap().line_count(), 2);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp = TempDir::new().unwrap();
        let result = SourceRegistry::scan(
            &temp.path().join("missing"),
            &Config::default(),
            &Diagnostics::quiet(),
        );
        assert!(matches!(result, Err(RegistryError::Root { .. })));
    }
}
