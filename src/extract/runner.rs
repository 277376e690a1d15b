//! Extraction runner that drives the four extractors over a project.

use indicatif::ProgressBar;
use rayon::prelude::*;

use crate::config::{Config, Extractor, ExtractorToggles};
use crate::detect::{detect_frameworks, detect_monorepo};
use crate::diagnostics::Diagnostics;
use crate::registry::SourceRegistry;
use crate::source::SourceFile;

use super::{
    dependencies_of, extract_file_components, extract_file_endpoints, extract_file_symbols,
    FileFacts, PathIndex, ProjectIndex,
};

/// Executes the enabled extractors against a set of files.
#[derive(Debug, Clone)]
pub struct Runner {
    extractors: ExtractorToggles,
    parallel: bool,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Runner {
    /// Create a runner from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            extractors: config.extractors,
            parallel: config.parallel,
        }
    }

    /// Override which extractors run.
    pub fn extractors(mut self, extractors: ExtractorToggles) -> Self {
        self.extractors = extractors;
        self
    }

    /// Set whether files are processed on the rayon pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run every enabled extractor on one file.
    pub fn extract_file(&self, file: &SourceFile, index: &PathIndex, diag: &Diagnostics) -> FileFacts {
        let mut facts = FileFacts {
            path: file.path.clone(),
            language: file.language.clone(),
            lines: file.line_count(),
            ..Default::default()
        };

        for extractor in self.extractors.enabled() {
            match extractor {
                Extractor::Symbols => facts.symbols = extract_file_symbols(file, diag),
                Extractor::Endpoints => facts.endpoints = extract_file_endpoints(file, diag),
                Extractor::Components => facts.components = extract_file_components(file, diag),
                Extractor::Dependencies => facts.dependencies = dependencies_of(file, index, diag),
            }
        }
        facts
    }

    /// Extract from files already in memory. Imports resolve among `files`.
    pub fn run_files(&self, files: &[SourceFile], diag: &Diagnostics) -> ProjectIndex {
        let index = PathIndex::new(files.iter().map(|f| f.path.as_str()));

        let mut ordered: Vec<&SourceFile> = files.iter().collect();
        ordered.sort_by(|a, b| a.path.cmp(&b.path));

        let all_facts: Vec<FileFacts> = if self.parallel {
            ordered
                .par_iter()
                .map(|f| self.extract_file(f, &index, diag))
                .collect()
        } else {
            ordered
                .iter()
                .map(|f| self.extract_file(f, &index, diag))
                .collect()
        };

        fold(all_facts)
    }

    /// Extract from every file of a registry and detect the project stack.
    ///
    /// Files are loaded one at a time and dropped as soon as their facts are
    /// taken. Files that cannot be read are reported and skipped.
    pub fn run(&self, registry: &SourceRegistry, diag: &Diagnostics) -> ProjectIndex {
        self.run_with_progress(registry, diag, None)
    }

    /// Like [`Runner::run`], advancing `progress` once per file.
    pub fn run_with_progress(
        &self,
        registry: &SourceRegistry,
        diag: &Diagnostics,
        progress: Option<&ProgressBar>,
    ) -> ProjectIndex {
        let index = registry.path_index();

        let process = |path: &String| -> Option<FileFacts> {
            let facts = match registry.load(path) {
                Ok(file) => Some(self.extract_file(&file, &index, diag)),
                Err(e) => {
                    diag.warn(e.to_string(), path);
                    None
                }
            };
            if let Some(pb) = progress {
                pb.inc(1);
            }
            facts
        };

        // Registry paths are sorted, and both iterators keep that order.
        let all_facts: Vec<FileFacts> = if self.parallel {
            registry.paths().par_iter().filter_map(process).collect()
        } else {
            registry.paths().iter().filter_map(process).collect()
        };

        let mut project = fold(all_facts);
        project.summary.frameworks = detect_frameworks(registry.root(), diag);
        project.summary.monorepo = detect_monorepo(registry.root(), diag);
        project
    }
}

/// Fold per-file facts, in path order, into the project tables.
fn fold(all_facts: Vec<FileFacts>) -> ProjectIndex {
    let mut project = ProjectIndex::new();
    for facts in all_facts {
        project.absorb(facts);
    }
    project
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Vec<SourceFile> {
        vec![
            SourceFile::from_text(
                "api/app.py",
                "from flask import Flask\nfrom api import models\n\n@app.route('/items')\ndef list_items():\n    pass\n",
            ),
            SourceFile::from_text("api/models.py", "class Item:\n    def save(self):\n        pass\n"),
            SourceFile::from_text(
                "web/Button.jsx",
                "import React from 'react'\nexport function Button() {\n  const [n] = useState(0)\n}\n",
            ),
        ]
    }

    #[test]
    fn test_run_files_fills_all_tables() {
        let project = Runner::default().run_files(&sample(), &Diagnostics::quiet());

        assert_eq!(project.summary.files, 3);
        assert_eq!(project.summary.lines, 13);
        assert_eq!(
            project.summary.languages,
            vec!["JavaScript (React)", "Python"]
        );
        assert_eq!(project.symbols["api/models.py"].get("Item.save").map(|s| s.line), Some(2));
        assert_eq!(project.endpoints["GET /items"].handler, "list_items");
        assert_eq!(project.components["Button"].hooks, vec!["useState"]);
        assert!(project.dependencies["api/app.py"].contains("api/models.py"));

        let entry = &project.summary.file_map["web/Button.jsx"];
        assert_eq!((entry.language.as_str(), entry.lines), ("jsx", 4));
        assert!(project.summary.frameworks.is_empty());
    }

    #[test]
    fn test_disabled_extractors_leave_tables_empty() {
        let runner = Runner::default().extractors(ExtractorToggles::only(&[Extractor::Endpoints]));
        let project = runner.run_files(&sample(), &Diagnostics::quiet());

        assert!(project.symbols.is_empty());
        assert!(project.components.is_empty());
        assert!(project.dependencies.is_empty());
        assert_eq!(project.endpoints.len(), 1);
        assert_eq!(project.summary.files, 3);
        assert_eq!(project.summary.file_map.len(), 3);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let files = sample();
        let diag = Diagnostics::quiet();
        let sequential = Runner::default().run_files(&files, &diag);
        let parallel = Runner::default().parallel(true).run_files(&files, &diag);
        assert_eq!(
            serde_json::to_string(&sequential).unwrap(),
            serde_json::to_string(&parallel).unwrap()
        );
    }

    #[test]
    fn test_run_over_registry() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("pkg")).unwrap();
        std::fs::write(temp.path().join("pkg/a.py"), "from pkg import b\ndef run():\n    pass\n").unwrap();
        std::fs::write(temp.path().join("pkg/b.py"), "def helper():\n    pass\n").unwrap();
        std::fs::write(temp.path().join("Pipfile"), "[packages]\nflask = \"*\"\n").unwrap();

        let diag = Diagnostics::quiet();
        let registry = SourceRegistry::scan(temp.path(), &Config::default(), &diag).unwrap();
        let progress = ProgressBar::hidden();
        let project = Runner::default().run_with_progress(&registry, &diag, Some(&progress));

        assert_eq!(progress.position(), 2);
        assert_eq!(project.summary.files, 2);
        assert_eq!(project.symbols["pkg/a.py"].get("run").map(|s| s.line), Some(2));
        assert!(project.dependencies["pkg/a.py"].contains("pkg/b.py"));
        assert_eq!(
            project.summary.frameworks.backend,
            vec!["Python (pipenv)", "Flask"]
        );
        assert_eq!(project.summary.monorepo, None);
        assert_eq!(diag.warning_count(), 0);
    }
}
