//! Project stack detection from manifest files at the project root.
//!
//! Unlike the extractors this stage never reads source files. It checks for
//! well-known indicator files (`go.mod`, `manage.py`, `vite.config.ts`, ...)
//! and looks inside `package.json` and the Python requirement files for the
//! frameworks they name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::diagnostics::Diagnostics;

/// Which part of the stack an indicator belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layer {
    Backend,
    Frontend,
    Other,
}

/// Indicator file name -> (layer, framework), checked in this order.
static INDICATORS: phf::OrderedMap<&'static str, (Layer, &'static str)> = phf::phf_ordered_map! {
    "requirements.txt" => (Layer::Backend, "Python (pip)"),
    "Pipfile" => (Layer::Backend, "Python (pipenv)"),
    "pyproject.toml" => (Layer::Backend, "Python (poetry/modern)"),
    "manage.py" => (Layer::Backend, "Django"),
    "app.py" => (Layer::Backend, "Flask"),
    "api.py" => (Layer::Backend, "Flask/FastAPI"),
    "main.py" => (Layer::Backend, "Python App"),
    "go.mod" => (Layer::Backend, "Go"),
    "Cargo.toml" => (Layer::Backend, "Rust"),
    "pom.xml" => (Layer::Backend, "Java (Maven)"),
    "build.gradle" => (Layer::Backend, "Java/Kotlin (Gradle)"),
    "Gemfile" => (Layer::Backend, "Ruby"),
    "composer.json" => (Layer::Backend, "PHP (Composer)"),
    "package.json" => (Layer::Frontend, "Node.js"),
    "next.config.js" => (Layer::Frontend, "Next.js"),
    "next.config.mjs" => (Layer::Frontend, "Next.js"),
    "nuxt.config.ts" => (Layer::Frontend, "Nuxt"),
    "nuxt.config.js" => (Layer::Frontend, "Nuxt"),
    "vite.config.js" => (Layer::Frontend, "Vite"),
    "vite.config.ts" => (Layer::Frontend, "Vite"),
    "angular.json" => (Layer::Frontend, "Angular"),
    "svelte.config.js" => (Layer::Frontend, "SvelteKit"),
    "tailwind.config.js" => (Layer::Frontend, "Tailwind CSS"),
    "tailwind.config.ts" => (Layer::Frontend, "Tailwind CSS"),
    "docker-compose.yml" => (Layer::Other, "Docker Compose"),
    "docker-compose.yaml" => (Layer::Other, "Docker Compose"),
    "Dockerfile" => (Layer::Other, "Docker"),
};

/// `package.json` dependency -> (layer, framework).
static PACKAGE_FRAMEWORKS: phf::OrderedMap<&'static str, (Layer, &'static str)> = phf::phf_ordered_map! {
    "react" => (Layer::Frontend, "React"),
    "vue" => (Layer::Frontend, "Vue 3"),
    "svelte" => (Layer::Frontend, "Svelte"),
    "express" => (Layer::Backend, "Express"),
    "fastify" => (Layer::Backend, "Fastify"),
    "koa" => (Layer::Backend, "Koa"),
    "next" => (Layer::Backend, "Next.js"),
    "nuxt" => (Layer::Backend, "Nuxt"),
    "@angular/core" => (Layer::Frontend, "Angular"),
};

/// Python requirement files searched for framework names.
const REQUIREMENT_FILES: &[&str] = &["requirements.txt", "Pipfile", "pyproject.toml"];

/// Lowercase needle -> framework.
const PYTHON_FRAMEWORKS: &[(&str, &str)] = &[
    ("flask", "Flask"),
    ("fastapi", "FastAPI"),
    ("django", "Django"),
];

/// Monorepo tool marker files, checked in this order.
const MONOREPO_MARKERS: &[(&str, &str)] = &[
    ("lerna.json", "Lerna"),
    ("pnpm-workspace.yaml", "pnpm"),
    ("nx.json", "Nx"),
    ("rush.json", "Rush"),
];

/// Frameworks found for a project, in detection order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backend: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frontend: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other: Vec<String>,
}

impl Stack {
    pub fn is_empty(&self) -> bool {
        self.backend.is_empty() && self.frontend.is_empty() && self.other.is_empty()
    }

    fn add(&mut self, layer: Layer, name: &str, source: &str, diag: &Diagnostics) {
        let list = match layer {
            Layer::Backend => &mut self.backend,
            Layer::Frontend => &mut self.frontend,
            Layer::Other => &mut self.other,
        };
        if !list.iter().any(|n| n == name) {
            list.push(name.to_string());
            diag.note(2, format!("detected {} ({})", name, source));
        }
    }
}

/// A monorepo tool and the workspace globs it declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monorepo {
    pub tool: String,
    #[serde(default)]
    pub workspaces: Vec<String>,
}

/// The parts of `package.json` this stage reads.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageManifest {
    #[serde(default)]
    dependencies: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    workspaces: Option<serde_json::Value>,
}

impl PackageManifest {
    fn depends_on(&self, name: &str) -> bool {
        self.dependencies.contains_key(name) || self.dev_dependencies.contains_key(name)
    }
}

#[derive(Debug, Default, Deserialize)]
struct LernaConfig {
    #[serde(default)]
    packages: Vec<String>,
}

/// Read and parse `package.json` under `root`. Parse errors become warnings.
fn read_package_manifest(root: &Path, diag: &Diagnostics) -> Option<PackageManifest> {
    let path = root.join("package.json");
    let text = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&text) {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            diag.warn(format!("cannot parse package.json: {}", e), "detect");
            None
        }
    }
}

/// Detect backend, frontend and tooling frameworks of the project at `root`.
pub fn detect_frameworks(root: &Path, diag: &Diagnostics) -> Stack {
    let mut stack = Stack::default();

    for (file, (layer, name)) in INDICATORS.entries() {
        if root.join(file).exists() {
            stack.add(*layer, name, file, diag);
        }
    }

    if let Some(manifest) = read_package_manifest(root, diag) {
        for (dep, (layer, name)) in PACKAGE_FRAMEWORKS.entries() {
            if manifest.depends_on(dep) {
                stack.add(*layer, name, "package.json", diag);
            }
        }
    }

    for file in REQUIREMENT_FILES {
        let path = root.join(file);
        if !path.is_file() {
            continue;
        }
        let content = match fs::read_to_string(&path) {
            Ok(text) => text.to_lowercase(),
            Err(e) => {
                diag.warn(format!("cannot read {}: {}", file, e), "detect");
                continue;
            }
        };
        for (needle, name) in PYTHON_FRAMEWORKS {
            if content.contains(needle) {
                stack.add(Layer::Backend, name, file, diag);
            }
        }
    }

    diag.note(
        1,
        format!(
            "frameworks: backend={}, frontend={}",
            stack.backend.len(),
            stack.frontend.len()
        ),
    );
    stack
}

/// Detect a monorepo tool at `root`.
///
/// Tool marker files win over `package.json` workspaces. Only Lerna and
/// npm/yarn declare workspaces in a format read here.
pub fn detect_monorepo(root: &Path, diag: &Diagnostics) -> Option<Monorepo> {
    for (marker, tool) in MONOREPO_MARKERS {
        let path = root.join(marker);
        if !path.exists() {
            continue;
        }
        let workspaces = if *marker == "lerna.json" {
            fs::read_to_string(&path)
                .ok()
                .and_then(|text| serde_json::from_str::<LernaConfig>(&text).ok())
                .map(|config| config.packages)
                .unwrap_or_default()
        } else {
            Vec::new()
        };
        diag.note(2, format!("monorepo: {}", tool));
        return Some(Monorepo {
            tool: tool.to_string(),
            workspaces,
        });
    }

    let workspaces = read_package_manifest(root, diag)?.workspaces?;
    diag.note(2, "monorepo: npm/yarn workspaces");
    Some(Monorepo {
        tool: "npm/yarn workspaces".to_string(),
        workspaces: workspace_globs(&workspaces),
    })
}

/// Workspaces are either a list of globs or `{"packages": [...]}` (yarn).
fn workspace_globs(value: &serde_json::Value) -> Vec<String> {
    let list = match value {
        serde_json::Value::Object(map) => map.get("packages"),
        other => Some(other),
    };
    list.and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
