//! Import resolution between tracked files.
//!
//! Import statements are found line by line and resolved against the set of
//! tracked paths only. Anything that does not resolve to a tracked file (a
//! third-party package, the standard library) produces no edge.

use regex::Regex;
use std::collections::{BTreeSet, HashSet};

use super::types::DependencyGraph;
use crate::diagnostics::Diagnostics;
use crate::source::{language_of, SourceFile};

/// Extensions tried, in order, when a JS import omits one.
const JS_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs", "vue", "svelte"];

lazy_static::lazy_static! {
    static ref PY_FROM_RE: Regex = Regex::new(r"^\s*from\s+(\.*)([\w.]*)\s+import\b").unwrap();
    static ref PY_IMPORT_RE: Regex = Regex::new(r"^\s*import\s+(.+)").unwrap();
    static ref JS_IMPORT_RE: Regex = Regex::new(
        r#"(?:\bfrom\s+|\bimport\s*\(?\s*|\brequire\s*\(\s*)['"]([^'"]+)['"]"#
    ).unwrap();
    static ref PHP_USE_RE: Regex = Regex::new(
        r"^\s*use\s+\\?([\w\\]+)(?:\s+as\s+\w+)?\s*;"
    ).unwrap();
    static ref PHP_INCLUDE_RE: Regex = Regex::new(
        r#"\b(?:require|include)(?:_once)?\s*\(?\s*(__DIR__\s*\.\s*)?['"]([^'"]+)['"]"#
    ).unwrap();
}

/// One tracked path with the views of it the resolvers need.
#[derive(Debug, Clone)]
struct Entry {
    path: String,
    language: String,
    stem: String,
    /// Extension-less path split on `/`.
    segments: Vec<String>,
}

impl Entry {
    fn new(path: &str) -> Self {
        let language = language_of(path);
        let without_ext = match path.rfind('.') {
            Some(idx) if idx > path.rfind('/').map_or(0, |s| s + 1) => &path[..idx],
            _ => path,
        };
        let segments: Vec<String> = without_ext.split('/').map(str::to_string).collect();
        let stem = segments.last().cloned().unwrap_or_default();
        Self {
            path: path.to_string(),
            language,
            stem,
            segments,
        }
    }
}

/// All tracked paths, sorted, prepared for resolution.
///
/// Built once per run from the registry; resolution never touches the disk.
#[derive(Debug, Clone, Default)]
pub struct PathIndex {
    entries: Vec<Entry>,
    known: HashSet<String>,
}

impl PathIndex {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut paths: Vec<String> = paths.into_iter().map(|p| p.as_ref().to_string()).collect();
        paths.sort();
        paths.dedup();
        let known = paths.iter().cloned().collect();
        let entries = paths.iter().map(|p| Entry::new(p)).collect();
        Self { entries, known }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.known.contains(path)
    }

    /// First tracked path, other than `exclude`, accepted by `pred`.
    fn find(&self, exclude: &str, pred: impl Fn(&Entry) -> bool) -> Option<String> {
        self.entries
            .iter()
            .filter(|e| e.path != exclude)
            .find(|e| pred(e))
            .map(|e| e.path.clone())
    }

    /// `path` itself if it is tracked and is not `exclude`.
    fn exact(&self, exclude: &str, path: &str) -> Option<String> {
        if path != exclude && self.contains(path) {
            Some(path.to_string())
        } else {
            None
        }
    }
}

/// Resolve `rel` against the directory `base`, handling `.` and `..`.
///
/// Returns `None` when `..` would climb above the project root.
pub fn normalize(base: &str, rel: &str) -> Option<String> {
    let mut parts: Vec<&str> = base.split('/').filter(|p| !p.is_empty()).collect();
    for part in rel.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

/// Dependency graph of a set of files, resolved among themselves.
pub fn extract_dependencies(files: &[SourceFile], diag: &Diagnostics) -> DependencyGraph {
    let index = PathIndex::new(files.iter().map(|f| f.path.as_str()));
    let mut graph = DependencyGraph::new();
    for file in files {
        let deps = dependencies_of(file, &index, diag);
        if !deps.is_empty() {
            graph.insert(file.path.clone(), deps);
        }
    }
    diag.note(1, format!("files with dependencies: {}", graph.len()));
    graph
}

/// Tracked files imported by `file`. Never contains `file` itself.
pub fn dependencies_of(file: &SourceFile, index: &PathIndex, diag: &Diagnostics) -> BTreeSet<String> {
    let mut deps = BTreeSet::new();
    let resolve: fn(&SourceFile, &str, &PathIndex, &mut BTreeSet<String>) = match file.language.as_str() {
        "py" => python_imports,
        "js" | "jsx" | "ts" | "tsx" | "mjs" | "cjs" | "vue" | "svelte" => js_imports,
        "php" => php_imports,
        _ => return deps,
    };

    for line in &file.lines {
        resolve(file, line, index, &mut deps);
    }
    deps.remove(&file.path);

    if !deps.is_empty() {
        diag.note(2, format!("{}: {} dependencies", file.path, deps.len()));
    }
    deps
}

fn python_imports(file: &SourceFile, line: &str, index: &PathIndex, deps: &mut BTreeSet<String>) {
    if let Some(caps) = PY_FROM_RE.captures(line) {
        let dots = caps.get(1).map_or(0, |m| m.as_str().len());
        let module = caps.get(2).map_or("", |m| m.as_str());
        if dots > 0 {
            if module.is_empty() {
                return;
            }
            if let Some(target) = python_relative(file, dots, module, index) {
                deps.insert(target);
                return;
            }
        }
        deps.extend(python_module(file, module, index));
        return;
    }

    if let Some(caps) = PY_IMPORT_RE.captures(line) {
        for item in caps[1].split(',') {
            let module = item.split_whitespace().next().unwrap_or("");
            deps.extend(python_module(file, module, index));
        }
    }
}

/// `from ..pkg.mod import x` relative to the importing file's package.
fn python_relative(file: &SourceFile, dots: usize, module: &str, index: &PathIndex) -> Option<String> {
    let mut base = file.dir().to_string();
    for _ in 1..dots {
        base = normalize(&base, "..")?;
    }
    let rel = module.replace('.', "/");
    let target = normalize(&base, &rel)?;
    index
        .exact(&file.path, &format!("{}.py", target))
        .or_else(|| index.exact(&file.path, &format!("{}/__init__.py", target)))
}

/// Resolve an absolute module by its root package name.
fn python_module(file: &SourceFile, module: &str, index: &PathIndex) -> Option<String> {
    let root = module.split('.').next().unwrap_or("");
    if root.is_empty() {
        return None;
    }
    index
        .find(&file.path, |e| e.segments.iter().any(|s| s == root))
        .or_else(|| index.find(&file.path, |e| e.path.contains(root)))
}

fn js_imports(file: &SourceFile, line: &str, index: &PathIndex, deps: &mut BTreeSet<String>) {
    for caps in JS_IMPORT_RE.captures_iter(line) {
        if let Some(target) = resolve_js(file, &caps[1], index) {
            deps.insert(target);
        }
    }
}

fn resolve_js(file: &SourceFile, spec: &str, index: &PathIndex) -> Option<String> {
    if spec.starts_with('.') {
        let base = normalize(file.dir(), spec)?;
        let exact = js_candidates(&base)
            .into_iter()
            .find_map(|candidate| index.exact(&file.path, &candidate));
        // An empty base is the project root, which prefixes every path
        if exact.is_some() || base.is_empty() {
            return exact;
        }
        return index.find(&file.path, |e| e.path.starts_with(&base));
    }

    let aliased = spec.strip_prefix("@/").or_else(|| spec.strip_prefix("~/"))?;
    if aliased.is_empty() {
        return None;
    }
    index.find(&file.path, |e| e.path.contains(aliased))
}

/// `p`, then `p.<ext>`, then `p/index.<ext>`.
fn js_candidates(base: &str) -> Vec<String> {
    if base.is_empty() {
        return JS_EXTENSIONS.iter().map(|ext| format!("index.{}", ext)).collect();
    }
    let mut candidates = vec![base.to_string()];
    candidates.extend(JS_EXTENSIONS.iter().map(|ext| format!("{}.{}", base, ext)));
    candidates.extend(JS_EXTENSIONS.iter().map(|ext| format!("{}/index.{}", base, ext)));
    candidates
}

fn php_imports(file: &SourceFile, line: &str, index: &PathIndex, deps: &mut BTreeSet<String>) {
    if let Some(caps) = PHP_USE_RE.captures(line) {
        let class = caps[1].rsplit('\\').next().unwrap_or("");
        if !class.is_empty() {
            deps.extend(index.find(&file.path, |e| {
                e.language == "php" && e.stem.eq_ignore_ascii_case(class)
            }));
        }
        return;
    }

    for caps in PHP_INCLUDE_RE.captures_iter(line) {
        let target = &caps[2];
        if target.starts_with("http") {
            continue;
        }
        let from_dir = caps.get(1).is_some();
        deps.extend(resolve_include(file, target, from_dir, index));
    }
}

fn resolve_include(file: &SourceFile, target: &str, from_dir: bool, index: &PathIndex) -> Option<String> {
    // `__DIR__ . '/x.php'` is relative to the including file.
    let relative = if from_dir {
        Some(target.trim_start_matches('/'))
    } else if target.starts_with('/') {
        None
    } else {
        Some(target)
    };

    if let Some(rel) = relative {
        if let Some(found) = normalize(file.dir(), rel).and_then(|p| index.exact(&file.path, &p)) {
            return Some(found);
        }
    }

    let suffix = target
        .split('/')
        .filter(|p| !p.is_empty() && *p != "." && *p != "..")
        .collect::<Vec<_>>()
        .join("/");
    if suffix.is_empty() {
        return None;
    }
    let slash_suffix = format!("/{}", suffix);
    index.find(&file.path, |e| e.path == suffix || e.path.ends_with(&slash_suffix))
}
