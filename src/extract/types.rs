//! Core types for extraction results.

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

use crate::detect::{Monorepo, Stack};

/// Handler name used when a route's callback is written inline.
pub const HANDLER_INLINE: &str = "inline";
/// Handler name used when no handler could be found near a route.
pub const HANDLER_UNKNOWN: &str = "unknown";

/// Kind of a recovered definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    AsyncFunction,
    Class,
    Struct,
    Enum,
    Interface,
    Trait,
    Module,
    Namespace,
    Method,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::AsyncFunction => "async_function",
            SymbolKind::Class => "class",
            SymbolKind::Struct => "struct",
            SymbolKind::Enum => "enum",
            SymbolKind::Interface => "interface",
            SymbolKind::Trait => "trait",
            SymbolKind::Module => "module",
            SymbolKind::Namespace => "namespace",
            SymbolKind::Method => "method",
        }
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named definition and the line it starts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Line number (1-indexed)
    pub line: usize,
}

/// Symbols of one file, keyed by name.
///
/// Inserting a name that is already present replaces the earlier entry, so
/// the last definition in the file wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSymbols {
    by_name: BTreeMap<String, Symbol>,
}

impl FileSymbols {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, kind: SymbolKind, line: usize) {
        let name = name.into();
        self.by_name.insert(name.clone(), Symbol { name, kind, line });
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Symbols in ascending line order.
    pub fn by_line(&self) -> Vec<&Symbol> {
        let mut symbols: Vec<&Symbol> = self.by_name.values().collect();
        symbols.sort_by_key(|s| s.line);
        symbols
    }
}

impl Serialize for FileSymbols {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let symbols = self.by_line();
        let mut seq = serializer.serialize_seq(Some(symbols.len()))?;
        for symbol in symbols {
            seq.serialize_element(symbol)?;
        }
        seq.end()
    }
}

/// HTTP method of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    All,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::All => "ALL",
        }
    }

    /// Parse a method name in any case. `any` is accepted as an alias of `ALL`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            "ALL" | "ANY" => Some(HttpMethod::All),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A route declaration and the handler recovered near it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub method: HttpMethod,
    /// Route exactly as written, placeholders untouched.
    pub route: String,
    /// Handler name, or [`HANDLER_INLINE`] / [`HANDLER_UNKNOWN`].
    pub handler: String,
    pub file: String,
    pub line: usize,
}

impl Endpoint {
    /// Key used to deduplicate endpoints across the project.
    pub fn key(&self) -> String {
        format!("{} {}", self.method, self.route)
    }
}

/// UI framework a component was declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Vue,
    React,
    Svelte,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Vue => "vue",
            ComponentKind::React => "react",
            ComponentKind::Svelte => "svelte",
        }
    }

    /// Whether an earlier component with the same name is kept.
    ///
    /// React declarations keep the first occurrence; Vue and Svelte replace.
    pub fn first_wins(&self) -> bool {
        matches!(self, ComponentKind::React)
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A UI component declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiComponent {
    pub name: String,
    pub file: String,
    pub line: usize,
    pub kind: ComponentKind,
    #[serde(default)]
    pub props: Vec<String>,
    #[serde(default)]
    pub emits: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hooks: Vec<String>,
    /// String arguments of HTTP client calls in the same file.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_calls: Vec<String>,
}

/// File path -> symbols of that file.
pub type SymbolTable = BTreeMap<String, FileSymbols>;
/// Endpoint key -> endpoint.
pub type EndpointTable = BTreeMap<String, Endpoint>;
/// Component name -> component.
pub type ComponentTable = BTreeMap<String, UiComponent>;
/// Importing file -> imported tracked files.
pub type DependencyGraph = BTreeMap<String, BTreeSet<String>>;

/// Insert an endpoint, replacing any earlier one with the same key.
pub fn insert_endpoint(table: &mut EndpointTable, endpoint: Endpoint) {
    table.insert(endpoint.key(), endpoint);
}

/// Insert a component following its kind's collision policy.
pub fn insert_component(table: &mut ComponentTable, component: UiComponent) {
    if component.kind.first_wins() && table.contains_key(&component.name) {
        return;
    }
    table.insert(component.name.clone(), component);
}

/// Everything extracted from a single file.
#[derive(Debug, Clone, Default)]
pub struct FileFacts {
    pub path: String,
    pub language: String,
    pub lines: usize,
    pub symbols: FileSymbols,
    /// Endpoints in discovery order; later entries win on key collision.
    pub endpoints: Vec<Endpoint>,
    /// Components in discovery order.
    pub components: Vec<UiComponent>,
    pub dependencies: BTreeSet<String>,
}

/// Language tag and size of one scanned file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub language: String,
    pub lines: usize,
}

/// Totals describing the scanned files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSummary {
    pub files: usize,
    pub lines: usize,
    /// Display names of the languages seen, sorted.
    pub languages: Vec<String>,
    /// Frameworks named by manifest files at the project root.
    #[serde(default, skip_serializing_if = "Stack::is_empty")]
    pub frameworks: Stack,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monorepo: Option<Monorepo>,
    /// Every scanned file, including those with no extracted facts.
    #[serde(default)]
    pub file_map: BTreeMap<String, FileEntry>,
}

/// The four extraction results for a project.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectIndex {
    pub summary: IndexSummary,
    pub symbols: SymbolTable,
    pub endpoints: EndpointTable,
    pub components: ComponentTable,
    pub dependencies: DependencyGraph,
}

impl ProjectIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one file's facts into the project tables.
    ///
    /// Files must be absorbed in a fixed order for collisions to resolve the
    /// same way on every run.
    pub fn absorb(&mut self, facts: FileFacts) {
        self.summary.files += 1;
        self.summary.lines += facts.lines;
        if let Some(name) = crate::source::language_name(&facts.language) {
            if !self.summary.languages.iter().any(|l| l == name) {
                self.summary.languages.push(name.to_string());
                self.summary.languages.sort();
            }
        }
        self.summary.file_map.insert(
            facts.path.clone(),
            FileEntry {
                language: facts.language,
                lines: facts.lines,
            },
        );

        if !facts.symbols.is_empty() {
            self.symbols.insert(facts.path.clone(), facts.symbols);
        }
        for endpoint in facts.endpoints {
            insert_endpoint(&mut self.endpoints, endpoint);
        }
        for component in facts.components {
            insert_component(&mut self.components, component);
        }
        if !facts.dependencies.is_empty() {
            self.dependencies.insert(facts.path, facts.dependencies);
        }
    }

    /// Total number of symbols across all files.
    pub fn symbol_count(&self) -> usize {
        self.symbols.values().map(FileSymbols::len).sum()
    }
}
