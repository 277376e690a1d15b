//! Symbol extraction: named definitions with their line numbers.
//!
//! Every language has an ordered table of line patterns. Each line is tried
//! against the table top to bottom and the first pattern that matches
//! produces the symbol, so a line yields at most one symbol. The table is
//! plain data: supporting a new language means adding a table and an entry
//! in [`LANGUAGE_TABLES`].
//!
//! Python is the exception. Its definitions depend on indentation and on the
//! decorators stacked above them, which is handled by the state machine in
//! [`super::python`].

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use super::python;
use super::types::{FileSymbols, SymbolKind, SymbolTable};
use crate::diagnostics::Diagnostics;
use crate::source::SourceFile;

/// A pattern source and the kind of symbol it produces. The pattern must
/// have a `name` group; an optional `ty` group holds a return-type slot.
pub(crate) type PatternSpec = (&'static str, SymbolKind);

/// Captures that are statements, not definitions (`if (x) {` looks like a
/// method to the bare-call pattern).
const CONTROL_FLOW: &[&str] = &[
    "if", "for", "while", "switch", "return", "else", "catch", "function",
];

/// Words that can sit in Java's return-type slot of a call statement.
const NOT_A_TYPE: &[&str] = &["return", "new", "throw", "else", "case", "await"];

const JS_PATTERNS: &[PatternSpec] = &[
    (
        r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?\bfunction\b\s*\*?\s*(?P<name>\w+)",
        SymbolKind::Function,
    ),
    (
        r"^\s*(?:export\s+)?(?:const|let|var)\s+(?P<name>\w+)\s*(?::[^=]+)?=\s*(?:async\s*)?(?:\(|\w+\s*=>)",
        SymbolKind::Function,
    ),
    (
        r"^\s*(?:export\s+)?const\s+(?P<name>\w+)\s*(?::[^=]+)?=\s*\{",
        SymbolKind::Namespace,
    ),
    (
        r"^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(?P<name>\w+)",
        SymbolKind::Class,
    ),
    (
        r"^\s*(?:export\s+)?(?:declare\s+)?interface\s+(?P<name>\w+)",
        SymbolKind::Interface,
    ),
    (
        r"^\s*(?:(?:static|async|public|private|protected|override|get|set)\s+)*(?P<name>\w+)\s*\(.*\)\s*(?::[^{]*)?\{",
        SymbolKind::Method,
    ),
];

const GO_PATTERNS: &[PatternSpec] = &[
    (
        r"^func\s+\([^)]*\)\s*(?P<name>\w+)\s*[\[(]",
        SymbolKind::Method,
    ),
    (r"^func\s+(?P<name>\w+)\s*[\[(]", SymbolKind::Function),
    (
        r"^type\s+(?P<name>\w+)(?:\[[^\]]*\])?\s+struct\b",
        SymbolKind::Struct,
    ),
    (
        r"^type\s+(?P<name>\w+)(?:\[[^\]]*\])?\s+interface\b",
        SymbolKind::Interface,
    ),
];

const RUST_PATTERNS: &[PatternSpec] = &[
    (
        r#"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:(?:const|async|unsafe|extern(?:\s+"[^"]*")?)\s+)*fn\s+(?P<name>\w+)"#,
        SymbolKind::Function,
    ),
    (
        r"^\s*(?:pub(?:\([^)]*\))?\s+)?struct\s+(?P<name>\w+)",
        SymbolKind::Struct,
    ),
    (
        r"^\s*(?:pub(?:\([^)]*\))?\s+)?enum\s+(?P<name>\w+)",
        SymbolKind::Enum,
    ),
    (
        r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:unsafe\s+)?trait\s+(?P<name>\w+)",
        SymbolKind::Trait,
    ),
    (
        r"^\s*(?:unsafe\s+)?impl(?:<[^>]*>)?\s+(?:!?[\w:]+(?:<[^>]*>)?\s+for\s+)?(?:\w+::)*(?P<name>\w+)",
        SymbolKind::Class,
    ),
    (
        r"^\s*(?:pub(?:\([^)]*\))?\s+)?mod\s+(?P<name>\w+)",
        SymbolKind::Module,
    ),
];

const JAVA_PATTERNS: &[PatternSpec] = &[
    (
        r"^\s*(?:(?:public|private|protected)\s+)?(?:(?:static|final|abstract|synchronized|native|default)\s+)*(?:<[^>]*>\s+)?(?P<ty>[\w.]+(?:<[^>]*>)?(?:\[\])*)\s+(?P<name>\w+)\s*\(",
        SymbolKind::Method,
    ),
    (
        r"^\s*(?:(?:public|private|protected|abstract|final|static|sealed)\s+)*class\s+(?P<name>\w+)",
        SymbolKind::Class,
    ),
    (
        r"^\s*(?:(?:public|private|protected|abstract|static|sealed)\s+)*interface\s+(?P<name>\w+)",
        SymbolKind::Interface,
    ),
    (
        r"^\s*(?:(?:public|private|protected|static)\s+)*enum\s+(?P<name>\w+)",
        SymbolKind::Enum,
    ),
];

const RUBY_PATTERNS: &[PatternSpec] = &[
    (
        r"^\s*def\s+(?:self\.)?(?P<name>\w+[?!=]?)",
        SymbolKind::Method,
    ),
    (r"^\s*class\s+(?P<name>[\w:]+)", SymbolKind::Class),
    (r"^\s*module\s+(?P<name>[\w:]+)", SymbolKind::Module),
];

const PHP_PATTERNS: &[PatternSpec] = &[
    (
        r"^\s*(?:(?:public|private|protected|static|abstract|final)\s+)*function\s+&?(?P<name>\w+)",
        SymbolKind::Function,
    ),
    (
        r"^\s*(?:(?:abstract|final|readonly)\s+)*class\s+(?P<name>\w+)",
        SymbolKind::Class,
    ),
    (r"^\s*trait\s+(?P<name>\w+)", SymbolKind::Trait),
    (r"^\s*interface\s+(?P<name>\w+)", SymbolKind::Interface),
    (r"^\s*namespace\s+(?P<name>[\w\\]+)", SymbolKind::Namespace),
];

/// Language tag -> pattern table. TypeScript and the JSX dialects share the
/// JavaScript table.
static LANGUAGE_TABLES: phf::Map<&'static str, &'static [PatternSpec]> = phf::phf_map! {
    "py" => python::PATTERNS,
    "js" => JS_PATTERNS,
    "mjs" => JS_PATTERNS,
    "cjs" => JS_PATTERNS,
    "jsx" => JS_PATTERNS,
    "ts" => JS_PATTERNS,
    "tsx" => JS_PATTERNS,
    "go" => GO_PATTERNS,
    "rs" => RUST_PATTERNS,
    "java" => JAVA_PATTERNS,
    "rb" => RUBY_PATTERNS,
    "php" => PHP_PATTERNS,
};

/// A compiled table entry.
pub(crate) struct SymbolPattern {
    pub(crate) regex: Regex,
    pub(crate) kind: SymbolKind,
}

/// Compiled tables, built on first use.
static COMPILED: Lazy<HashMap<&'static str, Vec<SymbolPattern>>> = Lazy::new(|| {
    LANGUAGE_TABLES
        .entries()
        .map(|(lang, specs)| (*lang, compile(specs)))
        .collect()
});

pub(crate) fn compile(specs: &[PatternSpec]) -> Vec<SymbolPattern> {
    specs
        .iter()
        .map(|(source, kind)| SymbolPattern {
            regex: Regex::new(source).unwrap(),
            kind: *kind,
        })
        .collect()
}

/// Whether a pattern table exists for the language tag.
pub fn is_supported(language: &str) -> bool {
    LANGUAGE_TABLES.contains_key(language)
}

/// Extract symbols from every file. Files without symbols are omitted.
pub fn extract_symbols(files: &[SourceFile], diag: &Diagnostics) -> SymbolTable {
    let mut table = SymbolTable::new();
    for file in files {
        let symbols = extract_file_symbols(file, diag);
        if !symbols.is_empty() {
            table.insert(file.path.clone(), symbols);
        }
    }
    diag.note(
        1,
        format!(
            "symbols: {} across {} files",
            table.values().map(FileSymbols::len).sum::<usize>(),
            table.len()
        ),
    );
    table
}

/// Extract symbols from a single file.
pub fn extract_file_symbols(file: &SourceFile, diag: &Diagnostics) -> FileSymbols {
    if file.language == "py" {
        return python::extract(&file.lines);
    }

    let Some(patterns) = COMPILED.get(file.language.as_str()) else {
        diag.note(3, format!("{}: no symbol table for {:?}", file.path, file.language));
        return FileSymbols::new();
    };

    let mut symbols = FileSymbols::new();
    for (idx, line) in file.lines.iter().enumerate() {
        if let Some((name, kind)) = match_line(patterns, line) {
            symbols.insert(name, kind, idx + 1);
        }
    }

    if !symbols.is_empty() {
        diag.note(2, format!("{}: {} symbols", file.path, symbols.len()));
    }
    symbols
}

/// First pattern in the table that matches the line with an acceptable name.
fn match_line(patterns: &[SymbolPattern], line: &str) -> Option<(String, SymbolKind)> {
    for p in patterns {
        let Some(caps) = p.regex.captures(line) else {
            continue;
        };
        let Some(name) = caps.name("name") else {
            continue;
        };
        let name = name.as_str();
        if CONTROL_FLOW.contains(&name) {
            continue;
        }
        if let Some(ty) = caps.name("ty") {
            if NOT_A_TYPE.contains(&ty.as_str()) {
                continue;
            }
        }
        return Some((name.to_string(), p.kind));
    }
    None
}
