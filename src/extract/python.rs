//! Python symbol extraction.
//!
//! Every line falls into one of four classes: decorator, definition, blank
//! (or comment), other. Two pieces of state are carried between lines:
//!
//! - the enclosing class, set by any `class` line and cleared by a
//!   definition at indentation zero;
//! - the decorators stacked since the last definition. Blank and comment
//!   lines keep them; any other non-decorator line drops them.
//!
//! Indented definitions inside a class are recorded as `Class.method`.
//! Well-known decorators add a prefix such as `"@property "` to the name.

use regex::Regex;

use super::symbols::{compile, PatternSpec, SymbolPattern};
use super::types::{FileSymbols, SymbolKind};

pub(crate) const PATTERNS: &[PatternSpec] = &[
    (
        r"^(?P<indent>[ \t]*)def\s+(?P<name>\w+)\s*\(",
        SymbolKind::Function,
    ),
    (
        r"^(?P<indent>[ \t]*)async\s+def\s+(?P<name>\w+)\s*\(",
        SymbolKind::AsyncFunction,
    ),
    (r"^(?P<indent>[ \t]*)class\s+(?P<name>\w+)", SymbolKind::Class),
];

/// Decorators that show up in symbol names, and the prefix they add.
static DECORATOR_PREFIXES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "dataclass" => "@dataclass ",
    "dataclasses.dataclass" => "@dataclass ",
    "property" => "@property ",
    "abstractmethod" => "@abstract ",
    "abc.abstractmethod" => "@abstract ",
    "staticmethod" => "@static ",
    "classmethod" => "@classmethod ",
};

lazy_static::lazy_static! {
    static ref COMPILED: Vec<SymbolPattern> = compile(PATTERNS);
    static ref DECORATOR_RE: Regex =
        Regex::new(r"^[ \t]*@(?P<name>[A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)").unwrap();
}

/// What a single line means to the state machine.
#[derive(Debug, PartialEq, Eq)]
enum LineClass<'a> {
    Decorator(&'a str),
    Definition {
        indent: usize,
        name: &'a str,
        kind: SymbolKind,
    },
    Blank,
    Other,
}

fn classify(line: &str) -> LineClass<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return LineClass::Blank;
    }

    if let Some(caps) = DECORATOR_RE.captures(line) {
        if let Some(name) = caps.name("name") {
            return LineClass::Decorator(name.as_str());
        }
    }

    for p in COMPILED.iter() {
        if let Some(caps) = p.regex.captures(line) {
            if let (Some(indent), Some(name)) = (caps.name("indent"), caps.name("name")) {
                return LineClass::Definition {
                    indent: indent.as_str().len(),
                    name: name.as_str(),
                    kind: p.kind,
                };
            }
        }
    }

    LineClass::Other
}

/// State carried from one line to the next.
#[derive(Debug, Default)]
struct Scope {
    current_class: Option<String>,
    pending_decorators: Vec<String>,
}

impl Scope {
    fn feed(&mut self, line: &str, line_number: usize, symbols: &mut FileSymbols) {
        match classify(line) {
            LineClass::Blank => {}
            LineClass::Other => self.pending_decorators.clear(),
            LineClass::Decorator(name) => self.pending_decorators.push(name.to_string()),
            LineClass::Definition { indent, name, kind } => {
                let prefix = self.take_prefix();
                if kind == SymbolKind::Class {
                    self.current_class = Some(name.to_string());
                    symbols.insert(format!("{}{}", prefix, name), kind, line_number);
                    return;
                }

                let qualified = match &self.current_class {
                    Some(class) if indent > 0 => Some(format!("{}{}.{}", prefix, class, name)),
                    _ => None,
                };
                match qualified {
                    Some(qualified) => {
                        let kind = match kind {
                            SymbolKind::AsyncFunction => SymbolKind::AsyncFunction,
                            _ => SymbolKind::Method,
                        };
                        symbols.insert(qualified, kind, line_number);
                    }
                    None => {
                        self.current_class = None;
                        symbols.insert(format!("{}{}", prefix, name), kind, line_number);
                    }
                }
            }
        }
    }

    /// Prefix for the pending decorators; empties the pending list.
    fn take_prefix(&mut self) -> String {
        self.pending_decorators
            .drain(..)
            .filter_map(|d| DECORATOR_PREFIXES.get(d.as_str()).copied())
            .collect()
    }
}

/// Extract symbols from the lines of a Python file.
pub(crate) fn extract(lines: &[String]) -> FileSymbols {
    let mut symbols = FileSymbols::new();
    let mut scope = Scope::default();
    for (idx, line) in lines.iter().enumerate() {
        scope.feed(line, idx + 1, &mut symbols);
    }
    symbols
}
