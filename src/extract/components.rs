//! UI component extraction for Vue, React and Svelte.
//!
//! Each file is offered to the three framework branches independently. A
//! branch decides from the extension and, for plain `.js`/`.ts` files, from
//! what the content mentions.

use regex::Regex;
use std::collections::{BTreeMap, HashSet};

use super::text::{capitalize, object_keys, quoted_strings, LineIndex};
use super::types::{insert_component, ComponentKind, ComponentTable, UiComponent};
use crate::diagnostics::Diagnostics;
use crate::source::SourceFile;

/// Hooks kept per React file.
const MAX_HOOKS: usize = 10;

lazy_static::lazy_static! {
    // Vue
    static ref VUE_NAME_RE: Regex = Regex::new(r#"\bname\s*:\s*['"](\w+)['"]"#).unwrap();
    static ref VUE_ASSIGN_RE: Regex = Regex::new(
        r"\b(?:const|let|var)\s+(\w+)\s*=\s*(?:defineComponent|createApp)\s*\("
    ).unwrap();
    static ref PROPS_ARRAY_RE: Regex = Regex::new(
        r"(?:\bprops\s*:\s*|\bdefineProps\s*\(\s*)\[([^\]]*)\]"
    ).unwrap();
    static ref PROPS_OBJECT_RE: Regex = Regex::new(
        r"(?:\bprops\s*:\s*|\bdefineProps\s*\(\s*|\bdefineProps\s*<\s*)\{"
    ).unwrap();
    static ref EMITS_ARRAY_RE: Regex = Regex::new(
        r"(?:\bemits\s*:\s*|\bdefineEmits\s*\(\s*)\[([^\]]*)\]"
    ).unwrap();
    static ref EMITS_OBJECT_RE: Regex = Regex::new(
        r"(?:\bemits\s*:\s*|\bdefineEmits\s*\(\s*)\{"
    ).unwrap();
    static ref TEMPLATE_RE: Regex = Regex::new(r"<template\b|\btemplate\s*:").unwrap();

    // React
    static ref REACT_FUNCTION_RE: Regex = Regex::new(r"\bfunction\s+([A-Z]\w*)\s*\(").unwrap();
    static ref REACT_CONST_RE: Regex = Regex::new(
        r"\bconst\s+([A-Z]\w*)\s*(?::\s*[^=\n]+)?=\s*(?:(?:React\.)?(?:memo|forwardRef)\s*\(\s*)?(?:async\s*)?\("
    ).unwrap();
    static ref HOOK_RE: Regex = Regex::new(r"\buse[A-Z]\w+").unwrap();
    static ref PROPS_DECL_RE: Regex = Regex::new(
        r"\b(?:interface\s+(\w+)Props\b[^{;]*|type\s+(\w+)Props\s*=\s*)\{"
    ).unwrap();

    // Svelte
    static ref EXPORT_LET_RE: Regex = Regex::new(r"\bexport\s+let\s+(\w+)").unwrap();
    static ref DISPATCH_RE: Regex = Regex::new(r#"\bdispatch\(\s*['"]([^'"]+)['"]"#).unwrap();

    static ref API_CALL_RE: Regex = Regex::new(
        r#"(?:\bfetch|\baxios(?:\.\w+)?|\$http\.\w+|\b\w*[Aa]pi\.\w+)\(\s*['"`]([^'"`]+)"#
    ).unwrap();
}

/// Extract components from every file, applying each kind's collision policy.
pub fn extract_components(files: &[SourceFile], diag: &Diagnostics) -> ComponentTable {
    let mut table = ComponentTable::new();
    for file in files {
        for component in extract_file_components(file, diag) {
            insert_component(&mut table, component);
        }
    }
    diag.note(1, format!("components: {}", table.len()));
    table
}

/// Components declared in one file, in the order they were found.
pub fn extract_file_components(file: &SourceFile, diag: &Diagnostics) -> Vec<UiComponent> {
    let content = file.content();
    let lines = LineIndex::new(&content);
    let mut found = Vec::new();

    if applies_vue(file, &content) {
        found.extend(vue_component(file, &content, &lines));
    }
    if applies_react(file, &content) {
        found.extend(react_components(file, &content, &lines));
    }
    if file.language == "svelte" {
        found.push(svelte_component(file, &content));
    }

    if !found.is_empty() {
        let api_calls = api_calls(&content);
        for component in found.iter_mut() {
            component.api_calls = api_calls.clone();
        }
        diag.note(2, format!("{}: {} components", file.path, found.len()));
    }
    found
}

fn applies_vue(file: &SourceFile, content: &str) -> bool {
    match file.language.as_str() {
        "vue" => true,
        "js" | "ts" => content.contains("defineComponent") || content.contains("createApp"),
        _ => false,
    }
}

fn applies_react(file: &SourceFile, content: &str) -> bool {
    match file.language.as_str() {
        "jsx" | "tsx" => true,
        "js" | "ts" => {
            content.contains("React") || content.contains("react") || content.contains("jsx")
        }
        _ => false,
    }
}

fn component(file: &SourceFile, name: String, line: usize, kind: ComponentKind) -> UiComponent {
    UiComponent {
        name,
        file: file.path.clone(),
        line,
        kind,
        props: Vec::new(),
        emits: Vec::new(),
        hooks: Vec::new(),
        api_calls: Vec::new(),
    }
}

fn vue_component(file: &SourceFile, content: &str, lines: &LineIndex) -> Option<UiComponent> {
    let (name, line) = if let Some(caps) = VUE_NAME_RE.captures(content) {
        let m = caps.get(1)?;
        (m.as_str().to_string(), lines.line_of(m.start()))
    } else if file.language == "vue" {
        (capitalize(file.stem()), 1)
    } else {
        let m = VUE_ASSIGN_RE.captures(content)?.get(1)?;
        (m.as_str().to_string(), lines.line_of(m.start()))
    };

    let props = declared_names(content, &PROPS_ARRAY_RE, &PROPS_OBJECT_RE);
    let emits = declared_names(content, &EMITS_ARRAY_RE, &EMITS_OBJECT_RE);
    if props.is_empty() && emits.is_empty() && !TEMPLATE_RE.is_match(content) {
        return None;
    }

    let mut vue = component(file, name, line, ComponentKind::Vue);
    vue.props = props;
    vue.emits = emits;
    Some(vue)
}

/// Names from an array literal of strings, or else the keys of an object.
fn declared_names(content: &str, array: &Regex, object: &Regex) -> Vec<String> {
    if let Some(list) = array.captures(content).and_then(|caps| caps.get(1)) {
        return quoted_strings(list.as_str());
    }
    match object.find(content) {
        Some(m) => object_keys(content, m.end() - 1),
        None => Vec::new(),
    }
}

fn react_components(file: &SourceFile, content: &str, lines: &LineIndex) -> Vec<UiComponent> {
    let mut declared: Vec<(usize, &str)> = REACT_FUNCTION_RE
        .captures_iter(content)
        .chain(REACT_CONST_RE.captures_iter(content))
        .filter_map(|caps| caps.get(1))
        .map(|m| (m.start(), m.as_str()))
        .collect();
    declared.sort_by_key(|(offset, _)| *offset);

    if declared.is_empty() {
        return Vec::new();
    }

    let hooks = hooks(content);
    let mut props = props_declarations(content);

    let mut seen = HashSet::new();
    let mut components = Vec::new();
    for (offset, name) in declared {
        if !seen.insert(name) {
            continue;
        }
        let mut react = component(file, name.to_string(), lines.line_of(offset), ComponentKind::React);
        react.hooks = hooks.clone();
        react.props = props.remove(name).unwrap_or_default();
        components.push(react);
    }
    components
}

/// Distinct hook names in order of first use.
fn hooks(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    HOOK_RE
        .find_iter(content)
        .map(|m| m.as_str())
        .filter(|hook| seen.insert(*hook))
        .take(MAX_HOOKS)
        .map(str::to_string)
        .collect()
}

/// Component name -> keys of its `XProps` interface or type literal.
fn props_declarations(content: &str) -> BTreeMap<&str, Vec<String>> {
    let mut props = BTreeMap::new();
    for caps in PROPS_DECL_RE.captures_iter(content) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1).or_else(|| caps.get(2))) else {
            continue;
        };
        props
            .entry(name.as_str())
            .or_insert_with(|| object_keys(content, whole.end() - 1));
    }
    props
}

fn svelte_component(file: &SourceFile, content: &str) -> UiComponent {
    let mut svelte = component(file, capitalize(file.stem()), 1, ComponentKind::Svelte);
    svelte.props = EXPORT_LET_RE
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .collect();
    svelte.emits = DISPATCH_RE
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .collect();
    svelte
}

/// Distinct string targets of HTTP client calls, in order of appearance.
fn api_calls(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    API_CALL_RE
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|target| seen.insert(*target))
        .map(str::to_string)
        .collect()
}
