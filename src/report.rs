//! Output formatting for codeatlas results.
//!
//! Supports three output formats:
//! - Pretty: colored terminal listing for human readability
//! - JSON: the project index for programmatic consumption
//! - YAML: the same document as JSON, easier to diff by eye

use colored::*;
use serde::Serialize;
use std::io::Write;

use crate::extract::{ComponentKind, ProjectIndex, SymbolKind};

// =============================================================================
// Structured formats
// =============================================================================

/// Document written by the JSON and YAML formats.
#[derive(Serialize)]
pub struct Report<'a> {
    pub version: &'static str,
    pub path: &'a str,
    #[serde(flatten)]
    pub index: &'a ProjectIndex,
}

impl<'a> Report<'a> {
    pub fn new(path: &'a str, index: &'a ProjectIndex) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            path,
            index,
        }
    }
}

/// Write the index as pretty-printed JSON.
pub fn write_json<W: Write>(out: &mut W, path: &str, index: &ProjectIndex) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&Report::new(path, index))?;
    writeln!(out, "{}", json)?;
    Ok(())
}

/// Write the index as YAML.
pub fn write_yaml<W: Write>(out: &mut W, path: &str, index: &ProjectIndex) -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(&Report::new(path, index))?;
    write!(out, "{}", yaml)?;
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write the index in pretty (human-readable) format.
pub fn write_pretty<W: Write>(out: &mut W, path: &str, index: &ProjectIndex) -> anyhow::Result<()> {
    // Header
    writeln!(out)?;
    writeln!(
        out,
        "  {} v{}",
        "codeatlas".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(out)?;
    writeln!(out, "  {}{}", "Scanning:  ".dimmed(), path)?;
    if !index.summary.languages.is_empty() {
        writeln!(
            out,
            "  {}{}",
            "Languages: ".dimmed(),
            index.summary.languages.join(", ")
        )?;
    }
    let stack = &index.summary.frameworks;
    for (label, names) in [
        ("Backend:   ", &stack.backend),
        ("Frontend:  ", &stack.frontend),
        ("Tooling:   ", &stack.other),
    ] {
        if !names.is_empty() {
            writeln!(out, "  {}{}", label.dimmed(), names.join(", "))?;
        }
    }
    if let Some(monorepo) = &index.summary.monorepo {
        writeln!(
            out,
            "  {}{} {}",
            "Monorepo:  ".dimmed(),
            monorepo.tool,
            format!("[{}]", monorepo.workspaces.join(", ")).dimmed()
        )?;
    }
    writeln!(out)?;

    write_summary(out, index)?;
    writeln!(out)?;

    if !index.symbols.is_empty() {
        write_symbols(out, index)?;
        writeln!(out)?;
    }
    if !index.endpoints.is_empty() {
        write_endpoints(out, index)?;
        writeln!(out)?;
    }
    if !index.components.is_empty() {
        write_components(out, index)?;
        writeln!(out)?;
    }
    if !index.dependencies.is_empty() {
        write_dependencies(out, index)?;
        writeln!(out)?;
    }
    Ok(())
}

fn write_summary<W: Write>(out: &mut W, index: &ProjectIndex) -> anyhow::Result<()> {
    writeln!(
        out,
        "  {} files, {} lines  {}",
        index.summary.files,
        index.summary.lines,
        format!(
            "({} symbols, {} endpoints, {} components, {} files with imports)",
            index.symbol_count(),
            index.endpoints.len(),
            index.components.len(),
            index.dependencies.len()
        )
        .dimmed()
    )?;
    Ok(())
}

fn write_symbols<W: Write>(out: &mut W, index: &ProjectIndex) -> anyhow::Result<()> {
    writeln!(out, "  {} ({}):", "Symbols".bold(), index.symbol_count())?;
    for (file, symbols) in &index.symbols {
        writeln!(out)?;
        writeln!(out, "    {}", file.blue())?;
        for symbol in symbols.by_line() {
            writeln!(
                out,
                "      {:>5}  {}  {}",
                format!("{}", symbol.line).dimmed(),
                kind_tag(symbol.kind),
                symbol.name
            )?;
        }
    }
    Ok(())
}

fn kind_tag(kind: SymbolKind) -> ColoredString {
    let tag = format!("{:<14}", kind.as_str());
    match kind {
        SymbolKind::Class | SymbolKind::Struct | SymbolKind::Enum => tag.yellow(),
        SymbolKind::Interface | SymbolKind::Trait => tag.magenta(),
        SymbolKind::Module | SymbolKind::Namespace => tag.cyan(),
        _ => tag.green(),
    }
}

fn write_endpoints<W: Write>(out: &mut W, index: &ProjectIndex) -> anyhow::Result<()> {
    writeln!(out, "  {} ({}):", "Endpoints".bold(), index.endpoints.len())?;
    writeln!(out)?;
    for endpoint in index.endpoints.values() {
        writeln!(
            out,
            "    {:<7}{:<40} {} {}{}",
            endpoint.method.as_str().green().bold(),
            endpoint.route,
            endpoint.handler,
            endpoint.file.blue(),
            format!(":{}", endpoint.line).dimmed()
        )?;
    }
    Ok(())
}

fn write_components<W: Write>(out: &mut W, index: &ProjectIndex) -> anyhow::Result<()> {
    writeln!(out, "  {} ({}):", "Components".bold(), index.components.len())?;
    writeln!(out)?;
    for component in index.components.values() {
        let kind = match component.kind {
            ComponentKind::Vue => "vue   ".green(),
            ComponentKind::React => "react ".cyan(),
            ComponentKind::Svelte => "svelte".red(),
        };
        writeln!(
            out,
            "    {} {:<24} {}{}",
            kind,
            component.name,
            component.file.blue(),
            format!(":{}", component.line).dimmed()
        )?;
        for (label, values) in [
            ("props", &component.props),
            ("emits", &component.emits),
            ("hooks", &component.hooks),
            ("api", &component.api_calls),
        ] {
            if !values.is_empty() {
                writeln!(out, "           {} {}", format!("{}:", label).dimmed(), values.join(", "))?;
            }
        }
    }
    Ok(())
}

fn write_dependencies<W: Write>(out: &mut W, index: &ProjectIndex) -> anyhow::Result<()> {
    writeln!(out, "  {} ({}):", "Dependencies".bold(), index.dependencies.len())?;
    writeln!(out)?;
    for (file, targets) in &index.dependencies {
        writeln!(out, "    {}", file.blue())?;
        for target in targets {
            writeln!(out, "      {} {}", "->".dimmed(), target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::extract::Runner;
    use crate::source::SourceFile;

    fn index() -> ProjectIndex {
        let files = vec![
            SourceFile::from_text("app.py", "import models\n@app.route('/x')\ndef x():\n    pass\n"),
            SourceFile::from_text("models.py", "class User:\n    pass\n"),
        ];
        Runner::default().run_files(&files, &Diagnostics::quiet())
    }

    #[test]
    fn test_json_shape() {
        let mut buf = Vec::new();
        write_json(&mut buf, "proj", &index()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["path"], "proj");
        assert_eq!(value["summary"]["files"], 2);
        assert_eq!(value["symbols"]["models.py"][0]["name"], "User");
        assert_eq!(value["endpoints"]["GET /x"]["handler"], "x");
        assert_eq!(value["dependencies"]["app.py"][0], "models.py");
    }

    #[test]
    fn test_yaml_parses_back() {
        let mut buf = Vec::new();
        write_yaml(&mut buf, "proj", &index()).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_slice(&buf).unwrap();
        assert_eq!(value["endpoints"]["GET /x"]["line"].as_u64(), Some(2));
    }

    #[test]
    fn test_pretty_lists_sections() {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        write_pretty(&mut buf, "proj", &index()).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("Scanning:  proj"));
        assert!(text.contains("Endpoints (1):"));
        assert!(text.contains("GET    /x"));
        assert!(text.contains("-> models.py"));
        assert!(!text.contains("Components"));
        assert!(!text.contains("Backend:"));
    }

    #[test]
    fn test_pretty_lists_stack() {
        colored::control::set_override(false);
        let mut project = index();
        project.summary.frameworks.backend = vec!["Flask".to_string()];
        project.summary.monorepo = Some(crate::detect::Monorepo {
            tool: "pnpm".to_string(),
            workspaces: vec!["apps/*".to_string()],
        });
        let mut buf = Vec::new();
        write_pretty(&mut buf, "proj", &project).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("Backend:   Flask"));
        assert!(text.contains("Monorepo:  pnpm [apps/*]"));
        assert!(!text.contains("Frontend:"));
    }

    #[test]
    fn test_json_omits_empty_stack() {
        let mut buf = Vec::new();
        write_json(&mut buf, "proj", &index()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        let summary = value["summary"].as_object().unwrap();
        assert!(!summary.contains_key("frameworks"));
        assert!(!summary.contains_key("monorepo"));
        assert_eq!(value["summary"]["file_map"]["models.py"]["lines"], 2);
    }
}
