//! Source files as the extractors see them.
//!
//! A [`SourceFile`] is an immutable snapshot of one tracked file: its
//! project-relative path, a language tag (the lowercase extension) and the
//! file content split into newline-terminated lines.

use std::path::Path;

/// One tracked file of the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Project-relative path with `/` separators.
    pub path: String,
    /// Lowercase extension without the dot (`"py"`, `"tsx"`, ...).
    pub language: String,
    /// Lines in order, each keeping its trailing newline.
    pub lines: Vec<String>,
}

impl SourceFile {
    /// Build a source file from already split lines.
    pub fn new(path: impl Into<String>, lines: Vec<String>) -> Self {
        let path = normalize_separators(&path.into());
        let language = language_of(&path);
        Self {
            path,
            language,
            lines,
        }
    }

    /// Build a source file from its full text.
    pub fn from_text(path: impl Into<String>, text: &str) -> Self {
        Self::new(path, split_lines(text))
    }

    /// The whole file content, lines joined back together.
    pub fn content(&self) -> String {
        self.lines.concat()
    }

    /// Number of lines in the file.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// File name including extension.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// File name without its last extension.
    pub fn stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => name,
            Some(idx) => &name[..idx],
        }
    }

    /// Directory part of the path (`""` for files at the root).
    pub fn dir(&self) -> &str {
        parent_dir(&self.path)
    }
}

/// Split text into lines, keeping each line's `\n`.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_string).collect()
}

/// Lowercase extension of a path, without the dot.
pub fn language_of(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Directory part of a `/`-separated path.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Convert `\` separators and strip a leading `./`.
pub fn normalize_separators(path: &str) -> String {
    let path = path.replace('\\', "/");
    match path.strip_prefix("./") {
        Some(rest) => rest.to_string(),
        None => path,
    }
}

/// Human readable language names by extension.
static LANGUAGE_NAMES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "py" => "Python",
    "js" => "JavaScript",
    "mjs" => "JavaScript",
    "cjs" => "JavaScript",
    "ts" => "TypeScript",
    "tsx" => "TypeScript (React)",
    "jsx" => "JavaScript (React)",
    "vue" => "Vue",
    "svelte" => "Svelte",
    "java" => "Java",
    "kt" => "Kotlin",
    "go" => "Go",
    "rs" => "Rust",
    "rb" => "Ruby",
    "php" => "PHP",
    "cs" => "C#",
    "c" => "C",
    "cpp" => "C++",
    "html" => "HTML",
    "css" => "CSS",
    "scss" => "SCSS",
};

/// Display name for a language tag, if it is a programming language we report.
pub fn language_name(language: &str) -> Option<&'static str> {
    LANGUAGE_NAMES.get(language).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_keeps_newlines() {
        let file = SourceFile::from_text("src/app.py", "a\nb\n\nc");
        assert_eq!(file.lines, vec!["a\n", "b\n", "\n", "c"]);
        assert_eq!(file.content(), "a\nb\n\nc");
        assert_eq!(file.language, "py");
        assert_eq!(file.line_count(), 4);
    }

    #[test]
    fn test_path_parts() {
        let file = SourceFile::from_text(".\\src\\components\\Button.VUE", "");
        assert_eq!(file.path, "src/components/Button.VUE");
        assert_eq!(file.language, "vue");
        assert_eq!(file.file_name(), "Button.VUE");
        assert_eq!(file.stem(), "Button");
        assert_eq!(file.dir(), "src/components");

        let root = SourceFile::from_text("main.go", "");
        assert_eq!(root.dir(), "");
        assert_eq!(root.stem(), "main");
    }

    #[test]
    fn test_language_name() {
        assert_eq!(language_name("tsx"), Some("TypeScript (React)"));
        assert_eq!(language_name("md"), None);
    }
}
