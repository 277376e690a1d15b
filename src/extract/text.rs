//! Small text utilities shared by the extractors.
//!
//! Everything here works on byte offsets into UTF-8 text and only ever
//! slices at character boundaries, so arbitrary input cannot panic.

use regex::Regex;

/// Upper bound on how far the object scanner walks from the opening brace.
const MAX_BLOCK_BYTES: usize = 64 * 1024;

/// Maps byte offsets of a text to 1-based line numbers.
pub struct LineIndex {
    newlines: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let newlines = text
            .bytes()
            .enumerate()
            .filter(|(_, b)| *b == b'\n')
            .map(|(i, _)| i)
            .collect();
        Self { newlines }
    }

    /// Line containing `offset`: newlines strictly before it, plus one.
    pub fn line_of(&self, offset: usize) -> usize {
        self.newlines.partition_point(|&nl| nl < offset) + 1
    }
}

/// The text starting at `start` and spanning at most `chars` characters.
pub fn window(text: &str, start: usize, chars: usize) -> &str {
    let start = floor_boundary(text, start.min(text.len()));
    let rest = &text[start..];
    match rest.char_indices().nth(chars) {
        Some((end, _)) => &rest[..end],
        None => rest,
    }
}

fn floor_boundary(text: &str, mut idx: usize) -> usize {
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Uppercase the first character.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Contents of every single- or double-quoted string literal in `text`.
pub fn quoted_strings(text: &str) -> Vec<String> {
    lazy_static::lazy_static! {
        static ref QUOTED_RE: Regex = Regex::new(r#"'([^'\n]+)'|"([^"\n]+)""#).unwrap();
    }

    QUOTED_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Keys of the object literal (or TypeScript type literal) whose opening
/// brace sits at byte offset `open`.
///
/// Only top-level keys are returned: `{ a: { b: 1 }, c?: string }` yields
/// `a` and `c`. Quoted keys, `?:` optional markers, comments and string
/// values are handled; scanning stops at the matching close brace or after
/// a fixed byte budget.
pub fn object_keys(text: &str, open: usize) -> Vec<String> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return Vec::new();
    }

    let end = floor_boundary(text, (open + MAX_BLOCK_BYTES).min(text.len()));
    let mut keys = Vec::new();
    let mut depth = 0usize;
    let mut expect_key = false;
    let mut i = open;

    while i < end {
        let b = bytes[i];
        match b {
            b'{' | b'[' | b'(' => {
                depth += 1;
                expect_key = depth == 1;
                i += 1;
            }
            b'}' | b']' | b')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
                expect_key = false;
                i += 1;
            }
            b'"' | b'\'' | b'`' => {
                let close = string_end(bytes, i, end);
                if depth == 1 && expect_key && close < end && colon_follows(bytes, close + 1, end) {
                    keys.push(text[i + 1..close].to_string());
                }
                expect_key = false;
                i = close + 1;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < end && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < end && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i += 2;
            }
            b',' | b';' | b'\n' => {
                if depth == 1 {
                    expect_key = true;
                }
                i += 1;
            }
            c if depth == 1 && expect_key && is_ident_start(c) => {
                let start = i;
                while i < end && is_ident_continue(bytes[i]) {
                    i += 1;
                }
                let ident = &text[start..i];
                if colon_follows(bytes, i, end) {
                    keys.push(ident.to_string());
                    expect_key = false;
                } else {
                    // `readonly name: T` in type literals
                    expect_key = ident == "readonly";
                }
            }
            c => {
                if !c.is_ascii_whitespace() {
                    expect_key = false;
                }
                i += 1;
            }
        }
    }

    keys
}

/// Offset of the quote closing the string opened at `open` (or `end`).
fn string_end(bytes: &[u8], open: usize, end: usize) -> usize {
    let quote = bytes[open];
    let mut i = open + 1;
    while i < end {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i,
            _ => i += 1,
        }
    }
    end
}

/// Whether the next non-blank bytes at `from` are `:` or `?:`.
fn colon_follows(bytes: &[u8], from: usize, end: usize) -> bool {
    let mut i = from;
    while i < end && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    if i < end && bytes[i] == b'?' {
        i += 1;
    }
    i < end && bytes[i] == b':'
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}
