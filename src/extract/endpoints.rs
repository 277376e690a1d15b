//! HTTP endpoint extraction.
//!
//! Route declarations are found by scanning the whole file content once per
//! framework convention. The handler is recovered with a fixed-size forward
//! window after the declaration; when nothing is found inside the window the
//! handler is a sentinel ([`HANDLER_UNKNOWN`] or [`HANDLER_INLINE`]).

use regex::{Captures, Regex};

use super::text::{quoted_strings, window, LineIndex};
use super::types::{
    insert_endpoint, Endpoint, EndpointTable, HttpMethod, HANDLER_INLINE, HANDLER_UNKNOWN,
};
use crate::diagnostics::Diagnostics;
use crate::source::SourceFile;

/// Characters searched for a handler after a Flask `@x.route(...)`.
const FLASK_HANDLER_WINDOW: usize = 200;
/// Characters searched for a handler after `app.get(...)` / `@x.get(...)`.
const CALL_HANDLER_WINDOW: usize = 300;
/// Characters searched for a controller after `Route::get(...)`.
const LARAVEL_HANDLER_WINDOW: usize = 200;
/// Characters searched for a method signature after `@Get(...)`.
const NEST_HANDLER_WINDOW: usize = 100;

lazy_static::lazy_static! {
    static ref FLASK_RE: Regex = Regex::new(
        r#"@\w+\.route\(\s*['"]([^'"]+)['"](?:[^)]*?\bmethods\s*=\s*[\[(]([^\])]*)[\])])?"#
    ).unwrap();
    static ref CALL_RE: Regex = Regex::new(
        r#"(?:@\w+|\b(?:app|router))\.(get|post|put|patch|delete|all)\(\s*['"]([^'"]+)['"]"#
    ).unwrap();
    static ref DJANGO_RE: Regex = Regex::new(
        r#"\b(?:re_)?path\(\s*r?['"]([^'"]*)['"]\s*,\s*([\w.]+)"#
    ).unwrap();
    static ref LARAVEL_RE: Regex = Regex::new(
        r#"Route::(get|post|put|patch|delete|any)\(\s*['"]([^'"]+)['"]"#
    ).unwrap();
    static ref NEST_CONTROLLER_RE: Regex = Regex::new(
        r#"@Controller\(\s*(?:['"]([^'"]*)['"])?"#
    ).unwrap();
    static ref NEST_ROUTE_RE: Regex = Regex::new(
        r#"@(Get|Post|Put|Patch|Delete|All)\(\s*(?:['"]([^'"]*)['"])?\s*\)"#
    ).unwrap();

    static ref PY_DEF_RE: Regex = Regex::new(r"\bdef\s+(\w+)").unwrap();
    static ref DEF_OR_FUNCTION_RE: Regex = Regex::new(r"\b(?:def|function)\s+(\w+)").unwrap();
    static ref LARAVEL_ARRAY_RE: Regex = Regex::new(
        r#"\[\s*\\?([\w\\]+)::class\s*,\s*['"](\w+)['"]"#
    ).unwrap();
    static ref LARAVEL_AT_RE: Regex = Regex::new(r#"['"]([\w\\]+)@(\w+)['"]"#).unwrap();
    static ref LARAVEL_CLASS_RE: Regex = Regex::new(r"\\?([\w\\]+)::class").unwrap();
    static ref NEST_METHOD_RE: Regex = Regex::new(
        r"(?m)^\s*(?:(?:public|private|protected|async|static)\s+)*(\w+)\s*\("
    ).unwrap();
    static ref SLASHES_RE: Regex = Regex::new(r"/{2,}").unwrap();
}

/// File content prepared for whole-text scanning.
struct FileText<'a> {
    file: &'a SourceFile,
    content: String,
    lines: LineIndex,
}

impl<'a> FileText<'a> {
    fn new(file: &'a SourceFile) -> Self {
        let content = file.content();
        let lines = LineIndex::new(&content);
        Self {
            file,
            content,
            lines,
        }
    }

    fn endpoint(&self, method: HttpMethod, route: String, handler: String, offset: usize) -> Endpoint {
        Endpoint {
            method,
            route,
            handler,
            file: self.file.path.clone(),
            line: self.lines.line_of(offset),
        }
    }

    /// First capture of `re` inside the window after `offset`.
    fn find_after(&self, re: &Regex, offset: usize, chars: usize) -> Option<String> {
        re.captures(window(&self.content, offset, chars))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

type ConventionScanner = fn(&FileText<'_>, &mut Vec<Endpoint>);

/// Route conventions in scan order. Later conventions win key collisions.
const CONVENTIONS: &[(&str, ConventionScanner)] = &[
    ("flask", scan_flask_routes),
    ("call-style", scan_call_routes),
    ("django", scan_django_paths),
    ("laravel", scan_laravel_routes),
    ("nestjs", scan_nest_routes),
];

/// Extract endpoints from every file. On key collision the last one wins.
pub fn extract_endpoints(files: &[SourceFile], diag: &Diagnostics) -> EndpointTable {
    let mut table = EndpointTable::new();
    for file in files {
        for endpoint in extract_file_endpoints(file, diag) {
            insert_endpoint(&mut table, endpoint);
        }
    }
    diag.note(1, format!("endpoints: {}", table.len()));
    table
}

/// Endpoints of one file in discovery order.
pub fn extract_file_endpoints(file: &SourceFile, diag: &Diagnostics) -> Vec<Endpoint> {
    let text = FileText::new(file);
    let mut found = Vec::new();
    for (name, scan) in CONVENTIONS {
        let before = found.len();
        scan(&text, &mut found);
        if found.len() > before {
            diag.note(
                2,
                format!("{}: {} {} routes", file.path, found.len() - before, name),
            );
        }
    }
    found
}

/// `@app.route("/path", methods=["GET", "POST"])` followed by `def handler`.
fn scan_flask_routes(text: &FileText<'_>, out: &mut Vec<Endpoint>) {
    for caps in FLASK_RE.captures_iter(&text.content) {
        let (start, end) = span(&caps);
        let route = caps[1].to_string();
        let handler = text
            .find_after(&PY_DEF_RE, end, FLASK_HANDLER_WINDOW)
            .unwrap_or_else(|| HANDLER_UNKNOWN.to_string());

        let methods: Vec<HttpMethod> = match caps.get(2) {
            Some(list) => quoted_strings(list.as_str())
                .iter()
                .filter_map(|m| HttpMethod::parse(m))
                .collect(),
            None => vec![HttpMethod::Get],
        };

        for method in methods {
            out.push(text.endpoint(method, route.clone(), handler.clone(), start));
        }
    }
}

/// Express/Koa `app.get("/path", ...)` and FastAPI-style `@router.post("/path")`.
fn scan_call_routes(text: &FileText<'_>, out: &mut Vec<Endpoint>) {
    for caps in CALL_RE.captures_iter(&text.content) {
        let (start, end) = span(&caps);
        let Some(method) = HttpMethod::parse(&caps[1]) else {
            continue;
        };
        let handler = text
            .find_after(&DEF_OR_FUNCTION_RE, end, CALL_HANDLER_WINDOW)
            .unwrap_or_else(|| HANDLER_INLINE.to_string());
        out.push(text.endpoint(method, caps[2].to_string(), handler, start));
    }
}

/// Django `urlpatterns` entries: `path("users/", views.users)`.
fn scan_django_paths(text: &FileText<'_>, out: &mut Vec<Endpoint>) {
    if !text.file.file_name().contains("urls") && !text.content.contains("urlpatterns") {
        return;
    }

    for caps in DJANGO_RE.captures_iter(&text.content) {
        let (start, _) = span(&caps);
        let raw = &caps[1];
        let route = if raw.starts_with('/') {
            raw.to_string()
        } else {
            format!("/{}", raw)
        };
        out.push(text.endpoint(HttpMethod::All, route, caps[2].to_string(), start));
    }
}

/// Laravel `Route::get("/path", [UserController::class, "index"])`.
fn scan_laravel_routes(text: &FileText<'_>, out: &mut Vec<Endpoint>) {
    for caps in LARAVEL_RE.captures_iter(&text.content) {
        let (start, end) = span(&caps);
        let Some(method) = HttpMethod::parse(&caps[1]) else {
            continue;
        };
        let handler = laravel_handler(window(&text.content, end, LARAVEL_HANDLER_WINDOW));
        out.push(text.endpoint(method, caps[2].to_string(), handler, start));
    }
}

fn laravel_handler(ahead: &str) -> String {
    if let Some(caps) = LARAVEL_ARRAY_RE.captures(ahead) {
        return format!("{}@{}", last_segment(&caps[1]), &caps[2]);
    }
    if let Some(caps) = LARAVEL_AT_RE.captures(ahead) {
        return format!("{}@{}", last_segment(&caps[1]), &caps[2]);
    }
    if let Some(caps) = LARAVEL_CLASS_RE.captures(ahead) {
        return last_segment(&caps[1]).to_string();
    }
    HANDLER_INLINE.to_string()
}

fn last_segment(class: &str) -> &str {
    class.rsplit('\\').next().unwrap_or(class)
}

/// NestJS `@Controller("base")` plus `@Get("route")` method decorators.
fn scan_nest_routes(text: &FileText<'_>, out: &mut Vec<Endpoint>) {
    if !matches!(text.file.language.as_str(), "ts" | "js") {
        return;
    }

    let base = NEST_CONTROLLER_RE
        .captures(&text.content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or("");

    for caps in NEST_ROUTE_RE.captures_iter(&text.content) {
        let (start, end) = span(&caps);
        let Some(method) = HttpMethod::parse(&caps[1]) else {
            continue;
        };
        let route = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        let full_route = SLASHES_RE
            .replace_all(&format!("{}/{}", base, route), "/")
            .into_owned();
        let handler = text
            .find_after(&NEST_METHOD_RE, end, NEST_HANDLER_WINDOW)
            .unwrap_or_else(|| HANDLER_UNKNOWN.to_string());
        out.push(text.endpoint(method, full_route, handler, start));
    }
}

/// Byte span of the whole match.
fn span(caps: &Captures<'_>) -> (usize, usize) {
    caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0))
}
