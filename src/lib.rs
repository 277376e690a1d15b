//! Codeatlas - heuristic structural index of a source tree.
//!
//! Codeatlas recovers structural facts from plain source text without
//! building syntax trees, so downstream tooling can point at code by file and
//! line instead of re-reading whole files:
//!
//! - symbols (functions, classes, structs, traits, ...) for a dozen languages
//! - HTTP endpoints for Flask, FastAPI, Express, Django, Laravel and NestJS
//! - UI components for Vue, React and Svelte
//! - import edges between tracked files
//! - the framework stack named by manifest files at the project root
//!
//! # Architecture
//!
//! - `source`: the [`SourceFile`] snapshot every extractor reads
//! - `registry`: walks a project and loads files on demand
//! - `extract`: the four extractors and the [`Runner`] that drives them
//! - `detect`: framework and monorepo detection from manifest files
//! - `config`: YAML configuration schema
//! - `diagnostics`: warning collection passed explicitly to every stage
//! - `report`: output formatting (pretty, JSON, YAML)
//!
//! # Adding a Language
//!
//! Symbol patterns are data: add a pattern table in `extract/symbols.rs` and
//! register it under the file extension in `LANGUAGE_TABLES`.

pub mod cli;
pub mod config;
pub mod detect;
pub mod diagnostics;
pub mod extract;
pub mod registry;
pub mod report;
pub mod source;

pub use config::{Config, Extractor, ExtractorToggles};
pub use detect::{Monorepo, Stack};
pub use diagnostics::Diagnostics;
pub use extract::{
    extract_components, extract_dependencies, extract_endpoints, extract_symbols, Endpoint,
    ProjectIndex, Runner, Symbol, SymbolKind, UiComponent,
};
pub use registry::SourceRegistry;
pub use source::SourceFile;
