//! Heuristic extractors that turn source lines into structural facts.

mod components;
mod dependencies;
mod endpoints;
mod python;
mod runner;
mod symbols;
mod text;
mod types;

pub use components::{extract_components, extract_file_components};
pub use dependencies::{dependencies_of, extract_dependencies, normalize, PathIndex};
pub use endpoints::{extract_endpoints, extract_file_endpoints};
pub use runner::Runner;
pub use symbols::{extract_file_symbols, extract_symbols, is_supported};
pub use types::{
    insert_component, insert_endpoint, ComponentKind, ComponentTable, DependencyGraph, Endpoint,
    EndpointTable, FileEntry, FileFacts, FileSymbols, HttpMethod, IndexSummary, ProjectIndex, Symbol,
    SymbolKind, SymbolTable, UiComponent, HANDLER_INLINE, HANDLER_UNKNOWN,
};
