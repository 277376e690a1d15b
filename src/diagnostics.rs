//! Warning collection and verbose progress notes.
//!
//! A `Diagnostics` value is created once per run and passed by reference to
//! every stage that may want to report something. Nothing here is global:
//! two runs in the same process keep separate warning lists.

use colored::*;
use std::sync::{Mutex, MutexGuard};

/// Collected warnings plus the verbosity used for progress notes.
#[derive(Debug, Default)]
pub struct Diagnostics {
    verbosity: u8,
    warnings: Mutex<Vec<String>>,
}

impl Diagnostics {
    /// Create a diagnostics sink. Notes with a level up to `verbosity` are
    /// printed to stderr.
    pub fn new(verbosity: u8) -> Self {
        Self {
            verbosity,
            warnings: Mutex::new(Vec::new()),
        }
    }

    /// A sink that prints nothing (warnings are still collected).
    pub fn quiet() -> Self {
        Self::new(0)
    }

    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Record a warning without interrupting the run.
    pub fn warn(&self, message: impl AsRef<str>, context: &str) {
        let message = message.as_ref();
        let warning = if context.is_empty() {
            format!("warning: {}", message)
        } else {
            format!("warning: {} ({})", message, context)
        };

        tracing::warn!(context, "{}", message);
        if self.verbosity > 0 {
            eprintln!("  {} {}", "!".yellow(), warning);
        }
        self.lock().push(warning);
    }

    /// Emit a progress note at the given verbosity level (1 = summary,
    /// 2 = per file, 3 = per decision).
    pub fn note(&self, level: u8, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::debug!(level, "{}", message);
        if level > 0 && self.verbosity >= level {
            let indent = "  ".repeat(level as usize);
            eprintln!("{}{}", indent, message.dimmed());
        }
    }

    /// Snapshot of the warnings recorded so far.
    pub fn warnings(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn warning_count(&self) -> usize {
        self.lock().len()
    }

    /// Print all collected warnings to stderr.
    pub fn print_summary(&self) {
        let warnings = self.lock();
        if warnings.is_empty() {
            return;
        }

        eprintln!();
        eprintln!(
            "  {} ({}):",
            "Warnings".yellow().bold(),
            warnings.len()
        );
        for (i, w) in warnings.iter().enumerate() {
            eprintln!("    {}. {}", i + 1, w);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.warnings.lock().unwrap_or_else(|e| e.into_inner())
    }
}
