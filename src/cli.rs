//! Command-line interface for codeatlas.

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};

use crate::config::{self, Extractor, ExtractorToggles};
use crate::diagnostics::Diagnostics;
use crate::extract::Runner;
use crate::registry::SourceRegistry;
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 2;

/// Starter configuration written by `codeatlas init`.
const CONFIG_TEMPLATE: &str = include_str!("templates/codeatlas.yaml");

/// Heuristic structural index of a source tree.
///
/// Codeatlas recovers function and class symbols, HTTP endpoints, UI
/// components and import edges from plain source text, each with the file
/// and line it was found on.
#[derive(Parser)]
#[command(name = "codeatlas")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index a project and print what was found
    #[command(visible_alias = "index")]
    Scan(ScanArgs),
    /// Write a starter codeatlas.yaml
    Init(InitArgs),
}

/// Output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Pretty,
    Json,
    Yaml,
}

/// Arguments for the scan command.
#[derive(Parser)]
pub struct ScanArgs {
    /// Project directory (or single file) to index
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover in the project)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: Format,

    /// Write output to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Increase diagnostic output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Run only these extractors (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<Extractor>,

    /// Extract files in parallel
    #[arg(long)]
    pub parallel: bool,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "codeatlas.yaml")]
    pub output: PathBuf,
}

/// Run the scan command.
pub fn run_scan(args: &ScanArgs) -> anyhow::Result<i32> {
    let diag = Diagnostics::new(args.verbose);

    // Config lives next to the project, or next to a single scanned file
    let config_dir = if args.path.is_file() {
        args.path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf()
    } else {
        args.path.clone()
    };
    let (mut config, config_path) = match config::load(args.config.as_deref(), &config_dir) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: invalid config: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    if let Some(path) = &config_path {
        diag.note(1, format!("config: {}", path.display()));
    }

    if !args.only.is_empty() {
        config.extractors = ExtractorToggles::only(&args.only);
    }
    if args.parallel {
        config.parallel = true;
    }
    let enabled: Vec<&str> = config.extractors.enabled().iter().map(Extractor::as_str).collect();
    diag.note(1, format!("extractors: {}", enabled.join(", ")));

    let registry = match SourceRegistry::scan(&args.path, &config, &diag) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    if registry.is_empty() {
        eprintln!("Warning: no files to scan");
    }

    let runner = Runner::new(&config);
    let progress = progress_bar(registry.len() as u64, &diag);
    let index = runner.run_with_progress(&registry, &diag, progress.as_ref());
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let path_str = args.path.to_string_lossy().to_string();
    match &args.output {
        Some(output) => {
            colored::control::set_override(false);
            let mut out = BufWriter::new(File::create(output)?);
            write_report(&mut out, args.format, &path_str, &index)?;
            out.flush()?;
            diag.note(1, format!("wrote {}", output.display()));
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_report(&mut out, args.format, &path_str, &index)?;
        }
    }

    diag.print_summary();
    Ok(EXIT_SUCCESS)
}

fn write_report<W: Write>(
    out: &mut W,
    format: Format,
    path: &str,
    index: &crate::extract::ProjectIndex,
) -> anyhow::Result<()> {
    match format {
        Format::Pretty => report::write_pretty(out, path, index),
        Format::Json => report::write_json(out, path, index),
        Format::Yaml => report::write_yaml(out, path, index),
    }
}

/// A progress bar on stderr, only when nobody is reading verbose output.
fn progress_bar(len: u64, diag: &Diagnostics) -> Option<ProgressBar> {
    if diag.verbosity() > 0 || !io::stderr().is_terminal() {
        return None;
    }
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template("  {spinner} indexing {pos}/{len} files {wide_bar}") {
        pb.set_style(style);
    }
    Some(pb)
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // Check if output already exists
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, CONFIG_TEMPLATE) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to customize for your project", args.output.display());
    println!("  2. Run: codeatlas scan . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_template_is_valid_config() {
        let config = crate::config::Config::parse_str(CONFIG_TEMPLATE).unwrap();
        assert!(crate::config::validate(&config).is_ok());
        assert_eq!(config.extractors, ExtractorToggles::default());
    }

    #[test]
    fn test_parse_scan_args() {
        let cli = Cli::try_parse_from([
            "codeatlas",
            "scan",
            "src",
            "--format",
            "json",
            "--only",
            "symbols,endpoints",
            "-vv",
        ])
        .unwrap();
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.path, PathBuf::from("src"));
        assert_eq!(args.format, Format::Json);
        assert_eq!(args.only, vec![Extractor::Symbols, Extractor::Endpoints]);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_unknown_extractor_rejected() {
        assert!(Cli::try_parse_from(["codeatlas", "scan", "--only", "routes"]).is_err());
    }

    #[test]
    fn test_scan_writes_output_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("main.go"), "package main\n\nfunc main() {\n}\n").unwrap();
        let output = temp.path().join("out/index.json");
        std::fs::create_dir_all(output.parent().unwrap()).unwrap();

        let args = ScanArgs {
            path: temp.path().to_path_buf(),
            config: None,
            format: Format::Json,
            output: Some(output.clone()),
            verbose: 0,
            only: vec![],
            parallel: false,
        };
        assert_eq!(run_scan(&args).unwrap(), EXIT_SUCCESS);

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(value["symbols"]["main.go"][0]["name"], "main");
        assert_eq!(value["symbols"]["main.go"][0]["line"], 3);
    }

    #[test]
    fn test_scan_rejects_bad_config() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("codeatlas.yaml"), "max_file_bytes: 0\n").unwrap();
        let args = ScanArgs {
            path: temp.path().to_path_buf(),
            config: None,
            format: Format::Pretty,
            output: None,
            verbose: 0,
            only: vec![],
            parallel: false,
        };
        assert_eq!(run_scan(&args).unwrap(), EXIT_ERROR);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("codeatlas.yaml");
        let args = InitArgs {
            output: output.clone(),
        };
        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
        assert!(output.exists());
        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);
    }
}
