//! The Tova compiler CLI.
//!
//! Provides the `tovac` command:
//!
//! - `tovac build <path>` - compile a `.tova` file (or every `.tova` file
//!   in a directory) to its JavaScript outputs
//! - `tovac check <path>` - parse and analyze without writing outputs
//!
//! Outputs per source file `<base>.tova`: `<base>.shared.js`,
//! `<base>.server[.<name>].js`, `<base>.client[.<name>].js`, plus
//! `tova.deploy.json` and `tova.tests.js` when the source declares deploy
//! profiles or test blocks.
//!
//! Exit codes: 0 success, 1 diagnostics with errors, 2 IO/usage error.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tova_analyzer::diagnostics::{render_diagnostic, summary_lines};
use tova_codegen::GenOptions;
use tova_common::diag::Diagnostic;

#[derive(Parser)]
#[command(name = "tovac", version, about = "The Tova compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a Tova source file or directory
    Build {
        /// Path to a `.tova` file or a directory of them
        path: PathBuf,

        /// Upgrade type warnings to errors
        #[arg(long)]
        strict: bool,

        /// Recover from syntax errors instead of failing fast
        #[arg(long)]
        tolerant: bool,

        /// Directory for the emitted files (defaults to the source's)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
    /// Parse and analyze without writing outputs
    Check {
        path: PathBuf,

        #[arg(long)]
        strict: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Build {
            path,
            strict,
            tolerant,
            out_dir,
        } => run(&path, strict, tolerant, Some(out_dir), true),
        Commands::Check { path, strict } => run(&path, strict, false, None, false),
    };
    match result {
        Ok(false) => process::exit(0),
        Ok(true) => process::exit(1),
        Err(message) => {
            eprintln!("error: {message}");
            process::exit(2);
        }
    }
}

/// Compile one path. Returns `Ok(true)` when diagnostics contained errors.
fn run(
    path: &Path,
    strict: bool,
    tolerant: bool,
    out_dir: Option<Option<PathBuf>>,
    write: bool,
) -> Result<bool, String> {
    if !path.exists() {
        return Err(format!("'{}' does not exist", path.display()));
    }

    let files = if path.is_dir() {
        let mut files: Vec<PathBuf> = std::fs::read_dir(path)
            .map_err(|e| format!("failed to read '{}': {e}", path.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "tova"))
            .collect();
        files.sort();
        if files.is_empty() {
            return Err(format!("no .tova files in '{}'", path.display()));
        }
        files
    } else {
        vec![path.to_path_buf()]
    };

    let mut had_errors = false;
    for file in &files {
        let out = out_dir
            .clone()
            .flatten()
            .unwrap_or_else(|| file.parent().unwrap_or(Path::new(".")).to_path_buf());
        had_errors |= compile_file(file, strict, tolerant, &out, write)?;
    }
    Ok(had_errors)
}

fn compile_file(
    file: &Path,
    strict: bool,
    tolerant: bool,
    out_dir: &Path,
    write: bool,
) -> Result<bool, String> {
    let source = std::fs::read_to_string(file)
        .map_err(|e| format!("failed to read '{}': {e}", file.display()))?;
    let file_name = file.display().to_string();

    let parse = if tolerant {
        tova_parser::parse_tolerant(&source)
    } else {
        tova_parser::parse(&source)
    };
    let parse = match parse {
        Ok(parse) => parse,
        Err(diag) => {
            report(&[diag], &source, &file_name);
            return Ok(true);
        }
    };

    let mut diagnostics: Vec<Diagnostic> = parse
        .errors
        .iter()
        .cloned()
        .map(|e| e.into_diagnostic())
        .collect();

    let analysis = tova_analyzer::analyze(&parse.program, tova_analyzer::Options { strict });
    diagnostics.extend(analysis.diagnostics.iter().cloned());
    report(&diagnostics, &source, &file_name);

    if diagnostics.iter().any(|d| d.is_error()) {
        return Ok(true);
    }
    if !write {
        return Ok(false);
    }

    let base = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("app")
        .to_string();
    let outputs = tova_codegen::generate(
        &parse.program,
        &analysis,
        &GenOptions {
            base_name: base.clone(),
        },
    );

    std::fs::create_dir_all(out_dir)
        .map_err(|e| format!("failed to create '{}': {e}", out_dir.display()))?;
    let write_out = |name: String, contents: &str| -> Result<(), String> {
        let target = out_dir.join(&name);
        std::fs::write(&target, contents)
            .map_err(|e| format!("failed to write '{}': {e}", target.display()))?;
        eprintln!("  Compiled: {}", target.display());
        Ok(())
    };

    write_out(format!("{base}.shared.js"), &outputs.shared)?;
    for bundle in &outputs.servers {
        let name = match &bundle.name {
            Some(n) => format!("{base}.server.{n}.js"),
            None => format!("{base}.server.js"),
        };
        write_out(name, &bundle.code)?;
    }
    for bundle in &outputs.clients {
        let name = match &bundle.name {
            Some(n) => format!("{base}.client.{n}.js"),
            None => format!("{base}.client.js"),
        };
        write_out(name, &bundle.code)?;
    }
    if outputs.deploys.as_object().is_some_and(|m| !m.is_empty()) {
        let rendered = serde_json::to_string_pretty(&outputs.deploys)
            .map_err(|e| format!("failed to render deploy record: {e}"))?;
        write_out("tova.deploy.json".into(), &rendered)?;
    }
    if let Some(tests) = &outputs.tests {
        write_out("tova.tests.js".into(), tests)?;
    }

    Ok(false)
}

/// Print each diagnostic as a one-line summary plus an ariadne report.
fn report(diagnostics: &[Diagnostic], source: &str, file_name: &str) {
    for line in summary_lines(diagnostics, file_name, source) {
        eprintln!("{line}");
    }
    for diag in diagnostics {
        eprint!("{}", render_diagnostic(diag, source, file_name));
    }
}
