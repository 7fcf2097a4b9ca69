//! Phixeo command-line tools.
//!
//! Provides the `phixeo` binary:
//!
//! - `run` executes a program (source text or a saved `.phix` graph) and
//!   prints its output buffer.
//! - `parse` turns source text into the editor's `.phix` JSON format.
//! - `export` regenerates source text from a `.phix` file.
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use phixeo_core::persist::{from_json, to_json};
use phixeo_core::{build, optimize, CoreError, Forest};
use phixeo_runtime::{execute, RunError, RunReport, RuntimeConfig, DEFAULT_WORKERS};

/// Extension of saved node graphs.
const GRAPH_EXTENSION: &str = "phix";

/// Phixeo graph runtime and tools.
#[derive(Parser)]
#[command(name = "phixeo", about = "Phixeo graph runtime and tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Run a program and print its output.
    Run {
        /// Source file, or a `.phix` graph saved by the editor.
        file: PathBuf,

        /// Size of the worker pool.
        #[arg(short, long, env = "PHIXEO_WORKERS", default_value_t = DEFAULT_WORKERS)]
        workers: usize,

        /// Fold similar sibling runs into aggregates before running.
        #[arg(long)]
        optimize: bool,

        /// Print every evaluation step to stderr.
        #[arg(long)]
        trace: bool,

        /// Print the output and failures as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Parse source text into a `.phix` graph.
    Parse {
        file: PathBuf,

        /// Fold similar sibling runs into aggregates.
        #[arg(long)]
        optimize: bool,

        /// Output path (default: stdout).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Regenerate source text from a `.phix` graph.
    Export {
        file: PathBuf,

        /// Output path (default: stdout).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let exit_code = match cli.command {
        Commands::Run {
            file,
            workers,
            optimize,
            trace,
            json,
        } => run_program(&file, workers, optimize, trace, json),
        Commands::Parse {
            file,
            optimize,
            output,
        } => parse_source(&file, optimize, output.as_deref()),
        Commands::Export { file, output } => export_source(&file, output.as_deref()),
    };
    process::exit(exit_code);
}

/// Execute the run subcommand.
///
/// Returns exit code: 0 = success, 1 = load or structural error,
/// 3 = I/O error. Failing nodes do not change the exit code.
fn run_program(path: &Path, workers: usize, fold: bool, trace: bool, json: bool) -> i32 {
    let mut forest = match read_forest(path) {
        Ok(forest) => forest,
        Err(code) => return code,
    };
    if fold {
        let report = optimize(&mut forest);
        tracing::info!(groups = report.groups, folded = report.folded, "optimized forest");
    }

    let config = RuntimeConfig {
        workers,
        trace_enabled: trace,
    };
    let report = match execute(&forest, config) {
        Ok(report) => report,
        Err(RunError::Structural(e)) => {
            eprintln!("Structural error: {}", e);
            return 1;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    if let Some(entries) = &report.trace {
        for entry in entries {
            eprintln!("{}", entry);
        }
    }
    if json {
        println!("{}", report_json(&report));
    } else if !report.output.is_empty() {
        println!("{}", report.output_text());
    }
    0
}

fn report_json(report: &RunReport) -> String {
    let failures: Vec<serde_json::Value> = report
        .failures()
        .map(|(node, err)| serde_json::json!({ "node": node.0, "error": err.to_string() }))
        .collect();
    let body = serde_json::json!({
        "output": report.output,
        "failures": failures,
    });
    serde_json::to_string_pretty(&body)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize report: {}\"}}", e))
}

/// Execute the parse subcommand. Exit codes as for `run`.
fn parse_source(path: &Path, fold: bool, output: Option<&Path>) -> i32 {
    let source = match read_text(path) {
        Ok(source) => source,
        Err(code) => return code,
    };
    let mut forest = build(&source);
    if fold {
        optimize(&mut forest);
    }
    match to_json(&forest) {
        Ok(json) => write_output(output, &json),
        Err(e) => {
            eprintln!("Error: failed to serialize graph: {}", e);
            1
        }
    }
}

/// Execute the export subcommand. Exit codes as for `run`.
fn export_source(path: &Path, output: Option<&Path>) -> i32 {
    let text = match read_text(path) {
        Ok(text) => text,
        Err(code) => return code,
    };
    match from_json(&text) {
        Ok(forest) => write_output(output, &forest.to_source()),
        Err(e) => {
            eprintln!("Error: failed to load '{}': {}", path.display(), e);
            1
        }
    }
}

fn read_text(path: &Path) -> Result<String, i32> {
    fs::read_to_string(path).map_err(|e| {
        eprintln!("Error: failed to read '{}': {}", path.display(), e);
        3
    })
}

fn read_forest(path: &Path) -> Result<Forest, i32> {
    let text = read_text(path)?;
    load_forest(path, &text).map_err(|e| {
        eprintln!("Error: failed to load '{}': {}", path.display(), e);
        1
    })
}

/// `.phix` files hold the persisted graph; anything else is source text.
fn load_forest(path: &Path, text: &str) -> Result<Forest, CoreError> {
    if path.extension().is_some_and(|ext| ext == GRAPH_EXTENSION) {
        from_json(text)
    } else {
        Ok(build(text))
    }
}

fn write_output(output: Option<&Path>, text: &str) -> i32 {
    let Some(path) = output else {
        println!("{}", text);
        return 0;
    };
    match fs::write(path, format!("{text}\n")) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: failed to write '{}': {}", path.display(), e);
            3
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from(["phixeo", "run", "prog.py", "-w", "2", "--optimize"]).unwrap();
        let Commands::Run {
            workers, optimize, trace, ..
        } = cli.command
        else {
            panic!("expected run");
        };
        assert_eq!(workers, 2);
        assert!(optimize);
        assert!(!trace);
    }

    #[test]
    fn graph_files_load_as_json() {
        let json = to_json(&build("print('hi')")).unwrap();
        let forest = load_forest(Path::new("saved.phix"), &json).unwrap();
        assert_eq!(forest.len(), 1);
        assert!(load_forest(Path::new("saved.phix"), "print('hi')").is_err());
    }

    #[test]
    fn other_files_parse_as_source() {
        let forest = load_forest(Path::new("prog.py"), "x = 1\nprint(x)").unwrap();
        assert_eq!(forest.roots().len(), 2);
    }

    #[test]
    fn json_report_lists_failures() {
        let forest = build("print(nope)\nprint('ok')");
        let report = execute(&forest, RuntimeConfig { workers: 1, trace_enabled: false }).unwrap();
        let value: serde_json::Value = serde_json::from_str(&report_json(&report)).unwrap();
        assert_eq!(value["failures"][0]["node"], 0);
        assert_eq!(value["output"][1], "ok");
    }
}
