//! CLI module for metamark
//!
//! ## Commands
//!
//! - `discover <graph> --element E --marker M` - Find marker occurrences below an element
//! - `tree <graph> --element E` - Print the meta-occurrence tree of an element
//! - `check <graph>` - Load, validate and lint a graph document
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use crate::config::{DiscoverConfig, OutputFormat};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
    /// `check --deny-warnings` found lint warnings.
    pub const WARNINGS: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Recursive marker discovery over metadata graphs
#[derive(Parser, Debug)]
#[command(name = "metamark")]
#[command(version = VERSION)]
#[command(about = "Recursive marker discovery over metadata graphs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find every occurrence below an element whose type carries a marker
    Discover {
        /// Graph document (JSON)
        #[arg(value_name = "GRAPH")]
        graph: PathBuf,
        /// Element to start from, e.g. `type:Widget`
        #[arg(short, long, value_name = "ELEMENT")]
        element: String,
        /// Target marker type
        #[arg(short, long, value_name = "MARKER")]
        marker: String,
        /// Gating marker type: branches whose gate evaluates false are pruned
        #[arg(long, value_name = "MARKER")]
        gate: Option<String>,
        /// Enable a flag for gate evaluation (repeatable)
        #[arg(long = "flag", value_name = "FLAG")]
        flags: Vec<String>,
        /// Also expand the meta-metadata of built-in markers
        #[arg(long)]
        expand_builtins: bool,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the meta-occurrence tree of an element
    Tree {
        /// Graph document (JSON)
        #[arg(value_name = "GRAPH")]
        graph: PathBuf,
        /// Element to start from
        #[arg(short, long, value_name = "ELEMENT")]
        element: String,
        /// Flag instances whose type carries this marker
        #[arg(short, long, value_name = "MARKER")]
        marker: Option<String>,
        /// Also expand the meta-metadata of built-in markers
        #[arg(long)]
        expand_builtins: bool,
    },

    /// Load, validate and lint a graph document
    Check {
        /// Graph document (JSON)
        #[arg(value_name = "GRAPH")]
        graph: PathBuf,
        /// Exit non-zero if lint reports warnings
        #[arg(long)]
        deny_warnings: bool,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Discover {
            graph,
            element,
            marker,
            gate,
            flags,
            expand_builtins,
            json,
        } => {
            let mut config = DiscoverConfig::new()
                .with_flags(flags)
                .with_builtins_terminal(!expand_builtins)
                .with_format(if json { OutputFormat::Json } else { OutputFormat::Text });
            if let Some(gate) = gate {
                config = config.with_gate(gate.as_str());
            }
            commands::discover(&graph, &element, &marker, &config)
        }
        Command::Tree {
            graph,
            element,
            marker,
            expand_builtins,
        } => commands::tree(&graph, &element, marker.as_deref(), !expand_builtins),
        Command::Check { graph, deny_warnings } => commands::check(&graph, deny_warnings),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_discover() {
        let cli = Cli::try_parse_from(["metamark", "discover", "g.json", "-e", "type:W", "-m", "Marker"]).unwrap();
        let Command::Discover {
            element,
            marker,
            gate,
            flags,
            expand_builtins,
            json,
            ..
        } = cli.command
        else {
            panic!("Expected Discover command");
        };
        assert_eq!(element, "type:W");
        assert_eq!(marker, "Marker");
        assert_eq!(gate, None);
        assert!(flags.is_empty());
        assert!(!expand_builtins);
        assert!(!json);
    }

    #[test]
    fn test_cli_parse_discover_with_gate_and_flags() {
        let cli = Cli::try_parse_from([
            "metamark",
            "discover",
            "g.json",
            "--element",
            "type:W",
            "--marker",
            "Marker",
            "--gate",
            "Conditional",
            "--flag",
            "slow",
            "--flag",
            "net",
            "--json",
        ])
        .unwrap();
        if let Command::Discover { gate, flags, json, .. } = cli.command {
            assert_eq!(gate.as_deref(), Some("Conditional"));
            assert_eq!(flags, vec!["slow", "net"]);
            assert!(json);
        } else {
            panic!("Expected Discover command");
        }
    }

    #[test]
    fn test_cli_discover_requires_marker() {
        assert!(Cli::try_parse_from(["metamark", "discover", "g.json", "-e", "type:W"]).is_err());
    }

    #[test]
    fn test_cli_parse_tree() {
        let cli = Cli::try_parse_from(["metamark", "tree", "g.json", "-e", "type:W"]).unwrap();
        if let Command::Tree { marker, .. } = cli.command {
            assert_eq!(marker, None);
        } else {
            panic!("Expected Tree command");
        }
    }

    #[test]
    fn test_cli_parse_check() {
        let cli = Cli::try_parse_from(["metamark", "check", "g.json", "--deny-warnings"]).unwrap();
        assert!(matches!(cli.command, Command::Check { deny_warnings: true, .. }));
    }

    #[test]
    fn test_cli_error_failure_code() {
        let err = CliError::failure("boom");
        assert_eq!(err.exit_code, ExitCode::FAILURE);
        assert_eq!(err.to_string(), "boom");
    }
}
