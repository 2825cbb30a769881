//! CLI argument parsing via `clap`.
//!
//! Wrapper options come first; the first positional argument is the go
//! subcommand and everything from there on is passed through verbatim.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "goannotate",
    version,
    about = "Run the go tool and annotate its diagnostics for CI",
    long_about = "goannotate runs `go <args...>`, forwards all of its output unchanged, and adds workflow annotations for compiler errors (build, run, test) and failing test assertions (test).\n\nConfiguration precedence: CLI > goannotate.toml > defaults.",
    after_help = "Examples:\n  goannotate test ./...\n  goannotate build -o bin/app ./cmd/app\n  goannotate --go go1.22.0 test -run TestParse ./parser",
    arg_required_else_help = true
)]
/// Wrapper options followed by the go command line.
pub struct Cli {
    #[arg(long, help = "go binary to run (default: go)")]
    pub go: Option<String>,
    #[arg(long, help = "Module descriptor file name (default: go.mod)")]
    pub modfile: Option<String>,
    #[arg(long, help = "Directory annotation paths are relative to (default: current dir)")]
    pub workspace: Option<PathBuf>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Pass output through without annotations")]
    pub no_annotate: bool,
    /// go subcommand and its arguments
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "GO_ARGS"
    )]
    pub args: Vec<String>,
}

impl Cli {
    /// `Some(false)` when annotations were switched off on the command line.
    pub fn annotate_override(&self) -> Option<bool> {
        if self.no_annotate {
            Some(false)
        } else {
            None
        }
    }
}
