//! goannotate binary entry point.
//! Resolves configuration, runs the wrapped go command and forwards its
//! exit code.

use clap::Parser;
use goannotate::cli::Cli;
use goannotate::pipeline::{self, FATAL_EXIT};
use goannotate::{config, utils};

#[tokio::main]
async fn main() {
    // Logs go to stderr and stay quiet unless RUST_LOG asks for more.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let eff = match config::resolve_effective(
        cli.workspace.as_deref(),
        cli.go.as_deref(),
        cli.modfile.as_deref(),
        cli.annotate_override(),
    ) {
        Ok(eff) => eff,
        Err(e) => {
            eprintln!(
                "{} cannot determine working directory: {}",
                utils::error_prefix(),
                e
            );
            std::process::exit(FATAL_EXIT);
        }
    };
    if let Some(root) = eff.config_root.as_ref() {
        tracing::debug!(root = %root.display(), "using goannotate config");
    }
    if !eff.annotate {
        eprintln!(
            "{} annotations disabled; passing output through",
            utils::note_prefix()
        );
    }

    match pipeline::run(&eff, &cli.args).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {}", utils::error_prefix(), e);
            std::process::exit(e.exit_code());
        }
    }
}
