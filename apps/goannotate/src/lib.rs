//! goannotate core library.
//!
//! Wraps a `go` invocation, forwards its output unchanged and adds CI
//! workflow annotations for compiler errors and failing tests.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `lines`: Line reader over child pipes.
//! - `matchers`: Build-error and test-block line patterns.
//! - `aggregate`: Multi-line test failure grouping.
//! - `modfile`: `go.mod` module directive reader.
//! - `pkgindex`: Package name → directory index.
//! - `testflags`: Target extraction from `go test` arguments.
//! - `output`: Annotation rendering and emission.
//! - `pipeline`: Child process and stream draining.
//! - `models`: Diagnostic data models.
//! - `error`: Error types.
//! - `utils`: Console prefixes and path helpers.
pub mod aggregate;
pub mod cli;
pub mod config;
pub mod error;
pub mod lines;
pub mod matchers;
pub mod models;
pub mod modfile;
pub mod output;
pub mod pipeline;
pub mod pkgindex;
pub mod testflags;
pub mod utils;
