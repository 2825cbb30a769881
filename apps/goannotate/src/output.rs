//! Annotation rendering and line emission.
//!
//! Annotations use the workflow-command grammar understood by GitHub
//! Actions:
//! - build error: `::error file=<f>,line=<l>,col=<c>:: <msg>`
//! - test failure: `::error file=<f>,line=<l>:: <msg>`
//!
//! `<f>` never starts with `./`.

use crate::models::{BuildError, TestFailure};
use crate::utils::strip_dot_slash;
use tokio::io::{AsyncWrite, AsyncWriteExt};

pub fn render_build_err(err: &BuildError) -> String {
    format!(
        "::error file={},line={},col={}:: {}",
        strip_dot_slash(&err.file),
        err.line,
        err.col,
        err.text
    )
}

/// Render a test failure whose file has already been resolved against the
/// package index.
pub fn render_test_failure(file: &str, failure: &TestFailure) -> String {
    format!(
        "::error file={},line={}:: {}",
        strip_dot_slash(file),
        failure.line,
        failure.text
    )
}

/// Write the annotations (if any) followed by the raw line, each on its own
/// line.
pub async fn emit<W, S>(out: &mut W, annotations: &[S], raw: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
    S: AsRef<str>,
{
    for a in annotations {
        out.write_all(a.as_ref().as_bytes()).await?;
        out.write_all(b"\n").await?;
    }
    out.write_all(raw).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}
