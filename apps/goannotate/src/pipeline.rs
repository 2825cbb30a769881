//! Runs the wrapped `go` command and drains its output streams.
//!
//! stderr goes through the build-error matcher for `build`, `run` and
//! `test`; stdout goes through the test-failure aggregator for `test` only.
//! Any other subcommand inherits both streams untouched. Every raw line is
//! forwarded, annotated or not.

use crate::aggregate::TestAggregator;
use crate::config::Effective;
use crate::error::{StreamKind, WrapperError};
use crate::lines::LineReader;
use crate::matchers::match_build_err;
use crate::modfile::GoModParser;
use crate::output::{emit, render_build_err, render_test_failure};
use crate::pkgindex::PackageIndex;
use crate::testflags::extract_targets;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Build,
    Run,
    Test,
    Other,
}

impl Mode {
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            Some("build") => Self::Build,
            Some("run") => Self::Run,
            Some("test") => Self::Test,
            _ => Self::Other,
        }
    }

    fn pipes_stdout(self) -> bool {
        self == Self::Test
    }

    fn pipes_stderr(self) -> bool {
        self != Self::Other
    }
}

/// Exit code for failures inside the wrapper itself.
pub const FATAL_EXIT: i32 = 2;

/// A fatal wrapper failure, with the child's exit code when it got that far.
#[derive(Error, Debug)]
#[error("{source}")]
pub struct RunError {
    #[source]
    pub source: WrapperError,
    pub child_code: Option<i32>,
}

impl RunError {
    /// Code to exit with: the child's own failure code, else `FATAL_EXIT`.
    pub fn exit_code(&self) -> i32 {
        self.child_code.filter(|c| *c != 0).unwrap_or(FATAL_EXIT)
    }
}

impl From<WrapperError> for RunError {
    fn from(source: WrapperError) -> Self {
        Self {
            source,
            child_code: None,
        }
    }
}

/// Forward `reader` to `out`, preceding each build diagnostic with its
/// annotation.
pub async fn drain_build_errors<R, W>(reader: R, out: &mut W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = LineReader::new(reader);
    while let Some(raw) = lines.next_line().await? {
        let text = String::from_utf8_lossy(&raw);
        let annotations: Vec<String> = match_build_err(&text)
            .map(|e| render_build_err(&e))
            .into_iter()
            .collect();
        emit(out, &annotations, &raw).await?;
    }
    Ok(())
}

/// Forward `reader` to `out`, annotating test failures when their block's
/// footer arrives. Files are resolved through `index` relative to
/// `workspace`.
pub async fn drain_test_failures<R, W>(
    reader: R,
    out: &mut W,
    index: &PackageIndex,
    workspace: &Path,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = LineReader::new(reader);
    let mut agg = TestAggregator::new();
    while let Some(raw) = lines.next_line().await? {
        let text = String::from_utf8_lossy(&raw);
        let annotations: Vec<String> = agg
            .push(&text)
            .iter()
            .map(|f| render_test_failure(&index.resolve_file(f, workspace), f))
            .collect();
        emit(out, &annotations, &raw).await?;
    }
    if agg.is_open() {
        tracing::debug!("stream ended inside a failure block");
    }
    agg.finish();
    Ok(())
}

/// Run `<go> <args...>` with output going to the process's own stdout and
/// stderr. Returns the child's exit code.
pub async fn run(cfg: &Effective, args: &[String]) -> Result<i32, RunError> {
    run_with(cfg, args, tokio::io::stdout(), tokio::io::stderr()).await
}

/// Like `run`, with explicit sinks for the drained streams.
pub async fn run_with<O, E>(
    cfg: &Effective,
    args: &[String],
    stdout: O,
    stderr: E,
) -> Result<i32, RunError>
where
    O: AsyncWrite + Unpin + Send + 'static,
    E: AsyncWrite + Unpin + Send + 'static,
{
    let mode = if cfg.annotate {
        Mode::from_arg(args.first().map(String::as_str))
    } else {
        Mode::Other
    };

    // Built before the child starts; read-only afterwards.
    let index = if mode == Mode::Test {
        let targets = extract_targets(&args[1..]);
        let index = PackageIndex::build(&targets, &cfg.workspace, &cfg.modfile, &GoModParser);
        tracing::debug!(targets = targets.len(), packages = index.len(), "package index built");
        if index.is_empty() {
            tracing::debug!("no packages indexed; failure paths stay as printed");
        }
        Arc::new(index)
    } else {
        Arc::new(PackageIndex::empty())
    };

    let mut cmd = Command::new(&cfg.go);
    cmd.args(args)
        .current_dir(&cfg.workspace)
        .stdin(Stdio::inherit())
        .stdout(if mode.pipes_stdout() {
            Stdio::piped()
        } else {
            Stdio::inherit()
        })
        .stderr(if mode.pipes_stderr() {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });

    tracing::info!(go = %cfg.go, ?mode, "starting wrapped command");
    let mut child = cmd.spawn().map_err(|source| WrapperError::Spawn {
        program: cfg.go.clone(),
        source,
    })?;

    let stdout_task: Option<JoinHandle<std::io::Result<()>>> = child.stdout.take().map(|pipe| {
        let index = Arc::clone(&index);
        let workspace: PathBuf = cfg.workspace.clone();
        let mut out = stdout;
        tokio::spawn(async move {
            drain_test_failures(BufReader::new(pipe), &mut out, &index, &workspace).await
        })
    });
    let stderr_task: Option<JoinHandle<std::io::Result<()>>> = child.stderr.take().map(|pipe| {
        let mut out = stderr;
        tokio::spawn(async move { drain_build_errors(BufReader::new(pipe), &mut out).await })
    });

    let (status, out_res, err_res) = tokio::join!(
        child.wait(),
        join_drain(stdout_task, StreamKind::Stdout),
        join_drain(stderr_task, StreamKind::Stderr),
    );

    let child_code = status.as_ref().ok().map(exit_code);
    let first_failure = status
        .map_err(|source| WrapperError::Wait {
            program: cfg.go.clone(),
            source,
        })
        .err()
        .or(out_res.err())
        .or(err_res.err());
    match first_failure {
        Some(source) => Err(RunError { source, child_code }),
        None => {
            let code = child_code.unwrap_or(1);
            tracing::debug!(code, "wrapped command finished");
            Ok(code)
        }
    }
}

async fn join_drain(
    task: Option<JoinHandle<std::io::Result<()>>>,
    stream: StreamKind,
) -> Result<(), WrapperError> {
    let Some(task) = task else {
        return Ok(());
    };
    match task.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(WrapperError::stream(stream, e)),
        Err(e) => Err(WrapperError::Join {
            stream,
            message: e.to_string(),
        }),
    }
}

/// Exit code to forward for a finished child.
fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    async fn drain_build(input: &str) -> String {
        let mut out: Vec<u8> = Vec::new();
        drain_build_errors(input.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    async fn drain_test(input: &str, index: &PackageIndex, workspace: &Path) -> String {
        let mut out: Vec<u8> = Vec::new();
        drain_test_failures(input.as_bytes(), &mut out, index, workspace)
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    fn module_fixture() -> tempfile::TempDir {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("go.mod"), "module example.com/mod\n\ngo 1.21\n").unwrap();
        fs::create_dir_all(tmp.path().join("pkg")).unwrap();
        tmp
    }

    #[test]
    fn test_mode_from_arg() {
        assert_eq!(Mode::from_arg(Some("build")), Mode::Build);
        assert_eq!(Mode::from_arg(Some("run")), Mode::Run);
        assert_eq!(Mode::from_arg(Some("test")), Mode::Test);
        assert_eq!(Mode::from_arg(Some("vet")), Mode::Other);
        assert_eq!(Mode::from_arg(None), Mode::Other);
    }

    #[tokio::test]
    async fn test_build_error_annotated_then_raw() {
        let out = drain_build("./main.go:5:2: undefined: foo\n").await;
        assert_eq!(
            out,
            "::error file=main.go,line=5,col=2:: undefined: foo\n./main.go:5:2: undefined: foo\n"
        );
    }

    #[tokio::test]
    async fn test_non_matching_lines_pass_through_only() {
        let input = "# example.com/mod\nnote: module requires Go 1.22\n\n";
        assert_eq!(drain_build(input).await, input);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_forwarded_byte_exact() {
        let input: &[u8] = b"caf\xe9 latin1\n";
        let mut out: Vec<u8> = Vec::new();
        drain_build_errors(input, &mut out).await.unwrap();
        assert_eq!(out, input);
    }

    #[tokio::test]
    async fn test_failure_block_resolved_through_index() {
        let tmp = module_fixture();
        let root = tmp.path();
        let index = PackageIndex::build(&["./pkg/...".into()], root, "go.mod", &GoModParser);
        let out = drain_test(
            "--- FAIL: TestX (0.00s)\n    util.go:10: boom\nFAIL example.com/mod/pkg 0.00s\n",
            &index,
            root,
        )
        .await;
        assert_eq!(
            out,
            "--- FAIL: TestX (0.00s)\n    util.go:10: boom\n::error file=pkg/util.go,line=10:: boom\nFAIL example.com/mod/pkg 0.00s\n"
        );
    }

    #[tokio::test]
    async fn test_unterminated_block_emits_no_annotation() {
        let tmp = module_fixture();
        let root = tmp.path();
        let index = PackageIndex::build(&["./pkg".into()], root, "go.mod", &GoModParser);
        let input = "--- FAIL: TestX (0.00s)\n    util.go:10: boom\n";
        assert_eq!(drain_test(input, &index, root).await, input);
    }

    #[tokio::test]
    async fn test_unknown_package_keeps_raw_path() {
        let tmp = tempdir().unwrap();
        let out = drain_test(
            "--- FAIL: TestX (0.00s)\n    ./util.go:10: boom\nFAIL example.com/gone 0.00s\n",
            &PackageIndex::empty(),
            tmp.path(),
        )
        .await;
        assert!(out.contains("::error file=util.go,line=10:: boom\nFAIL example.com/gone 0.00s\n"));
    }

    #[cfg(unix)]
    fn sh_config(root: &Path) -> Effective {
        // `sh test ...` runs the script file named `test` in the workspace,
        // standing in for the go tool.
        Effective {
            workspace: root.to_path_buf(),
            go: "sh".into(),
            ..Effective::default()
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_test_mode_end_to_end() {
        let tmp = module_fixture();
        let root = tmp.path();
        fs::write(
            root.join("test"),
            "echo '--- FAIL: TestX (0.00s)'\n\
             echo '    util.go:10: boom'\n\
             echo 'FAIL example.com/mod/pkg 0.00s'\n\
             echo './main.go:5:2: undefined: foo' >&2\n\
             exit 1\n",
        )
        .unwrap();
        let out_path = root.join("stdout.log");
        let err_path = root.join("stderr.log");
        let out = tokio::fs::File::create(&out_path).await.unwrap();
        let err = tokio::fs::File::create(&err_path).await.unwrap();

        let args: Vec<String> = vec!["test".into(), "./pkg/...".into()];
        let code = run_with(&sh_config(root), &args, out, err).await.unwrap();
        assert_eq!(code, 1);

        let stdout = fs::read_to_string(&out_path).unwrap();
        assert!(stdout.contains("::error file=pkg/util.go,line=10:: boom\nFAIL example.com/mod/pkg 0.00s\n"));
        let stderr = fs::read_to_string(&err_path).unwrap();
        assert_eq!(
            stderr,
            "::error file=main.go,line=5,col=2:: undefined: foo\n./main.go:5:2: undefined: foo\n"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_forwards_exit_code_and_skips_when_disabled() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join("build"), "echo './main.go:1:1: x' >&2\nexit 3\n").unwrap();
        let err_path = root.join("stderr.log");
        let err = tokio::fs::File::create(&err_path).await.unwrap();

        let mut cfg = sh_config(root);
        let code = run_with(&cfg, &["build".into()], tokio::io::sink(), err)
            .await
            .unwrap();
        assert_eq!(code, 3);
        assert!(fs::read_to_string(&err_path).unwrap().starts_with("::error file=main.go"));

        // With annotations off the streams are inherited, nothing is drained.
        cfg.annotate = false;
        let err_path2 = root.join("stderr2.log");
        let err2 = tokio::fs::File::create(&err_path2).await.unwrap();
        let code = run_with(&cfg, &["build".into()], tokio::io::sink(), err2)
            .await
            .unwrap();
        assert_eq!(code, 3);
        assert_eq!(fs::read_to_string(&err_path2).unwrap(), "");
    }

    #[tokio::test]
    async fn test_spawn_failure_is_fatal() {
        let tmp = tempdir().unwrap();
        let cfg = Effective {
            workspace: tmp.path().to_path_buf(),
            go: tmp.path().join("no-such-go").to_string_lossy().into_owned(),
            ..Effective::default()
        };
        let err = run_with(&cfg, &["build".into()], tokio::io::sink(), tokio::io::sink())
            .await
            .unwrap_err();
        assert!(matches!(err.source, WrapperError::Spawn { .. }));
        assert!(err.child_code.is_none());
    }

    /// Fails every read.
    struct Broken;

    impl tokio::io::AsyncRead for Broken {
        fn poll_read(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Err(std::io::Error::other("pipe broke")))
        }
    }

    #[tokio::test]
    async fn test_drains_propagate_read_errors() {
        let mut out: Vec<u8> = Vec::new();
        let err = drain_build_errors(BufReader::new(Broken), &mut out)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Other);

        let tmp = tempdir().unwrap();
        let err = drain_test_failures(
            BufReader::new(Broken),
            &mut out,
            &PackageIndex::empty(),
            tmp.path(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Other);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_failed_drain_becomes_stream_error() {
        let task = tokio::spawn(async move {
            let mut out = tokio::io::sink();
            drain_test_failures(
                BufReader::new(Broken),
                &mut out,
                &PackageIndex::empty(),
                Path::new("."),
            )
            .await
        });
        let err = join_drain(Some(task), StreamKind::Stdout).await.unwrap_err();
        assert!(matches!(
            err,
            WrapperError::Stream {
                stream: StreamKind::Stdout,
                ..
            }
        ));
        assert!(join_drain(None, StreamKind::Stderr).await.is_ok());
    }

    #[test]
    fn test_fatal_exit_code_prefers_child_failure() {
        let broken = || WrapperError::stream(StreamKind::Stderr, std::io::Error::other("x"));
        let err = RunError {
            source: broken(),
            child_code: Some(3),
        };
        assert_eq!(err.exit_code(), 3);
        let err = RunError {
            source: broken(),
            child_code: Some(0),
        };
        assert_eq!(err.exit_code(), FATAL_EXIT);
        assert_eq!(RunError::from(broken()).exit_code(), FATAL_EXIT);
    }
}
