//! Line patterns for `go build` diagnostics and `go test` failure blocks.

use crate::models::{BuildError, TestDetail};
use regex::Regex;
use std::sync::LazyLock;

static BUILD_ERR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+\.go):(\d+):(\d+):\s(.*)$").unwrap());

static TEST_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^---\sFAIL:\s+(.+)\s+\([0-9\.]+[smh]\)$").unwrap());

static TEST_DETAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+(.+\.go):(\d+):\s(.+)$").unwrap());

static TEST_RESULT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^FAIL\s(.+)\s+[0-9\.]+[smh]$").unwrap());

/// Parse a digit group already validated by a pattern. Overflow is the only
/// way this fails; the caller skips the line.
fn parse_num(digits: &str, line: &str) -> Option<usize> {
    match digits.parse() {
        Ok(n) => Some(n),
        Err(e) => {
            tracing::warn!(%line, error = %e, "skipping diagnostic with unparsable number");
            None
        }
    }
}

/// Match `<file>.go:<line>:<col>: <text>`.
pub fn match_build_err(line: &str) -> Option<BuildError> {
    let caps = BUILD_ERR.captures(line)?;
    Some(BuildError {
        file: caps[1].to_string(),
        line: parse_num(&caps[2], line)?,
        col: parse_num(&caps[3], line)?,
        text: caps[4].to_string(),
    })
}

/// Match a `--- FAIL: <name> (<duration>)` header, returning the test name.
pub fn match_test_start(line: &str) -> Option<&str> {
    TEST_START
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

/// Match an indented `<file>.go:<line>: <text>` detail line.
pub fn match_test_detail(line: &str) -> Option<TestDetail> {
    let caps = TEST_DETAIL.captures(line)?;
    Some(TestDetail {
        file: caps[1].to_string(),
        line: parse_num(&caps[2], line)?,
        text: caps[3].to_string(),
    })
}

/// Match a `FAIL <package> <duration>` footer, returning the package.
pub fn match_test_result(line: &str) -> Option<&str> {
    TEST_RESULT
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}
