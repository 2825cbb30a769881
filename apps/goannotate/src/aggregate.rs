//! Groups multi-line `go test` failure blocks into per-detail records.
//!
//! A block opens on `--- FAIL: <name> (<dur>)`, collects indented
//! `<file>.go:<line>: <msg>` details, and closes on `FAIL <pkg> <dur>`.
//! Details are only released once the footer names their package.

use crate::matchers::{match_test_detail, match_test_result, match_test_start};
use crate::models::{TestDetail, TestFailure};

#[derive(Debug, Default)]
pub struct TestAggregator {
    open: bool,
    pending: Vec<TestDetail>,
}

impl TestAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Feed one line. Returns the flushed failures, non-empty only when the
    /// line is a footer closing a block that collected details.
    pub fn push(&mut self, line: &str) -> Vec<TestFailure> {
        if !self.open {
            if let Some(name) = match_test_start(line) {
                tracing::trace!(test = name, "failure block opened");
                self.open = true;
                self.pending.clear();
            }
            return Vec::new();
        }

        if let Some(detail) = match_test_detail(line) {
            self.pending.push(detail);
            return Vec::new();
        }
        if let Some(pkg) = match_test_result(line) {
            self.open = false;
            let flushed: Vec<TestFailure> =
                self.pending.drain(..).map(|d| d.stamp(pkg)).collect();
            tracing::debug!(package = pkg, count = flushed.len(), "failure block closed");
            return flushed;
        }
        // Another header while open: go test prints one footer per package
        // after all of its failing tests, so keep what was collected.
        if let Some(name) = match_test_start(line) {
            tracing::trace!(test = name, "failure block continued");
        }
        Vec::new()
    }

    /// End of stream. Details of a block that never saw its footer are
    /// dropped; the count is returned for logging.
    pub fn finish(&mut self) -> usize {
        let dropped = self.pending.len();
        if self.open && dropped > 0 {
            tracing::debug!(dropped, "stream ended inside an open failure block");
        }
        self.open = false;
        self.pending.clear();
        dropped
    }
}
