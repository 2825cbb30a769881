//! Shared data models for diagnostics recognized in toolchain output.

/// A single-line compiler diagnostic: `<file>:<line>:<col>: <text>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildError {
    pub file: String,
    pub line: usize,
    pub col: usize,
    pub text: String,
}

/// A detail line seen inside an open failure block, before the footer
/// names its package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDetail {
    /// Path relative to the package directory, as printed by the test runner.
    pub file: String,
    pub line: usize,
    pub text: String,
}

/// A test failure stamped with its owning package, ready to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFailure {
    pub package: String,
    pub file: String,
    pub line: usize,
    pub text: String,
}

impl TestDetail {
    /// Attach the package named by the block footer.
    pub fn stamp(self, package: &str) -> TestFailure {
        TestFailure {
            package: package.to_string(),
            file: self.file,
            line: self.line,
            text: self.text,
        }
    }
}
