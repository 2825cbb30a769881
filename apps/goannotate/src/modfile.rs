//! Module descriptor (`go.mod`) reading.
//!
//! Only the `module` directive matters here. The package index takes any
//! `ModuleParser`, so a fuller parser can be dropped in.

use crate::error::ModFileError;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static MODULE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^module\s+(?:"((?:[^"\\]|\\.)+)"|`([^`]+)`|(\S+))\s*$"#).unwrap()
});

/// Extracts the module name from a descriptor file's bytes.
pub trait ModuleParser {
    fn parse_module(&self, path: &Path, data: &[u8]) -> Result<String, ModFileError>;
}

/// Reads the first `module` directive of a `go.mod` file.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoModParser;

impl ModuleParser for GoModParser {
    fn parse_module(&self, path: &Path, data: &[u8]) -> Result<String, ModFileError> {
        let text = std::str::from_utf8(data).map_err(|_| ModFileError::InvalidUtf8 {
            path: path.to_path_buf(),
        })?;
        for raw in text.lines() {
            let line = strip_comment(raw).trim();
            if let Some(caps) = MODULE_DIRECTIVE.captures(line) {
                let name = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .or_else(|| caps.get(3))
                    .map(|m| m.as_str().replace("\\\"", "\""));
                if let Some(name) = name {
                    return Ok(name);
                }
            }
        }
        Err(ModFileError::MissingModule {
            path: path.to_path_buf(),
        })
    }
}

/// Drop a trailing `//` comment that is not inside a quoted string.
fn strip_comment(line: &str) -> &str {
    let mut in_quote = false;
    let mut prev = '\0';
    for (i, ch) in line.char_indices() {
        match ch {
            '"' if prev != '\\' => in_quote = !in_quote,
            '/' if !in_quote && prev == '/' => return &line[..i - 1],
            _ => {}
        }
        prev = ch;
    }
    line
}
