//! Console prefixes and path helpers.

use owo_colors::OwoColorize;
use std::path::{Component, Path, PathBuf};

fn use_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if use_colors() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if use_colors() {
        "note:".cyan().bold().to_string()
    } else {
        "note:".to_string()
    }
}

/// Lexically clean a path: drop `.` components and fold `..` into the
/// preceding segment. Symlinks are not resolved.
pub fn normalize_path(p: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in p.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = match out.components().next_back() {
                    Some(Component::Normal(_)) => out.pop(),
                    Some(Component::RootDir) | Some(Component::Prefix(_)) => true,
                    _ => false,
                };
                if !popped {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Render a path with `/` separators regardless of platform.
pub fn to_slash(p: &Path) -> String {
    let parts: Vec<String> = p
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| match c {
            Component::RootDir => String::new(),
            other => other.as_os_str().to_string_lossy().into_owned(),
        })
        .collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// `path` relative to `base`, slash-separated. Falls back to the path itself
/// when no relative form exists (e.g. different drive prefixes).
pub fn rel_to(path: &Path, base: &Path) -> String {
    match pathdiff::diff_paths(path, base) {
        Some(rel) => to_slash(&rel),
        None => to_slash(path),
    }
}

pub fn strip_dot_slash(p: &str) -> &str {
    p.strip_prefix("./").unwrap_or(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize_path(Path::new("/a/b/...")), PathBuf::from("/a/b/..."));
        assert_eq!(normalize_path(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize_path(Path::new("./x")), PathBuf::from("x"));
        assert_eq!(normalize_path(Path::new("../x")), PathBuf::from("../x"));
        assert_eq!(normalize_path(Path::new(".")), PathBuf::from("."));
    }

    #[test]
    fn test_rel_to_and_strip() {
        assert_eq!(rel_to(Path::new("/w/pkg/a.go"), Path::new("/w")), "pkg/a.go");
        assert_eq!(rel_to(Path::new("/w/a.go"), Path::new("/w/pkg")), "../a.go");
        assert_eq!(strip_dot_slash("./main.go"), "main.go");
        assert_eq!(strip_dot_slash("main.go"), "main.go");
        assert_eq!(strip_dot_slash("../main.go"), "../main.go");
    }
}
