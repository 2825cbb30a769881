//! Configuration discovery and effective settings resolution.
//!
//! goannotate reads `goannotate.toml|yaml|yml` from the workspace or the
//! closest ancestor (stopping at a `.git` directory) and merges it with CLI
//! flags into an `Effective` config.
//! Defaults:
//! - `go`: `go`
//! - `modfile`: `go.mod`
//! - `annotate`: true
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::utils::normalize_path;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_NAMES: [&str; 3] = ["goannotate.toml", "goannotate.yaml", "goannotate.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `goannotate.toml|yaml`.
pub struct FileConfig {
    pub go: Option<String>,
    pub modfile: Option<String>,
    pub annotate: Option<bool>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration, built once in `main` and passed down.
pub struct Effective {
    /// Directory annotation paths are made relative to.
    pub workspace: PathBuf,
    pub go: String,
    pub modfile: String,
    pub annotate: bool,
    /// Where the config file was found, if any.
    pub config_root: Option<PathBuf>,
}

impl Default for Effective {
    fn default() -> Self {
        Self {
            workspace: PathBuf::from("."),
            go: "go".to_string(),
            modfile: "go.mod".to_string(),
            annotate: true,
            config_root: None,
        }
    }
}

/// Walk upward from `start` looking for a config file.
///
/// Stops at the first directory holding a config file, or at a directory
/// containing `.git` (the repository root) without one.
pub fn detect_config_root(start: &Path) -> Option<PathBuf> {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).is_file()) {
            return Some(cur.to_path_buf());
        }
        if cur.join(".git").exists() {
            return None;
        }
        cur = cur.parent()?;
    }
}

/// Load `FileConfig` from `goannotate.toml` or `goannotate.yaml|yml`.
///
/// Unreadable or invalid files are reported and treated as absent.
pub fn load_config(root: &Path) -> Option<FileConfig> {
    let toml_path = root.join(CONFIG_NAMES[0]);
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).ok()?;
        return match toml::from_str(&s) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                tracing::warn!(path = %toml_path.display(), error = %e, "ignoring invalid config");
                None
            }
        };
    }
    for yml in &CONFIG_NAMES[1..] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            return match serde_yaml::from_str(&s) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "ignoring invalid config");
                    None
                }
            };
        }
    }
    None
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_workspace: Option<&Path>,
    cli_go: Option<&str>,
    cli_modfile: Option<&str>,
    cli_annotate: Option<bool>,
) -> std::io::Result<Effective> {
    let cwd = std::env::current_dir()?;
    let workspace = match cli_workspace {
        Some(p) => normalize_path(&cwd.join(p)),
        None => cwd,
    };
    let config_root = detect_config_root(&workspace);
    let cfg = config_root
        .as_deref()
        .and_then(load_config)
        .unwrap_or_default();
    let defaults = Effective::default();

    Ok(Effective {
        go: cli_go.map(str::to_string).or(cfg.go).unwrap_or(defaults.go),
        modfile: cli_modfile
            .map(str::to_string)
            .or(cfg.modfile)
            .unwrap_or(defaults.modfile),
        annotate: cli_annotate.or(cfg.annotate).unwrap_or(defaults.annotate),
        workspace,
        config_root,
    })
}
