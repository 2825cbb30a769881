//! Package name → directory index.
//!
//! Built once per run from the targets handed to `go test`. For each target
//! directory we walk outward to the nearest module descriptor, then compose
//! package names top-down (`<module>/<sub>/<dir>`). Every visited directory
//! is memoized so shared ancestors are resolved and parsed only once.
//!
//! A directory with no descriptor anywhere above it has no package (the
//! empty string in the memo); we never guess a name without an anchor.

use crate::models::TestFailure;
use crate::modfile::ModuleParser;
use crate::utils::{normalize_path, rel_to, strip_dot_slash};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const WILDCARD: &str = "...";

#[derive(Debug, Default, Clone)]
pub struct PackageIndex {
    dirs: HashMap<String, PathBuf>,
}

impl PackageIndex {
    /// Index with no packages; every lookup degrades to the raw path.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve every target (relative targets are taken against `workspace`)
    /// and invert the memo into package → directory.
    pub fn build<P: ModuleParser>(
        targets: &[String],
        workspace: &Path,
        modfile: &str,
        parser: &P,
    ) -> Self {
        let mut resolver = Resolver::new(modfile, parser);
        for target in targets {
            resolver.visit_target(&absolutize(target, workspace));
        }
        resolver.into_index()
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn resolve_dir(&self, package: &str) -> Option<&Path> {
        self.dirs.get(package).map(PathBuf::as_path)
    }

    /// File path for a failure, relative to `workspace`. Falls back to the
    /// path as printed when the package is unknown.
    pub fn resolve_file(&self, failure: &TestFailure, workspace: &Path) -> String {
        match self.resolve_dir(&failure.package) {
            Some(dir) => {
                let abs = normalize_path(&dir.join(&failure.file));
                strip_dot_slash(&rel_to(&abs, workspace)).to_string()
            }
            None => {
                tracing::debug!(package = %failure.package, file = %failure.file, "package not indexed");
                strip_dot_slash(&failure.file).to_string()
            }
        }
    }
}

fn absolutize(target: &str, workspace: &Path) -> PathBuf {
    let p = Path::new(target);
    if p.is_absolute() {
        normalize_path(p)
    } else {
        normalize_path(&workspace.join(p))
    }
}

/// Memoizing walker behind `PackageIndex::build`.
struct Resolver<'a, P> {
    modfile: &'a str,
    parser: &'a P,
    memo: HashMap<PathBuf, String>,
    // Memo insertion order; the first directory seen for a package wins.
    order: Vec<PathBuf>,
}

impl<'a, P: ModuleParser> Resolver<'a, P> {
    fn new(modfile: &'a str, parser: &'a P) -> Self {
        Self {
            modfile,
            parser,
            memo: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn visit_target(&mut self, abs: &Path) {
        if abs.file_name().and_then(|n| n.to_str()) == Some(WILDCARD) {
            if let Some(root) = abs.parent() {
                self.visit_tree(root);
            }
            return;
        }
        match fs::metadata(abs) {
            Ok(meta) if meta.is_dir() => {
                self.resolve_package_of(abs);
            }
            Ok(_) => {
                if let Some(dir) = abs.parent() {
                    self.resolve_package_of(dir);
                }
            }
            Err(e) => {
                tracing::debug!(path = %abs.display(), error = %e, "skipping target");
            }
        }
    }

    /// Resolve `root` and every directory below it, skipping the ones the go
    /// tool ignores for `...` patterns (hidden, `_`-prefixed, `testdata`).
    /// Symlinked directories are neither resolved nor descended into.
    fn visit_tree(&mut self, root: &Path) {
        if !root.is_dir() {
            tracing::debug!(root = %root.display(), "wildcard root is not a directory");
            return;
        }
        self.resolve_package_of(root);
        let walker = WalkDir::new(root)
            .follow_links(false)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.file_type().is_dir() && !is_ignored_by_go(e));
        for entry in walker {
            match entry {
                Ok(entry) => {
                    self.resolve_package_of(entry.path());
                }
                Err(e) => {
                    tracing::debug!(root = %root.display(), error = %e, "skipping unreadable entry");
                }
            }
        }
    }

    /// Package name of `dir`, or "" when no module anchor is found above it.
    fn resolve_package_of(&mut self, dir: &Path) -> String {
        // Directories still waiting on an ancestor, innermost first.
        let mut unresolved: Vec<PathBuf> = Vec::new();
        let mut cur = dir.to_path_buf();
        let mut pkg = loop {
            if let Some(hit) = self.memo.get(&cur) {
                break hit.clone();
            }
            if let Some(module) = self.read_anchor(&cur) {
                self.remember(cur, module.clone());
                break module;
            }
            match cur.parent() {
                Some(parent) => {
                    let parent = parent.to_path_buf();
                    unresolved.push(std::mem::replace(&mut cur, parent));
                }
                None => {
                    self.remember(cur, String::new());
                    break String::new();
                }
            }
        };
        for d in unresolved.into_iter().rev() {
            if !pkg.is_empty() {
                let base = d
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                pkg = format!("{}/{}", pkg, base);
            }
            self.remember(d, pkg.clone());
        }
        pkg
    }

    /// Module name declared in `dir`, if it holds a readable descriptor.
    fn read_anchor(&self, dir: &Path) -> Option<String> {
        let path = dir.join(self.modfile);
        if !path.is_file() {
            return None;
        }
        let data = match fs::read(&path) {
            Ok(d) => d,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "unreadable module file");
                return None;
            }
        };
        match self.parser.parse_module(&path, &data) {
            Ok(name) => Some(name),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring malformed module file");
                None
            }
        }
    }

    fn remember(&mut self, dir: PathBuf, pkg: String) {
        self.order.push(dir.clone());
        self.memo.insert(dir, pkg);
    }

    fn into_index(self) -> PackageIndex {
        let mut dirs: HashMap<String, PathBuf> = HashMap::new();
        for dir in self.order {
            match self.memo.get(&dir) {
                Some(pkg) if !pkg.is_empty() => {
                    dirs.entry(pkg.clone()).or_insert(dir);
                }
                _ => {}
            }
        }
        PackageIndex { dirs }
    }
}

fn is_ignored_by_go(entry: &DirEntry) -> bool {
    if entry.path_is_symlink() {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name.starts_with('_') || name == "testdata"
}
