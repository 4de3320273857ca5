//! FileDiscovery: enumerate candidate files under a root (spec §4.1).

use ignore::overrides::{Override, OverrideBuilder};
use ignore::{Walk, WalkBuilder};
use std::path::{Path, PathBuf};

use crate::error::{Result, SearchCodeError};

/// Directory names excluded at any depth regardless of config (stage 1 of the
/// exclusion pipeline).
const BLACKLISTED_DIR_NAMES: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "dist",
    "build",
    "coverage",
    ".next",
    ".nuxt",
    ".venv",
    "venv",
    "__pycache__",
    ".mypy_cache",
    ".pytest_cache",
    "vendor",
    ".idea",
    ".vscode",
    "out",
];

/// File globs excluded regardless of config (stage 2).
const BLACKLISTED_FILE_GLOBS: &[&str] = &[
    "**/*.lock",
    "**/package-lock.json",
    "**/pnpm-lock.yaml",
    "**/yarn.lock",
    "**/*.log",
    "**/*.map",
    "**/*.pyc",
    "**/*.class",
    "**/*.swp",
    "**/*~",
    "**/.DS_Store",
];

fn build_overrides(
    root: &Path,
    exclude_dir_names: &[String],
    exclude_globs: &[String],
    include_globs: &[String],
) -> Result<Override> {
    let mut ob = OverrideBuilder::new(root);

    for d in BLACKLISTED_DIR_NAMES {
        ob.add(&format!("**/{d}")).map_err(glob_err)?;
        ob.add(&format!("**/{d}/**")).map_err(glob_err)?;
    }
    for d in exclude_dir_names {
        let d = d.trim().trim_matches('/');
        if d.is_empty() {
            continue;
        }
        ob.add(&format!("**/{d}")).map_err(glob_err)?;
        ob.add(&format!("**/{d}/**")).map_err(glob_err)?;
    }
    for g in BLACKLISTED_FILE_GLOBS {
        ob.add(g).map_err(glob_err)?;
    }
    for g in exclude_globs {
        ob.add(g).map_err(glob_err)?;
    }
    // Whitelist negation: must come last, `ignore::overrides` treats a
    // leading `!` as "force-include", overriding earlier exclusion matches.
    for g in include_globs {
        ob.add(&format!("!{g}")).map_err(glob_err)?;
    }

    ob.build().map_err(glob_err)
}

fn glob_err(e: impl std::fmt::Display) -> SearchCodeError {
    SearchCodeError::DiscoveryError(e.to_string())
}

/// Options controlling one discovery pass (spec §4.1 inputs).
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    pub include_globs: Vec<String>,
    pub extra_exclude_globs: Vec<String>,
    pub exclude_dir_names: Vec<String>,
    pub max_file_bytes: u64,
}

/// A discovered file, relative path plus size (size lets the indexer skip the
/// byte-ceiling check without a second stat call).
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub rel_path: PathBuf,
    pub abs_path: PathBuf,
    pub bytes: u64,
}

/// Lazy sequence of discovered files (Design Notes §9: "model as lazy
/// sequences... do not buffer a whole repository in memory"). Finite, not
/// restartable — a fresh `discover` call is required to walk again.
pub struct Discovery {
    walk: Walk,
    root: PathBuf,
    max_file_bytes: u64,
}

impl Iterator for Discovery {
    type Item = DiscoveredFile;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = self.walk.next()?;
            let Ok(dent) = entry else { continue };
            if !dent.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }
            let abs_path = dent.into_path();
            let bytes = match std::fs::metadata(&abs_path).map(|m| m.len()) {
                Ok(b) => b,
                Err(_) => continue,
            };
            if bytes > self.max_file_bytes {
                tracing::warn!(
                    path = %abs_path.display(),
                    bytes,
                    max = self.max_file_bytes,
                    "file exceeds byte ceiling, skipping"
                );
                continue;
            }
            let Ok(rel_path) = abs_path.strip_prefix(&self.root) else {
                continue;
            };
            return Some(DiscoveredFile {
                rel_path: rel_path.to_path_buf(),
                abs_path,
                bytes,
            });
        }
    }
}

/// Enumerates files under `root` per the spec's ordered exclusion pipeline.
/// Fails with `DiscoveryError` when `root` does not exist or is not a
/// directory.
pub fn discover(root: &Path, opts: &DiscoveryOptions) -> Result<Discovery> {
    let meta = std::fs::metadata(root).map_err(|e| {
        SearchCodeError::DiscoveryError(format!("root {}: {e}", root.display()))
    })?;
    if !meta.is_dir() {
        return Err(SearchCodeError::DiscoveryError(format!(
            "root {} is not a directory",
            root.display()
        )));
    }

    let max_file_bytes = if opts.max_file_bytes == 0 {
        crate::config::ABSOLUTE_MAX_FILE_BYTES
    } else {
        opts.max_file_bytes.min(crate::config::ABSOLUTE_MAX_FILE_BYTES)
    };

    let overrides = build_overrides(
        root,
        &opts.exclude_dir_names,
        &opts.extra_exclude_globs,
        &opts.include_globs,
    )?;

    let walk = WalkBuilder::new(root)
        .standard_filters(true)
        .overrides(overrides)
        .build();

    Ok(Discovery {
        walk,
        root: root.to_path_buf(),
        max_file_bytes,
    })
}
