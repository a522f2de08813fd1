//! Flow file discovery

use anyhow::{Context, Result};
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const FLOW_EXTENSION: &str = "xml";

/// All `*.xml` files under `project_root/flows_dir`, sorted
///
/// Respects `.gitignore`. A missing flow directory yields an empty list.
pub fn discover_flow_files(project_root: &Path, flows_dir: &str) -> Result<Vec<PathBuf>> {
    discover_flow_files_excluding(project_root, flows_dir, &[])
}

/// Like [`discover_flow_files`], skipping files that match any `exclude` glob
///
/// Globs are relative to the flow directory.
pub fn discover_flow_files_excluding(
    project_root: &Path,
    flows_dir: &str,
    exclude: &[String],
) -> Result<Vec<PathBuf>> {
    let root = project_root.join(flows_dir);
    if !root.is_dir() {
        warn!("Flow directory {} does not exist", root.display());
        return Ok(Vec::new());
    }

    let mut overrides = OverrideBuilder::new(&root);
    for pattern in exclude {
        overrides
            .add(&format!("!{}", pattern))
            .with_context(|| format!("invalid exclude pattern '{}'", pattern))?;
    }
    let overrides = overrides.build().context("failed to build exclude patterns")?;

    let mut builder = WalkBuilder::new(&root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .require_git(false)
        .overrides(overrides);

    let mut files: Vec<PathBuf> = builder
        .build()
        .flatten()
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(FLOW_EXTENSION))
        })
        .collect();
    files.sort();

    debug!("Discovered {} flow files under {}", files.len(), root.display());
    Ok(files)
}
