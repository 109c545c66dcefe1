//! Artifact location.
//!
//! Outputs land next to the executable, not in the caller's working
//! directory, so runs from different shells write to the same place.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const CHART_FILE: &str = "comparison.svg";
pub const REPORT_FILE: &str = "analysis_results.txt";

/// Directory containing the running executable.
pub fn install_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("failed to locate the running executable")?;
    let exe = exe.canonicalize().unwrap_or(exe);
    exe.parent()
        .map(Path::to_path_buf)
        .context("executable path has no parent directory")
}

/// Resolve the artifact directory: the override if given, else [`install_dir`].
///
/// An override directory is created if it does not exist.
pub fn resolve_output_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    match override_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create output dir: {}", dir.display()))?;
            Ok(dir.to_path_buf())
        }
        None => install_dir(),
    }
}
