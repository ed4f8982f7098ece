//! Phase directory lookup and artifact counting.
//!
//! A phase lives in `phases/<NN>-<name>/` where `NN` is the phase number
//! zero-padded to two digits. Enumeration failures count as "nothing
//! found"; only the caller decides whether that matters.

use crate::config::{GAP_CLOSURE_MARKER, PLAN_SUFFIX, SUMMARY_SUFFIX};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Artifact counts for a single phase directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhaseArtifacts {
    /// The resolved phase directory
    pub dir: PathBuf,
    /// Files ending in `-PLAN.md`
    pub plans: usize,
    /// Files ending in `-SUMMARY.md`
    pub summaries: usize,
    /// Plans whose content carries the gap-closure marker
    pub gap_closure_plans: usize,
}

impl PhaseArtifacts {
    /// Scan `dir` and count its artifacts.
    #[must_use]
    pub fn scan(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            plans: count_files_by_suffix(dir, PLAN_SUFFIX),
            summaries: count_files_by_suffix(dir, SUMMARY_SUFFIX),
            gap_closure_plans: count_gap_closure_plans(dir),
        }
    }

    /// True when every plan has a matching summary
    #[must_use]
    pub fn is_executed(&self) -> bool {
        self.plans > 0 && self.summaries >= self.plans
    }
}

/// Directory-name prefix for a phase (`3` -> `"03-"`, `112` -> `"112-"`).
#[must_use]
pub fn phase_prefix(phase: u32) -> String {
    format!("{phase:02}-")
}

/// Find the unique directory for `phase` directly under `phases_root`.
///
/// Returns `None` when the root is missing, nothing matches, or more than
/// one directory matches the prefix.
#[must_use]
pub fn find_phase_dir(phases_root: &Path, phase: u32) -> Option<PathBuf> {
    let prefix = phase_prefix(phase);
    let entries = match fs::read_dir(phases_root) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot list {}: {}", phases_root.display(), e);
            return None;
        }
    };

    let mut matches = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(&prefix))
        .map(|e| e.path())
        .filter(|p| p.is_dir());

    let first = matches.next()?;
    if matches.next().is_some() {
        debug!(
            "Phase {} is ambiguous under {}",
            phase,
            phases_root.display()
        );
        return None;
    }
    Some(first)
}

/// Count regular files in `dir` whose name ends with `suffix`.
#[must_use]
pub fn count_files_by_suffix(dir: &Path, suffix: &str) -> usize {
    plan_like_files(dir, suffix).count()
}

/// Count `-PLAN.md` files in `dir` whose content contains the gap-closure
/// marker. Unreadable plans are not counted.
#[must_use]
pub fn count_gap_closure_plans(dir: &Path) -> usize {
    plan_like_files(dir, PLAN_SUFFIX)
        .filter(|path| {
            fs::read_to_string(path)
                .map(|content| content.contains(GAP_CLOSURE_MARKER))
                .unwrap_or(false)
        })
        .count()
}

fn plan_like_files<'a>(dir: &Path, suffix: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
    fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(|e| e.ok())
        .filter(move |e| e.file_name().to_string_lossy().ends_with(suffix))
        .map(|e| e.path())
        .filter(|p| p.is_file())
}
