//! Test fixtures for creating reproducible planning projects.
//!
//! Provides temporary project directories laid out the way the workflow
//! skills leave them, for tests that exercise the real filesystem store.

use crate::config::{PlanningPaths, PHASES_DIR, PLANNING_DIR};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary project directory.
///
/// Automatically cleans up when dropped.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::planning_project(true)
///     .with_signal("execute-phase 3")
///     .with_phase_file(3, "03-01-PLAN.md", "plan");
/// assert!(fixture.has_signal());
/// ```
pub struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    /// Create an empty project with no `.planning` directory.
    ///
    /// # Panics
    ///
    /// Panics if temporary directory creation fails.
    #[must_use]
    pub fn empty() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        Self { temp_dir }
    }

    /// Create a project with a `config.json` carrying `auto_mode`.
    ///
    /// # Panics
    ///
    /// Panics if file creation fails.
    #[must_use]
    pub fn planning_project(auto_mode: bool) -> Self {
        let fixture = Self::empty();
        fixture
            .write_file(
                &format!("{PLANNING_DIR}/config.json"),
                &format!(r#"{{"mode": "interactive", "auto_mode": {auto_mode}}}"#),
            )
            .expect("Failed to write config.json");
        fixture
    }

    /// Write a pending signal.
    ///
    /// # Panics
    ///
    /// Panics if file creation fails.
    #[must_use]
    pub fn with_signal(self, content: &str) -> Self {
        self.write_file(&format!("{PLANNING_DIR}/.auto-next"), content)
            .expect("Failed to write signal");
        self
    }

    /// Write STATE.md.
    ///
    /// # Panics
    ///
    /// Panics if file creation fails.
    #[must_use]
    pub fn with_state(self, content: &str) -> Self {
        self.write_file(&format!("{PLANNING_DIR}/STATE.md"), content)
            .expect("Failed to write STATE.md");
        self
    }

    /// Write a file into the directory of `phase` (`NN-phase`).
    ///
    /// # Panics
    ///
    /// Panics if file creation fails.
    #[must_use]
    pub fn with_phase_file(self, phase: u32, name: &str, content: &str) -> Self {
        self.write_file(
            &format!("{PLANNING_DIR}/{PHASES_DIR}/{phase:02}-phase/{name}"),
            content,
        )
        .expect("Failed to write phase file");
        self
    }

    /// Write a transcript file and return its path.
    ///
    /// # Panics
    ///
    /// Panics if file creation fails.
    #[must_use]
    pub fn write_transcript(&self, content: &str) -> PathBuf {
        self.write_file("transcript.jsonl", content)
            .expect("Failed to write transcript");
        self.temp_dir.path().join("transcript.jsonl")
    }

    /// Get the path to the fixture directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Planning paths for this fixture.
    #[must_use]
    pub fn paths(&self) -> PlanningPaths {
        PlanningPaths::new(self.temp_dir.path())
    }

    /// Check if a signal is pending.
    #[must_use]
    pub fn has_signal(&self) -> bool {
        self.paths().signal_path().exists()
    }

    /// Write a file relative to the fixture directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_file(&self, relative_path: &str, content: &str) -> std::io::Result<()> {
        let path = self.temp_dir.path().join(relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
    }
}
