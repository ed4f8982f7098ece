//! Access to the on-disk workflow state.
//!
//! The engine never touches the filesystem directly; it goes through
//! [`WorkflowStore`], which lets unit tests swap in
//! [`crate::testing::MemoryWorkflowStore`].

use crate::config::{PlanningPaths, ProjectConfig};
use crate::error::{AutochainError, Result};
use crate::phases::{find_phase_dir, PhaseArtifacts};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

/// Persisted state consulted by the continuation engine.
///
/// # Example
///
/// ```rust,ignore
/// use autochain::store::{FsWorkflowStore, WorkflowStore};
///
/// let mut store = FsWorkflowStore::new(".");
/// if let Some(next) = store.take_signal()? {
///     println!("next command: {next}");
/// }
/// ```
pub trait WorkflowStore {
    /// Load the project configuration.
    ///
    /// Returns `Ok(None)` when no configuration exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration exists but cannot be read or parsed.
    fn load_config(&self) -> Result<Option<ProjectConfig>>;

    /// Read and consume the pending signal.
    ///
    /// On success the signal is gone from the store before this returns,
    /// whatever the caller later decides to do with it.
    ///
    /// # Errors
    ///
    /// Returns an error if the signal exists but cannot be read or removed.
    fn take_signal(&mut self) -> Result<Option<String>>;

    /// Read the pending signal without consuming it.
    ///
    /// # Errors
    ///
    /// Returns an error if the signal exists but cannot be read.
    fn peek_signal(&self) -> Result<Option<String>>;

    /// Artifact counts for the directory of `phase`, or `None` when the
    /// phase has no unique directory.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures the implementation cannot map to
    /// "no directory".
    fn phase_artifacts(&self, phase: u32) -> Result<Option<PhaseArtifacts>>;

    /// Read the workflow state document (STATE.md).
    ///
    /// # Errors
    ///
    /// Returns an error if the document exists but cannot be read.
    fn read_state(&self) -> Result<Option<String>>;

    /// Read a session transcript supplied by the host.
    ///
    /// # Errors
    ///
    /// Returns an error if the transcript cannot be read.
    fn read_transcript(&self, path: &Path) -> Result<String>;
}

/// [`WorkflowStore`] backed by a project directory.
#[derive(Debug, Clone)]
pub struct FsWorkflowStore {
    paths: PlanningPaths,
}

impl FsWorkflowStore {
    /// Create a store for the project rooted at `project_dir`.
    #[must_use]
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            paths: PlanningPaths::new(project_dir),
        }
    }

    #[must_use]
    pub fn paths(&self) -> &PlanningPaths {
        &self.paths
    }

    /// Write a signal for the next invocation, replacing any pending one.
    pub fn write_signal(&self, command: &str) -> Result<()> {
        let command = command.trim();
        if command.is_empty() {
            return Err(AutochainError::signal(
                self.paths.signal_path(),
                "refusing to write an empty signal",
            ));
        }
        fs::create_dir_all(self.paths.planning_dir())?;
        fs::write(self.paths.signal_path(), format!("{command}\n"))?;
        Ok(())
    }
}

/// Read a file, mapping "not found" to `None`.
fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl WorkflowStore for FsWorkflowStore {
    fn load_config(&self) -> Result<Option<ProjectConfig>> {
        ProjectConfig::load(&self.paths)
    }

    fn take_signal(&mut self) -> Result<Option<String>> {
        let path = self.paths.signal_path();
        let Some(content) = read_optional(&path)? else {
            return Ok(None);
        };

        // Consume before the caller sees the content.
        if let Err(e) = fs::remove_file(&path) {
            warn!("Could not consume signal at {}: {}", path.display(), e);
            return Err(AutochainError::signal(path, e.to_string()));
        }
        debug!("Consumed signal at {}", path.display());

        Ok(Some(content))
    }

    fn peek_signal(&self) -> Result<Option<String>> {
        read_optional(&self.paths.signal_path())
    }

    fn phase_artifacts(&self, phase: u32) -> Result<Option<PhaseArtifacts>> {
        Ok(find_phase_dir(&self.paths.phases_dir(), phase).map(|dir| PhaseArtifacts::scan(&dir)))
    }

    fn read_state(&self) -> Result<Option<String>> {
        read_optional(&self.paths.state_path())
    }

    fn read_transcript(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| {
            AutochainError::transcript(format!("{}: {}", path.display(), e))
        })
    }
}
